use crate::error;
use crate::lang::{Error, NL};
use tracing::debug;

type Result<T> = std::result::Result<T, Error>;

/// Where characters come from and go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Interactive,
    Store,
    File,
}

/// A byte-at-a-time transport for saving and loading programs.
pub trait Device {
    /// Rewind before a transfer in.
    fn begin_read(&mut self);
    /// Discard old contents before a transfer out.
    fn begin_write(&mut self);
    /// `None` at the end of the data.
    fn read(&mut self) -> Option<u8>;
    fn write(&mut self, ch: u8);
}

/// Bytes held in memory, like the small persistent store of a
/// microcontroller.
#[derive(Debug, Default, Clone)]
pub struct MemoryDevice {
    bytes: Vec<u8>,
    pos: usize,
}

impl MemoryDevice {
    pub fn new() -> MemoryDevice {
        MemoryDevice::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> MemoryDevice {
        MemoryDevice {
            bytes: bytes.to_vec(),
            pos: 0,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Device for MemoryDevice {
    fn begin_read(&mut self) {
        self.pos = 0;
    }

    fn begin_write(&mut self) {
        self.bytes.clear();
        self.pos = 0;
    }

    fn read(&mut self) -> Option<u8> {
        let b = self.bytes.get(self.pos).copied()?;
        self.pos += 1;
        Some(b)
    }

    fn write(&mut self, ch: u8) {
        self.bytes.push(ch);
    }
}

/// Anything characters can be written to.
pub trait Output {
    fn outchar(&mut self, ch: u8);

    fn line_terminator(&mut self) {
        self.outchar(NL);
    }
}

/// ## Character streams of one session

#[derive(Default)]
pub struct Io {
    input: Stream,
    output: Stream,
    /// Drop all output, set while replaying a loaded program.
    pub inhibit: bool,
    print: String,
    store: Option<Box<dyn Device>>,
    file: Option<Box<dyn Device>>,
}

impl Default for Stream {
    fn default() -> Stream {
        Stream::Interactive
    }
}

impl Output for Io {
    fn outchar(&mut self, ch: u8) {
        if self.inhibit {
            return;
        }
        match self.output {
            Stream::Interactive => self.print.push(char::from(ch)),
            stream => {
                if let Some(device) = self.device(stream) {
                    device.write(ch);
                }
            }
        }
    }
}

impl Io {
    pub fn input(&self) -> Stream {
        self.input
    }

    pub fn output(&self) -> Stream {
        self.output
    }

    pub fn attach(&mut self, stream: Stream, device: Box<dyn Device>) {
        match stream {
            Stream::Store => self.store = Some(device),
            Stream::File => self.file = Some(device),
            Stream::Interactive => debug_assert!(false, "The terminal is not a device."),
        }
    }

    pub fn detach(&mut self, stream: Stream) -> Option<Box<dyn Device>> {
        match stream {
            Stream::Store => self.store.take(),
            Stream::File => self.file.take(),
            Stream::Interactive => None,
        }
    }

    fn device(&mut self, stream: Stream) -> Option<&mut Box<dyn Device>> {
        match stream {
            Stream::Store => self.store.as_mut(),
            Stream::File => self.file.as_mut(),
            Stream::Interactive => None,
        }
    }

    pub fn select_input(&mut self, stream: Stream) -> Result<()> {
        if stream != Stream::Interactive {
            match self.device(stream) {
                Some(device) => device.begin_read(),
                None => return Err(error!(DeviceUnavailable)),
            }
        }
        debug!(?stream, "input selected");
        self.input = stream;
        Ok(())
    }

    pub fn select_output(&mut self, stream: Stream) -> Result<()> {
        if stream != Stream::Interactive {
            match self.device(stream) {
                Some(device) => device.begin_write(),
                None => return Err(error!(DeviceUnavailable)),
            }
        }
        debug!(?stream, "output selected");
        self.output = stream;
        Ok(())
    }

    /// Send output back to the terminal.
    pub fn restore_output(&mut self) {
        self.output = Stream::Interactive;
    }

    /// End a transfer in and let output through again.
    pub fn restore_input(&mut self) {
        self.input = Stream::Interactive;
        self.inhibit = false;
    }

    /// One byte from the selected input device. The interactive terminal
    /// is line oriented and never read here.
    pub fn inchar(&mut self) -> Option<u8> {
        let stream = self.input;
        self.device(stream)?.read()
    }

    pub fn has_print(&self) -> bool {
        !self.print.is_empty()
    }

    pub fn take_print(&mut self) -> String {
        std::mem::take(&mut self.print)
    }
}
