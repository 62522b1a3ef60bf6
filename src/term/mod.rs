extern crate ansi_term;
extern crate ctrlc;
extern crate linefeed;
use crate::lang::Error;
use crate::mach::{Config, Device, Event, MemoryDevice, Runtime, Stream};
use ansi_term::Style;
use linefeed::{Completer, Completion, Interface, Prompter, ReadResult, Signal, Terminal};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Bytes, Read, Write};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

pub fn main() {
    init_tracing();
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    if let Err(error) = ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    }) {
        eprintln!("Error setting Ctrl-C handler: {}", error);
        return;
    }
    let mut runtime = match Runtime::new(config_from_env()) {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("{}", error);
            return;
        }
    };
    runtime.attach(Stream::Store, Box::new(MemoryDevice::new()));
    runtime.attach(Stream::File, Box::new(FileDevice::new(program_path())));
    if let Err(error) = main_loop(runtime, interrupted) {
        eprintln!("{}", error);
    }
}

/// Log to stderr, only when `RUST_LOG` asks for it.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn config_from_env() -> Config {
    let mut config = Config::default();
    if let Ok(size) = std::env::var("BASIC_ARENA_SIZE") {
        match size.trim().parse() {
            Ok(size) => config.arena_size = size,
            Err(_) => warn!(%size, "ignoring BASIC_ARENA_SIZE"),
        }
    }
    if let Ok(align) = std::env::var("BASIC_ALIGN") {
        config.align = matches!(align.trim(), "1" | "true" | "yes");
    }
    config
}

fn program_path() -> PathBuf {
    std::env::var_os("BASIC_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("program.bas"))
}

fn main_loop(mut runtime: Runtime, interrupted: Arc<AtomicBool>) -> std::io::Result<()> {
    let command = Interface::new("BASIC")?;
    command.set_prompt("> ")?;
    let input = Interface::new("INPUT")?;
    input.set_report_signal(Signal::Interrupt, true);
    let mut direct = String::new();

    loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            runtime.interrupt();
        }
        match runtime.execute(5000) {
            Event::Stopped => {
                let saved_completer = command.completer();
                command.set_completer(Arc::new(LineCompleter::new(&runtime)));
                let string = match command.read_line()? {
                    ReadResult::Input(string) => string,
                    ReadResult::Signal(_) | ReadResult::Eof => break,
                };
                command.set_completer(saved_completer);
                direct = string.clone();
                if runtime.enter(&string) {
                    command.add_history_unique(string);
                }
            }
            Event::Input(prompt) => {
                input.set_prompt(&prompt)?;
                match input.read_line()? {
                    ReadResult::Input(string) => {
                        if runtime.enter(&string) {
                            input.add_history_unique(string);
                        }
                    }
                    ReadResult::Signal(Signal::Interrupt) => {
                        input.set_buffer("")?;
                        input.lock_reader().cancel_read_line()?;
                        runtime.interrupt();
                    }
                    ReadResult::Signal(_) | ReadResult::Eof => break,
                };
            }
            Event::Error(error) => {
                command.write_fmt(format_args!(
                    "{}\n",
                    Style::new().bold().paint(error.to_string())
                ))?;
                if let Some(decorated) = decorate_error(&runtime, &error, &direct) {
                    command.write_fmt(format_args!("{}\n", decorated))?;
                }
            }
            Event::Running => {}
            Event::Print(s) => {
                command.write_fmt(format_args!("{}", s))?;
            }
            Event::Bye => break,
        }
    }
    Ok(())
}

struct LineCompleter {
    lines: BTreeMap<u16, String>,
}

impl LineCompleter {
    fn new(runtime: &Runtime) -> LineCompleter {
        let lines = runtime
            .arena()
            .lines()
            .map(|line| {
                let text = format!("{} {}", line.number, String::from_utf8_lossy(line.body));
                (line.number, text)
            })
            .collect();
        LineCompleter { lines }
    }
}

impl<Term: Terminal> Completer<Term> for LineCompleter {
    fn complete(
        &self,
        _word: &str,
        prompter: &Prompter<Term>,
        _start: usize,
        _end: usize,
    ) -> Option<Vec<Completion>> {
        let num = prompter.buffer().trim().parse::<u16>().ok()?;
        let s = self.lines.get(&num)?;
        let mut comp = Completion::simple(s.clone());
        comp.suffix = linefeed::complete::Suffix::None;
        Some(vec![comp])
    }
}

/// The failing line with its statement underlined.
fn decorate_error(runtime: &Runtime, error: &Error, direct: &str) -> Option<String> {
    let column = error.column()?;
    match error.line_number() {
        Some(number) => {
            let text = runtime.line_text(number)?;
            let offset = text.find(' ')? + 1;
            let span = statement_span(&text, offset + column);
            Some(decorate(&text, span))
        }
        None => {
            let text = direct.trim_end_matches(|c| c == '\r' || c == '\n');
            let span = statement_span(text, column);
            Some(decorate(text, span))
        }
    }
}

/// From `start` to the next `:` that is not inside quotes.
fn statement_span(text: &str, start: usize) -> Range<usize> {
    let mut quote = None;
    for (index, ch) in text.char_indices().skip_while(|(i, _)| *i < start) {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == ':' => return start..index,
            None => {}
        }
    }
    start..text.len()
}

fn decorate(ins: &str, columns: Range<usize>) -> String {
    let style = Style::new().underline();
    let mut out = String::new();
    let mut under_on = false;
    for (index, ch) in ins.char_indices() {
        let do_under = columns.contains(&index);
        if under_on && !do_under {
            out.push_str(&style.suffix().to_string());
        } else if !under_on && do_under {
            out.push_str(&style.prefix().to_string());
        }
        under_on = do_under;
        out.push(ch);
    }
    if columns.start >= ins.len() {
        under_on = true;
        out.push_str(&style.prefix().to_string());
        out.push(' ');
    }
    if under_on {
        out.push_str(&style.suffix().to_string());
    }
    out
}

/// Programs saved with `SAVE` go to one file on disk.
struct FileDevice {
    path: PathBuf,
    reader: Option<Bytes<BufReader<File>>>,
    writer: Option<File>,
}

impl FileDevice {
    fn new(path: PathBuf) -> FileDevice {
        FileDevice {
            path,
            reader: None,
            writer: None,
        }
    }
}

impl Device for FileDevice {
    fn begin_read(&mut self) {
        self.writer = None;
        self.reader = match File::open(&self.path) {
            Ok(file) => Some(BufReader::new(file).bytes()),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "cannot open program");
                None
            }
        };
    }

    fn begin_write(&mut self) {
        self.reader = None;
        self.writer = match File::create(&self.path) {
            Ok(file) => Some(file),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "cannot create program");
                None
            }
        };
    }

    fn read(&mut self) -> Option<u8> {
        self.reader.as_mut()?.next()?.ok()
    }

    fn write(&mut self, ch: u8) {
        if let Some(file) = self.writer.as_mut() {
            if let Err(error) = file.write_all(&[ch]) {
                warn!(%error, "write failed");
                self.writer = None;
            }
        }
    }
}
