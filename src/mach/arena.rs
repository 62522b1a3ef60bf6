use super::Config;
use crate::error;
use crate::lang::{Error, NL};
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// Bytes kept free between the live text and the stack pointer.
pub const STACK_MARGIN: usize = 8;

/// Room held back for loop frames when typing a direct line.
pub const STACK_RESERVE: usize = 5 * super::stack::FOR_FRAME_LEN;

pub const MIN_ARENA_SIZE: usize = 256;
pub const MAX_ARENA_SIZE: usize = 64 * 1024;

/// ## One fixed block of interpreter memory
///
/// Program records grow up from `program_start`, control frames grow down
/// from `stack_top`. The gap between them holds the line being executed in
/// direct mode and the reply to an `INPUT` statement.
///
/// ```text
/// program_start   program_end   input_end       sp        stack_top
///      |  records  |  input text  |     free     |  frames  |
/// ```

pub struct Arena {
    pub(super) bytes: Box<[u8]>,
    pub(super) align: bool,
    pub(super) program_start: usize,
    pub(super) program_end: usize,
    pub(super) input_end: usize,
    pub(super) sp: usize,
    pub(super) stack_top: usize,
    pub(super) variables_begin: usize,
    pub(super) scratch: usize,
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Arena {{ program: {}..{}, input_end: {}, stack: {}..{} }}",
            self.program_start, self.program_end, self.input_end, self.sp, self.stack_top
        )
    }
}

impl Default for Arena {
    fn default() -> Arena {
        Arena::build(Config::default().arena_size, false)
    }
}

impl Arena {
    pub fn new(config: &Config) -> Result<Arena> {
        if config.arena_size < MIN_ARENA_SIZE || config.arena_size > MAX_ARENA_SIZE {
            return Err(error!(OutOfMemory; "INVALID ARENA SIZE"));
        }
        Ok(Arena::build(config.arena_size, config.align))
    }

    fn build(size: usize, align: bool) -> Arena {
        Arena {
            bytes: vec![0; size].into_boxed_slice(),
            align,
            program_start: 0,
            program_end: 0,
            input_end: 0,
            sp: size,
            stack_top: size,
            variables_begin: size - STACK_RESERVE,
            scratch: 0,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn program_end(&self) -> usize {
        self.program_end
    }

    pub fn stack_pointer(&self) -> usize {
        self.sp
    }

    /// Bytes available to program text.
    pub fn free(&self) -> usize {
        self.variables_begin.saturating_sub(self.program_end)
    }

    /// Lowest address a stack push may reach.
    pub(super) fn stack_floor(&self) -> usize {
        self.program_end.max(self.input_end) + STACK_MARGIN
    }

    /// Highest address program text may grow to.
    pub(super) fn program_limit(&self) -> usize {
        self.sp.min(self.variables_begin)
    }

    /// Copy a direct-mode line into the gap just above the program.
    pub fn set_input(&mut self, line: &[u8]) -> Result<usize> {
        self.input_end = self.program_end;
        let start = self.program_end;
        self.append_input(start, line)
    }

    /// Copy the reply to `INPUT` after the direct-mode line, replacing any
    /// earlier reply.
    pub fn set_reply(&mut self, direct_end: usize, reply: &[u8]) -> Result<usize> {
        let start = direct_end.max(self.program_end);
        self.append_input(start, reply)
    }

    fn append_input(&mut self, start: usize, text: &[u8]) -> Result<usize> {
        let end = start + text.len() + 1;
        let limit = self
            .variables_begin
            .min(self.sp.saturating_sub(STACK_MARGIN));
        if end > limit {
            return Err(error!(LineBufferOverflow));
        }
        self.bytes[start..end - 1].copy_from_slice(text);
        self.bytes[end - 1] = NL;
        self.input_end = end;
        Ok(start)
    }

    pub fn clear_input(&mut self) {
        self.input_end = self.program_end;
    }

    pub fn peek(&self, addr: i16) -> Result<u8> {
        match usize::try_from(addr).ok().and_then(|a| self.bytes.get(a)) {
            Some(&b) => Ok(b),
            None => Err(error!(IllegalFunctionCall; "ADDRESS OUT OF RANGE")),
        }
    }

    /// Writes are confined to the free gap so program records and frames
    /// stay well formed.
    pub fn poke(&mut self, addr: i16, value: u8) -> Result<()> {
        match usize::try_from(addr) {
            Ok(a) if a >= self.input_end && a < self.sp => {
                self.bytes[a] = value;
                Ok(())
            }
            _ => Err(error!(IllegalFunctionCall; "ADDRESS OUT OF RANGE")),
        }
    }

    pub(super) fn check_cursors(&self) {
        debug_assert!(self.program_start <= self.program_end);
        debug_assert!(self.program_end <= self.sp);
        debug_assert!(self.sp <= self.stack_top);
        debug_assert!(self.stack_top == self.bytes.len());
    }
}
