/*!
## Rust Machine Module

This Rust module stores and runs Tiny BASIC programs. Program text, the
line being typed and the control stack all share one fixed block of
memory, the same way a small microcontroller build would lay it out.

*/

mod arena;
mod eval;
mod io;
mod listing;
mod program;
mod runtime;
mod stack;
mod var;

#[cfg(test)]
mod tests;

pub use arena::Arena;
pub use arena::{MAX_ARENA_SIZE, MIN_ARENA_SIZE, STACK_MARGIN, STACK_RESERVE};
pub use eval::expression;
pub use io::{Device, Io, MemoryDevice, Output, Stream};
pub use listing::{print_line, print_num, print_unum};
pub use program::{LineRef, Lines, HEADER_LEN, MAX_RECORD_LEN};
pub use runtime::{Event, Runtime};
pub use stack::{ForFrame, Frame, Frames, Position, FOR_FRAME_LEN, GOSUB_FRAME_LEN};
pub use var::{Var, VAR_COUNT};

/// Sizing of the interpreter memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Total bytes shared by program, input line and control stack.
    pub arena_size: usize,
    /// Pad program records to an even length.
    pub align: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            arena_size: 64 * 1024,
            align: false,
        }
    }
}
