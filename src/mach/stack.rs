use super::Arena;
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;
use tracing::trace;

type Result<T> = std::result::Result<T, Error>;

const FOR_TAG: u8 = b'F';
const GOSUB_TAG: u8 = b'G';
const NO_LINE: u32 = u32::MAX;

pub const FOR_FRAME_LEN: usize = 1 + 1 + 2 + 2 + POSITION_LEN;
pub const GOSUB_FRAME_LEN: usize = 1 + POSITION_LEN;
const POSITION_LEN: usize = 8;

/// Where execution continues. `line` is the arena offset of the current
/// record, `None` while running a direct-mode line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: Option<usize>,
    pub cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForFrame {
    /// Variable slot, 0 for `A`.
    pub var: u8,
    pub terminal: i16,
    pub step: i16,
    pub resume: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    For(ForFrame),
    Gosub(Position),
}

impl Frame {
    fn len(&self) -> usize {
        match self {
            Frame::For(_) => FOR_FRAME_LEN,
            Frame::Gosub(_) => GOSUB_FRAME_LEN,
        }
    }

    fn encode(&self, buf: &mut [u8]) {
        match self {
            Frame::For(f) => {
                buf[0] = FOR_TAG;
                buf[1] = f.var;
                buf[2..4].copy_from_slice(&f.terminal.to_le_bytes());
                buf[4..6].copy_from_slice(&f.step.to_le_bytes());
                encode_position(&f.resume, &mut buf[6..]);
            }
            Frame::Gosub(pos) => {
                buf[0] = GOSUB_TAG;
                encode_position(pos, &mut buf[1..]);
            }
        }
    }

    fn decode(buf: &[u8]) -> Option<Frame> {
        match *buf.first()? {
            FOR_TAG if buf.len() >= FOR_FRAME_LEN => Some(Frame::For(ForFrame {
                var: buf[1],
                terminal: i16::from_le_bytes([buf[2], buf[3]]),
                step: i16::from_le_bytes([buf[4], buf[5]]),
                resume: decode_position(&buf[6..]),
            })),
            GOSUB_TAG if buf.len() >= GOSUB_FRAME_LEN => {
                Some(Frame::Gosub(decode_position(&buf[1..])))
            }
            _ => None,
        }
    }
}

fn encode_position(pos: &Position, buf: &mut [u8]) {
    let line = pos
        .line
        .and_then(|l| u32::try_from(l).ok())
        .unwrap_or(NO_LINE);
    buf[0..4].copy_from_slice(&line.to_le_bytes());
    buf[4..8].copy_from_slice(&(pos.cursor as u32).to_le_bytes());
}

fn decode_position(buf: &[u8]) -> Position {
    let line = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let cursor = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    Position {
        line: if line == NO_LINE {
            None
        } else {
            Some(line as usize)
        },
        cursor: cursor as usize,
    }
}

/// Frames from the top of the stack down, with their arena offsets.
pub struct Frames<'a> {
    arena: &'a Arena,
    at: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<(usize, Frame)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at >= self.arena.stack_top {
            return None;
        }
        match Frame::decode(&self.arena.bytes[self.at..self.arena.stack_top]) {
            Some(frame) => {
                let at = self.at;
                self.at += frame.len();
                Some(Ok((at, frame)))
            }
            None => {
                self.at = self.arena.stack_top;
                Some(Err(error!(InternalError; "CORRUPT STACK")))
            }
        }
    }
}

/// ## Control stack
///
/// Frames live at the top of the arena and grow down toward the program.
/// `NEXT` looks past other frames for its loop, `RETURN` only takes the
/// frame on top.

impl Arena {
    fn overflow_error(&self) -> Error {
        error!(OutOfMemory; "STACK OVERFLOW")
    }

    pub fn frames(&self) -> Frames<'_> {
        Frames {
            arena: self,
            at: self.sp,
        }
    }

    pub fn stack_depth(&self) -> usize {
        self.stack_top - self.sp
    }

    pub fn push_frame(&mut self, frame: Frame) -> Result<()> {
        debug_assert_eq!(self.scratch, 0);
        let len = frame.len();
        if self.sp < len || self.sp - len < self.stack_floor() {
            return Err(self.overflow_error());
        }
        self.sp -= len;
        let sp = self.sp;
        frame.encode(&mut self.bytes[sp..sp + len]);
        trace!(?frame, sp, "push frame");
        self.check_cursors();
        Ok(())
    }

    pub fn push_for(&mut self, var: u8, terminal: i16, step: i16, resume: Position) -> Result<()> {
        self.push_frame(Frame::For(ForFrame {
            var,
            terminal,
            step,
            resume,
        }))
    }

    pub fn push_gosub(&mut self, resume: Position) -> Result<()> {
        self.push_frame(Frame::Gosub(resume))
    }

    pub fn top_frame(&self) -> Result<Option<Frame>> {
        self.frames().next().transpose().map(|f| f.map(|(_, frame)| frame))
    }

    pub fn pop_frame(&mut self) -> Result<Option<Frame>> {
        debug_assert_eq!(self.scratch, 0);
        let frame = self.top_frame()?;
        if let Some(frame) = &frame {
            self.sp += frame.len();
            trace!(?frame, sp = self.sp, "pop frame");
        }
        Ok(frame)
    }

    /// Pop the subroutine frame on top. Any other frame on top is left alone.
    pub fn pop_gosub(&mut self) -> Result<Position> {
        match self.top_frame()? {
            Some(Frame::Gosub(pos)) => {
                self.pop_frame()?;
                Ok(pos)
            }
            _ => Err(error!(ReturnWithoutGosub)),
        }
    }

    /// Find the loop frame for `var` (or the innermost loop when `None`),
    /// discard every frame above it and return it. The stack is untouched
    /// when there is no such loop.
    pub fn unwind_to_for(&mut self, var: Option<u8>) -> Result<ForFrame> {
        let mut found = None;
        for item in self.frames() {
            if let (at, Frame::For(f)) = item? {
                if var.map_or(true, |v| v == f.var) {
                    found = Some((at, f));
                    break;
                }
            }
        }
        match found {
            Some((at, f)) => {
                if at != self.sp {
                    trace!(discarded = at - self.sp, "unwind to loop");
                }
                self.sp = at;
                Ok(f)
            }
            None => Err(error!(NoMatchingFor)),
        }
    }

    pub fn clear_stack(&mut self) {
        debug_assert_eq!(self.scratch, 0);
        self.sp = self.stack_top;
    }

    pub fn push_byte(&mut self, b: u8) -> Result<()> {
        if self.sp == 0 || self.sp - 1 < self.stack_floor() {
            return Err(self.overflow_error());
        }
        self.sp -= 1;
        self.bytes[self.sp] = b;
        self.scratch += 1;
        Ok(())
    }

    pub fn pop_byte(&mut self) -> Result<u8> {
        if self.scratch == 0 {
            return Err(error!(InternalError; "UNDERFLOW"));
        }
        let b = self.bytes[self.sp];
        self.sp += 1;
        self.scratch -= 1;
        Ok(b)
    }
}
