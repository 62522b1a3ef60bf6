use super::Arena;
use crate::error;
use crate::lang::{Error, NL};
use tracing::debug;

type Result<T> = std::result::Result<T, Error>;

/// Line number, length byte.
pub const HEADER_LEN: usize = 3;
pub const MAX_RECORD_LEN: usize = u8::MAX as usize;

/// ## A stored program line
///
/// Records are `[number lo, number hi, length, body.., '\n', pad?]` where
/// `length` counts the whole record, pad included.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRef<'a> {
    pub number: u16,
    pub body: &'a [u8],
    /// Arena offset of the record.
    pub at: usize,
    pub len: usize,
}

impl<'a> LineRef<'a> {
    /// Arena offset of the first body byte.
    pub fn body_start(&self) -> usize {
        self.at + HEADER_LEN
    }

    pub fn next(&self) -> usize {
        self.at + self.len
    }
}

/// Lazy walk over program records in line number order.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    arena: &'a Arena,
    at: usize,
}

impl<'a> Iterator for Lines<'a> {
    type Item = LineRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.arena.line_at(self.at)?;
        self.at = line.next();
        Some(line)
    }
}

impl Arena {
    fn record_len(&self, body_len: usize) -> usize {
        let len = HEADER_LEN + body_len + 1;
        if self.align {
            (len + 1) & !1
        } else {
            len
        }
    }

    /// The record starting at `at`, or `None` at the end of the program.
    pub fn line_at(&self, at: usize) -> Option<LineRef<'_>> {
        if at < self.program_start || at + HEADER_LEN > self.program_end {
            return None;
        }
        let number = u16::from_le_bytes([self.bytes[at], self.bytes[at + 1]]);
        let len = usize::from(self.bytes[at + 2]);
        if len <= HEADER_LEN || at + len > self.program_end {
            debug_assert!(false, "Corrupt program record at {}.", at);
            return None;
        }
        let record = &self.bytes[at + HEADER_LEN..at + len];
        let body_len = record.iter().position(|&c| c == NL).unwrap_or(record.len());
        Some(LineRef {
            number,
            body: &record[..body_len],
            at,
            len,
        })
    }

    /// Offset of the first record numbered `number` or higher, or
    /// `program_end` when there is none.
    pub fn find_line(&self, number: u16) -> usize {
        self.lines()
            .find(|line| line.number >= number)
            .map(|line| line.at)
            .unwrap_or(self.program_end)
    }

    pub fn line(&self, number: u16) -> Option<LineRef<'_>> {
        self.line_at(self.find_line(number))
            .filter(|line| line.number == number)
    }

    pub fn lines(&self) -> Lines<'_> {
        Lines {
            arena: self,
            at: self.program_start,
        }
    }

    pub fn lines_from(&self, number: u16) -> Lines<'_> {
        Lines {
            arena: self,
            at: self.find_line(number),
        }
    }

    pub fn is_program_empty(&self) -> bool {
        self.program_end == self.program_start
    }

    /// Store `body` as line `number`, replacing any line with that number.
    /// An empty body deletes. Nothing changes when the result would not fit.
    pub fn insert_or_replace(&mut self, number: u16, body: &[u8]) -> Result<()> {
        debug_assert_eq!(self.scratch, 0);
        let at = self.find_line(number);
        let old_len = match self.line_at(at) {
            Some(line) if line.number == number => line.len,
            _ => 0,
        };
        let new_len = if body.is_empty() {
            0
        } else {
            self.record_len(body.len())
        };
        if new_len > MAX_RECORD_LEN || body.contains(&NL) {
            return Err(error!(LineBufferOverflow));
        }
        if self.program_end - old_len + new_len > self.program_limit() {
            return Err(error!(OutOfMemory));
        }
        if old_len > 0 {
            self.bytes.copy_within(at + old_len..self.program_end, at);
            self.program_end -= old_len;
            debug!(number, "deleted line");
        }
        if new_len > 0 {
            self.bytes.copy_within(at..self.program_end, at + new_len);
            let [lo, hi] = number.to_le_bytes();
            self.bytes[at] = lo;
            self.bytes[at + 1] = hi;
            self.bytes[at + 2] = new_len as u8;
            let body_start = at + HEADER_LEN;
            self.bytes[body_start..body_start + body.len()].copy_from_slice(body);
            for b in &mut self.bytes[body_start + body.len()..at + new_len] {
                *b = NL;
            }
            self.program_end += new_len;
            debug!(number, len = new_len, "stored line");
        }
        self.input_end = self.input_end.max(self.program_end);
        self.check_cursors();
        Ok(())
    }

    pub fn delete_line(&mut self, number: u16) -> Result<()> {
        self.insert_or_replace(number, &[])
    }

    /// Forget the program and every frame. Variables live elsewhere.
    pub fn reset(&mut self) {
        self.program_end = self.program_start;
        self.input_end = self.program_start;
        self.sp = self.stack_top;
        self.scratch = 0;
        debug!("program reset");
    }
}
