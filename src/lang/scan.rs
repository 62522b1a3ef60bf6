use super::keyword::Keyword;

pub const NL: u8 = b'\n';

fn is_basic_whitespace(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

fn is_basic_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_basic_alphabetic(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

/// Upper-case a line in place, leaving quoted text alone.
pub fn fold_case(line: &mut [u8]) {
    let mut quote = None;
    for c in line.iter_mut() {
        match quote {
            Some(q) if *c == q => quote = None,
            Some(_) => {}
            None if *c == b'"' || *c == b'\'' => quote = Some(*c),
            None => c.make_ascii_uppercase(),
        }
    }
}

/// Result of scanning a run of decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Numeral {
    /// Value modulo 2^16.
    pub value: u16,
    pub digits: usize,
    /// The full value did not fit in 16 bits.
    pub overflow: bool,
}

/// ## Cursor over interpreter text
///
/// Positions are byte offsets into `text`; reading past the end yields the
/// line terminator so a scan can never run off a line.

#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a [u8], pos: usize) -> Scanner<'a> {
        Scanner { text, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.text
    }

    pub fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    pub fn peek_at(&self, offset: usize) -> u8 {
        match self.text.get(self.pos + offset) {
            Some(&c) => c,
            None => NL,
        }
    }

    pub fn bump(&mut self) {
        if self.pos < self.text.len() && self.peek() != NL {
            self.pos += 1;
        }
    }

    pub fn skip_blanks(&mut self) {
        while is_basic_whitespace(self.peek()) {
            self.pos += 1;
        }
    }

    /// Skips blanks, then consumes `c` if it is next.
    pub fn accept(&mut self, c: u8) -> bool {
        self.skip_blanks();
        if self.peek() == c && c != NL {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn at_end_of_line(&self) -> bool {
        self.peek() == NL
    }

    pub fn at_end_of_statement(&self) -> bool {
        let c = self.peek();
        c == NL || c == b':'
    }

    pub fn scan_table<K: Keyword>(&mut self) -> Option<K> {
        let rest = &self.text[self.pos.min(self.text.len())..];
        for (text, keyword) in K::TABLE {
            let text = text.as_bytes();
            if rest.len() >= text.len() && rest[..text.len()].eq_ignore_ascii_case(text) {
                self.pos += text.len();
                return Some(*keyword);
            }
        }
        None
    }

    pub fn scan_numeral(&mut self) -> Numeral {
        let mut value: u16 = 0;
        let mut digits = 0;
        let mut overflow = false;
        while is_basic_digit(self.peek()) {
            let digit = u16::from(self.peek() - b'0');
            match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                Some(v) => value = v,
                None => {
                    overflow = true;
                    value = value.wrapping_mul(10).wrapping_add(digit);
                }
            }
            digits += 1;
            self.pos += 1;
        }
        Numeral {
            value,
            digits,
            overflow,
        }
    }

    /// A letter that is not the start of a longer word.
    pub fn variable(&mut self) -> Option<u8> {
        self.skip_blanks();
        let c = self.peek();
        if is_basic_alphabetic(c) && !is_basic_alphabetic(self.peek_at(1)) {
            self.pos += 1;
            Some(c.to_ascii_uppercase() - b'A')
        } else {
            None
        }
    }

    pub fn is_word_start(&self) -> bool {
        is_basic_alphabetic(self.peek()) && is_basic_alphabetic(self.peek_at(1))
    }

    /// Everything up to (not including) the terminator.
    pub fn rest_of_line(&self) -> &'a [u8] {
        let start = self.pos.min(self.text.len());
        let rest = &self.text[start..];
        match rest.iter().position(|&c| c == NL) {
            Some(end) => &rest[..end],
            None => rest,
        }
    }

    /// The quoted text at the cursor, without its delimiters. The closing
    /// delimiter must be on the same line.
    pub fn quoted(&mut self) -> Option<std::ops::Range<usize>> {
        let delim = self.peek();
        if delim != b'"' && delim != b'\'' {
            return None;
        }
        let start = self.pos + 1;
        let len = self.text[start..]
            .iter()
            .take_while(|&&c| c != NL)
            .position(|&c| c == delim)?;
        self.pos = start + len + 1;
        Some(start..start + len)
    }
}
