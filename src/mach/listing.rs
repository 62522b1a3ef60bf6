use super::{Arena, Output};
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// Print a signed number. Digits are staged on the control stack.
pub fn print_num<O: Output>(arena: &mut Arena, out: &mut O, num: i16) -> Result<()> {
    if num < 0 {
        out.outchar(b'-');
    }
    print_unum(arena, out, usize::from(num.unsigned_abs()))
}

pub fn print_unum<O: Output>(arena: &mut Arena, out: &mut O, mut num: usize) -> Result<()> {
    let mut digits = 0;
    loop {
        if let Err(error) = arena.push_byte(b'0' + (num % 10) as u8) {
            for _ in 0..digits {
                arena.pop_byte()?;
            }
            return Err(error);
        }
        digits += 1;
        num /= 10;
        if num == 0 {
            break;
        }
    }
    for _ in 0..digits {
        out.outchar(arena.pop_byte()?);
    }
    Ok(())
}

/// Print the record at `at` the way `LIST` shows it and return the offset
/// of the next record, or `None` past the last line.
pub fn print_line<O: Output>(arena: &mut Arena, out: &mut O, at: usize) -> Result<Option<usize>> {
    let (number, body, next) = match arena.line_at(at) {
        Some(line) => (line.number, line.body_start(), line.next()),
        None => return Ok(None),
    };
    print_unum(arena, out, usize::from(number))?;
    out.outchar(b' ');
    let mut pos = body;
    while let Some(&c) = arena.bytes().get(pos) {
        if c == crate::lang::NL {
            break;
        }
        out.outchar(c);
        pos += 1;
    }
    out.line_terminator();
    Ok(Some(next))
}

#[cfg(test)]
mod tests {
    use super::super::{Config, Position};
    use super::*;

    #[derive(Default)]
    struct Capture(Vec<u8>);

    impl Output for Capture {
        fn outchar(&mut self, ch: u8) {
            self.0.push(ch);
        }
    }

    fn arena() -> Arena {
        Arena::new(&Config {
            arena_size: 512,
            align: false,
        })
        .unwrap()
    }

    #[test]
    fn test_print_num() {
        let mut a = arena();
        let mut out = Capture::default();
        for n in &[0, 7, -12, 32767, -32768] {
            print_num(&mut a, &mut out, *n).unwrap();
            out.outchar(b',');
        }
        assert_eq!(out.0, b"0,7,-12,32767,-32768,".to_vec());
        assert_eq!(a.stack_depth(), 0);
    }

    #[test]
    fn test_print_num_unwinds_on_overflow() {
        let mut a = arena();
        a.insert_or_replace(10, &[b'X'; 200]).unwrap();
        let resume = Position {
            line: None,
            cursor: 0,
        };
        while a.push_gosub(resume).is_ok() {}
        let depth = a.stack_depth();
        let mut out = Capture::default();
        assert!(print_num(&mut a, &mut out, 12345).is_err());
        assert_eq!(a.stack_depth(), depth);
    }

    #[test]
    fn test_print_line() {
        let mut a = arena();
        a.insert_or_replace(10, b"PRINT \"HI\"").unwrap();
        a.insert_or_replace(20, b"END").unwrap();
        let mut out = Capture::default();
        let mut at = a.find_line(0);
        while let Some(next) = print_line(&mut a, &mut out, at).unwrap() {
            at = next;
        }
        assert_eq!(out.0, b"10 PRINT \"HI\"\n20 END\n".to_vec());
    }
}
