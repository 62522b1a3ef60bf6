use super::Var;
use crate::error;
use crate::lang::{Error, Function, Relop, Scanner};
use rand::rngs::StdRng;
use rand::Rng;
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// Evaluate one expression at the scanner's cursor, leaving the cursor just
/// past it. `PEEK` reads the bytes the scanner runs over.
pub fn expression(scan: &mut Scanner<'_>, vars: &Var, rng: &mut StdRng) -> Result<i16> {
    Evaluator { scan, vars, rng }.relational()
}

struct Evaluator<'s, 'a> {
    scan: &'s mut Scanner<'a>,
    vars: &'s Var,
    rng: &'s mut StdRng,
}

impl<'s, 'a> Evaluator<'s, 'a> {
    fn relational(&mut self) -> Result<i16> {
        let lhs = self.additive()?;
        self.scan.skip_blanks();
        let op = match self.scan.scan_table::<Relop>() {
            Some(op) => op,
            None => return Ok(lhs),
        };
        let rhs = self.additive()?;
        self.scan.skip_blanks();
        if self.scan.scan_table::<Relop>().is_some() {
            return Err(error!(SyntaxError; "ONE COMPARISON PER EXPRESSION"));
        }
        Ok(op.compare(lhs, rhs) as i16)
    }

    fn additive(&mut self) -> Result<i16> {
        self.scan.skip_blanks();
        let mut acc = match self.scan.peek() {
            b'-' | b'+' => 0,
            _ => self.multiplicative()?,
        };
        loop {
            self.scan.skip_blanks();
            match self.scan.peek() {
                b'+' => {
                    self.scan.bump();
                    acc = acc.wrapping_add(self.multiplicative()?);
                }
                b'-' => {
                    self.scan.bump();
                    acc = acc.wrapping_sub(self.multiplicative()?);
                }
                _ => return Ok(acc),
            }
        }
    }

    fn multiplicative(&mut self) -> Result<i16> {
        let mut acc = self.primary()?;
        loop {
            self.scan.skip_blanks();
            match self.scan.peek() {
                b'*' => {
                    self.scan.bump();
                    acc = acc.wrapping_mul(self.primary()?);
                }
                b'/' => {
                    self.scan.bump();
                    let rhs = self.primary()?;
                    if rhs == 0 {
                        return Err(error!(DivisionByZero));
                    }
                    acc = acc.wrapping_div(rhs);
                }
                _ => return Ok(acc),
            }
        }
    }

    fn primary(&mut self) -> Result<i16> {
        self.scan.skip_blanks();
        let c = self.scan.peek();
        if c == b'-' {
            self.scan.bump();
            return Ok(self.primary()?.wrapping_neg());
        }
        if c.is_ascii_digit() {
            return Ok(self.scan.scan_numeral().value as i16);
        }
        if c == b'(' {
            self.scan.bump();
            let value = self.relational()?;
            self.close_paren()?;
            return Ok(value);
        }
        if let Some(var) = self.scan.variable() {
            return Ok(self.vars.fetch(var));
        }
        if let Some(function) = self.scan.scan_table::<Function>() {
            return self.function(function);
        }
        Err(error!(SyntaxError; "EXPECTED EXPRESSION"))
    }

    fn close_paren(&mut self) -> Result<()> {
        if self.scan.accept(b')') {
            Ok(())
        } else {
            Err(error!(SyntaxError; "EXPECTED RIGHT PARENTHESIS"))
        }
    }

    fn function(&mut self, function: Function) -> Result<i16> {
        if !self.scan.accept(b'(') {
            return Err(error!(SyntaxError; "EXPECTED LEFT PARENTHESIS"));
        }
        let arg = self.relational()?;
        self.close_paren()?;
        match function {
            Function::Peek => {
                match usize::try_from(arg).ok().and_then(|a| self.scan.bytes().get(a)) {
                    Some(&b) => Ok(i16::from(b)),
                    None => Err(error!(IllegalFunctionCall; "ADDRESS OUT OF RANGE")),
                }
            }
            Function::Abs => Ok(arg.wrapping_abs()),
            Function::Rnd => {
                if arg > 0 {
                    Ok(self.rng.gen_range(0..arg))
                } else {
                    Ok(0)
                }
            }
        }
    }
}
