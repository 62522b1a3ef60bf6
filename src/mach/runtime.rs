use super::{
    expression, print_line, print_num, print_unum, Arena, Config, Device, Io, Output, Position,
    Stream, Var, HEADER_LEN,
};
use crate::error;
use crate::lang::{fold_case, Command, Error, Scanner, Word, MAX_LINE_NUMBER, NL};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

type Result<T> = std::result::Result<T, Error>;

const INPUT_PROMPT: &str = "? ";

/// ## Events
///
/// `execute` reports what the host should do next. Output gathered while
/// running always comes out before an error.

#[derive(Debug)]
pub enum Event {
    /// Waiting for a line from `enter`.
    Stopped,
    /// Ran out of cycles and will continue on the next `execute`.
    Running,
    Print(String),
    /// Waiting for the reply to `INPUT`, with the prompt to show.
    Input(String),
    Error(Error),
    Bye,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Stopped,
    Running,
    Input { var: u8, resume: Position },
    Bye,
}

/// ## Virtual machine
///
/// Statements are interpreted straight from the text held in the arena.
/// The cursor in `pos` always sits at a statement boundary between calls.

pub struct Runtime {
    arena: Arena,
    vars: Var,
    io: Io,
    rng: StdRng,
    pos: Position,
    statement: usize,
    direct_start: usize,
    direct_end: usize,
    state: State,
    pending: Option<Error>,
    interrupted: bool,
    run_after_load: bool,
}

impl Default for Runtime {
    fn default() -> Runtime {
        Runtime::with_arena(Arena::default())
    }
}

impl Runtime {
    pub fn new(config: Config) -> Result<Runtime> {
        Ok(Runtime::with_arena(Arena::new(&config)?))
    }

    fn with_arena(arena: Arena) -> Runtime {
        Runtime {
            arena,
            vars: Var::new(),
            io: Io::default(),
            rng: StdRng::from_entropy(),
            pos: Position {
                line: None,
                cursor: 0,
            },
            statement: 0,
            direct_start: 0,
            direct_end: 0,
            state: State::Stopped,
            pending: None,
            interrupted: false,
            run_after_load: false,
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn vars(&self) -> &Var {
        &self.vars
    }

    pub fn attach(&mut self, stream: Stream, device: Box<dyn Device>) {
        self.io.attach(stream, device)
    }

    pub fn detach(&mut self, stream: Stream) -> Option<Box<dyn Device>> {
        self.io.detach(stream)
    }

    /// Request a break. Honored before the next statement or while waiting
    /// for `INPUT`.
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    /// Line `number` as `LIST` shows it, without the terminator.
    pub fn line_text(&self, number: u16) -> Option<String> {
        let line = self.arena.line(number)?;
        Some(format!(
            "{} {}",
            line.number,
            String::from_utf8_lossy(line.body)
        ))
    }

    /// Accept a line from the keyboard. Returns true when the line is
    /// worth keeping in history.
    pub fn enter(&mut self, line: &str) -> bool {
        match self.state {
            State::Stopped => self.enter_line(line.as_bytes()),
            State::Input { var, resume } => self.enter_reply(var, resume, line.as_bytes()),
            State::Running | State::Bye => return false,
        }
        !line.trim().is_empty()
    }

    fn enter_line(&mut self, text: &[u8]) {
        let mut line = strip_terminators(text);
        fold_case(&mut line);
        let mut scan = Scanner::new(&line, 0);
        scan.skip_blanks();
        let number = scan.scan_numeral();
        if number.digits == 0 {
            match self.arena.set_input(&line) {
                Ok(start) => {
                    self.direct_start = start;
                    self.direct_end = start + line.len() + 1;
                    self.pos = Position {
                        line: None,
                        cursor: start,
                    };
                    self.state = State::Running;
                }
                Err(error) => self.pending = Some(error),
            }
            return;
        }
        if number.overflow || number.value == 0 || number.value > MAX_LINE_NUMBER {
            self.pending = Some(error!(SyntaxError; "INVALID LINE NUMBER"));
            return;
        }
        scan.skip_blanks();
        let body = &line[scan.pos()..];
        self.arena.clear_input();
        if let Err(error) = self.arena.insert_or_replace(number.value, body) {
            self.pending = Some(error);
        }
    }

    fn enter_reply(&mut self, var: u8, resume: Position, text: &[u8]) {
        let mut reply = strip_terminators(text);
        fold_case(&mut reply);
        match self.read_reply(&reply) {
            Ok(value) => {
                self.vars.store(var, value);
                self.pos = resume;
                self.state = State::Running;
            }
            Err(error) => {
                debug!(%error, "input rejected");
                self.pending = Some(error);
            }
        }
    }

    fn read_reply(&mut self, reply: &[u8]) -> Result<i16> {
        let start = self.arena.set_reply(self.direct_end, reply)?;
        let mut scan = Scanner::new(self.arena.bytes(), start);
        let value = expression(&mut scan, &self.vars, &mut self.rng)?;
        scan.skip_blanks();
        if !scan.at_end_of_line() {
            return Err(error!(SyntaxError; "EXPECTED NUMBER"));
        }
        Ok(value)
    }

    pub fn execute(&mut self, cycles: usize) -> Event {
        if self.interrupted && self.state != State::Running {
            self.interrupted = false;
            if let State::Input { .. } = self.state {
                self.fail(error!(Break));
            }
        }
        let mut budget = cycles;
        loop {
            if self.is_loading() {
                self.replay();
            }
            while budget > 0 && self.state == State::Running {
                budget -= 1;
                if let Err(error) = self.step() {
                    self.fail(error);
                }
            }
            if budget == 0 || self.io.has_print() || !self.is_loading() {
                break;
            }
        }
        if self.is_loading() && !self.io.has_print() {
            return Event::Running;
        }
        if self.io.has_print() {
            return Event::Print(self.io.take_print());
        }
        if let Some(error) = self.pending.take() {
            return Event::Error(error);
        }
        match self.state {
            State::Stopped => Event::Stopped,
            State::Running => Event::Running,
            State::Input { .. } => Event::Input(INPUT_PROMPT.to_string()),
            State::Bye => Event::Bye,
        }
    }

    fn is_loading(&self) -> bool {
        self.state == State::Stopped
            && self.pending.is_none()
            && self.io.input() != Stream::Interactive
    }

    /// Feed lines from the selected input device as if they were typed,
    /// pausing whenever one of them needs to run or fails.
    fn replay(&mut self) {
        let mut line = Vec::new();
        loop {
            match self.io.inchar() {
                Some(b'\r') | Some(NL) => {
                    if !line.is_empty() {
                        self.enter_line(&line);
                        line.clear();
                        if self.state != State::Stopped || self.pending.is_some() {
                            return;
                        }
                    }
                }
                Some(0) | None => break,
                Some(ch) => line.push(ch),
            }
        }
        if !line.is_empty() {
            self.enter_line(&line);
        }
        self.io.restore_input();
        debug!(lines = self.arena.lines().count(), "program loaded");
        if self.run_after_load {
            self.run_after_load = false;
            if self.state == State::Stopped {
                self.run();
            }
        }
    }

    fn step(&mut self) -> Result<()> {
        let mut scan = Scanner::new(self.arena.bytes(), self.pos.cursor);
        while scan.accept(b':') {}
        scan.skip_blanks();
        if scan.at_end_of_line() {
            self.next_line();
            return Ok(());
        }
        let start = scan.pos();
        self.statement = start;
        if self.interrupted {
            self.interrupted = false;
            return Err(error!(Break));
        }
        match scan.scan_table::<Command>() {
            Some(command) => {
                let cursor = scan.pos();
                trace!(?command, cursor, "statement");
                self.dispatch(command, cursor)
            }
            None => self.assignment(start),
        }
    }

    fn next_line(&mut self) {
        let next = match self.pos.line {
            Some(at) => match self.arena.line_at(at) {
                Some(line) => self.arena.line_at(line.next()).map(|next| next.at),
                None => None,
            },
            None => None,
        };
        match next {
            Some(at) => {
                self.pos = Position {
                    line: Some(at),
                    cursor: at + HEADER_LEN,
                }
            }
            None => self.stop(),
        }
    }

    fn stop(&mut self) {
        self.state = State::Stopped;
        self.arena.clear_stack();
        self.arena.clear_input();
        self.io.restore_output();
    }

    fn fail(&mut self, error: Error) {
        let error = self.locate(error);
        debug!(%error, "stopped");
        self.pending = Some(error);
        self.stop();
    }

    /// Tag an error with the line and the column of the statement running.
    fn locate(&self, error: Error) -> Error {
        let (number, body_start) = match self.pos.line.and_then(|at| self.arena.line_at(at)) {
            Some(line) => (Some(line.number), line.body_start()),
            None => (None, self.direct_start),
        };
        let error = match error.line_number() {
            Some(_) => error,
            None => error.in_line_number(number),
        };
        match error.column() {
            Some(_) => error,
            None => error.in_column(self.statement.saturating_sub(body_start)),
        }
    }

    fn run(&mut self) {
        self.arena.clear_stack();
        self.arena.clear_input();
        self.direct_end = self.arena.program_end();
        match self.arena.lines().next().map(|line| line.at) {
            Some(at) => {
                debug!("run");
                self.pos = Position {
                    line: Some(at),
                    cursor: at + HEADER_LEN,
                };
                self.state = State::Running;
            }
            None => self.stop(),
        }
    }

    fn dispatch(&mut self, command: Command, cursor: usize) -> Result<()> {
        match command {
            Command::Let => self.assignment(cursor),
            Command::Print1 | Command::Print2 => self.print(cursor),
            Command::If => self.if_then(cursor),
            Command::Goto => self.goto(cursor, false),
            Command::Gosub => self.goto(cursor, true),
            Command::Return => self.return_from(cursor),
            Command::For => self.for_loop(cursor),
            Command::Next => self.next(cursor),
            Command::Input => self.input(cursor),
            Command::Poke => self.poke(cursor),
            Command::Rem1 | Command::Rem2 => self.remark(cursor),
            Command::List => self.list(cursor),
            Command::Mem => self.mem(cursor),
            Command::Rseed => self.rseed(cursor),
            Command::New => {
                self.end_statement(cursor)?;
                self.arena.reset();
                self.vars.clear();
                self.stop();
                Ok(())
            }
            Command::Run => {
                self.end_statement(cursor)?;
                self.run();
                Ok(())
            }
            Command::Stop | Command::End => {
                self.end_statement(cursor)?;
                self.stop();
                Ok(())
            }
            Command::Bye => {
                self.end_statement(cursor)?;
                self.state = State::Bye;
                Ok(())
            }
            Command::Save => self.save(cursor, Stream::File),
            Command::Esave => self.save(cursor, Stream::Store),
            Command::Load => self.load(cursor, Stream::File, false),
            Command::Chain => self.load(cursor, Stream::File, true),
            Command::Eload => self.load(cursor, Stream::Store, false),
            Command::Echain => self.load(cursor, Stream::Store, true),
        }
    }

    /// Require a `:` or the end of the line, then move past the statement.
    fn end_statement(&mut self, cursor: usize) -> Result<()> {
        let mut scan = Scanner::new(self.arena.bytes(), cursor);
        scan.skip_blanks();
        if !scan.at_end_of_statement() {
            return Err(error!(SyntaxError; "UNEXPECTED TEXT"));
        }
        self.pos.cursor = scan.pos();
        Ok(())
    }

    fn eval(&mut self, cursor: usize) -> Result<(i16, usize)> {
        let mut scan = Scanner::new(self.arena.bytes(), cursor);
        let value = expression(&mut scan, &self.vars, &mut self.rng)?;
        Ok((value, scan.pos()))
    }

    fn variable(&self, cursor: usize) -> Result<(u8, usize)> {
        let mut scan = Scanner::new(self.arena.bytes(), cursor);
        match scan.variable() {
            Some(var) => Ok((var, scan.pos())),
            None => Err(error!(SyntaxError; "EXPECTED VARIABLE")),
        }
    }

    fn expect(&self, cursor: usize, ch: u8, message: &'static str) -> Result<usize> {
        let mut scan = Scanner::new(self.arena.bytes(), cursor);
        if scan.accept(ch) {
            Ok(scan.pos())
        } else {
            Err(error!(SyntaxError; message))
        }
    }

    fn assignment(&mut self, cursor: usize) -> Result<()> {
        let (var, cursor) = self.variable(cursor)?;
        let cursor = self.expect(cursor, b'=', "EXPECTED EQUALS SIGN")?;
        let (value, cursor) = self.eval(cursor)?;
        self.end_statement(cursor)?;
        self.vars.store(var, value);
        Ok(())
    }

    fn print(&mut self, mut cursor: usize) -> Result<()> {
        loop {
            let mut scan = Scanner::new(self.arena.bytes(), cursor);
            scan.skip_blanks();
            if scan.at_end_of_statement() {
                let at = scan.pos();
                self.io.line_terminator();
                return self.end_statement(at);
            }
            if let Some(text) = scan.quoted() {
                cursor = scan.pos();
                let bytes = self.arena.bytes();
                for &ch in &bytes[text] {
                    self.io.outchar(ch);
                }
            } else {
                let at = scan.pos();
                let (value, next) = self.eval(at)?;
                cursor = next;
                print_num(&mut self.arena, &mut self.io, value)?;
            }
            let mut scan = Scanner::new(self.arena.bytes(), cursor);
            if scan.accept(b',') {
                scan.skip_blanks();
                if scan.at_end_of_statement() {
                    return Err(error!(SyntaxError; "EXPECTED EXPRESSION"));
                }
                cursor = scan.pos();
                continue;
            }
            let semicolon = scan.accept(b';');
            scan.skip_blanks();
            if !scan.at_end_of_statement() {
                return Err(error!(SyntaxError; "EXPECTED SEPARATOR"));
            }
            let at = scan.pos();
            if !semicolon {
                self.io.line_terminator();
            }
            return self.end_statement(at);
        }
    }

    fn if_then(&mut self, cursor: usize) -> Result<()> {
        let (value, cursor) = self.eval(cursor)?;
        let mut scan = Scanner::new(self.arena.bytes(), cursor);
        scan.skip_blanks();
        match scan.scan_table::<Word>() {
            Some(Word::Then) | None => {}
            Some(_) => return Err(error!(SyntaxError; "EXPECTED THEN")),
        }
        scan.skip_blanks();
        if scan.at_end_of_line() {
            return Err(error!(SyntaxError; "EXPECTED STATEMENT"));
        }
        let at = scan.pos();
        if value == 0 {
            self.pos.cursor = at + scan.rest_of_line().len();
            Ok(())
        } else if scan.peek().is_ascii_digit() {
            self.goto(at, false)
        } else {
            self.pos.cursor = at;
            Ok(())
        }
    }

    fn target(&self, number: i16) -> Result<usize> {
        // Line numbers are unsigned, so 40000 arrives here as a negative value.
        let number = number as u16;
        match self.arena.line(number).filter(|_| number != 0) {
            Some(line) => Ok(line.at),
            None => Err(error!(LineNotFound)),
        }
    }

    fn goto(&mut self, cursor: usize, gosub: bool) -> Result<()> {
        let (number, cursor) = self.eval(cursor)?;
        let at = self.target(number)?;
        self.end_statement(cursor)?;
        if gosub {
            self.arena.push_gosub(self.pos)?;
        }
        self.pos = Position {
            line: Some(at),
            cursor: at + HEADER_LEN,
        };
        Ok(())
    }

    fn return_from(&mut self, cursor: usize) -> Result<()> {
        self.end_statement(cursor)?;
        self.pos = self.arena.pop_gosub()?;
        Ok(())
    }

    fn for_loop(&mut self, cursor: usize) -> Result<()> {
        let (var, cursor) = self.variable(cursor)?;
        let cursor = self.expect(cursor, b'=', "EXPECTED EQUALS SIGN")?;
        let (initial, cursor) = self.eval(cursor)?;
        let mut scan = Scanner::new(self.arena.bytes(), cursor);
        scan.skip_blanks();
        if scan.scan_table::<Word>() != Some(Word::To) {
            return Err(error!(SyntaxError; "EXPECTED TO"));
        }
        let at = scan.pos();
        let (terminal, cursor) = self.eval(at)?;
        let mut scan = Scanner::new(self.arena.bytes(), cursor);
        scan.skip_blanks();
        let (step, cursor) = match scan.scan_table::<Word>() {
            Some(Word::Step) => {
                let at = scan.pos();
                self.eval(at)?
            }
            Some(_) => return Err(error!(SyntaxError; "EXPECTED STEP")),
            None => (1, cursor),
        };
        self.end_statement(cursor)?;
        self.vars.store(var, initial);
        self.arena.push_for(var, terminal, step, self.pos)
    }

    fn next(&mut self, cursor: usize) -> Result<()> {
        let mut scan = Scanner::new(self.arena.bytes(), cursor);
        scan.skip_blanks();
        let (var, cursor) = if scan.at_end_of_statement() {
            (None, scan.pos())
        } else {
            let (var, cursor) = self.variable(cursor)?;
            (Some(var), cursor)
        };
        self.end_statement(cursor)?;
        let frame = self.arena.unwind_to_for(var)?;
        let value = self.vars.fetch(frame.var).wrapping_add(frame.step);
        self.vars.store(frame.var, value);
        trace!(var = %Var::name(frame.var), value, terminal = frame.terminal, "next");
        if (frame.step > 0 && value <= frame.terminal) || (frame.step < 0 && value >= frame.terminal)
        {
            self.pos = frame.resume;
        } else {
            self.arena.pop_frame()?;
        }
        Ok(())
    }

    fn input(&mut self, cursor: usize) -> Result<()> {
        let (var, cursor) = self.variable(cursor)?;
        self.end_statement(cursor)?;
        self.state = State::Input {
            var,
            resume: self.pos,
        };
        Ok(())
    }

    fn poke(&mut self, cursor: usize) -> Result<()> {
        let (addr, cursor) = self.eval(cursor)?;
        let cursor = self.expect(cursor, b',', "EXPECTED COMMA")?;
        let (value, cursor) = self.eval(cursor)?;
        self.end_statement(cursor)?;
        self.arena.poke(addr, value as u8)
    }

    fn remark(&mut self, cursor: usize) -> Result<()> {
        let scan = Scanner::new(self.arena.bytes(), cursor);
        self.pos.cursor = cursor + scan.rest_of_line().len();
        Ok(())
    }

    fn list(&mut self, cursor: usize) -> Result<()> {
        let mut scan = Scanner::new(self.arena.bytes(), cursor);
        scan.skip_blanks();
        let number = scan.scan_numeral();
        if number.overflow {
            return Err(error!(SyntaxError; "INVALID LINE NUMBER"));
        }
        let at = scan.pos();
        self.end_statement(at)?;
        self.list_from(number.value)?;
        self.stop();
        Ok(())
    }

    fn list_from(&mut self, number: u16) -> Result<()> {
        let mut at = self.arena.find_line(number);
        while let Some(next) = print_line(&mut self.arena, &mut self.io, at)? {
            at = next;
        }
        Ok(())
    }

    fn mem(&mut self, cursor: usize) -> Result<()> {
        self.end_statement(cursor)?;
        let free = self.arena.free();
        print_unum(&mut self.arena, &mut self.io, free)?;
        for &ch in b" BYTES FREE." {
            self.io.outchar(ch);
        }
        self.io.line_terminator();
        Ok(())
    }

    fn rseed(&mut self, cursor: usize) -> Result<()> {
        let (seed, cursor) = self.eval(cursor)?;
        self.end_statement(cursor)?;
        debug!(seed, "random generator seeded");
        self.rng = StdRng::seed_from_u64(u64::from(seed as u16));
        Ok(())
    }

    fn save(&mut self, cursor: usize, stream: Stream) -> Result<()> {
        self.end_statement(cursor)?;
        self.io.select_output(stream)?;
        let listed = self.list_from(0);
        if stream == Stream::Store {
            self.io.outchar(0);
        }
        self.io.restore_output();
        listed?;
        debug!(?stream, lines = self.arena.lines().count(), "program saved");
        self.stop();
        Ok(())
    }

    fn load(&mut self, cursor: usize, stream: Stream, chain: bool) -> Result<()> {
        self.end_statement(cursor)?;
        self.io.select_input(stream)?;
        debug!(?stream, chain, "loading program");
        self.arena.reset();
        self.vars.clear();
        self.io.inhibit = true;
        self.run_after_load = chain;
        self.stop();
        Ok(())
    }
}

fn strip_terminators(text: &[u8]) -> Vec<u8> {
    text.iter()
        .copied()
        .filter(|&ch| ch != b'\r' && ch != NL)
        .collect()
}
