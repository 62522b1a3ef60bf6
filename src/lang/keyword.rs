/// ## Keyword tables
///
/// Each table is a flat, ordered list of `(text, entry)` pairs. Scanning
/// tries entries in table order and takes the first one whose text is a
/// case-insensitive prefix of the input, so longer spellings that share a
/// prefix with shorter ones must come first.

pub trait Keyword: Copy + Sized + 'static {
    const TABLE: &'static [(&'static str, Self)];

    fn text(self) -> &'static str
    where
        Self: PartialEq,
    {
        Self::TABLE
            .iter()
            .find(|(_, k)| *k == self)
            .map(|(s, _)| *s)
            .unwrap_or("")
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Command {
    List,
    Load,
    New,
    Run,
    Save,
    Next,
    Let,
    If,
    Goto,
    Gosub,
    Return,
    Rem1,
    For,
    Input,
    Print1,
    Poke,
    Stop,
    Bye,
    Mem,
    Print2,
    Rem2,
    End,
    Rseed,
    Chain,
    Esave,
    Eload,
    Echain,
}

impl Keyword for Command {
    const TABLE: &'static [(&'static str, Command)] = &[
        ("LIST", Command::List),
        ("LOAD", Command::Load),
        ("NEW", Command::New),
        ("RUN", Command::Run),
        ("SAVE", Command::Save),
        ("NEXT", Command::Next),
        ("LET", Command::Let),
        ("IF", Command::If),
        ("GOTO", Command::Goto),
        ("GOSUB", Command::Gosub),
        ("RETURN", Command::Return),
        ("REM", Command::Rem1),
        ("FOR", Command::For),
        ("INPUT", Command::Input),
        ("PRINT", Command::Print1),
        ("POKE", Command::Poke),
        ("STOP", Command::Stop),
        ("BYE", Command::Bye),
        ("MEM", Command::Mem),
        ("?", Command::Print2),
        ("'", Command::Rem2),
        ("END", Command::End),
        ("RSEED", Command::Rseed),
        ("CHAIN", Command::Chain),
        ("ESAVE", Command::Esave),
        ("ELOAD", Command::Eload),
        ("ECHAIN", Command::Echain),
    ];
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Function {
    Peek,
    Abs,
    Rnd,
}

impl Keyword for Function {
    const TABLE: &'static [(&'static str, Function)] = &[
        ("PEEK", Function::Peek),
        ("ABS", Function::Abs),
        ("RND", Function::Rnd),
    ];
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Relop {
    GreaterEqual,
    NotEqual1,
    Greater,
    Equal,
    LessEqual,
    Less,
    NotEqual2,
}

impl Keyword for Relop {
    const TABLE: &'static [(&'static str, Relop)] = &[
        (">=", Relop::GreaterEqual),
        ("<>", Relop::NotEqual1),
        (">", Relop::Greater),
        ("=", Relop::Equal),
        ("<=", Relop::LessEqual),
        ("<", Relop::Less),
        ("!=", Relop::NotEqual2),
    ];
}

impl Relop {
    pub fn compare(self, lhs: i16, rhs: i16) -> bool {
        use Relop::*;
        match self {
            GreaterEqual => lhs >= rhs,
            NotEqual1 | NotEqual2 => lhs != rhs,
            Greater => lhs > rhs,
            Equal => lhs == rhs,
            LessEqual => lhs <= rhs,
            Less => lhs < rhs,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Word {
    To,
    Step,
    Then,
}

impl Keyword for Word {
    const TABLE: &'static [(&'static str, Word)] = &[
        ("TO", Word::To),
        ("STEP", Word::Step),
        ("THEN", Word::Then),
    ];
}

macro_rules! display_keyword {
    ($($kw:ty),*) => {
        $(
            impl std::fmt::Display for $kw {
                fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "{}", self.text())
                }
            }
        )*
    };
}

display_keyword!(Command, Function, Relop, Word);
