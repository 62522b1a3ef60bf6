#[derive(Clone)]
pub struct Error {
    code: u16,
    line_number: Option<u16>,
    column: Option<usize>,
    message: &'static str,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code: code as u16,
            line_number: None,
            column: None,
            message: "",
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code as u16
    }

    pub fn is_direct(&self) -> bool {
        self.line_number.is_none()
    }

    pub fn line_number(&self) -> Option<u16> {
        self.line_number
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn in_line_number(self, line: Option<u16>) -> Error {
        debug_assert!(self.line_number.is_none());
        Error {
            line_number: line,
            ..self
        }
    }

    pub fn in_column(self, column: usize) -> Error {
        debug_assert!(self.column.is_none());
        Error {
            column: Some(column),
            ..self
        }
    }

    pub fn message(self, message: &'static str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error { message, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Break = 0,
    NoMatchingFor = 1,
    SyntaxError = 2,
    ReturnWithoutGosub = 3,
    IllegalFunctionCall = 5,
    OutOfMemory = 7,
    LineNotFound = 8,
    DivisionByZero = 11,
    LineBufferOverflow = 23,
    InternalError = 51,
    DeviceUnavailable = 56,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            0 => "BREAK",
            1 => "NEXT WITHOUT FOR",
            2 => "SYNTAX ERROR",
            3 => "RETURN WITHOUT GOSUB",
            5 => "ILLEGAL FUNCTION CALL",
            7 => "OUT OF MEMORY",
            8 => "UNDEFINED LINE",
            11 => "DIVISION BY ZERO",
            23 => "LINE BUFFER OVERFLOW",
            51 => "INTERNAL ERROR",
            56 => "DEVICE UNAVAILABLE",
            _ => "",
        };
        let mut suffix = String::new();
        if let Some(line_number) = self.line_number {
            suffix.push_str(&format!(" {}", line_number));
        }
        let mut tail = String::new();
        if !self.message.is_empty() {
            tail.push_str(&format!("; {}", self.message));
        }
        if code_str.is_empty() {
            if suffix.is_empty() {
                write!(f, "PROGRAM ERROR {}{}", self.code, tail)
            } else {
                write!(f, "PROGRAM ERROR {} IN{}{}", self.code, suffix, tail)
            }
        } else if suffix.is_empty() {
            write!(f, "{}{}", code_str, tail)
        } else {
            write!(f, "{} IN{}{}", code_str, suffix, tail)
        }
    }
}
