pub struct Error {
    code: u16,
    offset: Option<usize>,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::mach::Error::new($crate::mach::ErrorCode::$err)
    };
    ($err:ident, $offset:expr) => {
        $crate::mach::Error::new($crate::mach::ErrorCode::$err).at_offset($offset)
    };
    ($err:ident; $msg:expr) => {
        $crate::mach::Error::new($crate::mach::ErrorCode::$err).message($msg)
    };
    ($err:ident, $offset:expr; $msg:expr) => {
        $crate::mach::Error::new($crate::mach::ErrorCode::$err)
            .at_offset($offset)
            .message($msg)
    };
}

/// Which part of the machine's contract an error breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The image was rejected; the machine stays unloaded.
    Load,
    /// The run is over and the machine must be disposed before reuse.
    Step,
    /// The operand stack over- or underflowed. Fatal to the run.
    Stack,
    /// Cooperative cancellation. Never retried.
    Interrupted,
    /// The host embedding failed outside the machine.
    Host,
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code: code as u16,
            offset: None,
            message: String::new(),
        }
    }

    pub fn at_offset(self, offset: usize) -> Error {
        debug_assert!(self.offset.is_none());
        Error {
            offset: Some(offset),
            ..self
        }
    }

    pub fn message(self, message: &str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error {
            message: message.to_string(),
            ..self
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code as u16
    }

    pub fn is_interrupted(&self) -> bool {
        self.is(ErrorCode::Interrupted)
    }

    pub fn fault(&self) -> Fault {
        match self.code {
            1 | 2 | 20 => Fault::Load,
            30 | 31 => Fault::Stack,
            40 => Fault::Interrupted,
            50 => Fault::Host,
            _ => Fault::Step,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadImage = 1,
    UnsupportedVersion = 2,
    NotLoaded = 10,
    ProgramEnded = 11,
    IllegalOpcode = 12,
    Unimplemented = 13,
    EndOfImage = 14,
    WindowOverlap = 20,
    StackOverflow = 30,
    StackUnderflow = 31,
    Interrupted = 40,
    HostIo = 50,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            1 => "BAD PROGRAM IMAGE",
            2 => "UNSUPPORTED VERSION",
            10 => "NO PROGRAM LOADED",
            11 => "PROGRAM ENDED",
            12 => "ILLEGAL OPCODE",
            13 => "UNIMPLEMENTED OPCODE",
            14 => "FETCH PAST END OF IMAGE",
            20 => "WINDOW OVERLAP",
            30 => "STACK OVERFLOW",
            31 => "STACK UNDERFLOW",
            40 => "INTERRUPTED",
            50 => "HOST I/O ERROR",
            _ => "",
        };
        let mut suffix = String::new();
        if let Some(offset) = self.offset {
            suffix.push_str(&format!(" AT 0x{:06X}", offset));
        }
        if !self.message.is_empty() {
            suffix.push_str(&format!("; {}", self.message));
        }
        if code_str.is_empty() {
            write!(f, "MACHINE ERROR {}{}", self.code, suffix)
        } else {
            write!(f, "{}{}", code_str, suffix)
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::new(ErrorCode::HostIo).message(&error.to_string())
    }
}
