//! Runtime errors
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    AccessViolation,
    ConfigError,
    DivideByZero,
    FileError,
    InvalidAbbreviation,
    InvalidFilename,
    InvalidInput,
    InvalidObject,
    InvalidObjectAttribute,
    InvalidObjectProperty,
    InvalidObjectPropertySize,
    InvalidObjectTree,
    InvalidOutputStream,
    InvalidRoutine,
    InvalidState,
    MalformedSaveState,
    MalformedStoryHeader,
    NoFrame,
    ReturnNoCaller,
    StackUnderflow,
    UnimplementedOpcode,
    UnsupportedVersion,
    VariableAccessViolation,
}

/// A runtime error
#[derive(Clone, PartialEq, Eq)]
pub struct RuntimeError {
    /// Error code
    code: ErrorCode,
    /// Error message
    message: String,
    /// Address of the instruction that was executing, if any
    address: Option<usize>,
    /// Disassembled text of the instruction that was executing, if any
    instruction: Option<String>,
}

impl RuntimeError {
    /// Constructor
    ///
    /// # Arguments
    /// * `code` - Error code
    /// * `message` - Error message
    pub fn new(code: ErrorCode, message: String) -> RuntimeError {
        RuntimeError {
            code,
            message,
            address: None,
            instruction: None,
        }
    }

    /// Attach the faulting instruction to an error.
    ///
    /// An error that already carries a location keeps it, so the innermost
    /// instruction is the one reported.
    ///
    /// # Arguments
    /// * `address` - Address of the faulting instruction
    /// * `instruction` - Disassembled instruction text
    ///
    /// # Returns
    /// The decorated error
    pub fn at(mut self, address: usize, instruction: &str) -> RuntimeError {
        if self.address.is_none() {
            self.address = Some(address);
            self.instruction = Some(instruction.to_string());
        }
        self
    }

    /// Get the error code
    ///
    /// # Returns
    /// Error code
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the error message
    ///
    /// # Returns
    /// Error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the address of the faulting instruction
    ///
    /// # Returns
    /// [Option] with the instruction address
    pub fn address(&self) -> Option<usize> {
        self.address
    }

    /// Get the disassembled faulting instruction
    ///
    /// # Returns
    /// [Option] with the instruction text
    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }
}

#[macro_export]
macro_rules! fatal_error {
    ($code:expr, $($arg:tt)*) => {
        Err(RuntimeError::new($code, format!($($arg)*)))
    };
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Fatal error - [{:?}]: {}", self.code, self.message)?;
        match (self.address, &self.instruction) {
            (Some(address), Some(instruction)) => {
                write!(f, " at ${:05x} ({})", address, instruction)
            }
            (Some(address), None) => write!(f, " at ${:05x}", address),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for RuntimeError {}
