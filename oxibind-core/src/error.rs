use std::fmt::{self, Display};

/// Error as reported by the native call interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    /// Backend specific error code (for example an `ORA-` number or an sqlite result code).
    pub code: i32,
    pub message: String,
    /// Offset in the statement text the error refers to, when the backend reports one.
    pub offset: Option<usize>,
}

impl NativeError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            offset: None,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " (at offset {})", offset)?;
        }
        Ok(())
    }
}

/// Failure conditions raised by the statement layer.
///
/// They travel inside [`crate::Error`] and can be recovered with
/// `error.downcast_ref::<StatementError>()`, context layers included.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatementError {
    /// A native bind, execute or fetch call failed.
    #[error("Native call failed: {0}")]
    ExecutionFailure(NativeError),
    /// A fetch mode was requested with a missing or wrongly typed argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The fetch mode is not one of the recognized modes.
    #[error("Unsupported fetch mode `{0}`")]
    UnsupportedMode(String),
    /// A value reported by the environment does not have the expected shape.
    #[error("Malformed {what}: `{value}`")]
    MalformedEnvironmentValue { what: &'static str, value: String },
}

impl StatementError {
    pub fn native(&self) -> Option<&NativeError> {
        match self {
            StatementError::ExecutionFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NativeError> for StatementError {
    fn from(value: NativeError) -> Self {
        StatementError::ExecutionFailure(value)
    }
}
