//! Error types for tessera

use thiserror::Error;

/// Result type alias for tessera operations
pub type Result<T> = std::result::Result<T, TesseraError>;

/// Unified error type for all tessera operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TesseraError {
    /// Malformed or empty identifier, or an otherwise unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Option or parameter value of the wrong shape
    #[error("Expected {name} to have type \"{expected}\" but found \"{actual}\"")]
    InvalidArgumentType {
        name: String,
        expected: String,
        actual: String,
    },

    /// The server reported a command failure (`ok` falsy)
    #[error("{0}")]
    Runtime(String),

    /// The server claimed success but the reply does not have the expected shape
    #[error("Unexpected value: {0}")]
    UnexpectedValue(String),

    #[error("MongoDB error: {0}")]
    MongoDB(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl TesseraError {
    /// Builds an [`TesseraError::InvalidArgumentType`].
    pub fn invalid_type(
        name: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        TesseraError::InvalidArgumentType {
            name: name.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Returns true if this error was raised while validating caller input,
    /// i.e. before anything was sent to a server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TesseraError::InvalidArgument(_) | TesseraError::InvalidArgumentType { .. }
        )
    }

    /// Returns true if this error describes a reply the server actually sent
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            TesseraError::Runtime(_) | TesseraError::UnexpectedValue(_)
        )
    }
}

// MongoDB-specific error conversions (when mongodb-errors feature is enabled)
#[cfg(feature = "mongodb-errors")]
impl From<mongodb::error::Error> for TesseraError {
    fn from(err: mongodb::error::Error) -> Self {
        TesseraError::MongoDB(err.to_string())
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::ser::Error> for TesseraError {
    fn from(err: bson::ser::Error) -> Self {
        TesseraError::Serialization(format!("BSON serialization error: {}", err))
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::de::Error> for TesseraError {
    fn from(err: bson::de::Error) -> Self {
        TesseraError::Deserialization(format!("BSON deserialization error: {}", err))
    }
}
