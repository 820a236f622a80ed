//! Identifier validation for handles and operations
//!
//! All checks run eagerly at construction so a handle holding an invalid
//! name can never exist.

use bson::Bson;
use tessera_common::{Result, TesseraError};

/// Validated database name
///
/// # Guarantees
/// - Not empty
/// - No null bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedDatabaseName {
    name: String,
}

impl ValidatedDatabaseName {
    /// # Errors
    /// Returns `InvalidArgument` if the name is empty or contains null bytes
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(TesseraError::InvalidArgument(
                "Database name cannot be empty".to_string(),
            ));
        }

        if name.contains('\0') {
            return Err(TesseraError::InvalidArgument(format!(
                "Database name cannot contain null bytes: {:?}",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl AsRef<str> for ValidatedDatabaseName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedDatabaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validated collection name
///
/// # Guarantees
/// - Not empty
/// - No null bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedCollectionName {
    name: String,
}

impl ValidatedCollectionName {
    /// # Errors
    /// Returns `InvalidArgument` if the name is empty or contains null bytes
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(TesseraError::InvalidArgument(
                "Collection name cannot be empty".to_string(),
            ));
        }

        if name.contains('\0') {
            return Err(TesseraError::InvalidArgument(format!(
                "Collection name cannot contain null bytes: {:?}",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl AsRef<str> for ValidatedCollectionName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedCollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validated field name used as a grouping key
///
/// # Guarantees
/// - Not empty
/// - No null bytes
/// - No `$` prefix (reserved for operators)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFieldName {
    name: String,
}

impl ValidatedFieldName {
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(TesseraError::InvalidArgument(
                "Field name cannot be empty".to_string(),
            ));
        }

        if name.contains('\0') {
            return Err(TesseraError::InvalidArgument(
                "Field name cannot contain null bytes".to_string(),
            ));
        }

        if name.starts_with('$') {
            return Err(TesseraError::InvalidArgument(format!(
                "Field name cannot start with '$' (reserved for operators): '{}'",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn into_string(self) -> String {
        self.name
    }
}

/// Get the BSON type name for error messages
pub(crate) fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "object",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binary",
        Bson::ObjectId(_) => "objectid",
        Bson::DateTime(_) => "datetime",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal128",
        Bson::JavaScriptCode(_) => "javascript",
        Bson::JavaScriptCodeWithScope(_) => "javascript",
        _ => "unknown",
    }
}
