//! Server-side JavaScript code values

use bson::{Bson, Document as BsonDocument, JavaScriptCodeWithScope};
use tessera_common::{Result, TesseraError};

use crate::validation::bson_type_name;

/// JavaScript code sent to the server, optionally with a scope document.
#[derive(Debug, Clone, PartialEq)]
pub struct JavaScript {
    code: String,
    scope: Option<BsonDocument>,
}

impl JavaScript {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            scope: None,
        }
    }

    pub fn with_scope(code: impl Into<String>, scope: BsonDocument) -> Self {
        Self {
            code: code.into(),
            scope: Some(scope),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn scope(&self) -> Option<&BsonDocument> {
        self.scope.as_ref()
    }

    /// Interpret a BSON value as JavaScript.
    ///
    /// `name` describes the value in the error, e.g. `"finalize" option`.
    pub fn from_bson(name: &str, value: &Bson) -> Result<Self> {
        match value {
            Bson::JavaScriptCode(code) => Ok(Self::new(code.clone())),
            Bson::JavaScriptCodeWithScope(code) => {
                Ok(Self::with_scope(code.code.clone(), code.scope.clone()))
            }
            other => Err(TesseraError::invalid_type(
                name,
                "javascript",
                bson_type_name(other),
            )),
        }
    }
}

impl From<JavaScript> for Bson {
    fn from(js: JavaScript) -> Self {
        match js.scope {
            None => Bson::JavaScriptCode(js.code),
            Some(scope) => Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                code: js.code,
                scope,
            }),
        }
    }
}
