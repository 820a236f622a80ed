//! Read concern / read preference / write concern bundles and their inheritance
//!
//! Every handle resolves its options exactly once, at construction, from the
//! options passed explicitly and the effective options of its parent
//! (manager → database → collection/bucket). The result is frozen.

use bson::{Bson, Document as BsonDocument};
use mongodb::options::{Acknowledgment, ReadConcern, ReadPreference, WriteConcern};
use std::time::Duration;
use tessera_common::{Result, TesseraError};

use crate::manager::Manager;
use crate::validation::bson_type_name;

/// Options passed explicitly to a handle; `None` means "inherit".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandleOptions {
    pub read_concern: Option<ReadConcern>,
    pub read_preference: Option<ReadPreference>,
    pub write_concern: Option<WriteConcern>,
}

impl HandleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_concern(mut self, read_concern: ReadConcern) -> Self {
        self.read_concern = Some(read_concern);
        self
    }

    pub fn read_preference(mut self, read_preference: ReadPreference) -> Self {
        self.read_preference = Some(read_preference);
        self
    }

    pub fn write_concern(mut self, write_concern: WriteConcern) -> Self {
        self.write_concern = Some(write_concern);
        self
    }

    /// Parse an option bundle from a loosely typed document.
    ///
    /// Recognized keys are `readConcern`, `readPreference` and `writeConcern`;
    /// `null` counts as absent and other keys are ignored.
    ///
    /// # Errors
    /// Returns `InvalidArgumentType` if a recognized key holds a value that
    /// cannot describe the policy, and `InvalidArgument` for an unknown
    /// read preference mode.
    pub fn from_document(options: &BsonDocument) -> Result<Self> {
        let mut parsed = Self::default();

        if let Some(value) = present(options, "readConcern") {
            parsed.read_concern = Some(parse_read_concern(value)?);
        }
        if let Some(value) = present(options, "readPreference") {
            parsed.read_preference = Some(parse_read_preference(value)?);
        }
        if let Some(value) = present(options, "writeConcern") {
            parsed.write_concern = Some(parse_write_concern(value)?);
        }

        Ok(parsed)
    }
}

/// Options in effect for a handle after inheritance has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveOptions {
    /// `None` leaves the choice to the server
    pub read_concern: Option<ReadConcern>,
    pub read_preference: ReadPreference,
    /// `None` leaves the choice to the server
    pub write_concern: Option<WriteConcern>,
}

impl Default for EffectiveOptions {
    fn default() -> Self {
        Self {
            read_concern: None,
            read_preference: ReadPreference::Primary,
            write_concern: None,
        }
    }
}

impl EffectiveOptions {
    /// Snapshot of the manager's defaults
    pub fn from_manager(manager: &dyn Manager) -> Self {
        Self {
            read_concern: manager.read_concern(),
            read_preference: manager.read_preference(),
            write_concern: manager.write_concern(),
        }
    }

    /// Converts back to explicit options, e.g. to pass down to a child handle
    pub fn to_handle_options(&self) -> HandleOptions {
        HandleOptions {
            read_concern: self.read_concern.clone(),
            read_preference: Some(self.read_preference.clone()),
            write_concern: self.write_concern.clone(),
        }
    }
}

/// Explicit values win; anything unset comes from the parent's effective options.
pub fn resolve(explicit: HandleOptions, parent: &EffectiveOptions) -> EffectiveOptions {
    EffectiveOptions {
        read_concern: explicit.read_concern.or_else(|| parent.read_concern.clone()),
        read_preference: explicit
            .read_preference
            .unwrap_or_else(|| parent.read_preference.clone()),
        write_concern: explicit.write_concern.or_else(|| parent.write_concern.clone()),
    }
}

fn present<'a>(options: &'a BsonDocument, key: &str) -> Option<&'a Bson> {
    match options.get(key) {
        None | Some(Bson::Null) => None,
        Some(value) => Some(value),
    }
}

fn parse_read_concern(value: &Bson) -> Result<ReadConcern> {
    let level = match value {
        Bson::String(level) => level.as_str(),
        Bson::Document(doc) => match doc.get("level") {
            Some(Bson::String(level)) => level.as_str(),
            _ => return Err(wrong_type("readConcern", "ReadConcern", value)),
        },
        other => return Err(wrong_type("readConcern", "ReadConcern", other)),
    };

    Ok(match level {
        "local" => ReadConcern::local(),
        "majority" => ReadConcern::majority(),
        "linearizable" => ReadConcern::linearizable(),
        "available" => ReadConcern::available(),
        "snapshot" => ReadConcern::snapshot(),
        custom => ReadConcern::custom(custom.to_string()),
    })
}

fn parse_read_preference(value: &Bson) -> Result<ReadPreference> {
    let mode = match value {
        Bson::String(mode) => mode.as_str(),
        Bson::Document(doc) => match doc.get("mode") {
            Some(Bson::String(mode)) => mode.as_str(),
            _ => return Err(wrong_type("readPreference", "ReadPreference", value)),
        },
        other => return Err(wrong_type("readPreference", "ReadPreference", other)),
    };

    match mode {
        "primary" => Ok(ReadPreference::Primary),
        "primaryPreferred" => Ok(ReadPreference::PrimaryPreferred { options: None }),
        "secondary" => Ok(ReadPreference::Secondary { options: None }),
        "secondaryPreferred" => Ok(ReadPreference::SecondaryPreferred { options: None }),
        "nearest" => Ok(ReadPreference::Nearest { options: None }),
        unknown => Err(TesseraError::InvalidArgument(format!(
            "Unknown read preference mode: '{}'",
            unknown
        ))),
    }
}

fn parse_write_concern(value: &Bson) -> Result<WriteConcern> {
    let mut write_concern = WriteConcern::default();

    match value {
        Bson::Int32(_) | Bson::Int64(_) | Bson::String(_) => {
            write_concern.w = Some(parse_acknowledgment(value)?);
        }
        Bson::Document(doc) => {
            if let Some(w) = present(doc, "w") {
                write_concern.w = Some(parse_acknowledgment(w)?);
            }
            if let Some(timeout) = present(doc, "wtimeout") {
                let millis = match timeout {
                    Bson::Int32(ms) if *ms >= 0 => *ms as u64,
                    Bson::Int64(ms) if *ms >= 0 => *ms as u64,
                    other => return Err(wrong_type("writeConcern.wtimeout", "int", other)),
                };
                write_concern.w_timeout = Some(Duration::from_millis(millis));
            }
            if let Some(journal) = present(doc, "j") {
                match journal {
                    Bson::Boolean(j) => write_concern.journal = Some(*j),
                    other => return Err(wrong_type("writeConcern.j", "bool", other)),
                }
            }
        }
        other => return Err(wrong_type("writeConcern", "WriteConcern", other)),
    }

    Ok(write_concern)
}

fn parse_acknowledgment(value: &Bson) -> Result<Acknowledgment> {
    match value {
        Bson::Int32(n) if *n >= 0 => Ok(Acknowledgment::Nodes(*n as u32)),
        Bson::Int64(n) if *n >= 0 && *n <= u32::MAX as i64 => Ok(Acknowledgment::Nodes(*n as u32)),
        Bson::String(s) if s == "majority" => Ok(Acknowledgment::Majority),
        Bson::String(tag) => Ok(Acknowledgment::Custom(tag.clone())),
        other => Err(wrong_type("writeConcern.w", "int or string", other)),
    }
}

fn wrong_type(option: &str, expected: &str, actual: &Bson) -> TesseraError {
    TesseraError::invalid_type(format!("\"{}\" option", option), expected, bson_type_name(actual))
}
