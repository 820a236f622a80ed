//! The legacy `group` command
//!
//! Buckets the documents of a collection by a key (or a key function),
//! folds every bucket with a reduce function starting from an initial
//! accumulator, and returns the accumulators in server order.

use async_trait::async_trait;
use bson::{doc, Bson, Document as BsonDocument};
use tessera_common::{Result, TesseraError};
use tracing::{debug, instrument};

use super::{render_errmsg, Executable, UNKNOWN_ERROR};
use crate::javascript::JavaScript;
use crate::manager::{is_truthy, Command, Server};
use crate::validation::{
    bson_type_name, ValidatedCollectionName, ValidatedDatabaseName, ValidatedFieldName,
};

/// Command slots owned by the operation itself; auxiliary options may not
/// overwrite them.
const RESERVED_SLOTS: &[&str] = &["key", "$keyf", "ns", "$reduce", "initial", "cond", "finalize"];

/// What the documents are grouped by.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// Field names (or an expression object) sent as `key`
    Fields(BsonDocument),
    /// A function computing the key from a document, sent as `$keyf`
    Function(JavaScript),
}

impl GroupKey {
    /// Group by the given field names, e.g. `["x", "y"]` becomes `{x: 1, y: 1}`.
    pub fn fields<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key = BsonDocument::new();
        for name in names {
            let field = ValidatedFieldName::new(name.as_ref())?;
            key.insert(field.into_string(), 1);
        }
        Ok(GroupKey::Fields(key))
    }

    /// Name of the command slot this key is sent in
    pub fn slot(&self) -> &'static str {
        match self {
            GroupKey::Fields(_) => "key",
            GroupKey::Function(_) => "$keyf",
        }
    }

    fn to_bson(&self) -> Bson {
        match self {
            GroupKey::Fields(key) => Bson::Document(key.clone()),
            GroupKey::Function(keyf) => keyf.clone().into(),
        }
    }
}

impl From<BsonDocument> for GroupKey {
    fn from(key: BsonDocument) -> Self {
        GroupKey::Fields(key)
    }
}

impl From<JavaScript> for GroupKey {
    fn from(keyf: JavaScript) -> Self {
        GroupKey::Function(keyf)
    }
}

impl TryFrom<Bson> for GroupKey {
    type Error = TesseraError;

    /// Accepts a document, an array of field names, or JavaScript code.
    fn try_from(value: Bson) -> Result<Self> {
        match value {
            Bson::Document(key) => Ok(GroupKey::Fields(key)),
            Bson::Array(names) => {
                let names = names
                    .into_iter()
                    .map(|name| match name {
                        Bson::String(name) => Ok(name),
                        other => Err(TesseraError::invalid_type(
                            "\"keys\" element",
                            "string",
                            bson_type_name(&other),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                GroupKey::fields(names)
            }
            Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => {
                Ok(GroupKey::Function(JavaScript::from_bson("\"keys\" option", &value)?))
            }
            other => Err(TesseraError::invalid_type(
                "\"keys\" option",
                "array, object or javascript",
                bson_type_name(&other),
            )),
        }
    }
}

/// Auxiliary `group` options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupOptions {
    /// Only documents matching this filter are grouped
    pub cond: Option<BsonDocument>,
    /// Runs over every accumulator before it is returned
    pub finalize: Option<JavaScript>,
    /// Any other command fields (e.g. `maxTimeMS`, `collation`), sent verbatim
    pub extra: BsonDocument,
}

impl GroupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cond(mut self, cond: BsonDocument) -> Self {
        self.cond = Some(cond);
        self
    }

    pub fn finalize(mut self, finalize: JavaScript) -> Self {
        self.finalize = Some(finalize);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Parse options from a loosely typed document.
    ///
    /// # Errors
    /// `InvalidArgumentType` if `finalize` is not JavaScript or `cond` is not
    /// a document.
    pub fn from_document(options: &BsonDocument) -> Result<Self> {
        let mut parsed = Self::default();

        for (key, value) in options {
            match (key.as_str(), value) {
                (_, Bson::Null) => {}
                ("cond", Bson::Document(cond)) => parsed.cond = Some(cond.clone()),
                ("cond", other) => {
                    return Err(TesseraError::invalid_type(
                        "\"cond\" option",
                        "object",
                        bson_type_name(other),
                    ))
                }
                ("finalize", value) => {
                    parsed.finalize = Some(JavaScript::from_bson("\"finalize\" option", value)?)
                }
                (key, value) => {
                    parsed.extra.insert(key, value.clone());
                }
            }
        }

        Ok(parsed)
    }
}

/// The decoded reply of a `group` command.
#[derive(Debug, Clone, PartialEq)]
struct GroupReply {
    ok: bool,
    errmsg: Option<String>,
    retval: Option<Bson>,
}

impl GroupReply {
    fn from_document(mut reply: BsonDocument) -> Self {
        Self {
            ok: is_truthy(reply.get("ok")),
            errmsg: reply.get("errmsg").and_then(render_errmsg),
            retval: reply.remove("retval"),
        }
    }

    fn into_documents(self) -> Result<Vec<BsonDocument>> {
        if !self.ok {
            return Err(TesseraError::Runtime(
                self.errmsg.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            ));
        }

        let retval = match self.retval {
            Some(Bson::Array(retval)) => retval,
            _ => {
                return Err(TesseraError::UnexpectedValue(
                    "group command did not return a \"retval\" array".to_string(),
                ))
            }
        };

        retval
            .into_iter()
            .map(|entry| match entry {
                Bson::Document(doc) => Ok(doc),
                other => Err(TesseraError::UnexpectedValue(format!(
                    "group command returned a \"retval\" element of type {}",
                    bson_type_name(&other)
                ))),
            })
            .collect()
    }
}

/// The `group` command for one collection.
#[derive(Debug, Clone)]
pub struct Group {
    database_name: ValidatedDatabaseName,
    collection_name: ValidatedCollectionName,
    keys: GroupKey,
    initial: BsonDocument,
    reduce: JavaScript,
    options: GroupOptions,
}

impl Group {
    /// # Errors
    /// `InvalidArgument` for empty names or when `options.extra` tries to
    /// overwrite a slot the command already fills.
    pub fn new(
        database_name: &str,
        collection_name: &str,
        keys: GroupKey,
        initial: BsonDocument,
        reduce: JavaScript,
        options: GroupOptions,
    ) -> Result<Self> {
        let database_name = ValidatedDatabaseName::new(database_name)?;
        let collection_name = ValidatedCollectionName::new(collection_name)?;

        if let Some(slot) = options
            .extra
            .keys()
            .find(|key| RESERVED_SLOTS.contains(&key.as_str()))
        {
            return Err(TesseraError::InvalidArgument(format!(
                "group option '{}' would overwrite a reserved command field",
                slot
            )));
        }

        Ok(Self {
            database_name,
            collection_name,
            keys,
            initial,
            reduce,
            options,
        })
    }

    pub fn database_name(&self) -> &str {
        self.database_name.as_str()
    }

    pub fn collection_name(&self) -> &str {
        self.collection_name.as_str()
    }

    pub fn command(&self) -> Command {
        let mut group = BsonDocument::new();
        group.insert(self.keys.slot(), self.keys.to_bson());
        group.insert("ns", self.collection_name.as_str());
        group.insert("$reduce", Bson::from(self.reduce.clone()));
        group.insert("initial", self.initial.clone());

        if let Some(cond) = &self.options.cond {
            group.insert("cond", cond.clone());
        }
        if let Some(finalize) = &self.options.finalize {
            group.insert("finalize", Bson::from(finalize.clone()));
        }
        for (key, value) in &self.options.extra {
            group.insert(key.clone(), value.clone());
        }

        Command::new(doc! { "group": group })
    }
}

#[async_trait]
impl Executable for Group {
    type Output = Vec<BsonDocument>;

    #[instrument(skip(self, server), fields(
        database = self.database_name.as_str(),
        collection = self.collection_name.as_str(),
        key = self.keys.slot()
    ))]
    async fn execute(&self, server: &dyn Server) -> Result<Vec<BsonDocument>> {
        let reply = server
            .execute_command(self.database_name.as_str(), &self.command())
            .await?;

        let documents = GroupReply::from_document(reply.into_first()).into_documents()?;
        debug!(groups = documents.len(), "group command returned");
        Ok(documents)
    }
}
