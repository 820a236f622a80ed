//! Seams to the underlying driver: server selection and command execution
//!
//! Handles in this crate never talk to the network directly. They ask a
//! [`Manager`] for a [`Server`] matching a read preference and hand it a
//! [`Command`]; the reply comes back as a [`ReplyCursor`] of raw documents.

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use mongodb::options::{ReadConcern, ReadPreference, WriteConcern};
use std::fmt;
use std::sync::Arc;
use tessera_common::Result;

/// Connection manager capability supplied by the driver.
///
/// Implementations are shared by every handle derived from them and must be
/// safe to use from multiple tasks.
#[async_trait]
pub trait Manager: Send + Sync + fmt::Debug {
    /// Select a server able to serve the given read preference
    async fn select_server(&self, read_preference: &ReadPreference) -> Result<Arc<dyn Server>>;

    /// Default read concern (`None` means the server default)
    fn read_concern(&self) -> Option<ReadConcern>;

    /// Default read preference
    fn read_preference(&self) -> ReadPreference;

    /// Default write concern (`None` means the server default)
    fn write_concern(&self) -> Option<WriteConcern>;
}

/// An already-selected server able to execute one command.
#[async_trait]
pub trait Server: Send + Sync + fmt::Debug {
    async fn execute_command(&self, database_name: &str, command: &Command) -> Result<ReplyCursor>;
}

/// A command document ready to be sent to a server.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    document: BsonDocument,
}

impl Command {
    pub fn new(document: BsonDocument) -> Self {
        Self { document }
    }

    /// The command name is the first key of the document
    pub fn name(&self) -> Option<&str> {
        self.document.keys().next().map(String::as_str)
    }

    pub fn document(&self) -> &BsonDocument {
        &self.document
    }

    pub fn into_document(self) -> BsonDocument {
        self.document
    }
}

impl From<BsonDocument> for Command {
    fn from(document: BsonDocument) -> Self {
        Self::new(document)
    }
}

/// Raw reply documents returned by a server, in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyCursor {
    documents: Vec<BsonDocument>,
}

impl ReplyCursor {
    pub fn new(documents: Vec<BsonDocument>) -> Self {
        Self { documents }
    }

    /// Wraps a single command reply document
    pub fn single(document: BsonDocument) -> Self {
        Self {
            documents: vec![document],
        }
    }

    pub fn first(&self) -> Option<&BsonDocument> {
        self.documents.first()
    }

    /// Consumes the cursor and returns its first document, or an empty
    /// document if the server sent nothing
    pub fn into_first(self) -> BsonDocument {
        self.documents.into_iter().next().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BsonDocument> {
        self.documents.iter()
    }

    pub fn into_documents(self) -> Vec<BsonDocument> {
        self.documents
    }
}

impl IntoIterator for ReplyCursor {
    type Item = BsonDocument;
    type IntoIter = std::vec::IntoIter<BsonDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReplyCursor {
    type Item = &'a BsonDocument;
    type IntoIter = std::slice::Iter<'a, BsonDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

/// Truthiness of a reply's `ok` field. Servers send `1.0`, `1` or `true`.
pub(crate) fn is_truthy(value: Option<&Bson>) -> bool {
    match value {
        None | Some(Bson::Null) | Some(Bson::Undefined) => false,
        Some(Bson::Boolean(b)) => *b,
        Some(Bson::Int32(i)) => *i != 0,
        Some(Bson::Int64(i)) => *i != 0,
        Some(Bson::Double(d)) => *d != 0.0,
        Some(Bson::String(s)) => !s.is_empty() && s != "0",
        Some(_) => true,
    }
}
