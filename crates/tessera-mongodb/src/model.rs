//! Typed views over command replies

use bson::{Bson, Document as BsonDocument};
use serde::Deserialize;
use tessera_common::Result;

/// Metadata for one collection, as returned by `listCollections`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    options: BsonDocument,
    #[serde(default)]
    info: Option<BsonDocument>,
    #[serde(default)]
    id_index: Option<BsonDocument>,
}

impl CollectionInfo {
    pub fn from_document(document: BsonDocument) -> Result<Self> {
        Ok(bson::from_document(document)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `collection`, `view` or `timeseries`; absent on old servers
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn options(&self) -> &BsonDocument {
        &self.options
    }

    pub fn info(&self) -> Option<&BsonDocument> {
        self.info.as_ref()
    }

    pub fn id_index(&self) -> Option<&BsonDocument> {
        self.id_index.as_ref()
    }

    pub fn is_capped(&self) -> bool {
        matches!(self.options.get("capped"), Some(Bson::Boolean(true)))
    }

    /// Maximum number of documents, if this is a capped collection with a limit
    pub fn capped_max(&self) -> Option<i64> {
        self.options.get("max").and_then(as_i64)
    }

    /// Maximum size in bytes, if this is a capped collection
    pub fn capped_size(&self) -> Option<i64> {
        self.options.get("size").and_then(as_i64)
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(i) => Some(*i as i64),
        Bson::Int64(i) => Some(*i),
        Bson::Double(d) => Some(*d as i64),
        _ => None,
    }
}

/// Iterator over collection metadata returned by `list_collections`.
#[derive(Debug)]
pub struct CollectionInfoIterator {
    inner: std::vec::IntoIter<CollectionInfo>,
}

impl CollectionInfoIterator {
    pub fn new(collections: Vec<CollectionInfo>) -> Self {
        Self {
            inner: collections.into_iter(),
        }
    }
}

impl Iterator for CollectionInfoIterator {
    type Item = CollectionInfo;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for CollectionInfoIterator {}
