use async_trait::async_trait;
use bson::{doc, Document as BsonDocument};
use serde::Deserialize;
use std::time::Duration;
use tessera_common::{Result, TesseraError};
use tracing::debug;

use super::{command_result, max_time_ms, Executable};
use crate::manager::{Command, Server};
use crate::model::{CollectionInfo, CollectionInfoIterator};
use crate::validation::ValidatedDatabaseName;

/// Options for the `listCollections` command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListCollectionsOptions {
    /// Query predicate over the collection metadata
    pub filter: Option<BsonDocument>,
    pub max_time: Option<Duration>,
}

/// Lists the collections of a database.
///
/// The server answers with a cursor; remaining batches are fetched with
/// `getMore` on the same server until the cursor is exhausted.
#[derive(Debug, Clone)]
pub struct ListCollections {
    database_name: ValidatedDatabaseName,
    options: ListCollectionsOptions,
}

#[derive(Debug, Deserialize)]
struct CursorReply {
    cursor: CursorBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorBody {
    id: i64,
    ns: String,
    #[serde(default)]
    first_batch: Vec<BsonDocument>,
    #[serde(default)]
    next_batch: Vec<BsonDocument>,
}

impl CursorReply {
    fn decode(reply: BsonDocument) -> Result<CursorBody> {
        let reply: CursorReply = bson::from_document(reply).map_err(|e| {
            TesseraError::UnexpectedValue(format!(
                "listCollections command did not return a valid cursor: {}",
                e
            ))
        })?;
        Ok(reply.cursor)
    }
}

impl ListCollections {
    pub fn new(database_name: &str, options: ListCollectionsOptions) -> Result<Self> {
        Ok(Self {
            database_name: ValidatedDatabaseName::new(database_name)?,
            options,
        })
    }

    pub fn command(&self) -> Result<Command> {
        let mut command = doc! { "listCollections": 1 };
        if let Some(filter) = &self.options.filter {
            command.insert("filter", filter.clone());
        }
        if let Some(max_time) = self.options.max_time {
            command.insert("maxTimeMS", max_time_ms(max_time)?);
        }
        Ok(Command::new(command))
    }

    async fn get_more(&self, server: &dyn Server, cursor_id: i64, ns: &str) -> Result<CursorBody> {
        // ns is "<db>.<collection>"; getMore wants the collection part
        let collection = ns.split_once('.').map(|(_, coll)| coll).unwrap_or(ns);
        let command = Command::new(doc! { "getMore": cursor_id, "collection": collection });

        let reply = server
            .execute_command(self.database_name.as_str(), &command)
            .await?;
        CursorReply::decode(command_result(reply.into_first())?)
    }
}

#[async_trait]
impl Executable for ListCollections {
    type Output = CollectionInfoIterator;

    async fn execute(&self, server: &dyn Server) -> Result<CollectionInfoIterator> {
        let reply = server
            .execute_command(self.database_name.as_str(), &self.command()?)
            .await?;
        let mut cursor = CursorReply::decode(command_result(reply.into_first())?)?;

        let mut documents = std::mem::take(&mut cursor.first_batch);
        while cursor.id != 0 {
            debug!(cursor_id = cursor.id, ns = %cursor.ns, "Fetching next listCollections batch");
            let next = self.get_more(server, cursor.id, &cursor.ns).await?;
            documents.extend(next.next_batch);
            cursor.id = next.id;
        }

        let collections = documents
            .into_iter()
            .map(CollectionInfo::from_document)
            .collect::<Result<Vec<_>>>()?;

        Ok(CollectionInfoIterator::new(collections))
    }
}
