use async_trait::async_trait;
use bson::{doc, Document as BsonDocument};
use mongodb::options::WriteConcern;
use serde::Serialize;
use std::time::Duration;
use tessera_common::Result;

use super::{append_write_concern, command_result, max_time_ms, Executable};
use crate::manager::{Command, Server};
use crate::validation::{ValidatedCollectionName, ValidatedDatabaseName};

/// Options for the `create` command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capped: Option<bool>,
    /// Maximum size in bytes of a capped collection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Maximum number of documents in a capped collection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_engine: Option<BsonDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator: Option<BsonDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_option_defaults: Option<BsonDocument>,
    #[serde(skip)]
    pub max_time: Option<Duration>,
    #[serde(skip)]
    pub write_concern: Option<WriteConcern>,
}

/// Explicitly creates a collection.
#[derive(Debug, Clone)]
pub struct CreateCollection {
    database_name: ValidatedDatabaseName,
    collection_name: ValidatedCollectionName,
    options: CreateCollectionOptions,
}

impl CreateCollection {
    pub fn new(
        database_name: &str,
        collection_name: &str,
        options: CreateCollectionOptions,
    ) -> Result<Self> {
        Ok(Self {
            database_name: ValidatedDatabaseName::new(database_name)?,
            collection_name: ValidatedCollectionName::new(collection_name)?,
            options,
        })
    }

    pub fn command(&self) -> Result<Command> {
        let mut command = doc! { "create": self.collection_name.as_str() };
        for (key, value) in bson::to_document(&self.options)? {
            command.insert(key, value);
        }

        if let Some(max_time) = self.options.max_time {
            command.insert("maxTimeMS", max_time_ms(max_time)?);
        }
        append_write_concern(&mut command, self.options.write_concern.as_ref())?;

        Ok(Command::new(command))
    }
}

#[async_trait]
impl Executable for CreateCollection {
    type Output = BsonDocument;

    async fn execute(&self, server: &dyn Server) -> Result<BsonDocument> {
        let reply = server
            .execute_command(self.database_name.as_str(), &self.command()?)
            .await?;
        command_result(reply.into_first())
    }
}
