use async_trait::async_trait;
use bson::{doc, Document as BsonDocument};
use mongodb::options::WriteConcern;
use tessera_common::{Result, TesseraError};
use tracing::debug;

use super::{append_write_concern, error_message, Executable};
use crate::manager::{is_truthy, Command, Server};
use crate::validation::{ValidatedCollectionName, ValidatedDatabaseName};

/// Server message for dropping a collection that does not exist
pub const NAMESPACE_NOT_FOUND: &str = "ns not found";

/// Drops a single collection.
///
/// Dropping a collection that does not exist is not an error: the server's
/// `"ns not found"` reply is returned as the result.
#[derive(Debug, Clone)]
pub struct DropCollection {
    database_name: ValidatedDatabaseName,
    collection_name: ValidatedCollectionName,
    write_concern: Option<WriteConcern>,
}

impl DropCollection {
    pub fn new(
        database_name: &str,
        collection_name: &str,
        write_concern: Option<WriteConcern>,
    ) -> Result<Self> {
        Ok(Self {
            database_name: ValidatedDatabaseName::new(database_name)?,
            collection_name: ValidatedCollectionName::new(collection_name)?,
            write_concern,
        })
    }

    pub fn command(&self) -> Result<Command> {
        let mut command = doc! { "drop": self.collection_name.as_str() };
        append_write_concern(&mut command, self.write_concern.as_ref())?;
        Ok(Command::new(command))
    }
}

#[async_trait]
impl Executable for DropCollection {
    type Output = BsonDocument;

    async fn execute(&self, server: &dyn Server) -> Result<BsonDocument> {
        let reply = server
            .execute_command(self.database_name.as_str(), &self.command()?)
            .await?
            .into_first();

        if is_truthy(reply.get("ok")) {
            return Ok(reply);
        }

        let message = error_message(&reply);
        if message == NAMESPACE_NOT_FOUND {
            debug!(
                database = self.database_name.as_str(),
                collection = self.collection_name.as_str(),
                "Collection to drop does not exist"
            );
            return Ok(reply);
        }

        Err(TesseraError::Runtime(message))
    }
}
