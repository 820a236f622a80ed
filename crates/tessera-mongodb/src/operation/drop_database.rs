use async_trait::async_trait;
use bson::{doc, Document as BsonDocument};
use mongodb::options::WriteConcern;
use tessera_common::Result;

use super::{append_write_concern, command_result, Executable};
use crate::manager::{Command, Server};
use crate::validation::ValidatedDatabaseName;

/// Drops a whole database.
#[derive(Debug, Clone)]
pub struct DropDatabase {
    database_name: ValidatedDatabaseName,
    write_concern: Option<WriteConcern>,
}

impl DropDatabase {
    pub fn new(database_name: &str, write_concern: Option<WriteConcern>) -> Result<Self> {
        Ok(Self {
            database_name: ValidatedDatabaseName::new(database_name)?,
            write_concern,
        })
    }

    pub fn command(&self) -> Result<Command> {
        let mut command = doc! { "dropDatabase": 1 };
        append_write_concern(&mut command, self.write_concern.as_ref())?;
        Ok(Command::new(command))
    }
}

#[async_trait]
impl Executable for DropDatabase {
    type Output = BsonDocument;

    async fn execute(&self, server: &dyn Server) -> Result<BsonDocument> {
        let reply = server
            .execute_command(self.database_name.as_str(), &self.command()?)
            .await?;
        command_result(reply.into_first())
    }
}
