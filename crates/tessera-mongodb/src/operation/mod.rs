//! One-shot command operations
//!
//! Each operation owns the shape of exactly one server command. Handles build
//! the operation, select a server, and call [`Executable::execute`] once.

mod create_collection;
mod drop_collection;
mod drop_database;
mod group;
mod list_collections;

pub use create_collection::{CreateCollection, CreateCollectionOptions};
pub use drop_collection::DropCollection;
pub use drop_database::DropDatabase;
pub use group::{Group, GroupKey, GroupOptions};
pub use list_collections::{ListCollections, ListCollectionsOptions};

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use mongodb::options::WriteConcern;
use std::time::Duration;
use tessera_common::{Result, TesseraError};

use crate::manager::{is_truthy, Server};

/// Fallback message when a failed reply carries no `errmsg`
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// An operation that can be executed against an already-selected server.
#[async_trait]
pub trait Executable: Send + Sync {
    type Output: Send;

    async fn execute(&self, server: &dyn Server) -> Result<Self::Output>;
}

/// Returns the reply when `ok` is truthy, otherwise the server's message as
/// a [`TesseraError::Runtime`].
pub(crate) fn command_result(reply: BsonDocument) -> Result<BsonDocument> {
    if is_truthy(reply.get("ok")) {
        return Ok(reply);
    }
    Err(TesseraError::Runtime(error_message(&reply)))
}

pub(crate) fn error_message(reply: &BsonDocument) -> String {
    reply
        .get("errmsg")
        .and_then(render_errmsg)
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// A present, non-null `errmsg` of any type, as text
pub(crate) fn render_errmsg(errmsg: &Bson) -> Option<String> {
    match errmsg {
        Bson::Null | Bson::Undefined => None,
        Bson::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

/// `maxTimeMS` value for a duration; must fit the server's int64
pub(crate) fn max_time_ms(max_time: Duration) -> Result<i64> {
    i64::try_from(max_time.as_millis()).map_err(|_| {
        TesseraError::InvalidArgument(format!("maxTimeMS is out of range: {:?}", max_time))
    })
}

/// Appends `writeConcern` to a command when one is configured
pub(crate) fn append_write_concern(
    command: &mut BsonDocument,
    write_concern: Option<&WriteConcern>,
) -> Result<()> {
    if let Some(write_concern) = write_concern {
        let serialized = bson::to_document(write_concern)?;
        if !serialized.is_empty() {
            command.insert("writeConcern", serialized);
        }
    }
    Ok(())
}
