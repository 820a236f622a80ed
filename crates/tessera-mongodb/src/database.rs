//! Database handle
//!
//! A [`Database`] validates its name, freezes its read concern, read
//! preference and write concern at construction, and is the gateway to
//! collection and bucket handles that inherit those defaults.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tessera_mongodb::{ConnectionConfig, Database, DriverManager, HandleOptions};
//!
//! let manager = Arc::new(DriverManager::connect(&ConnectionConfig::from_env()?).await?);
//! let db = Database::new(manager, "reports", HandleOptions::default())?;
//! let events = db.select_collection("events", HandleOptions::default())?;
//! assert_eq!(events.namespace(), "reports.events");
//! ```

use bson::Document as BsonDocument;
use mongodb::options::{ReadConcern, ReadPreference, WriteConcern};
use std::fmt;
use std::sync::Arc;
use tessera_common::Result;
use tracing::{debug, instrument};

use crate::collection::Collection;
use crate::gridfs::{Bucket, BucketOptions};
use crate::manager::{Command, Manager, ReplyCursor, Server};
use crate::model::CollectionInfoIterator;
use crate::operation::{
    CreateCollection, CreateCollectionOptions, DropCollection, DropDatabase, Executable,
    ListCollections, ListCollectionsOptions,
};
use crate::options::{resolve, EffectiveOptions, HandleOptions};
use crate::validation::ValidatedDatabaseName;

#[derive(Clone)]
pub struct Database {
    manager: Arc<dyn Manager>,
    database_name: ValidatedDatabaseName,
    options: EffectiveOptions,
}

impl Database {
    /// Create a database handle; unset options default to the manager's.
    ///
    /// # Errors
    /// `InvalidArgument` if `database_name` is empty.
    pub fn new(manager: Arc<dyn Manager>, database_name: &str, options: HandleOptions) -> Result<Self> {
        let parent = EffectiveOptions::from_manager(manager.as_ref());
        Self::with_parent(manager, database_name, options, &parent)
    }

    fn with_parent(
        manager: Arc<dyn Manager>,
        database_name: &str,
        options: HandleOptions,
        parent: &EffectiveOptions,
    ) -> Result<Self> {
        Ok(Self {
            database_name: ValidatedDatabaseName::new(database_name)?,
            options: resolve(options, parent),
            manager,
        })
    }

    pub fn database_name(&self) -> &str {
        self.database_name.as_str()
    }

    pub fn manager(&self) -> &Arc<dyn Manager> {
        &self.manager
    }

    pub fn options(&self) -> &EffectiveOptions {
        &self.options
    }

    pub fn read_concern(&self) -> Option<&ReadConcern> {
        self.options.read_concern.as_ref()
    }

    pub fn read_preference(&self) -> &ReadPreference {
        &self.options.read_preference
    }

    pub fn write_concern(&self) -> Option<&WriteConcern> {
        self.options.write_concern.as_ref()
    }

    /// Execute an arbitrary command on this database.
    ///
    /// The server is selected with `read_preference`, or this handle's read
    /// preference when `None`. The raw reply is returned unchecked.
    #[instrument(skip(self, command, read_preference), fields(database = %self.database_name))]
    pub async fn command(
        &self,
        command: impl Into<Command>,
        read_preference: Option<ReadPreference>,
    ) -> Result<ReplyCursor> {
        let command = command.into();
        let read_preference = read_preference.unwrap_or_else(|| self.options.read_preference.clone());
        debug!(command = command.name().unwrap_or_default(), "Running database command");

        let server = self.manager.select_server(&read_preference).await?;
        server
            .execute_command(self.database_name.as_str(), &command)
            .await
    }

    /// Create a new collection explicitly.
    #[instrument(skip(self, options), fields(database = %self.database_name))]
    pub async fn create_collection(
        &self,
        collection_name: &str,
        mut options: CreateCollectionOptions,
    ) -> Result<BsonDocument> {
        if options.write_concern.is_none() {
            options.write_concern = self.options.write_concern.clone();
        }
        let operation = CreateCollection::new(self.database_name.as_str(), collection_name, options)?;
        let server = self.primary().await?;

        operation.execute(server.as_ref()).await
    }

    /// Drop this database.
    #[instrument(skip(self), fields(database = %self.database_name))]
    pub async fn drop(&self) -> Result<BsonDocument> {
        let operation = DropDatabase::new(
            self.database_name.as_str(),
            self.options.write_concern.clone(),
        )?;
        let server = self.primary().await?;

        operation.execute(server.as_ref()).await
    }

    /// Drop a collection within this database.
    #[instrument(skip(self), fields(database = %self.database_name))]
    pub async fn drop_collection(&self, collection_name: &str) -> Result<BsonDocument> {
        let operation = DropCollection::new(
            self.database_name.as_str(),
            collection_name,
            self.options.write_concern.clone(),
        )?;
        let server = self.primary().await?;

        operation.execute(server.as_ref()).await
    }

    /// Information for every collection in this database.
    #[instrument(skip(self, options), fields(database = %self.database_name))]
    pub async fn list_collections(
        &self,
        options: ListCollectionsOptions,
    ) -> Result<CollectionInfoIterator> {
        let operation = ListCollections::new(self.database_name.as_str(), options)?;
        let server = self.primary().await?;

        operation.execute(server.as_ref()).await
    }

    /// Select a collection within this database; unset options default to
    /// this database's.
    pub fn select_collection(&self, collection_name: &str, options: HandleOptions) -> Result<Collection> {
        Collection::with_parent(
            Arc::clone(&self.manager),
            self.database_name.as_str(),
            collection_name,
            options,
            &self.options,
        )
    }

    /// Get a GridFS bucket within this database; unset read preference and
    /// write concern default to this database's.
    pub fn get_grid_fs(&self, options: BucketOptions) -> Result<Bucket> {
        Bucket::with_parent(
            Arc::clone(&self.manager),
            self.database_name.as_str(),
            options,
            &self.options,
        )
    }

    /// A copy of this handle; unset options default to this handle's.
    pub fn with_options(&self, options: HandleOptions) -> Result<Self> {
        Self::with_parent(
            Arc::clone(&self.manager),
            self.database_name.as_str(),
            options,
            &self.options,
        )
    }

    // Administrative commands must never be routed to a secondary.
    async fn primary(&self) -> Result<Arc<dyn Server>> {
        self.manager.select_server(&ReadPreference::Primary).await
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.database_name)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("database_name", &self.database_name.as_str())
            .field("manager", &self.manager)
            .field("read_concern", &self.options.read_concern)
            .field("read_preference", &self.options.read_preference)
            .field("write_concern", &self.options.write_concern)
            .finish()
    }
}
