//! Collection handle

use bson::Document as BsonDocument;
use mongodb::options::{ReadConcern, ReadPreference, WriteConcern};
use std::fmt;
use std::sync::Arc;
use tessera_common::{Result, TesseraError};
use tracing::instrument;

use crate::javascript::JavaScript;
use crate::manager::Manager;
use crate::operation::{DropCollection, Executable, Group, GroupKey, GroupOptions};
use crate::options::{resolve, EffectiveOptions, HandleOptions};
use crate::validation::{ValidatedCollectionName, ValidatedDatabaseName};

/// A collection within a database, carrying its own resolved options.
///
/// Cloning is cheap; the manager is shared.
#[derive(Clone)]
pub struct Collection {
    manager: Arc<dyn Manager>,
    database_name: ValidatedDatabaseName,
    collection_name: ValidatedCollectionName,
    options: EffectiveOptions,
}

impl Collection {
    /// Unset options default to the manager's.
    pub fn new(
        manager: Arc<dyn Manager>,
        database_name: &str,
        collection_name: &str,
        options: HandleOptions,
    ) -> Result<Self> {
        let parent = EffectiveOptions::from_manager(manager.as_ref());
        Self::with_parent(manager, database_name, collection_name, options, &parent)
    }

    /// Build from a `"<database>.<collection>"` namespace.
    pub fn from_namespace(
        manager: Arc<dyn Manager>,
        namespace: &str,
        options: HandleOptions,
    ) -> Result<Self> {
        match namespace.split_once('.') {
            Some((database_name, collection_name))
                if !database_name.is_empty() && !collection_name.is_empty() =>
            {
                Self::new(manager, database_name, collection_name, options)
            }
            _ => Err(TesseraError::InvalidArgument(format!(
                "$namespace is invalid: {}",
                namespace
            ))),
        }
    }

    /// Unset options default to `parent` (a database or bucket).
    pub(crate) fn with_parent(
        manager: Arc<dyn Manager>,
        database_name: &str,
        collection_name: &str,
        options: HandleOptions,
        parent: &EffectiveOptions,
    ) -> Result<Self> {
        Ok(Self {
            database_name: ValidatedDatabaseName::new(database_name)?,
            collection_name: ValidatedCollectionName::new(collection_name)?,
            options: resolve(options, parent),
            manager,
        })
    }

    pub fn database_name(&self) -> &str {
        self.database_name.as_str()
    }

    pub fn collection_name(&self) -> &str {
        self.collection_name.as_str()
    }

    /// `<database>.<collection>`
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database_name, self.collection_name)
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

    /// A copy of this handle; unset options default to this handle's.
    pub fn with_options(&self, options: HandleOptions) -> Result<Self> {
        Self::with_parent(
            Arc::clone(&self.manager),
            self.database_name.as_str(),
            self.collection_name.as_str(),
            options,
            &self.options,
        )
    }

    /// Run the legacy `group` command against this collection.
    ///
    /// The server is selected with this collection's read preference.
    #[instrument(skip(self, keys, initial, reduce, options), fields(namespace = %self.namespace()))]
    pub async fn group(
        &self,
        keys: GroupKey,
        initial: BsonDocument,
        reduce: JavaScript,
        options: GroupOptions,
    ) -> Result<Vec<BsonDocument>> {
        let operation = Group::new(
            self.database_name.as_str(),
            self.collection_name.as_str(),
            keys,
            initial,
            reduce,
            options,
        )?;
        let server = self
            .manager
            .select_server(&self.options.read_preference)
            .await?;

        operation.execute(server.as_ref()).await
    }

    /// Drop this collection.
    #[instrument(skip(self), fields(namespace = %self.namespace()))]
    pub async fn drop(&self) -> Result<BsonDocument> {
        let operation = DropCollection::new(
            self.database_name.as_str(),
            self.collection_name.as_str(),
            self.options.write_concern.clone(),
        )?;
        let server = self.manager.select_server(&ReadPreference::Primary).await?;

        operation.execute(server.as_ref()).await
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database_name, self.collection_name)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("database_name", &self.database_name.as_str())
            .field("collection_name", &self.collection_name.as_str())
            .field("manager", &self.manager)
            .field("read_concern", &self.options.read_concern)
            .field("read_preference", &self.options.read_preference)
            .field("write_concern", &self.options.write_concern)
            .finish()
    }
}
