//! GridFS bucket handle
//!
//! A bucket is a pair of collections, `<bucket>.files` and `<bucket>.chunks`,
//! sharing a name prefix and a chunk size.

use bson::Document as BsonDocument;
use mongodb::options::{ReadConcern, ReadPreference, WriteConcern};
use std::fmt;
use std::sync::Arc;
use tessera_common::{Result, TesseraError};
use tracing::instrument;

use crate::collection::Collection;
use crate::manager::Manager;
use crate::operation::{DropCollection, Executable};
use crate::options::{resolve, EffectiveOptions, HandleOptions};
use crate::validation::ValidatedDatabaseName;

pub const DEFAULT_BUCKET_NAME: &str = "fs";

/// 255 KiB
pub const DEFAULT_CHUNK_SIZE_BYTES: u32 = 261_120;

#[derive(Debug, Clone, PartialEq)]
pub struct BucketOptions {
    /// Prefix of the files and chunks collections (default `"fs"`)
    pub bucket_name: String,
    /// Chunk size in bytes (default 261120)
    pub chunk_size_bytes: u32,
    pub read_preference: Option<ReadPreference>,
    pub write_concern: Option<WriteConcern>,
}

impl Default for BucketOptions {
    fn default() -> Self {
        Self {
            bucket_name: DEFAULT_BUCKET_NAME.to_string(),
            chunk_size_bytes: DEFAULT_CHUNK_SIZE_BYTES,
            read_preference: None,
            write_concern: None,
        }
    }
}

impl BucketOptions {
    pub fn bucket_name(mut self, bucket_name: impl Into<String>) -> Self {
        self.bucket_name = bucket_name.into();
        self
    }

    pub fn chunk_size_bytes(mut self, chunk_size_bytes: u32) -> Self {
        self.chunk_size_bytes = chunk_size_bytes;
        self
    }

    pub fn read_preference(mut self, read_preference: ReadPreference) -> Self {
        self.read_preference = Some(read_preference);
        self
    }

    pub fn write_concern(mut self, write_concern: WriteConcern) -> Self {
        self.write_concern = Some(write_concern);
        self
    }

    fn handle_options(&self) -> HandleOptions {
        HandleOptions {
            read_concern: None,
            read_preference: self.read_preference.clone(),
            write_concern: self.write_concern.clone(),
        }
    }
}

/// A GridFS bucket within a database.
#[derive(Clone)]
pub struct Bucket {
    manager: Arc<dyn Manager>,
    database_name: ValidatedDatabaseName,
    bucket_name: String,
    chunk_size_bytes: u32,
    options: EffectiveOptions,
}

impl Bucket {
    /// Unset options default to the manager's.
    pub fn new(manager: Arc<dyn Manager>, database_name: &str, options: BucketOptions) -> Result<Self> {
        let parent = EffectiveOptions::from_manager(manager.as_ref());
        Self::with_parent(manager, database_name, options, &parent)
    }

    pub(crate) fn with_parent(
        manager: Arc<dyn Manager>,
        database_name: &str,
        options: BucketOptions,
        parent: &EffectiveOptions,
    ) -> Result<Self> {
        let database_name = ValidatedDatabaseName::new(database_name)?;

        if options.bucket_name.is_empty() {
            return Err(TesseraError::InvalidArgument(
                "Bucket name cannot be empty".to_string(),
            ));
        }
        if options.chunk_size_bytes == 0 {
            return Err(TesseraError::InvalidArgument(
                "Chunk size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            options: resolve(options.handle_options(), parent),
            manager,
            database_name,
            bucket_name: options.bucket_name,
            chunk_size_bytes: options.chunk_size_bytes,
        })
    }

    pub fn database_name(&self) -> &str {
        self.database_name.as_str()
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    pub fn chunk_size_bytes(&self) -> u32 {
        self.chunk_size_bytes
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

    /// Handle over `<bucket>.files`
    pub fn files_collection(&self) -> Result<Collection> {
        self.child_collection("files")
    }

    /// Handle over `<bucket>.chunks`
    pub fn chunks_collection(&self) -> Result<Collection> {
        self.child_collection("chunks")
    }

    fn child_collection(&self, suffix: &str) -> Result<Collection> {
        Collection::with_parent(
            Arc::clone(&self.manager),
            self.database_name.as_str(),
            &format!("{}.{}", self.bucket_name, suffix),
            HandleOptions::default(),
            &self.options,
        )
    }

    /// Drop the files collection, then the chunks collection.
    ///
    /// Returns the two command results in that order.
    #[instrument(skip(self), fields(database = %self.database_name, bucket = %self.bucket_name))]
    pub async fn drop(&self) -> Result<(BsonDocument, BsonDocument)> {
        let server = self.manager.select_server(&ReadPreference::Primary).await?;

        let files = DropCollection::new(
            self.database_name.as_str(),
            &format!("{}.files", self.bucket_name),
            self.options.write_concern.clone(),
        )?;
        let chunks = DropCollection::new(
            self.database_name.as_str(),
            &format!("{}.chunks", self.bucket_name),
            self.options.write_concern.clone(),
        )?;

        let files_result = files.execute(server.as_ref()).await?;
        let chunks_result = chunks.execute(server.as_ref()).await?;
        Ok((files_result, chunks_result))
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("database_name", &self.database_name.as_str())
            .field("bucket_name", &self.bucket_name)
            .field("chunk_size_bytes", &self.chunk_size_bytes)
            .field("manager", &self.manager)
            .field("read_preference", &self.options.read_preference)
            .field("write_concern", &self.options.write_concern)
            .finish()
    }
}
