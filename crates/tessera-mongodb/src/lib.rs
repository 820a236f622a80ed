//! MongoDB handles for tessera
//!
//! This crate is a thin, typed layer over the MongoDB driver: database,
//! collection and GridFS bucket handles that validate their names and freeze
//! their read/write policies at construction, plus one-shot command
//! operations (`create`, `drop`, `dropDatabase`, `listCollections`, `group`).
//!
//! Wire protocol, pooling and server selection stay in the driver, reached
//! through the [`Manager`] and [`Server`] traits. [`DriverManager`] adapts a
//! `mongodb::Client`; tests can plug in their own implementations.

pub mod collection;
pub mod config;
pub mod database;
pub mod driver;
pub mod gridfs;
pub mod javascript;
pub mod manager;
pub mod model;
pub mod operation;
pub mod options;
pub mod validation;

pub use collection::Collection;
pub use config::{ConnectionConfig, PoolConfig};
pub use database::Database;
pub use driver::{DriverManager, DriverServer};
pub use gridfs::{Bucket, BucketOptions, DEFAULT_BUCKET_NAME, DEFAULT_CHUNK_SIZE_BYTES};
pub use javascript::JavaScript;
pub use manager::{Command, Manager, ReplyCursor, Server};
pub use model::{CollectionInfo, CollectionInfoIterator};
pub use operation::{
    CreateCollectionOptions, Executable, Group, GroupKey, GroupOptions, ListCollectionsOptions,
};
pub use options::{resolve, EffectiveOptions, HandleOptions};
pub use tessera_common::{Result, TesseraError};
pub use validation::{ValidatedCollectionName, ValidatedDatabaseName, ValidatedFieldName};
