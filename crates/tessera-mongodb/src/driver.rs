//! [`Manager`] and [`Server`] backed by the official MongoDB driver

use async_trait::async_trait;
use bson::doc;
use mongodb::{
    error::ErrorKind,
    options::{ReadConcern, ReadPreference, SelectionCriteria, WriteConcern},
    Client,
};
use std::sync::Arc;
use tessera_common::{Result, TesseraError};
use tracing::{debug, info, instrument};

use crate::config::ConnectionConfig;
use crate::manager::{Command, Manager, ReplyCursor, Server};

/// Driver client wrapped as a [`Manager`].
///
/// The driver owns pooling and topology monitoring; defaults are read from
/// the client's own read concern, selection criteria and write concern.
#[derive(Debug, Clone)]
pub struct DriverManager {
    client: Client,
}

impl DriverManager {
    /// Connect using the given configuration
    #[instrument(skip(config), fields(app_name = ?config.pool.app_name))]
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let client_options = config.client_options().await?;
        let client = Client::with_options(client_options)
            .map_err(|e| TesseraError::Connection(e.to_string()))?;

        info!("MongoDB client initialized");
        Ok(Self { client })
    }

    /// Wrap an existing driver client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Check if the deployment is reachable by pinging the `admin` database
    pub async fn ping(&self) -> Result<bool> {
        match self.client.database("admin").run_command(doc! { "ping": 1 }).await {
            Ok(_) => Ok(true),
            Err(e) => Err(TesseraError::Connection(format!("Ping failed: {}", e))),
        }
    }
}

#[async_trait]
impl Manager for DriverManager {
    async fn select_server(&self, read_preference: &ReadPreference) -> Result<Arc<dyn Server>> {
        Ok(Arc::new(DriverServer {
            client: self.client.clone(),
            selection_criteria: SelectionCriteria::ReadPreference(read_preference.clone()),
        }))
    }

    fn read_concern(&self) -> Option<ReadConcern> {
        self.client.read_concern().cloned()
    }

    fn read_preference(&self) -> ReadPreference {
        self.client
            .selection_criteria()
            .and_then(|criteria| match criteria {
                SelectionCriteria::ReadPreference(read_pref) => Some(read_pref.clone()),
                _ => None,
            })
            .unwrap_or(ReadPreference::Primary)
    }

    fn write_concern(&self) -> Option<WriteConcern> {
        self.client.write_concern().cloned()
    }
}

/// A server choice pinned to a read preference.
///
/// The driver performs the actual selection when the command runs.
#[derive(Debug, Clone)]
pub struct DriverServer {
    client: Client,
    selection_criteria: SelectionCriteria,
}

#[async_trait]
impl Server for DriverServer {
    async fn execute_command(&self, database_name: &str, command: &Command) -> Result<ReplyCursor> {
        debug!(
            database = database_name,
            command = command.name().unwrap_or_default(),
            "Executing command"
        );

        let result = self
            .client
            .database(database_name)
            .run_command(command.document().clone())
            .selection_criteria(self.selection_criteria.clone())
            .await;

        match result {
            Ok(reply) => Ok(ReplyCursor::single(reply)),
            Err(err) => {
                // Server-side command failures come back as a raw `ok: 0` reply
                if let ErrorKind::Command(command_error) = err.kind.as_ref() {
                    return Ok(ReplyCursor::single(doc! {
                        "ok": 0.0,
                        "errmsg": command_error.message.clone(),
                        "code": command_error.code,
                        "codeName": command_error.code_name.clone(),
                    }));
                }
                Err(err.into())
            }
        }
    }
}
