//! Scripted manager/server doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bson::Document as BsonDocument;
use mongodb::options::{ReadConcern, ReadPreference, WriteConcern};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tessera_mongodb::{
    Command, EffectiveOptions, Manager, ReplyCursor, Result, Server, TesseraError,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Server that answers with queued replies and records every command.
#[derive(Debug, Default)]
pub struct MockServer {
    replies: Mutex<VecDeque<Result<BsonDocument>>>,
    commands: Mutex<Vec<(String, BsonDocument)>>,
}

impl MockServer {
    pub fn push_reply(&self, reply: BsonDocument) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn push_error(&self, error: TesseraError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// `(database, command)` pairs in the order they were executed
    pub fn commands(&self) -> Vec<(String, BsonDocument)> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl Server for MockServer {
    async fn execute_command(&self, database_name: &str, command: &Command) -> Result<ReplyCursor> {
        self.commands
            .lock()
            .unwrap()
            .push((database_name.to_string(), command.document().clone()));

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TesseraError::MongoDB("no scripted reply".to_string())));
        reply.map(ReplyCursor::single)
    }
}

/// Manager with fixed defaults that always selects the same [`MockServer`].
#[derive(Debug, Default)]
pub struct MockManager {
    defaults: EffectiveOptions,
    server: Arc<MockServer>,
    selections: Mutex<Vec<ReadPreference>>,
}

impl MockManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_defaults(defaults: EffectiveOptions) -> Arc<Self> {
        Arc::new(Self {
            defaults,
            ..Default::default()
        })
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Read preferences passed to `select_server`, in call order
    pub fn selections(&self) -> Vec<ReadPreference> {
        self.selections.lock().unwrap().clone()
    }
}

#[async_trait]
impl Manager for MockManager {
    async fn select_server(&self, read_preference: &ReadPreference) -> Result<Arc<dyn Server>> {
        self.selections.lock().unwrap().push(read_preference.clone());
        Ok(self.server.clone() as Arc<dyn Server>)
    }

    fn read_concern(&self) -> Option<ReadConcern> {
        self.defaults.read_concern.clone()
    }

    fn read_preference(&self) -> ReadPreference {
        self.defaults.read_preference.clone()
    }

    fn write_concern(&self) -> Option<WriteConcern> {
        self.defaults.write_concern.clone()
    }
}

pub fn secondary() -> ReadPreference {
    ReadPreference::Secondary { options: None }
}

pub fn nearest() -> ReadPreference {
    ReadPreference::Nearest { options: None }
}

pub fn write_concern_nodes(n: u32) -> WriteConcern {
    let mut write_concern = WriteConcern::default();
    write_concern.w = Some(mongodb::options::Acknowledgment::Nodes(n));
    write_concern
}

/// Defaults that differ from the driver's, so inheritance is observable
pub fn non_default_options() -> EffectiveOptions {
    EffectiveOptions {
        read_concern: Some(ReadConcern::majority()),
        read_preference: secondary(),
        write_concern: Some(write_concern_nodes(2)),
    }
}
