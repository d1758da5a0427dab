//! Repository abstraction over the command store
//!
//! A [`CommandStore`] is the long-lived handle shared by every request. Each
//! request opens its own [`CommandRepo`] unit of work: reads go straight to
//! the store, mutations are staged in a [`ChangeTracker`] and written in one
//! commit by `save_changes`.
//!
//! Mutations are never picked up implicitly. A changed command must be
//! handed back through `update_command`, otherwise the change is lost.

mod memory;
mod sqlite;
mod tracker;

pub use memory::InMemoryCommandStore;
pub use sqlite::SqliteCommandStore;
pub use tracker::{ChangeKind, ChangeTracker, EntryKey, PendingChange};

use async_trait::async_trait;
use command_common::{BackendKind, Command, DatabaseConfig};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RepoError {
    /// Repository misuse, e.g. deleting a command the store never assigned
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("failed to prepare store: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of committing a batch of staged changes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Rows written by the commit; zero is a valid outcome
    pub changes: usize,
    /// Ids assigned to staged inserts
    pub assigned: Vec<(EntryKey, i64)>,
    /// False when the store reports the commit did not take effect
    pub committed: bool,
}

/// Storage operations a backend provides to a unit of work
#[async_trait]
pub trait CommandBackend: Send + Sync + 'static {
    async fn load_all(&self) -> Result<Vec<Command>, RepoError>;

    async fn load_by_id(&self, id: i64) -> Result<Option<Command>, RepoError>;

    /// Apply `changes` in order, atomically
    async fn commit(&self, changes: Vec<PendingChange>) -> Result<CommitOutcome, RepoError>;
}

/// Long-lived store handle
#[async_trait]
pub trait CommandStore: Send + Sync {
    /// Open a unit of work for one request
    fn begin(&self) -> Box<dyn CommandRepo>;

    /// Check the store is reachable
    async fn ping(&self) -> Result<(), RepoError>;

    fn backend(&self) -> BackendKind;
}

/// Per-request repository
#[async_trait]
pub trait CommandRepo: Send + Sync {
    /// Every stored command, in id order
    async fn get_all_commands(&self) -> Result<Vec<Command>, RepoError>;

    /// `None` when no command has this id
    async fn get_command_by_id(&self, id: i64) -> Result<Option<Command>, RepoError>;

    /// Stage a new command. Its id is assigned by `save_changes`.
    fn create_command(&mut self, cmd: Command) -> Result<EntryKey, RepoError>;

    /// Stage the write-back of a changed command
    fn update_command(&mut self, cmd: Command) -> Result<(), RepoError>;

    /// Stage removal of a command
    fn delete_command(&mut self, cmd: Command) -> Result<(), RepoError>;

    /// Commit staged changes. Returns whether the store accepted the commit.
    async fn save_changes(&mut self) -> Result<bool, RepoError>;

    /// Tracked command for a key returned by `create_command`
    fn entry(&self, key: EntryKey) -> Option<&Command>;
}

/// Unit of work over any backend
pub struct UnitOfWork<B> {
    backend: B,
    tracker: ChangeTracker,
}

impl<B: CommandBackend> UnitOfWork<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            tracker: ChangeTracker::new(),
        }
    }
}

#[async_trait]
impl<B: CommandBackend> CommandRepo for UnitOfWork<B> {
    async fn get_all_commands(&self) -> Result<Vec<Command>, RepoError> {
        self.backend.load_all().await
    }

    async fn get_command_by_id(&self, id: i64) -> Result<Option<Command>, RepoError> {
        self.backend.load_by_id(id).await
    }

    fn create_command(&mut self, cmd: Command) -> Result<EntryKey, RepoError> {
        self.tracker.add(cmd)
    }

    fn update_command(&mut self, cmd: Command) -> Result<(), RepoError> {
        self.tracker.modify(cmd)
    }

    fn delete_command(&mut self, cmd: Command) -> Result<(), RepoError> {
        self.tracker.remove(cmd)
    }

    async fn save_changes(&mut self) -> Result<bool, RepoError> {
        let changes = self.tracker.pending_changes();
        if changes.is_empty() {
            debug!("save_changes: nothing staged");
            return Ok(true);
        }

        let outcome = self.backend.commit(changes).await?;
        if !outcome.committed {
            return Ok(false);
        }

        debug!("save_changes: {} row(s) written", outcome.changes);
        self.tracker.accept(&outcome.assigned);
        Ok(true)
    }

    fn entry(&self, key: EntryKey) -> Option<&Command> {
        self.tracker.get(key)
    }
}

/// Open the store named by the database configuration
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn CommandStore>, RepoError> {
    match config.backend {
        BackendKind::Sqlite => {
            let store = SqliteCommandStore::open(config.location()).await?;
            Ok(Arc::new(store))
        }
        BackendKind::Memory => {
            info!("Using in-memory command store");
            Ok(Arc::new(InMemoryCommandStore::new()))
        }
    }
}
