//! In-memory command store
//!
//! Used as the test double and for `backend = "memory"`. Every instance
//! owns its own map; nothing is shared between instances.

use super::{
    ChangeKind, CommandBackend, CommandRepo, CommandStore, CommitOutcome, PendingChange,
    RepoError, UnitOfWork,
};
use async_trait::async_trait;
use command_common::{BackendKind, Command};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

#[derive(Debug)]
struct MemoryState {
    rows: BTreeMap<i64, Command>,
    next_id: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCommandStore {
    state: Arc<RwLock<MemoryState>>,
    reject_commits: Arc<AtomicBool>,
}

impl InMemoryCommandStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `commands` already stored; their ids are reassigned in order
    pub async fn seeded(commands: Vec<Command>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write().await;
            for mut cmd in commands {
                cmd.id = state.next_id;
                state.next_id += 1;
                state.rows.insert(cmd.id, cmd);
            }
        }
        store
    }

    /// Make every following commit report failure without writing
    pub fn reject_commits(&self, reject: bool) {
        self.reject_commits.store(reject, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CommandBackend for InMemoryCommandStore {
    async fn load_all(&self) -> Result<Vec<Command>, RepoError> {
        Ok(self.state.read().await.rows.values().cloned().collect())
    }

    async fn load_by_id(&self, id: i64) -> Result<Option<Command>, RepoError> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn commit(&self, changes: Vec<PendingChange>) -> Result<CommitOutcome, RepoError> {
        if self.reject_commits.load(Ordering::SeqCst) {
            warn!("In-memory store rejecting commit of {} change(s)", changes.len());
            return Ok(CommitOutcome::default());
        }

        let mut state = self.state.write().await;
        let mut outcome = CommitOutcome::default();

        for change in changes {
            match change.kind {
                ChangeKind::Added => {
                    let id = state.next_id;
                    state.next_id += 1;
                    state.rows.insert(id, Command { id, ..change.command });
                    outcome.assigned.push((change.key, id));
                    outcome.changes += 1;
                }
                ChangeKind::Modified => {
                    if let Some(row) = state.rows.get_mut(&change.command.id) {
                        *row = change.command;
                        outcome.changes += 1;
                    }
                }
                ChangeKind::Deleted => {
                    if state.rows.remove(&change.command.id).is_some() {
                        outcome.changes += 1;
                    }
                }
            }
        }

        outcome.committed = true;
        Ok(outcome)
    }
}

#[async_trait]
impl CommandStore for InMemoryCommandStore {
    fn begin(&self) -> Box<dyn CommandRepo> {
        Box::new(UnitOfWork::new(self.clone()))
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Memory
    }
}
