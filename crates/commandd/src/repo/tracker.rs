//! Change tracking for a unit of work

use super::RepoError;
use command_common::Command;

/// Handle to an entity staged in a [`ChangeTracker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// A staged change as handed to a backend for commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    pub key: EntryKey,
    pub kind: ChangeKind,
    pub command: Command,
}

#[derive(Debug, Clone)]
struct TrackedEntry {
    command: Command,
    /// `None` once the change has been committed
    pending: Option<ChangeKind>,
}

/// Ordered list of entities touched by one unit of work
#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: Vec<TrackedEntry>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, cmd: Command) -> Result<EntryKey, RepoError> {
        if cmd.is_persisted() {
            return Err(RepoError::InvalidArgument(
                "cannot create a command that already has an id",
            ));
        }
        Ok(self.track(cmd, ChangeKind::Added))
    }

    pub fn modify(&mut self, cmd: Command) -> Result<(), RepoError> {
        if !cmd.is_persisted() {
            return Err(RepoError::InvalidArgument("cannot update an unsaved command"));
        }
        self.track(cmd, ChangeKind::Modified);
        Ok(())
    }

    pub fn remove(&mut self, cmd: Command) -> Result<(), RepoError> {
        if !cmd.is_persisted() {
            return Err(RepoError::InvalidArgument("cannot delete an unsaved command"));
        }
        self.track(cmd, ChangeKind::Deleted);
        Ok(())
    }

    fn track(&mut self, command: Command, kind: ChangeKind) -> EntryKey {
        self.entries.push(TrackedEntry {
            command,
            pending: Some(kind),
        });
        EntryKey(self.entries.len() - 1)
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| e.pending.is_some())
    }

    /// Snapshot of uncommitted changes, in staging order
    pub fn pending_changes(&self) -> Vec<PendingChange> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| {
                entry.pending.map(|kind| PendingChange {
                    key: EntryKey(idx),
                    kind,
                    command: entry.command.clone(),
                })
            })
            .collect()
    }

    /// Mark everything committed and record ids the store assigned
    pub fn accept(&mut self, assigned: &[(EntryKey, i64)]) {
        for (key, id) in assigned {
            if let Some(entry) = self.entries.get_mut(key.0) {
                entry.command.id = *id;
            }
        }
        for entry in &mut self.entries {
            entry.pending = None;
        }
    }

    pub fn get(&self, key: EntryKey) -> Option<&Command> {
        self.entries.get(key.0).map(|e| &e.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(id: i64) -> Command {
        Command {
            id,
            ..Command::new("How to list files", "ls", "Linux")
        }
    }

    #[test]
    fn test_rejects_misuse() {
        let mut tracker = ChangeTracker::new();
        assert!(matches!(
            tracker.add(saved(3)),
            Err(RepoError::InvalidArgument(_))
        ));
        assert!(matches!(
            tracker.modify(Command::default()),
            Err(RepoError::InvalidArgument(_))
        ));
        assert!(matches!(
            tracker.remove(Command::default()),
            Err(RepoError::InvalidArgument(_))
        ));
        assert!(!tracker.has_pending());
    }

    #[test]
    fn test_pending_in_staging_order() {
        let mut tracker = ChangeTracker::new();
        let key = tracker.add(Command::new("a", "b", "c")).unwrap();
        tracker.modify(saved(1)).unwrap();
        tracker.remove(saved(2)).unwrap();

        let kinds: Vec<ChangeKind> = tracker.pending_changes().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::Added, ChangeKind::Modified, ChangeKind::Deleted]
        );
        assert_eq!(tracker.pending_changes()[0].key, key);
    }

    #[test]
    fn test_accept_assigns_ids_and_clears() {
        let mut tracker = ChangeTracker::new();
        let key = tracker.add(Command::new("a", "b", "c")).unwrap();
        tracker.accept(&[(key, 17)]);

        assert_eq!(tracker.get(key).unwrap().id, 17);
        assert!(!tracker.has_pending());
        assert!(tracker.pending_changes().is_empty());
    }
}
