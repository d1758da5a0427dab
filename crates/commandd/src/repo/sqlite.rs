//! SQLite command store

use super::{
    ChangeKind, CommandBackend, CommandRepo, CommandStore, CommitOutcome, PendingChange,
    RepoError, UnitOfWork,
};
use async_trait::async_trait;
use command_common::{BackendKind, Command, DbLocation};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

const SELECT_COLUMNS: &str = "SELECT id, how_to, command_line, platform FROM commands";

/// Single connection guarded by a mutex; all work runs on the blocking pool
#[derive(Clone)]
pub struct SqliteCommandStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCommandStore {
    /// Open or create the database and its schema
    pub async fn open(location: DbLocation) -> Result<Self, RepoError> {
        if let DbLocation::File(path) = &location {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            info!("Opening command database at: {}", path.display());
        } else {
            info!("Opening in-memory command database");
        }

        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, RepoError> {
            let conn = match &location {
                DbLocation::File(path) => {
                    let conn = Connection::open(path)?;
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                    conn
                }
                DbLocation::InMemory => Connection::open_in_memory()?,
            };
            initialize_schema(&conn)?;
            Ok(conn)
        })
        .await??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, RepoError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, RepoError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            f(&mut conn)
        })
        .await?
    }
}

fn initialize_schema(conn: &Connection) -> Result<(), RepoError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS commands (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            how_to VARCHAR(250) NOT NULL,
            command_line VARCHAR(500) NOT NULL,
            platform VARCHAR(100) NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn row_to_command(row: &Row<'_>) -> rusqlite::Result<Command> {
    Ok(Command {
        id: row.get(0)?,
        how_to: row.get(1)?,
        command_line: row.get(2)?,
        platform: row.get(3)?,
    })
}

#[async_trait]
impl CommandBackend for SqliteCommandStore {
    async fn load_all(&self) -> Result<Vec<Command>, RepoError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))?;
            let rows = stmt.query_map([], row_to_command)?;
            let commands = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(commands)
        })
        .await
    }

    async fn load_by_id(&self, id: i64) -> Result<Option<Command>, RepoError> {
        self.with_conn(move |conn| {
            let command = conn
                .query_row(
                    &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                    params![id],
                    row_to_command,
                )
                .optional()?;
            Ok(command)
        })
        .await
    }

    async fn commit(&self, changes: Vec<PendingChange>) -> Result<CommitOutcome, RepoError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut outcome = CommitOutcome::default();

            for change in &changes {
                let cmd = &change.command;
                let written = match change.kind {
                    ChangeKind::Added => {
                        let n = tx.execute(
                            "INSERT INTO commands (how_to, command_line, platform)
                             VALUES (?1, ?2, ?3)",
                            params![cmd.how_to, cmd.command_line, cmd.platform],
                        )?;
                        outcome.assigned.push((change.key, tx.last_insert_rowid()));
                        n
                    }
                    ChangeKind::Modified => tx.execute(
                        "UPDATE commands SET how_to = ?1, command_line = ?2, platform = ?3
                         WHERE id = ?4",
                        params![cmd.how_to, cmd.command_line, cmd.platform, cmd.id],
                    )?,
                    ChangeKind::Deleted => {
                        tx.execute("DELETE FROM commands WHERE id = ?1", params![cmd.id])?
                    }
                };
                outcome.changes += written;
            }

            tx.commit()?;
            outcome.committed = true;
            Ok(outcome)
        })
        .await
    }
}

#[async_trait]
impl CommandStore for SqliteCommandStore {
    fn begin(&self) -> Box<dyn CommandRepo> {
        Box::new(UnitOfWork::new(self.clone()))
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Sqlite
    }
}
