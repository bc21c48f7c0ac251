//! Connection setup.
//!
//! # Invariants
//! - Returned connections enforce foreign keys and wait on a busy lock
//!   instead of failing immediately.
//! - Returned connections are at [`latest_version`](super::migrations::latest_version).

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the database file at `path`, including any
/// missing parent directories, and migrates it.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let started = Instant::now();
    let result = Connection::open(path)
        .map_err(DbError::from)
        .and_then(|mut conn| {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            prepare(&mut conn).map(|applied| (conn, applied))
        });
    report("file", &path.display().to_string(), started, result)
}

/// Fresh migrated database that lives as long as the connection.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started = Instant::now();
    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|mut conn| prepare(&mut conn).map(|applied| (conn, applied)));
    report("memory", ":memory:", started, result)
}

fn prepare(conn: &mut Connection) -> DbResult<usize> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}

fn report(
    mode: &str,
    target: &str,
    started: Instant,
    result: DbResult<(Connection, usize)>,
) -> DbResult<Connection> {
    let elapsed_ms = started.elapsed().as_millis();
    match result {
        Ok((conn, applied)) => {
            info!(
                "event=db_ready module=db status=ok mode={mode} target={target} migrations_applied={applied} duration_ms={elapsed_ms}"
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_ready module=db status=error mode={mode} target={target} duration_ms={elapsed_ms} error={err}"
            );
            Err(err)
        }
    }
}
