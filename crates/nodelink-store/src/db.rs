//! Database connection management
//!
//! Provides utilities for opening and managing SQLite connections

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;

use crate::errors::{from_rusqlite, io_error, Result};
use crate::migrations::apply_migrations;

/// One connection shared by every collection's repository
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection with optimal settings
pub fn configure(conn: &Connection) -> Result<()> {
    // WAL lets readers proceed while a writer holds the lock
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
        .map_err(from_rusqlite)
}

/// Open, configure and migrate a database file, creating its directory
pub fn open_shared<P: AsRef<Path>>(path: P) -> Result<SharedConnection> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_error("create database directory", e))?;
    }
    prepare(open(path)?)
}

/// In-memory equivalent of [`open_shared`]
pub fn open_shared_in_memory() -> Result<SharedConnection> {
    prepare(open_in_memory()?)
}

fn prepare(mut conn: Connection) -> Result<SharedConnection> {
    configure(&conn)?;
    apply_migrations(&mut conn)?;
    tracing::debug!("database ready");
    Ok(Arc::new(Mutex::new(conn)))
}
