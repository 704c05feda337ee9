//! One-off schema (re)initialization, run from the `init-db` command

use log::info;

use crate::{
    config::Database,
    storage::{db, error::StorageError, schema},
};

/// What to do with an existing `tracks` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaInit {
    /// create tables that do not exist yet
    IfMissing,
    /// drop and recreate every table, losing all stored tracks
    Recreate,
}

/// Connects to the configured database, initializes the schema and closes the connection.
///
/// Unlike [`db::open`], the parent directory of a file database is created when missing.
pub fn initialize_schema(config: &Database, mode: SchemaInit) -> Result<(), StorageError> {
    if !config.in_memory {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = db::connect(config)?;
    info!("Connected to database");

    let result = match mode {
        SchemaInit::IfMissing => schema::init(&conn),
        SchemaInit::Recreate => {
            log::warn!("Dropping existing tables, stored tracks will be lost");
            schema::reset(&conn)
        }
    };

    // close even when initialization failed
    let closed = conn.close().map_err(|(_, e)| e);
    result?;
    info!("Database and tables created");
    closed?;
    info!("Database connection closed");

    Ok(())
}
