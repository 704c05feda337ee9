use std::path::Path;

use rusqlite::Connection;

use crate::{
    config::Database,
    storage::{error::StorageError, schema},
};

fn open_in_memory() -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open_in_memory()
}

fn open_from_file(path: &Path) -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open(path)
}

/// Opens a connection without touching the schema.
///
/// A file-backed database is created if missing, but its parent directory must exist.
pub fn connect(config: &Database) -> Result<rusqlite::Connection, StorageError> {
    let db = if config.in_memory {
        open_in_memory()?
    } else {
        log::debug!("opening database {}", config.path.to_string_lossy());
        open_from_file(&config.path)?
    };
    Ok(db)
}

/// Opens a connection and makes sure the tables exist
pub fn open(config: &Database) -> Result<rusqlite::Connection, StorageError> {
    let db = connect(config)?;
    schema::init(&db)?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::tempdir;

    use crate::{
        config::Database,
        storage::{db::open, schema},
    };

    #[test]
    fn open_in_memory_db_initializes_schema() {
        let db = open(&Database {
            in_memory: true,
            path: PathBuf::new(),
        })
        .unwrap();

        let mut stmt = db
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        for table in schema::tables::ALL_TABLES {
            assert!(tables.contains(&table.to_string()));
        }
    }

    #[test]
    fn open_file_db_creates_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tracks.db");

        open(&Database {
            in_memory: false,
            path: path.clone(),
        })?;

        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn open_file_db_in_missing_dir_fails() -> anyhow::Result<()> {
        let dir = tempdir()?;

        let result = open(&Database {
            in_memory: false,
            path: dir.path().join("missing").join("tracks.db"),
        });

        assert!(result.is_err());
        Ok(())
    }
}
