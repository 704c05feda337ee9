use rusqlite::{OptionalExtension, Row, params};

use crate::{
    config,
    domain::track::{NewTrack, Track, TrackChanges, TrackId},
    storage::{
        db,
        error::StorageError,
        schema::{columns, tables},
    },
};

use columns::*;
use tables::*;

/// Main structure that implements all storage logic
///
/// Owns the single database connection of the process.
pub struct Storage {
    pub(crate) db: rusqlite::Connection,
}

fn track_from_row(row: &Row) -> rusqlite::Result<Track> {
    Ok(Track {
        track_id: TrackId(row.get(0)?),
        song_title: row.get(1)?,
        artist_name: row.get(2)?,
        album_name: row.get(3)?,
        genre: row.get(4)?,
        duration: row.get(5)?,
        release_year: row.get(6)?,
    })
}

fn select_tracks() -> String {
    format!(
        "SELECT {TRACK_ID}, {SONG_TITLE}, {ARTIST_NAME}, {ALBUM_NAME}, {GENRE}, {DURATION}, {RELEASE_YEAR} FROM {TRACKS}"
    )
}

impl Storage {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let db: rusqlite::Connection = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    /// checks that the connection actually answers queries
    pub fn ping(&self) -> Result<(), StorageError> {
        self.db.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    pub fn list_tracks(&mut self) -> Result<Vec<Track>, StorageError> {
        let sql = format!("{} ORDER BY {TRACK_ID}", select_tracks());
        log::debug!("{sql}");

        let mut stmt = self.db.prepare(&sql)?;
        let tracks = stmt
            .query_map([], track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    pub fn get_track(&mut self, track_id: TrackId) -> Result<Track, StorageError> {
        let sql = format!("{} WHERE {TRACK_ID} = ?1", select_tracks());
        log::debug!("{sql} [{track_id}]");

        self.db
            .query_row(&sql, params![track_id.0], track_from_row)
            .optional()?
            .ok_or(StorageError::TrackNotFound(track_id))
    }

    /// inserts the track and returns it with the id assigned by the database
    pub fn create_track(&mut self, track: NewTrack) -> Result<Track, StorageError> {
        let sql = format!(
            "INSERT INTO {TRACKS} ({SONG_TITLE}, {ARTIST_NAME}, {ALBUM_NAME}, {GENRE}, {DURATION}, {RELEASE_YEAR}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        );
        log::debug!("{sql}");

        self.db.execute(
            &sql,
            params![
                track.song_title,
                track.artist_name,
                track.album_name,
                track.genre,
                track.duration,
                track.release_year
            ],
        )?;
        let track_id = TrackId(self.db.last_insert_rowid());

        Ok(track.with_id(track_id))
    }

    /// Applies a partial update and returns the full stored track.
    ///
    /// Reading the current row and writing the merged one happen in one transaction.
    pub fn update_track(
        &mut self,
        track_id: TrackId,
        changes: TrackChanges,
    ) -> Result<Track, StorageError> {
        let tx = self.db.transaction()?;

        let current = tx
            .query_row(
                &format!("{} WHERE {TRACK_ID} = ?1", select_tracks()),
                params![track_id.0],
                track_from_row,
            )
            .optional()?
            .ok_or(StorageError::TrackNotFound(track_id))?;

        if changes.is_empty() {
            return Ok(current);
        }

        let updated = changes.merge_into(current);

        let sql = format!(
            "UPDATE {TRACKS} SET {SONG_TITLE} = ?1, {ARTIST_NAME} = ?2, {ALBUM_NAME} = ?3, \
             {GENRE} = ?4, {DURATION} = ?5, {RELEASE_YEAR} = ?6 WHERE {TRACK_ID} = ?7"
        );
        log::debug!("{sql}");

        tx.execute(
            &sql,
            params![
                updated.song_title,
                updated.artist_name,
                updated.album_name,
                updated.genre,
                updated.duration,
                updated.release_year,
                track_id.0
            ],
        )?;

        tx.commit()?;
        Ok(updated)
    }

    /// permanently removes the track
    pub fn delete_track(&mut self, track_id: TrackId) -> Result<(), StorageError> {
        let sql = format!("DELETE FROM {TRACKS} WHERE {TRACK_ID} = ?1");
        log::debug!("{sql} [{track_id}]");

        let deleted = self.db.execute(&sql, params![track_id.0])?;
        if deleted == 0 {
            return Err(StorageError::TrackNotFound(track_id));
        }
        Ok(())
    }
}
