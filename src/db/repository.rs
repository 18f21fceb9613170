//! Save database repository.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::models::NewSave;
use crate::db::{SaveEntry, StorageError, schema};
use crate::persist::Snapshot;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const AUTOSAVE_SLOT: &str = "autosave";
const NAMED_PREFIX: &str = "named:";

/// SQLite-backed store holding one autosave slot and any number of named saves.
///
/// Each save is a full session snapshot serialized as JSON, plus a few
/// columns for listing without decoding the payload.
#[derive(Debug, Clone)]
pub struct SaveStore {
    db_path: String,
}

impl SaveStore {
    /// Opens the database at `db_path`, creating it and applying pending
    /// migrations as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path))]
    pub fn open(db_path: impl Into<String>) -> Result<Self, StorageError> {
        let store = Self {
            db_path: db_path.into(),
        };
        let mut conn = store.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StorageError::new(format!("Migration failed: {}", e)))?;
        info!(path = %store.db_path, migrations = applied.len(), "Save store ready");
        Ok(store)
    }

    /// Path of the backing database.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StorageError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path).map_err(|e| {
            StorageError::new(format!("Failed to connect to '{}': {}", self.db_path, e))
        })
    }

    #[instrument(skip(self, snapshot))]
    fn write(&self, slot: String, label: &str, snapshot: &Snapshot) -> Result<(), StorageError> {
        let row = NewSave::new(
            slot,
            label.to_string(),
            snapshot.to_json()?,
            snapshot.saved_at.naive_utc(),
            snapshot.settings.mode.to_string(),
            snapshot.phase.to_string(),
            i32::try_from(snapshot.plies_to_current()).unwrap_or(i32::MAX),
        );
        let mut conn = self.connection()?;
        diesel::replace_into(schema::saves::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.connection()?;
        let payload = schema::saves::table
            .find(slot)
            .select(schema::saves::payload)
            .first::<String>(&mut conn)
            .optional()?;
        debug!(found = payload.is_some(), "Slot read");
        Ok(payload)
    }

    /// Overwrites the autosave slot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the snapshot cannot be encoded or written.
    #[instrument(skip(self, snapshot))]
    pub fn save_autosave(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.write(AUTOSAVE_SLOT.to_string(), AUTOSAVE_SLOT, snapshot)?;
        debug!("Autosave written");
        Ok(())
    }

    /// Reads the autosave payload, if one was written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    pub fn load_autosave(&self) -> Result<Option<String>, StorageError> {
        self.read(AUTOSAVE_SLOT)
    }

    /// Stores `snapshot` under `name`, replacing an existing save of that name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the name is blank or the write fails.
    #[instrument(skip(self, snapshot))]
    pub fn save_named(&self, name: &str, snapshot: &Snapshot) -> Result<(), StorageError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::new("Save name must not be empty"));
        }
        self.write(format!("{NAMED_PREFIX}{name}"), name, snapshot)?;
        info!(name = %name, "Named save written");
        Ok(())
    }

    /// Reads the payload of the named save, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    pub fn load_named(&self, name: &str) -> Result<Option<String>, StorageError> {
        self.read(&format!("{NAMED_PREFIX}{}", name.trim()))
    }

    /// Lists named saves, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_saves(&self) -> Result<Vec<SaveEntry>, StorageError> {
        let mut conn = self.connection()?;
        let saves: Vec<SaveEntry> = schema::saves::table
            .filter(schema::saves::slot.like(format!("{NAMED_PREFIX}%")))
            .order((schema::saves::saved_at.desc(), schema::saves::label.asc()))
            .select(SaveEntry::as_select())
            .load(&mut conn)?;
        info!(count = saves.len(), "Named saves loaded");
        Ok(saves)
    }

    /// Deletes the named save. Returns `false` when no save had that name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn delete_save(&self, name: &str) -> Result<bool, StorageError> {
        let mut conn = self.connection()?;
        let slot = format!("{NAMED_PREFIX}{}", name.trim());
        let deleted = diesel::delete(schema::saves::table.find(slot)).execute(&mut conn)?;
        info!(deleted, "Named save deleted");
        Ok(deleted > 0)
    }
}
