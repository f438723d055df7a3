//! Database operations using rusqlite.
//!
//! Owns the SQLite connection, applies the schema, and classifies SQLite
//! failures into the error taxonomy every store returns.

use crate::logbook::types::{DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::storage::catalog_store::CatalogStore;
use crate::storage::climber_store::ClimberStore;
use crate::storage::logbook_store::LogbookStore;
use crate::storage::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};
use crate::storage::stats_store::StatsStore;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{ffi, Connection, ErrorCode, Result as SqliteResult};
use std::path::Path;
use thiserror::Error;

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::IoError(e.to_string()))?;
            }
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        tracing::debug!(path = %path.display(), "Opened database");
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Enable referential integrity and bring the schema up to date.
    fn initialize(&self) -> Result<(), DatabaseError> {
        // SQLite leaves foreign keys off unless asked, per connection
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        self.conn
            .execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = self.get_schema_version()?;

        if current_version < CURRENT_VERSION {
            self.migrate(current_version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    pub fn get_schema_version(&self) -> Result<i32, DatabaseError> {
        let result: SqliteResult<i32> = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        );

        match result {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(DatabaseError::StoreOperationFailed(e.to_string())),
        }
    }

    /// Run database migrations.
    fn migrate(&self, from_version: i32) -> Result<(), DatabaseError> {
        if from_version < 1 {
            self.conn
                .execute_batch(SCHEMA)
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            self.conn
                .execute(
                    "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
                    [CURRENT_VERSION],
                )
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            tracing::info!("Database migrated to version {}", CURRENT_VERSION);
        }

        Ok(())
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Crags, sectors and routes.
    pub fn catalog(&self) -> CatalogStore<'_> {
        CatalogStore::new(&self.conn)
    }

    /// Registered climbers.
    pub fn climbers(&self) -> ClimberStore<'_> {
        ClimberStore::new(&self.conn)
    }

    /// Attempts, completions, comments and recommendations.
    pub fn logbook(&self) -> LogbookStore<'_> {
        LogbookStore::new(&self.conn)
    }

    /// Aggregates behind the dashboards.
    pub fn stats(&self) -> StatsStore<'_> {
        StatsStore::new(&self.conn)
    }
}

/// Reject blank values for mandatory fields before touching the store.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), DatabaseError> {
    if value.trim().is_empty() {
        return Err(DatabaseError::RequiredFieldMissing(field.to_string()));
    }
    Ok(())
}

/// Parse a stored `YYYY-MM-DD` date.
pub(crate) fn parse_date(column: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        DatabaseError::DeserializationError(format!("Invalid {} date {:?}: {}", column, value, e))
    })
}

/// Parse a stored `YYYY-MM-DD HH:MM:SS` timestamp.
pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| {
        DatabaseError::DeserializationError(format!(
            "Invalid {} timestamp {:?}: {}",
            column, value, e
        ))
    })
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Required field missing: {0}")]
    RequiredFieldMissing(String),

    #[error("Unique constraint violation: {0}")]
    UniqueConstraintViolation(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Store operation failed: {0}")]
    StoreOperationFailed(String),
}

impl DatabaseError {
    /// Whether this error came from a uniqueness, key or check constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::UniqueConstraintViolation(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::CheckViolation(_)
                | DatabaseError::RequiredFieldMissing(_)
        )
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
                let detail = msg.clone().unwrap_or_else(|| e.to_string());
                match err.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        DatabaseError::UniqueConstraintViolation(detail)
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => DatabaseError::ForeignKeyViolation(detail),
                    ffi::SQLITE_CONSTRAINT_CHECK => DatabaseError::CheckViolation(detail),
                    ffi::SQLITE_CONSTRAINT_NOTNULL => DatabaseError::RequiredFieldMissing(detail),
                    _ => DatabaseError::StoreOperationFailed(detail),
                }
            }
            _ => DatabaseError::StoreOperationFailed(e.to_string()),
        }
    }
}
