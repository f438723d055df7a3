//! Climber storage operations.

use rusqlite::{params, Connection, OptionalExtension};

use crate::climbers::{Climber, ClimberLevel};
use crate::logbook::types::DATE_FORMAT;
use crate::storage::database::{parse_date, require, DatabaseError};

/// Climber store for registered climbers and their credentials.
pub struct ClimberStore<'a> {
    conn: &'a Connection,
}

impl<'a> ClimberStore<'a> {
    /// Create a new climber store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new climber.
    pub fn insert_climber(&self, climber: &Climber) -> Result<(), DatabaseError> {
        require("username", &climber.username)?;
        require("password", &climber.password)?;

        self.conn.execute(
            "INSERT INTO escalador (nom_usuari, contrasenya, data_naixement, nivell)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                climber.username,
                climber.password,
                climber
                    .birth_date
                    .map(|d| d.format(DATE_FORMAT).to_string()),
                climber.level.map(|l| l.as_str()),
            ],
        )?;

        tracing::info!(climber = %climber.username, "Registered climber");
        Ok(())
    }

    /// Get a climber by username.
    pub fn get_climber(&self, username: &str) -> Result<Option<Climber>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT nom_usuari, contrasenya, data_naixement, nivell
                 FROM escalador WHERE nom_usuari = ?1",
                params![username],
                ClimberRow::from_row,
            )
            .optional()?;

        row.map(ClimberRow::into_climber).transpose()
    }

    /// List all climbers ordered by username.
    pub fn list_climbers(&self) -> Result<Vec<Climber>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT nom_usuari, contrasenya, data_naixement, nivell
             FROM escalador ORDER BY nom_usuari",
        )?;
        let rows = stmt.query_map([], ClimberRow::from_row)?;

        let mut climbers = Vec::new();
        for row in rows {
            climbers.push(row?.into_climber()?);
        }
        Ok(climbers)
    }

    /// Update the climber currently named `username`.
    pub fn update_climber(&self, username: &str, climber: &Climber) -> Result<(), DatabaseError> {
        require("username", &climber.username)?;
        require("password", &climber.password)?;

        let rows_affected = self.conn.execute(
            "UPDATE escalador SET nom_usuari = ?2, contrasenya = ?3, data_naixement = ?4, nivell = ?5
             WHERE nom_usuari = ?1",
            params![
                username,
                climber.username,
                climber.password,
                climber
                    .birth_date
                    .map(|d| d.format(DATE_FORMAT).to_string()),
                climber.level.map(|l| l.as_str()),
            ],
        )?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Climber {}", username)));
        }

        tracing::info!(climber = %username, "Updated climber");
        Ok(())
    }

    /// Delete a climber together with their attempts, comments and recommendations.
    pub fn delete_climber(&self, username: &str) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM escalador WHERE nom_usuari = ?1", params![username])?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Climber {}", username)));
        }

        tracing::info!(climber = %username, "Deleted climber");
        Ok(())
    }

    /// Check a username/password pair against the stored credentials.
    pub fn verify_credentials(&self, username: &str, password: &str) -> Result<bool, DatabaseError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM escalador WHERE nom_usuari = ?1 AND contrasenya = ?2",
                params![username, password],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

/// Intermediate struct for reading climber rows from database.
struct ClimberRow {
    username: String,
    password: String,
    birth_date: Option<String>,
    level: Option<String>,
}

impl ClimberRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            username: row.get(0)?,
            password: row.get(1)?,
            birth_date: row.get(2)?,
            level: row.get(3)?,
        })
    }

    fn into_climber(self) -> Result<Climber, DatabaseError> {
        let birth_date = self
            .birth_date
            .as_deref()
            .map(|s| parse_date("data_naixement", s))
            .transpose()?;

        Ok(Climber {
            username: self.username,
            password: self.password,
            birth_date,
            level: parse_level(self.level.as_deref()),
        })
    }
}

/// Parse a stored level label. Blank labels come from forms that allowed
/// "no selection"; unrecognised ones are logged and read as no level.
pub(crate) fn parse_level(value: Option<&str>) -> Option<ClimberLevel> {
    match value.map(str::trim) {
        None | Some("") => None,
        Some(label) => match label.parse::<ClimberLevel>() {
            Ok(level) => Some(level),
            Err(e) => {
                tracing::warn!(label = %label, "Ignoring stored climber level: {}", e);
                None
            }
        },
    }
}
