//! Login and registration.
//!
//! A [`Session`] is an explicit value handed to whatever acts on behalf of
//! the climber; nothing is kept in process-wide state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::climbers::{Climber, ClimberLevel};
use crate::storage::climber_store::ClimberStore;
use crate::storage::database::DatabaseError;

/// An authenticated climber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    username: String,
}

impl Session {
    /// Check the credentials against the store and open a session.
    pub fn login(
        store: &ClimberStore<'_>,
        username: &str,
        password: &str,
    ) -> Result<Self, AuthError> {
        if !store.verify_credentials(username, password)? {
            tracing::warn!(climber = %username, "Rejected login");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(climber = %username, "Climber logged in");
        Ok(Self {
            username: username.to_string(),
        })
    }

    /// Create the climber described by `registration` and log them in.
    pub fn register(store: &ClimberStore<'_>, registration: Registration) -> Result<Self, AuthError> {
        let climber = registration.into_climber();
        store.insert_climber(&climber)?;
        Ok(Self {
            username: climber.username,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether `climber` is the session owner.
    pub fn owns(&self, climber: &str) -> bool {
        self.username == climber
    }
}

/// Fields of the sign-up form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub birth_date: Option<NaiveDate>,
    pub level: Option<ClimberLevel>,
}

impl Registration {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn into_climber(self) -> Climber {
        Climber {
            username: self.username,
            password: self.password,
            birth_date: self.birth_date,
            level: self.level,
        }
    }
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
