//! Climber types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Self-assessed climbing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimberLevel {
    Beginner,
    Novice,
    Intermediate,
    Advanced,
    Expert,
    Pro,
}

impl ClimberLevel {
    pub const ALL: [ClimberLevel; 6] = [
        ClimberLevel::Beginner,
        ClimberLevel::Novice,
        ClimberLevel::Intermediate,
        ClimberLevel::Advanced,
        ClimberLevel::Expert,
        ClimberLevel::Pro,
    ];

    /// Label stored in the `nivell` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClimberLevel::Beginner => "Beginner",
            ClimberLevel::Novice => "Novice",
            ClimberLevel::Intermediate => "Intermediate",
            ClimberLevel::Advanced => "Advanced",
            ClimberLevel::Expert => "Expert",
            ClimberLevel::Pro => "Pro",
        }
    }
}

impl std::fmt::Display for ClimberLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown climber level: {0}")]
pub struct UnknownLevel(pub String);

impl FromStr for ClimberLevel {
    type Err = UnknownLevel;

    /// Accepts the English labels and the Catalan ones used by the
    /// climber-facing registration form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "principiant" => Ok(ClimberLevel::Beginner),
            "novice" | "iniciació" | "iniciacio" => Ok(ClimberLevel::Novice),
            "intermediate" | "intermedi" => Ok(ClimberLevel::Intermediate),
            "advanced" | "avançat" | "avancat" => Ok(ClimberLevel::Advanced),
            "expert" => Ok(ClimberLevel::Expert),
            "pro" => Ok(ClimberLevel::Pro),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

/// A registered climber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Climber {
    /// Unique username
    pub username: String,
    /// Stored as entered; never serialized out of the process
    #[serde(skip_serializing, default)]
    pub password: String,
    pub birth_date: Option<NaiveDate>,
    pub level: Option<ClimberLevel>,
}

impl Climber {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            birth_date: None,
            level: None,
        }
    }

    pub fn with_level(mut self, level: ClimberLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }
}
