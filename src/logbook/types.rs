//! Logbook types: attempts, completions, comments and recommendations.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::catalog::RouteKey;

/// Storage format for comment and recommendation timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current local time truncated to whole seconds.
pub fn now_timestamp() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// How a route was climbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AscentType {
    /// First try, no prior information
    Onsight,
    /// First try with beta
    Flash,
    /// Led clean after rehearsal
    Redpoint,
    /// Redpoint with pre-placed gear
    Pinkpoint,
    Toprope,
    Aid,
}

impl AscentType {
    pub const ALL: [AscentType; 6] = [
        AscentType::Onsight,
        AscentType::Flash,
        AscentType::Redpoint,
        AscentType::Pinkpoint,
        AscentType::Toprope,
        AscentType::Aid,
    ];

    /// Label stored in the `tipus_ascensio` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            AscentType::Onsight => "Onsight",
            AscentType::Flash => "Flash",
            AscentType::Redpoint => "Redpoint",
            AscentType::Pinkpoint => "Pinkpoint",
            AscentType::Toprope => "Toprope",
            AscentType::Aid => "Aid",
        }
    }

    /// Parse an optional form value where blank means "no type".
    pub fn parse_optional(s: &str) -> Result<Option<Self>, UnknownAscentType> {
        if s.trim().is_empty() {
            Ok(None)
        } else {
            s.parse().map(Some)
        }
    }
}

impl fmt::Display for AscentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ascent type: {0}")]
pub struct UnknownAscentType(pub String);

impl FromStr for AscentType {
    type Err = UnknownAscentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "").as_str() {
            "onsight" => Ok(AscentType::Onsight),
            "flash" => Ok(AscentType::Flash),
            "redpoint" | "assajat" => Ok(AscentType::Redpoint),
            "pinkpoint" => Ok(AscentType::Pinkpoint),
            "toprope" => Ok(AscentType::Toprope),
            "aid" => Ok(AscentType::Aid),
            _ => Err(UnknownAscentType(s.to_string())),
        }
    }
}

/// Elapsed time of a completed ascent, stored as `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AscentTime {
    seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidAscentTime {
    #[error("ascent time must be HH:MM:SS, got {0:?}")]
    Format(String),
    #[error("minutes and seconds must be below 60")]
    OutOfRange,
}

impl AscentTime {
    /// Largest representable value, 99:59:59.
    pub const MAX_HOURS: u32 = 99;

    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Result<Self, InvalidAscentTime> {
        if minutes >= 60 || seconds >= 60 || hours > Self::MAX_HOURS {
            return Err(InvalidAscentTime::OutOfRange);
        }
        Ok(Self {
            seconds: hours * 3600 + minutes * 60 + seconds,
        })
    }

    pub fn from_seconds(seconds: u32) -> Result<Self, InvalidAscentTime> {
        Self::from_hms(seconds / 3600, (seconds / 60) % 60, seconds % 60)
    }

    pub fn as_seconds(&self) -> u32 {
        self.seconds
    }

    pub fn hours(&self) -> u32 {
        self.seconds / 3600
    }

    pub fn minutes(&self) -> u32 {
        (self.seconds / 60) % 60
    }

    pub fn secs(&self) -> u32 {
        self.seconds % 60
    }
}

impl fmt::Display for AscentTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours(), self.minutes(), self.secs())
    }
}

impl FromStr for AscentTime {
    type Err = InvalidAscentTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let [h, m, sec] = parts.as_slice() else {
            return Err(InvalidAscentTime::Format(s.to_string()));
        };
        let field = |v: &str| {
            v.parse::<u32>()
                .map_err(|_| InvalidAscentTime::Format(s.to_string()))
        };
        Self::from_hms(field(*h)?, field(*m)?, field(*sec)?)
    }
}

impl TryFrom<String> for AscentTime {
    type Error = InvalidAscentTime;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AscentTime> for String {
    fn from(value: AscentTime) -> Self {
        value.to_string()
    }
}

/// A 1-5 route rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rating must be between 1 and 5, got {0}")]
pub struct InvalidRating(pub i64);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, InvalidRating> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidRating(value as i64))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = InvalidRating;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// Completion record attached one-to-one to an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub attempt_id: i64,
    pub ascent_time: Option<AscentTime>,
}

/// A logged attempt, with its completion when the climb was finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub climber: String,
    pub route: RouteKey,
    pub ascent_type: Option<AscentType>,
    pub date: NaiveDate,
    pub completion: Option<Completion>,
}

impl Attempt {
    pub fn is_completed(&self) -> bool {
        self.completion.is_some()
    }
}

/// Input for logging a new attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttempt {
    pub climber: String,
    pub route: RouteKey,
    pub ascent_type: Option<AscentType>,
    pub date: NaiveDate,
    /// Whether the climber finished the route on this attempt
    pub completed: bool,
    /// Elapsed time, only stored when `completed` is set
    pub ascent_time: Option<AscentTime>,
}

impl NewAttempt {
    pub fn new(climber: impl Into<String>, route: RouteKey, date: NaiveDate) -> Self {
        Self {
            climber: climber.into(),
            route,
            ascent_type: None,
            date,
            completed: false,
            ascent_time: None,
        }
    }

    pub fn with_type(mut self, ascent_type: AscentType) -> Self {
        self.ascent_type = Some(ascent_type);
        self
    }

    /// Mark the attempt as completed, optionally with its elapsed time.
    pub fn completed_in(mut self, ascent_time: Option<AscentTime>) -> Self {
        self.completed = true;
        self.ascent_time = ascent_time;
        self
    }
}

/// Completion state requested when editing an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionChange {
    /// Leave any existing completion untouched
    Keep,
    /// Mark completed, creating or overwriting the completion row
    Completed(Option<AscentTime>),
    /// Remove the completion row if present
    NotCompleted,
}

/// Edit of an existing attempt's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptUpdate {
    pub ascent_type: Option<AscentType>,
    pub date: NaiveDate,
    pub completion: CompletionChange,
}

/// A completion joined with its attempt and the route grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedAscent {
    pub attempt_id: i64,
    pub climber: String,
    pub route: RouteKey,
    pub ascent_type: Option<AscentType>,
    pub date: NaiveDate,
    pub ascent_time: Option<AscentTime>,
    pub grade: Option<String>,
}

/// Free-text note left by a climber on a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub climber: String,
    pub route: RouteKey,
    pub text: String,
    pub posted_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub climber: String,
    pub route: RouteKey,
    pub text: String,
    pub posted_at: NaiveDateTime,
}

impl NewComment {
    /// Comment stamped with the current local time.
    pub fn new(climber: impl Into<String>, route: RouteKey, text: impl Into<String>) -> Self {
        Self {
            climber: climber.into(),
            route,
            text: text.into(),
            posted_at: now_timestamp(),
        }
    }
}

/// A climber's rating of a route. At most one per climber and route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: i64,
    pub climber: String,
    pub route: RouteKey,
    pub rating: Rating,
    pub note: Option<String>,
    pub recommended_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecommendation {
    pub climber: String,
    pub route: RouteKey,
    pub rating: Rating,
    pub note: Option<String>,
    pub recommended_at: NaiveDateTime,
}

impl NewRecommendation {
    pub fn new(climber: impl Into<String>, route: RouteKey, rating: Rating) -> Self {
        Self {
            climber: climber.into(),
            route,
            rating,
            note: None,
            recommended_at: now_timestamp(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
