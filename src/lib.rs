//! Cragbook - Climbing Logbook
//!
//! Catalog of crags, sectors and routes, and a logbook of the attempts,
//! completions, comments and recommendations climbers record on them.
//! Integrity rules (uniqueness, references, cascading deletes) are enforced
//! by the SQLite schema; the dashboard module exposes the admin and climber
//! views built on top of it.

pub mod catalog;
pub mod climbers;
pub mod dashboard;
pub mod logbook;
pub mod storage;

// Re-export commonly used types
pub use catalog::{Crag, Route, RouteKey, Sector, SectorKey};
pub use climbers::{Climber, ClimberLevel, Session};
pub use dashboard::{dispatch, ClimberDesk, DeskError, Surface, View, ViewPage, ViewRequest};
pub use logbook::{AscentTime, AscentType, Attempt, NewAttempt, Rating};
pub use storage::{AppConfig, Database, DatabaseError};
