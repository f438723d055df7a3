//! Climbers, their levels, and authenticated sessions.

pub mod session;
pub mod types;

pub use session::{AuthError, Registration, Session};
pub use types::{Climber, ClimberLevel, UnknownLevel};
