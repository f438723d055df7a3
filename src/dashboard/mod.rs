//! Dashboard surfaces.
//!
//! [`router`] maps a page name and its typed inputs to one handler that
//! builds the page data, for both the admin and the climber surface.
//! [`desk`] holds the write actions a logged-in climber may perform.

pub mod desk;
pub mod router;

pub use desk::ClimberDesk;
pub use router::{
    dispatch, dispatch_with, AdminOverview, ClimberOverview, CompletionsPage,
    RecommendationsPage, RoutesPage, Surface, View, ViewPage, ViewRequest,
};

use thiserror::Error;

use crate::climbers::AuthError;
use crate::storage::database::DatabaseError;

/// Dashboard errors.
#[derive(Debug, Error)]
pub enum DeskError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("View {0} is not available here")]
    ViewUnavailable(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AuthError> for DeskError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => DeskError::InvalidCredentials,
            AuthError::Database(e) => DeskError::Database(e),
        }
    }
}
