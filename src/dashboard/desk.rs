//! Actions available to a logged-in climber.
//!
//! Activity records (attempts, comments, recommendations) can only be
//! created, edited or deleted by the climber who owns them. The catalog is
//! shared: any authenticated climber may add, edit or delete crags, sectors
//! and routes. Deleting a catalog entry removes everything recorded under it.

use crate::catalog::{Crag, Route, RouteKey, Sector, SectorKey};
use crate::climbers::Session;
use crate::dashboard::DeskError;
use crate::logbook::{
    Attempt, AttemptUpdate, Comment, NewAttempt, NewComment, NewRecommendation, Rating,
    Recommendation,
};
use crate::storage::database::{Database, DatabaseError};

/// Climber-scoped write access to the database.
pub struct ClimberDesk<'a> {
    db: &'a Database,
    session: Session,
}

impl<'a> ClimberDesk<'a> {
    pub fn new(db: &'a Database, session: Session) -> Self {
        Self { db, session }
    }

    /// Log in and open a desk for the climber.
    pub fn login(db: &'a Database, username: &str, password: &str) -> Result<Self, DeskError> {
        let session = Session::login(&db.climbers(), username, password)?;
        Ok(Self::new(db, session))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn ensure_owner(&self, owner: &str, record: String) -> Result<(), DeskError> {
        if self.session.owns(owner) {
            return Ok(());
        }
        tracing::warn!(
            climber = %self.session.username(),
            owner = %owner,
            %record,
            "Rejected change to another climber's record"
        );
        Err(DeskError::PermissionDenied(record))
    }

    // ========== Attempts ==========

    pub fn log_attempt(&self, attempt: &NewAttempt) -> Result<Attempt, DeskError> {
        self.ensure_owner(&attempt.climber, format!("attempt by {}", attempt.climber))?;
        Ok(self.db.logbook().log_attempt(attempt)?)
    }

    pub fn update_attempt(&self, id: i64, update: &AttemptUpdate) -> Result<(), DeskError> {
        let logbook = self.db.logbook();
        let attempt = logbook
            .get_attempt(id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("Attempt {}", id)))?;
        self.ensure_owner(&attempt.climber, format!("attempt {}", id))?;
        Ok(logbook.update_attempt(id, update)?)
    }

    pub fn delete_attempt(&self, id: i64) -> Result<(), DeskError> {
        let logbook = self.db.logbook();
        let attempt = logbook
            .get_attempt(id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("Attempt {}", id)))?;
        self.ensure_owner(&attempt.climber, format!("attempt {}", id))?;
        Ok(logbook.delete_attempt(id)?)
    }

    // ========== Comments ==========

    /// Comment on a route as the session climber.
    pub fn comment(&self, route: RouteKey, text: &str) -> Result<Comment, DeskError> {
        let comment = NewComment::new(self.session.username(), route, text);
        Ok(self.db.logbook().add_comment(&comment)?)
    }

    pub fn edit_comment(&self, id: i64, text: &str) -> Result<(), DeskError> {
        let logbook = self.db.logbook();
        let comment = logbook
            .get_comment(id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("Comment {}", id)))?;
        self.ensure_owner(&comment.climber, format!("comment {}", id))?;
        Ok(logbook.update_comment(id, text)?)
    }

    pub fn delete_comment(&self, id: i64) -> Result<(), DeskError> {
        let logbook = self.db.logbook();
        let comment = logbook
            .get_comment(id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("Comment {}", id)))?;
        self.ensure_owner(&comment.climber, format!("comment {}", id))?;
        Ok(logbook.delete_comment(id)?)
    }

    // ========== Recommendations ==========

    /// Rate a route as the session climber. Rating the same route twice is a
    /// unique constraint violation; use [`Self::edit_recommendation`].
    pub fn recommend(
        &self,
        route: RouteKey,
        rating: Rating,
        note: Option<&str>,
    ) -> Result<Recommendation, DeskError> {
        let mut recommendation = NewRecommendation::new(self.session.username(), route, rating);
        if let Some(note) = note {
            recommendation = recommendation.with_note(note);
        }
        Ok(self.db.logbook().add_recommendation(&recommendation)?)
    }

    pub fn edit_recommendation(
        &self,
        id: i64,
        rating: Rating,
        note: Option<&str>,
    ) -> Result<(), DeskError> {
        let logbook = self.db.logbook();
        let recommendation = logbook
            .get_recommendation(id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("Recommendation {}", id)))?;
        self.ensure_owner(&recommendation.climber, format!("recommendation {}", id))?;
        Ok(logbook.update_recommendation(id, rating, note)?)
    }

    pub fn delete_recommendation(&self, id: i64) -> Result<(), DeskError> {
        let logbook = self.db.logbook();
        let recommendation = logbook
            .get_recommendation(id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("Recommendation {}", id)))?;
        self.ensure_owner(&recommendation.climber, format!("recommendation {}", id))?;
        Ok(logbook.delete_recommendation(id)?)
    }

    // ========== Catalog ==========

    pub fn add_crag(&self, crag: &Crag) -> Result<(), DeskError> {
        Ok(self.db.catalog().insert_crag(crag)?)
    }

    pub fn edit_crag(&self, name: &str, crag: &Crag) -> Result<(), DeskError> {
        Ok(self.db.catalog().update_crag(name, crag)?)
    }

    pub fn add_sector(&self, sector: &Sector) -> Result<(), DeskError> {
        Ok(self.db.catalog().insert_sector(sector)?)
    }

    pub fn edit_sector(&self, key: &SectorKey, sector: &Sector) -> Result<(), DeskError> {
        Ok(self.db.catalog().update_sector(key, sector)?)
    }

    pub fn add_route(&self, route: &Route) -> Result<(), DeskError> {
        Ok(self.db.catalog().insert_route(route)?)
    }

    pub fn edit_route(&self, key: &RouteKey, route: &Route) -> Result<(), DeskError> {
        Ok(self.db.catalog().update_route(key, route)?)
    }

    /// Delete a crag with its sectors, routes and all activity on them.
    pub fn delete_crag(&self, name: &str) -> Result<(), DeskError> {
        tracing::debug!(climber = %self.session.username(), crag = %name, "Deleting crag");
        Ok(self.db.catalog().delete_crag(name)?)
    }

    pub fn delete_sector(&self, key: &SectorKey) -> Result<(), DeskError> {
        tracing::debug!(climber = %self.session.username(), sector = %key, "Deleting sector");
        Ok(self.db.catalog().delete_sector(key)?)
    }

    pub fn delete_route(&self, key: &RouteKey) -> Result<(), DeskError> {
        tracing::debug!(climber = %self.session.username(), route = %key, "Deleting route");
        Ok(self.db.catalog().delete_route(key)?)
    }
}
