//! Logbook storage operations.
//!
//! Provides persistence for:
//! - Attempts and their one-to-one completions
//! - Comments
//! - Recommendations
//!
//! An attempt and its completion are always written in the same
//! transaction, so a failed completion insert never leaves the attempt
//! behind on its own.

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::catalog::RouteKey;
use crate::logbook::types::{DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::logbook::{
    AscentTime, AscentType, Attempt, AttemptUpdate, Comment, CompletedAscent, Completion,
    CompletionChange, NewAttempt, NewComment, NewRecommendation, Rating, Recommendation,
};
use crate::storage::database::{parse_date, parse_timestamp, require, DatabaseError};
use crate::storage::filter::{ActivityFilter, AttemptFilter, WhereClause};

const ATTEMPT_SELECT: &str = "SELECT i.id_intent, i.nom_usuari_escalador, i.nom_via, i.nom_sector_via,
     i.nom_crag_via, i.tipus_ascensio, i.data_intent, e.id_intent, e.temps_ascensio
     FROM intent i
     LEFT JOIN encadenament e ON e.id_intent = i.id_intent
     JOIN via v ON v.nom = i.nom_via AND v.nom_sector = i.nom_sector_via
        AND v.nom_crag_sector = i.nom_crag_via";

const COMMENT_SELECT: &str = "SELECT c.id_comentari, c.nom_usuari_escalador, c.nom_via, c.nom_sector_via,
     c.nom_crag_via, c.text_comentari, c.data_comentari
     FROM comentari c
     JOIN via v ON v.nom = c.nom_via AND v.nom_sector = c.nom_sector_via
        AND v.nom_crag_sector = c.nom_crag_via";

const RECOMMENDATION_SELECT: &str = "SELECT r.id_recomanacio, r.nom_usuari_escalador, r.nom_via,
     r.nom_sector_via, r.nom_crag_via, r.puntuacio, r.descripcio_recomanacio, r.data_recomanacio
     FROM recomanacio r
     JOIN via v ON v.nom = r.nom_via AND v.nom_sector = r.nom_sector_via
        AND v.nom_crag_sector = r.nom_crag_via";

/// Logbook store for climber activity on routes.
pub struct LogbookStore<'a> {
    conn: &'a Connection,
}

impl<'a> LogbookStore<'a> {
    /// Create a new logbook store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn begin(&self) -> Result<Transaction<'a>, DatabaseError> {
        self.conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }

    fn commit(tx: Transaction<'_>) -> Result<(), DatabaseError> {
        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }

    // ========== Attempt Operations ==========

    /// Log an attempt, with its completion when `attempt.completed` is set.
    pub fn log_attempt(&self, attempt: &NewAttempt) -> Result<Attempt, DatabaseError> {
        require("climber", &attempt.climber)?;
        require_route(&attempt.route)?;

        let tx = self.begin()?;

        tx.execute(
            "INSERT INTO intent (tipus_ascensio, data_intent, nom_usuari_escalador,
             nom_via, nom_sector_via, nom_crag_via)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                attempt.ascent_type.map(|t| t.as_str()),
                attempt.date.format(DATE_FORMAT).to_string(),
                attempt.climber,
                attempt.route.name,
                attempt.route.sector,
                attempt.route.crag,
            ],
        )?;
        let id = tx.last_insert_rowid();

        let completion = if attempt.completed {
            upsert_completion(&tx, id, attempt.ascent_time)?;
            Some(Completion {
                attempt_id: id,
                ascent_time: attempt.ascent_time,
            })
        } else {
            None
        };

        Self::commit(tx)?;

        tracing::info!(
            attempt_id = id,
            climber = %attempt.climber,
            route = %attempt.route,
            completed = attempt.completed,
            "Logged attempt"
        );

        Ok(Attempt {
            id,
            climber: attempt.climber.clone(),
            route: attempt.route.clone(),
            ascent_type: attempt.ascent_type,
            date: attempt.date,
            completion,
        })
    }

    /// Get an attempt by id, including its completion.
    pub fn get_attempt(&self, id: i64) -> Result<Option<Attempt>, DatabaseError> {
        let sql = format!("{} WHERE i.id_intent = ?1", ATTEMPT_SELECT);
        let row = self
            .conn
            .query_row(&sql, params![id], AttemptRow::from_row)
            .optional()?;

        row.map(AttemptRow::into_attempt).transpose()
    }

    /// List attempts matching the filter, most recent first.
    pub fn list_attempts(&self, filter: &AttemptFilter) -> Result<Vec<Attempt>, DatabaseError> {
        let mut clause = WhereClause::new();
        filter.apply(&mut clause);

        let sql = format!(
            "{}{} ORDER BY i.data_intent DESC, i.id_intent DESC",
            ATTEMPT_SELECT,
            clause.sql()
        );
        tracing::debug!(?filter, "Listing attempts");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(clause.params(), AttemptRow::from_row)?;

        let mut attempts = Vec::new();
        for row in rows {
            attempts.push(row?.into_attempt()?);
        }
        Ok(attempts)
    }

    /// Edit an attempt's type and date and apply the requested completion change.
    pub fn update_attempt(&self, id: i64, update: &AttemptUpdate) -> Result<(), DatabaseError> {
        let tx = self.begin()?;

        let rows_affected = tx.execute(
            "UPDATE intent SET tipus_ascensio = ?2, data_intent = ?3 WHERE id_intent = ?1",
            params![
                id,
                update.ascent_type.map(|t| t.as_str()),
                update.date.format(DATE_FORMAT).to_string(),
            ],
        )?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Attempt {}", id)));
        }

        match update.completion {
            CompletionChange::Keep => {}
            CompletionChange::Completed(ascent_time) => upsert_completion(&tx, id, ascent_time)?,
            CompletionChange::NotCompleted => {
                tx.execute("DELETE FROM encadenament WHERE id_intent = ?1", params![id])?;
            }
        }

        Self::commit(tx)?;

        tracing::info!(attempt_id = id, "Updated attempt");
        Ok(())
    }

    /// Delete an attempt and its completion.
    pub fn delete_attempt(&self, id: i64) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM intent WHERE id_intent = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Attempt {}", id)));
        }

        tracing::info!(attempt_id = id, "Deleted attempt");
        Ok(())
    }

    // ========== Completion Operations ==========

    /// Get the completion of an attempt, if it was completed.
    pub fn get_completion(&self, attempt_id: i64) -> Result<Option<Completion>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id_intent, temps_ascensio FROM encadenament WHERE id_intent = ?1",
                params![attempt_id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;

        row.map(|(attempt_id, time)| {
            Ok(Completion {
                attempt_id,
                ascent_time: parse_ascent_time(time.as_deref())?,
            })
        })
        .transpose()
    }

    /// List completed ascents with their route grade, most recent first.
    pub fn list_completions(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<CompletedAscent>, DatabaseError> {
        let mut clause = WhereClause::new();
        filter.apply(&mut clause, "i", "data_intent");

        let sql = format!(
            "SELECT i.id_intent, i.nom_usuari_escalador, i.nom_via, i.nom_sector_via,
             i.nom_crag_via, i.tipus_ascensio, i.data_intent, e.temps_ascensio, v.grau_dificultat
             FROM encadenament e
             JOIN intent i ON e.id_intent = i.id_intent
             JOIN via v ON v.nom = i.nom_via AND v.nom_sector = i.nom_sector_via
                AND v.nom_crag_sector = i.nom_crag_via{}
             ORDER BY i.data_intent DESC, i.id_intent DESC",
            clause.sql()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(clause.params(), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                RouteKey::new(
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ),
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, Option<String>>(8)?,
            ))
        })?;

        let mut completions = Vec::new();
        for row in rows {
            let (attempt_id, climber, route, ascent_type, date, ascent_time, grade) = row?;
            completions.push(CompletedAscent {
                attempt_id,
                climber,
                route,
                ascent_type: parse_ascent_type(ascent_type.as_deref()),
                date: parse_date("data_intent", &date)?,
                ascent_time: parse_ascent_time(ascent_time.as_deref())?,
                grade,
            });
        }
        Ok(completions)
    }

    // ========== Comment Operations ==========

    /// Add a comment on a route.
    pub fn add_comment(&self, comment: &NewComment) -> Result<Comment, DatabaseError> {
        require("climber", &comment.climber)?;
        require_route(&comment.route)?;
        require("comment text", &comment.text)?;

        self.conn.execute(
            "INSERT INTO comentari (text_comentari, data_comentari, nom_usuari_escalador,
             nom_via, nom_sector_via, nom_crag_via)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                comment.text,
                comment.posted_at.format(TIMESTAMP_FORMAT).to_string(),
                comment.climber,
                comment.route.name,
                comment.route.sector,
                comment.route.crag,
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        tracing::info!(comment_id = id, climber = %comment.climber, route = %comment.route, "Added comment");

        Ok(Comment {
            id,
            climber: comment.climber.clone(),
            route: comment.route.clone(),
            text: comment.text.clone(),
            posted_at: comment.posted_at,
        })
    }

    /// Get a comment by id.
    pub fn get_comment(&self, id: i64) -> Result<Option<Comment>, DatabaseError> {
        let sql = format!("{} WHERE c.id_comentari = ?1", COMMENT_SELECT);
        let row = self
            .conn
            .query_row(&sql, params![id], CommentRow::from_row)
            .optional()?;

        row.map(CommentRow::into_comment).transpose()
    }

    /// List comments matching the filter, newest first.
    pub fn list_comments(&self, filter: &ActivityFilter) -> Result<Vec<Comment>, DatabaseError> {
        let mut clause = WhereClause::new();
        filter.apply(&mut clause, "c", "data_comentari");

        let sql = format!(
            "{}{} ORDER BY c.data_comentari DESC, c.id_comentari DESC",
            COMMENT_SELECT,
            clause.sql()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(clause.params(), CommentRow::from_row)?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?.into_comment()?);
        }
        Ok(comments)
    }

    /// Replace a comment's text.
    pub fn update_comment(&self, id: i64, text: &str) -> Result<(), DatabaseError> {
        require("comment text", text)?;

        let rows_affected = self.conn.execute(
            "UPDATE comentari SET text_comentari = ?2 WHERE id_comentari = ?1",
            params![id, text],
        )?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Comment {}", id)));
        }

        tracing::info!(comment_id = id, "Updated comment");
        Ok(())
    }

    /// Delete a comment.
    pub fn delete_comment(&self, id: i64) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM comentari WHERE id_comentari = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Comment {}", id)));
        }

        tracing::info!(comment_id = id, "Deleted comment");
        Ok(())
    }

    // ========== Recommendation Operations ==========

    /// Add a recommendation. A climber may only recommend a route once;
    /// a second insert fails with a unique constraint violation.
    pub fn add_recommendation(
        &self,
        recommendation: &NewRecommendation,
    ) -> Result<Recommendation, DatabaseError> {
        require("climber", &recommendation.climber)?;
        require_route(&recommendation.route)?;

        self.conn.execute(
            "INSERT INTO recomanacio (puntuacio, descripcio_recomanacio, data_recomanacio,
             nom_usuari_escalador, nom_via, nom_sector_via, nom_crag_via)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                recommendation.rating.value(),
                recommendation.note,
                recommendation
                    .recommended_at
                    .format(TIMESTAMP_FORMAT)
                    .to_string(),
                recommendation.climber,
                recommendation.route.name,
                recommendation.route.sector,
                recommendation.route.crag,
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        tracing::info!(
            recommendation_id = id,
            climber = %recommendation.climber,
            route = %recommendation.route,
            rating = recommendation.rating.value(),
            "Added recommendation"
        );

        Ok(Recommendation {
            id,
            climber: recommendation.climber.clone(),
            route: recommendation.route.clone(),
            rating: recommendation.rating,
            note: recommendation.note.clone(),
            recommended_at: recommendation.recommended_at,
        })
    }

    /// Get a recommendation by id.
    pub fn get_recommendation(&self, id: i64) -> Result<Option<Recommendation>, DatabaseError> {
        let sql = format!("{} WHERE r.id_recomanacio = ?1", RECOMMENDATION_SELECT);
        let row = self
            .conn
            .query_row(&sql, params![id], RecommendationRow::from_row)
            .optional()?;

        row.map(RecommendationRow::into_recommendation).transpose()
    }

    /// Find the recommendation a climber left on a route, if any.
    pub fn find_recommendation(
        &self,
        climber: &str,
        route: &RouteKey,
    ) -> Result<Option<Recommendation>, DatabaseError> {
        let sql = format!(
            "{} WHERE r.nom_usuari_escalador = ?1 AND r.nom_via = ?2
             AND r.nom_sector_via = ?3 AND r.nom_crag_via = ?4",
            RECOMMENDATION_SELECT
        );
        let row = self
            .conn
            .query_row(
                &sql,
                params![climber, route.name, route.sector, route.crag],
                RecommendationRow::from_row,
            )
            .optional()?;

        row.map(RecommendationRow::into_recommendation).transpose()
    }

    /// List recommendations matching the filter, newest first.
    pub fn list_recommendations(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<Recommendation>, DatabaseError> {
        let mut clause = WhereClause::new();
        filter.apply(&mut clause, "r", "data_recomanacio");

        let sql = format!(
            "{}{} ORDER BY r.data_recomanacio DESC, r.id_recomanacio DESC",
            RECOMMENDATION_SELECT,
            clause.sql()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(clause.params(), RecommendationRow::from_row)?;

        let mut recommendations = Vec::new();
        for row in rows {
            recommendations.push(row?.into_recommendation()?);
        }
        Ok(recommendations)
    }

    /// Change a recommendation's rating and note.
    pub fn update_recommendation(
        &self,
        id: i64,
        rating: Rating,
        note: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let rows_affected = self.conn.execute(
            "UPDATE recomanacio SET puntuacio = ?2, descripcio_recomanacio = ?3
             WHERE id_recomanacio = ?1",
            params![id, rating.value(), note],
        )?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Recommendation {}", id)));
        }

        tracing::info!(recommendation_id = id, rating = rating.value(), "Updated recommendation");
        Ok(())
    }

    /// Delete a recommendation.
    pub fn delete_recommendation(&self, id: i64) -> Result<(), DatabaseError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM recomanacio WHERE id_recomanacio = ?1",
            params![id],
        )?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Recommendation {}", id)));
        }

        tracing::info!(recommendation_id = id, "Deleted recommendation");
        Ok(())
    }
}

fn require_route(route: &RouteKey) -> Result<(), DatabaseError> {
    require("route", &route.name)?;
    require("sector", &route.sector)?;
    require("crag", &route.crag)
}

fn upsert_completion(
    tx: &Transaction<'_>,
    attempt_id: i64,
    ascent_time: Option<AscentTime>,
) -> Result<(), DatabaseError> {
    tx.execute(
        "INSERT INTO encadenament (id_intent, temps_ascensio) VALUES (?1, ?2)
         ON CONFLICT(id_intent) DO UPDATE SET temps_ascensio = excluded.temps_ascensio",
        params![attempt_id, ascent_time.map(|t| t.to_string())],
    )?;
    Ok(())
}

/// Parse a stored ascent type. The column is free text, so labels outside
/// [`AscentType`] are logged and read as "no type".
pub(crate) fn parse_ascent_type(value: Option<&str>) -> Option<AscentType> {
    let label = value?;
    match AscentType::parse_optional(label) {
        Ok(ascent_type) => ascent_type,
        Err(e) => {
            tracing::warn!(label = %label, "Ignoring stored ascent type: {}", e);
            None
        }
    }
}

fn parse_ascent_time(value: Option<&str>) -> Result<Option<AscentTime>, DatabaseError> {
    value
        .map(|s| {
            s.parse::<AscentTime>()
                .map_err(|e| DatabaseError::DeserializationError(e.to_string()))
        })
        .transpose()
}

/// Intermediate struct for reading attempt rows from database.
struct AttemptRow {
    id: i64,
    climber: String,
    route: RouteKey,
    ascent_type: Option<String>,
    date: String,
    completion_id: Option<i64>,
    ascent_time: Option<String>,
}

impl AttemptRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            climber: row.get(1)?,
            route: RouteKey::new(
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ),
            ascent_type: row.get(5)?,
            date: row.get(6)?,
            completion_id: row.get(7)?,
            ascent_time: row.get(8)?,
        })
    }

    fn into_attempt(self) -> Result<Attempt, DatabaseError> {
        let completion = match self.completion_id {
            Some(attempt_id) => Some(Completion {
                attempt_id,
                ascent_time: parse_ascent_time(self.ascent_time.as_deref())?,
            }),
            None => None,
        };

        Ok(Attempt {
            id: self.id,
            climber: self.climber,
            route: self.route,
            ascent_type: parse_ascent_type(self.ascent_type.as_deref()),
            date: parse_date("data_intent", &self.date)?,
            completion,
        })
    }
}

/// Intermediate struct for reading comment rows from database.
struct CommentRow {
    id: i64,
    climber: String,
    route: RouteKey,
    text: String,
    posted_at: String,
}

impl CommentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            climber: row.get(1)?,
            route: RouteKey::new(
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ),
            text: row.get(5)?,
            posted_at: row.get(6)?,
        })
    }

    fn into_comment(self) -> Result<Comment, DatabaseError> {
        Ok(Comment {
            id: self.id,
            climber: self.climber,
            route: self.route,
            text: self.text,
            posted_at: parse_timestamp("data_comentari", &self.posted_at)?,
        })
    }
}

/// Intermediate struct for reading recommendation rows from database.
struct RecommendationRow {
    id: i64,
    climber: String,
    route: RouteKey,
    rating: u8,
    note: Option<String>,
    recommended_at: String,
}

impl RecommendationRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            climber: row.get(1)?,
            route: RouteKey::new(
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ),
            rating: row.get(5)?,
            note: row.get(6)?,
            recommended_at: row.get(7)?,
        })
    }

    fn into_recommendation(self) -> Result<Recommendation, DatabaseError> {
        let rating = Rating::new(self.rating)
            .map_err(|e| DatabaseError::DeserializationError(e.to_string()))?;

        Ok(Recommendation {
            id: self.id,
            climber: self.climber,
            route: self.route,
            rating,
            note: self.note,
            recommended_at: parse_timestamp("data_recomanacio", &self.recommended_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Crag, Route, Sector};
    use crate::climbers::Climber;
    use crate::storage::database::Database;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn diedre() -> RouteKey {
        RouteKey::new("Diedre", "Paret Nord", "Montserrat")
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().expect("Failed to create database");
        let catalog = db.catalog();
        catalog.insert_crag(&Crag::new("Montserrat")).unwrap();
        catalog
            .insert_sector(&Sector::new("Paret Nord", "Montserrat"))
            .unwrap();
        catalog
            .insert_route(&Route::new(diedre()).with_grade("6a+"))
            .unwrap();
        db.climbers()
            .insert_climber(&Climber::new("alice", "pw"))
            .unwrap();
        db.climbers()
            .insert_climber(&Climber::new("bob", "pw"))
            .unwrap();
        db
    }

    #[test]
    fn test_log_attempt_with_completion() {
        let db = seeded();
        let logbook = db.logbook();
        let time = AscentTime::from_hms(0, 12, 30).unwrap();

        let attempt = logbook
            .log_attempt(
                &NewAttempt::new("alice", diedre(), date(2024, 5, 1))
                    .with_type(AscentType::Flash)
                    .completed_in(Some(time)),
            )
            .unwrap();

        let loaded = logbook.get_attempt(attempt.id).unwrap().expect("attempt");
        assert_eq!(loaded, attempt);
        assert_eq!(
            loaded.completion.unwrap().ascent_time.unwrap().to_string(),
            "00:12:30"
        );

        let stored: String = db
            .connection()
            .query_row(
                "SELECT temps_ascensio FROM encadenament WHERE id_intent = ?1",
                params![attempt.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, "00:12:30");
    }

    #[test]
    fn test_log_attempt_without_completion() {
        let db = seeded();
        let logbook = db.logbook();
        let attempt = logbook
            .log_attempt(&NewAttempt::new("alice", diedre(), date(2024, 5, 1)))
            .unwrap();

        assert!(!attempt.is_completed());
        assert!(logbook.get_completion(attempt.id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_attempt_rejected_but_variants_allowed() {
        let db = seeded();
        let logbook = db.logbook();
        let base = NewAttempt::new("alice", diedre(), date(2024, 5, 1)).with_type(AscentType::Flash);
        logbook.log_attempt(&base).unwrap();

        let err = logbook.log_attempt(&base).unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueConstraintViolation(_)));

        logbook
            .log_attempt(&NewAttempt::new("alice", diedre(), date(2024, 5, 2)).with_type(AscentType::Flash))
            .expect("different date");
        logbook
            .log_attempt(&base.clone().with_type(AscentType::Redpoint))
            .expect("different ascent type");

        assert_eq!(logbook.list_attempts(&AttemptFilter::default()).unwrap().len(), 3);
    }

    #[test]
    fn test_failed_attempt_leaves_no_rows() {
        let db = seeded();
        let logbook = db.logbook();
        let err = logbook
            .log_attempt(
                &NewAttempt::new("nobody", diedre(), date(2024, 5, 1))
                    .completed_in(None),
            )
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ForeignKeyViolation(_)));

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM intent", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    fn reject_completions(db: &Database) {
        db.connection()
            .execute_batch(
                "CREATE TRIGGER reject_completion BEFORE INSERT ON encadenament
                 BEGIN SELECT RAISE(ABORT, 'completion rejected'); END;",
            )
            .unwrap();
    }

    fn attempt_count(db: &Database) -> i64 {
        db.connection()
            .query_row("SELECT COUNT(*) FROM intent", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_rejected_completion_rolls_back_attempt() {
        let db = seeded();
        reject_completions(&db);

        let result = db.logbook().log_attempt(
            &NewAttempt::new("alice", diedre(), date(2024, 5, 1))
                .with_type(AscentType::Redpoint)
                .completed_in(None),
        );
        assert!(result.is_err());
        assert_eq!(attempt_count(&db), 0);
    }

    #[test]
    fn test_rejected_completion_rolls_back_attempt_edit() {
        let db = seeded();
        let logbook = db.logbook();
        let attempt = logbook
            .log_attempt(&NewAttempt::new("alice", diedre(), date(2024, 5, 1)))
            .unwrap();
        reject_completions(&db);

        let result = logbook.update_attempt(
            attempt.id,
            &AttemptUpdate {
                ascent_type: Some(AscentType::Redpoint),
                date: date(2024, 6, 9),
                completion: CompletionChange::Completed(None),
            },
        );
        assert!(result.is_err());

        let loaded = logbook.get_attempt(attempt.id).unwrap().unwrap();
        assert_eq!(loaded.date, date(2024, 5, 1));
        assert_eq!(loaded.ascent_type, None);
        assert!(loaded.completion.is_none());
    }

    #[test]
    fn test_unknown_ascent_type_label_listed_as_untyped() {
        let db = seeded();
        db.connection()
            .execute(
                "INSERT INTO intent (tipus_ascensio, data_intent, nom_usuari_escalador,
                 nom_via, nom_sector_via, nom_crag_via)
                 VALUES ('Solo', '2024-05-01', 'alice', 'Diedre', 'Paret Nord', 'Montserrat')",
                [],
            )
            .unwrap();
        let logbook = db.logbook();
        let attempt = logbook
            .log_attempt(
                &NewAttempt::new("alice", diedre(), date(2024, 5, 2))
                    .with_type(AscentType::Flash)
                    .completed_in(None),
            )
            .unwrap();
        db.connection()
            .execute(
                "UPDATE intent SET tipus_ascensio = 'Solo' WHERE id_intent = ?1",
                params![attempt.id],
            )
            .unwrap();

        let attempts = logbook.list_attempts(&AttemptFilter::default()).unwrap();
        assert_eq!(attempts.len(), 2);
        assert!(attempts.iter().all(|a| a.ascent_type.is_none()));

        let completions = logbook.list_completions(&ActivityFilter::default()).unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].ascent_type, None);
    }

    #[test]
    fn test_attempt_on_unknown_route_rejected() {
        let db = seeded();
        let err = db
            .logbook()
            .log_attempt(&NewAttempt::new(
                "alice",
                RouteKey::new("Ghost", "Paret Nord", "Montserrat"),
                date(2024, 5, 1),
            ))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ForeignKeyViolation(_)));
    }

    #[test]
    fn test_update_attempt_toggles_completion() {
        let db = seeded();
        let logbook = db.logbook();
        let attempt = logbook
            .log_attempt(&NewAttempt::new("alice", diedre(), date(2024, 5, 1)))
            .unwrap();

        let time = AscentTime::from_hms(0, 20, 0).unwrap();
        logbook
            .update_attempt(
                attempt.id,
                &AttemptUpdate {
                    ascent_type: Some(AscentType::Redpoint),
                    date: date(2024, 5, 3),
                    completion: CompletionChange::Completed(Some(time)),
                },
            )
            .unwrap();

        let loaded = logbook.get_attempt(attempt.id).unwrap().unwrap();
        assert_eq!(loaded.ascent_type, Some(AscentType::Redpoint));
        assert_eq!(loaded.date, date(2024, 5, 3));
        assert_eq!(loaded.completion.unwrap().ascent_time, Some(time));

        logbook
            .update_attempt(
                attempt.id,
                &AttemptUpdate {
                    ascent_type: Some(AscentType::Redpoint),
                    date: date(2024, 5, 3),
                    completion: CompletionChange::NotCompleted,
                },
            )
            .unwrap();
        assert!(logbook.get_completion(attempt.id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_attempt() {
        let db = seeded();
        let err = db
            .logbook()
            .update_attempt(
                42,
                &AttemptUpdate {
                    ascent_type: None,
                    date: date(2024, 5, 3),
                    completion: CompletionChange::Keep,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[test]
    fn test_delete_attempt_removes_completion() {
        let db = seeded();
        let logbook = db.logbook();
        let attempt = logbook
            .log_attempt(&NewAttempt::new("alice", diedre(), date(2024, 5, 1)).completed_in(None))
            .unwrap();

        logbook.delete_attempt(attempt.id).unwrap();

        assert!(logbook.get_attempt(attempt.id).unwrap().is_none());
        assert!(logbook.get_completion(attempt.id).unwrap().is_none());
    }

    #[test]
    fn test_list_attempts_filters() {
        let db = seeded();
        let logbook = db.logbook();
        logbook
            .log_attempt(
                &NewAttempt::new("alice", diedre(), date(2024, 5, 1))
                    .with_type(AscentType::Flash)
                    .completed_in(None),
            )
            .unwrap();
        logbook
            .log_attempt(&NewAttempt::new("bob", diedre(), date(2024, 6, 1)).with_type(AscentType::Toprope))
            .unwrap();

        let alice = logbook
            .list_attempts(&AttemptFilter::for_climber("alice"))
            .unwrap();
        assert_eq!(alice.len(), 1);

        let completed = logbook
            .list_attempts(&AttemptFilter::default().completed(true))
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].climber, "alice");

        let toprope = logbook
            .list_attempts(&AttemptFilter::default().ascent_type(AscentType::Toprope))
            .unwrap();
        assert_eq!(toprope[0].climber, "bob");

        let june = logbook
            .list_attempts(&AttemptFilter {
                activity: ActivityFilter::default()
                    .between(Some(date(2024, 6, 1)), Some(date(2024, 6, 30))),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(june.len(), 1);

        let all = logbook.list_attempts(&AttemptFilter::default()).unwrap();
        assert_eq!(all[0].date, date(2024, 6, 1));
    }

    #[test]
    fn test_list_completions_with_grade() {
        let db = seeded();
        let logbook = db.logbook();
        logbook
            .log_attempt(
                &NewAttempt::new("alice", diedre(), date(2024, 5, 1))
                    .completed_in(Some(AscentTime::from_hms(0, 5, 0).unwrap())),
            )
            .unwrap();
        logbook
            .log_attempt(&NewAttempt::new("bob", diedre(), date(2024, 5, 1)))
            .unwrap();

        let completions = logbook
            .list_completions(&ActivityFilter::default().grade("6a+"))
            .unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].climber, "alice");
        assert_eq!(completions[0].grade.as_deref(), Some("6a+"));
    }

    #[test]
    fn test_comment_lifecycle() {
        let db = seeded();
        let logbook = db.logbook();
        let comment = logbook
            .add_comment(&NewComment::new("alice", diedre(), "Polished start"))
            .unwrap();

        assert_eq!(logbook.get_comment(comment.id).unwrap().unwrap(), comment);

        logbook.update_comment(comment.id, "Very polished start").unwrap();
        assert_eq!(
            logbook.get_comment(comment.id).unwrap().unwrap().text,
            "Very polished start"
        );

        assert!(matches!(
            logbook.update_comment(comment.id, ""),
            Err(DatabaseError::RequiredFieldMissing(_))
        ));

        logbook.delete_comment(comment.id).unwrap();
        assert!(logbook.get_comment(comment.id).unwrap().is_none());
    }

    #[test]
    fn test_many_comments_allowed_per_route() {
        let db = seeded();
        let logbook = db.logbook();
        logbook
            .add_comment(&NewComment::new("alice", diedre(), "one"))
            .unwrap();
        logbook
            .add_comment(&NewComment::new("alice", diedre(), "two"))
            .unwrap();

        let comments = logbook
            .list_comments(&ActivityFilter::for_climber("alice").on_route(&diedre()))
            .unwrap();
        assert_eq!(comments.len(), 2);
    }

    #[test]
    fn test_second_recommendation_is_violation_then_update() {
        let db = seeded();
        let logbook = db.logbook();
        let first = logbook
            .add_recommendation(&NewRecommendation::new("alice", diedre(), Rating::new(4).unwrap()))
            .unwrap();

        let err = logbook
            .add_recommendation(&NewRecommendation::new("alice", diedre(), Rating::new(5).unwrap()))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueConstraintViolation(_)));

        logbook
            .update_recommendation(first.id, Rating::new(5).unwrap(), Some("Classic"))
            .unwrap();

        let found = logbook
            .find_recommendation("alice", &diedre())
            .unwrap()
            .expect("recommendation");
        assert_eq!(found.rating.value(), 5);
        assert_eq!(found.note.as_deref(), Some("Classic"));
        assert_eq!(
            logbook.list_recommendations(&ActivityFilter::default()).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_rating_out_of_range_rejected_by_store() {
        let db = seeded();
        let err: DatabaseError = db
            .connection()
            .execute(
                "INSERT INTO recomanacio (puntuacio, data_recomanacio, nom_usuari_escalador,
                 nom_via, nom_sector_via, nom_crag_via)
                 VALUES (9, '2024-05-01 10:00:00', 'alice', 'Diedre', 'Paret Nord', 'Montserrat')",
                [],
            )
            .unwrap_err()
            .into();
        assert!(matches!(err, DatabaseError::CheckViolation(_)));
    }

    #[test]
    fn test_route_rename_propagates_to_activity() {
        let db = seeded();
        let logbook = db.logbook();
        logbook
            .log_attempt(&NewAttempt::new("alice", diedre(), date(2024, 5, 1)))
            .unwrap();
        logbook
            .add_comment(&NewComment::new("alice", diedre(), "nice"))
            .unwrap();
        logbook
            .add_recommendation(&NewRecommendation::new("alice", diedre(), Rating::new(3).unwrap()))
            .unwrap();

        let renamed = RouteKey::new("Diedre Directe", "Paret Nord", "Montserrat");
        db.catalog()
            .update_route(&diedre(), &Route::new(renamed.clone()))
            .unwrap();

        let on_new = ActivityFilter::default().on_route(&renamed);
        assert_eq!(
            logbook
                .list_attempts(&AttemptFilter {
                    activity: on_new.clone(),
                    ..Default::default()
                })
                .unwrap()
                .len(),
            1
        );
        assert_eq!(logbook.list_comments(&on_new).unwrap().len(), 1);
        assert_eq!(logbook.list_recommendations(&on_new).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_climber_cascades() {
        let db = seeded();
        let logbook = db.logbook();
        let attempt = logbook
            .log_attempt(&NewAttempt::new("alice", diedre(), date(2024, 5, 1)).completed_in(None))
            .unwrap();
        logbook
            .add_comment(&NewComment::new("alice", diedre(), "nice"))
            .unwrap();

        db.climbers().delete_climber("alice").unwrap();

        assert!(logbook.get_attempt(attempt.id).unwrap().is_none());
        assert!(logbook.get_completion(attempt.id).unwrap().is_none());
        assert!(logbook
            .list_comments(&ActivityFilter::default())
            .unwrap()
            .is_empty());
    }
}
