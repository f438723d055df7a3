//! Aggregate queries behind the dashboards.
//!
//! Provides:
//! - Catalog and activity totals
//! - Route counts per grade
//! - Best rated routes and recent activity
//! - Per-climber attempt/completion summaries
//! - Completion and rating breakdowns narrowed by an [`ActivityFilter`]

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::catalog::RouteKey;
use crate::climbers::ClimberLevel;
use crate::logbook::AscentType;
use crate::storage::climber_store::parse_level;
use crate::storage::database::{parse_date, DatabaseError};
use crate::storage::filter::{ActivityFilter, WhereClause};
use crate::storage::logbook_store::parse_ascent_type;

/// Row counts shown on the admin overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub crags: u64,
    pub routes: u64,
    pub climbers: u64,
    pub attempts: u64,
}

/// Number of routes or completions at a grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCount {
    pub grade: String,
    pub count: u64,
}

/// A route with its average recommendation rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedRoute {
    pub route: RouteKey,
    pub average_rating: f64,
    pub ratings: u64,
}

/// One line of the recent activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub climber: String,
    pub route: RouteKey,
    pub ascent_type: Option<AscentType>,
    pub date: NaiveDate,
}

/// Attempts and completions of one climber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClimberSummary {
    pub username: String,
    pub level: Option<ClimberLevel>,
    pub attempts: u64,
    pub completions: u64,
}

/// Completions of one ascent type; `None` groups attempts logged without a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AscentTypeCount {
    pub ascent_type: Option<AscentType>,
    pub count: u64,
}

/// Number of recommendations with a given rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingCount {
    pub rating: u8,
    pub count: u64,
}

const COMPLETION_JOIN: &str = "FROM encadenament e
     JOIN intent i ON e.id_intent = i.id_intent
     JOIN via v ON v.nom = i.nom_via AND v.nom_sector = i.nom_sector_via
        AND v.nom_crag_sector = i.nom_crag_via";

const RECOMMENDATION_JOIN: &str = "FROM recomanacio r
     JOIN via v ON v.nom = r.nom_via AND v.nom_sector = r.nom_sector_via
        AND v.nom_crag_sector = r.nom_crag_via";

/// Stats store for read-only aggregates.
pub struct StatsStore<'a> {
    conn: &'a Connection,
}

impl<'a> StatsStore<'a> {
    /// Create a new stats store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn count(&self, table: &str) -> Result<u64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Crags, routes, climbers and attempts currently stored.
    pub fn totals(&self) -> Result<Totals, DatabaseError> {
        Ok(Totals {
            crags: self.count("crag")?,
            routes: self.count("via")?,
            climbers: self.count("escalador")?,
            attempts: self.count("intent")?,
        })
    }

    /// Routes per grade, most common grade first. Ungraded routes are skipped.
    pub fn routes_by_grade(&self) -> Result<Vec<GradeCount>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT grau_dificultat, COUNT(*) AS n FROM via
             WHERE grau_dificultat IS NOT NULL
             GROUP BY grau_dificultat
             ORDER BY n DESC, grau_dificultat",
        )?;
        let rows = stmt.query_map([], grade_count)?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// Routes with the highest average rating.
    pub fn top_rated_routes(&self, limit: usize) -> Result<Vec<RatedRoute>, DatabaseError> {
        self.average_rating_by_route(&ActivityFilter::default(), limit)
    }

    /// Latest attempts across all climbers.
    pub fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT i.nom_usuari_escalador, i.nom_via, i.nom_sector_via, i.nom_crag_via,
             i.tipus_ascensio, i.data_intent
             FROM intent i
             JOIN escalador c ON c.nom_usuari = i.nom_usuari_escalador
             ORDER BY i.data_intent DESC, i.id_intent DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                RouteKey::new(
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ),
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (climber, route, ascent_type, date) = row?;
            entries.push(ActivityEntry {
                climber,
                route,
                ascent_type: parse_ascent_type(ascent_type.as_deref()),
                date: parse_date("data_intent", &date)?,
            });
        }
        Ok(entries)
    }

    /// Attempts and completions per climber, ordered by username.
    pub fn climber_summaries(&self) -> Result<Vec<ClimberSummary>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.nom_usuari, c.nivell,
                (SELECT COUNT(*) FROM intent i WHERE i.nom_usuari_escalador = c.nom_usuari),
                (SELECT COUNT(*) FROM encadenament e
                    JOIN intent i ON e.id_intent = i.id_intent
                    WHERE i.nom_usuari_escalador = c.nom_usuari)
             FROM escalador c
             ORDER BY c.nom_usuari",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (username, level, attempts, completions) = row?;
            summaries.push(ClimberSummary {
                username,
                level: parse_level(level.as_deref()),
                attempts: attempts as u64,
                completions: completions as u64,
            });
        }
        Ok(summaries)
    }

    /// Completed ascents per route grade.
    pub fn completions_by_grade(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<GradeCount>, DatabaseError> {
        let mut clause = WhereClause::new();
        filter.apply(&mut clause, "i", "data_intent");
        clause.condition("v.grau_dificultat IS NOT NULL");

        let sql = format!(
            "SELECT v.grau_dificultat, COUNT(*) AS n {}{}
             GROUP BY v.grau_dificultat
             ORDER BY v.grau_dificultat",
            COMPLETION_JOIN,
            clause.sql()
        );
        tracing::debug!(?filter, "Counting completions by grade");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(clause.params(), grade_count)?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// Completed ascents per ascent type.
    pub fn completions_by_ascent_type(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<AscentTypeCount>, DatabaseError> {
        let mut clause = WhereClause::new();
        filter.apply(&mut clause, "i", "data_intent");

        let sql = format!(
            "SELECT i.tipus_ascensio, COUNT(*) AS n {}{}
             GROUP BY i.tipus_ascensio
             ORDER BY n DESC, i.tipus_ascensio",
            COMPLETION_JOIN,
            clause.sql()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(clause.params(), |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
        })?;

        // Blank, NULL and unrecognised types all mean "no type"; merge them into one bucket
        let mut counts: Vec<AscentTypeCount> = Vec::new();
        for row in rows {
            let (label, count) = row?;
            let ascent_type = parse_ascent_type(label.as_deref());
            match counts.iter_mut().find(|c| c.ascent_type == ascent_type) {
                Some(existing) => existing.count += count as u64,
                None => counts.push(AscentTypeCount {
                    ascent_type,
                    count: count as u64,
                }),
            }
        }
        Ok(counts)
    }

    /// Average rating per route, best first.
    pub fn average_rating_by_route(
        &self,
        filter: &ActivityFilter,
        limit: usize,
    ) -> Result<Vec<RatedRoute>, DatabaseError> {
        let mut clause = WhereClause::new();
        filter.apply(&mut clause, "r", "data_recomanacio");

        let sql = format!(
            "SELECT r.nom_via, r.nom_sector_via, r.nom_crag_via,
                AVG(r.puntuacio) AS average, COUNT(*) AS n {}{}
             GROUP BY r.nom_via, r.nom_sector_via, r.nom_crag_via
             ORDER BY average DESC, n DESC, r.nom_crag_via, r.nom_sector_via, r.nom_via
             LIMIT {}",
            RECOMMENDATION_JOIN,
            clause.sql(),
            limit
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(clause.params(), |row| {
            Ok(RatedRoute {
                route: RouteKey::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ),
                average_rating: row.get(3)?,
                ratings: row.get::<_, i64>(4)? as u64,
            })
        })?;

        let mut routes = Vec::new();
        for row in rows {
            routes.push(row?);
        }
        Ok(routes)
    }

    /// Recommendations per rating value, 1 through 5. Ratings nobody gave are omitted.
    pub fn rating_distribution(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<RatingCount>, DatabaseError> {
        let mut clause = WhereClause::new();
        filter.apply(&mut clause, "r", "data_recomanacio");

        let sql = format!(
            "SELECT r.puntuacio, COUNT(*) {}{}
             GROUP BY r.puntuacio
             ORDER BY r.puntuacio",
            RECOMMENDATION_JOIN,
            clause.sql()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(clause.params(), |row| {
            Ok(RatingCount {
                rating: row.get(0)?,
                count: row.get::<_, i64>(1)? as u64,
            })
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}

fn grade_count(row: &rusqlite::Row<'_>) -> rusqlite::Result<GradeCount> {
    Ok(GradeCount {
        grade: row.get(0)?,
        count: row.get::<_, i64>(1)? as u64,
    })
}
