//! Typed listing filters.
//!
//! Each filter enumerates the fields a listing may be narrowed by. Filters
//! compile into a [`WhereClause`]: fixed SQL fragments plus bound parameters,
//! so caller-supplied values never become part of the SQL text.

use chrono::NaiveDate;
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

use crate::catalog::RouteKey;
use crate::logbook::AscentType;
use crate::logbook::types::DATE_FORMAT;

/// Conditions and their bound parameters, joined with `AND`.
#[derive(Default)]
pub struct WhereClause {
    conditions: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `column = ?` bound to `value`.
    pub fn eq<T: ToSql + 'static>(&mut self, column: &str, value: T) -> &mut Self {
        self.conditions.push(format!("{} = ?", column));
        self.params.push(Box::new(value));
        self
    }

    /// Add a condition containing exactly one `?` placeholder.
    pub fn bind<T: ToSql + 'static>(&mut self, condition: String, value: T) -> &mut Self {
        self.conditions.push(condition);
        self.params.push(Box::new(value));
        self
    }

    /// Add a condition with no parameters.
    pub fn condition(&mut self, condition: impl Into<String>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// SQL to append after the FROM/JOIN part, with a leading space.
    pub fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Bound parameters in placeholder order.
    pub fn params(&self) -> impl rusqlite::Params + '_ {
        rusqlite::params_from_iter(self.params.iter())
    }
}

/// Filter for route listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFilter {
    pub crag: Option<String>,
    pub sector: Option<String>,
    pub grade: Option<String>,
}

impl RouteFilter {
    pub fn in_crag(crag: impl Into<String>) -> Self {
        Self {
            crag: Some(crag.into()),
            ..Default::default()
        }
    }

    pub fn sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = Some(grade.into());
        self
    }

    /// Apply to a query where `via` is aliased as `v`.
    pub fn apply(&self, clause: &mut WhereClause) {
        if let Some(crag) = &self.crag {
            clause.eq("v.nom_crag_sector", crag.clone());
        }
        if let Some(sector) = &self.sector {
            clause.eq("v.nom_sector", sector.clone());
        }
        if let Some(grade) = &self.grade {
            clause.eq("v.grau_dificultat", grade.clone());
        }
    }
}

/// Filter shared by attempts, completions, comments and recommendations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFilter {
    pub climber: Option<String>,
    pub crag: Option<String>,
    pub sector: Option<String>,
    pub route: Option<String>,
    pub grade: Option<String>,
    /// Inclusive lower bound on the activity date
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the activity date
    pub date_to: Option<NaiveDate>,
}

impl ActivityFilter {
    pub fn for_climber(climber: impl Into<String>) -> Self {
        Self {
            climber: Some(climber.into()),
            ..Default::default()
        }
    }

    pub fn crag(mut self, crag: impl Into<String>) -> Self {
        self.crag = Some(crag.into());
        self
    }

    /// Narrow to one route.
    pub fn on_route(mut self, route: &RouteKey) -> Self {
        self.crag = Some(route.crag.clone());
        self.sector = Some(route.sector.clone());
        self.route = Some(route.name.clone());
        self
    }

    pub fn grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = Some(grade.into());
        self
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Apply to a query where the activity table is aliased as `alias`,
    /// its date column is `date_column`, and `via` is joined as `v`.
    pub fn apply(&self, clause: &mut WhereClause, alias: &str, date_column: &str) {
        if let Some(climber) = &self.climber {
            clause.eq(&format!("{}.nom_usuari_escalador", alias), climber.clone());
        }
        if let Some(crag) = &self.crag {
            clause.eq(&format!("{}.nom_crag_via", alias), crag.clone());
        }
        if let Some(sector) = &self.sector {
            clause.eq(&format!("{}.nom_sector_via", alias), sector.clone());
        }
        if let Some(route) = &self.route {
            clause.eq(&format!("{}.nom_via", alias), route.clone());
        }
        if let Some(grade) = &self.grade {
            clause.eq("v.grau_dificultat", grade.clone());
        }
        if let Some(from) = self.date_from {
            clause.bind(
                format!("date({}.{}) >= ?", alias, date_column),
                from.format(DATE_FORMAT).to_string(),
            );
        }
        if let Some(to) = self.date_to {
            clause.bind(
                format!("date({}.{}) <= ?", alias, date_column),
                to.format(DATE_FORMAT).to_string(),
            );
        }
    }
}

/// Filter for attempt listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptFilter {
    #[serde(flatten)]
    pub activity: ActivityFilter,
    pub ascent_type: Option<AscentType>,
    /// `Some(true)` keeps only completed attempts, `Some(false)` only open ones
    pub completed: Option<bool>,
}

impl AttemptFilter {
    pub fn for_climber(climber: impl Into<String>) -> Self {
        Self {
            activity: ActivityFilter::for_climber(climber),
            ..Default::default()
        }
    }

    pub fn ascent_type(mut self, ascent_type: AscentType) -> Self {
        self.ascent_type = Some(ascent_type);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Apply to a query with `intent i LEFT JOIN encadenament e` and `via v`.
    pub fn apply(&self, clause: &mut WhereClause) {
        self.activity.apply(clause, "i", "data_intent");
        if let Some(ascent_type) = self.ascent_type {
            clause.eq("i.tipus_ascensio", ascent_type.as_str());
        }
        match self.completed {
            Some(true) => {
                clause.condition("e.id_intent IS NOT NULL");
            }
            Some(false) => {
                clause.condition("e.id_intent IS NULL");
            }
            None => {}
        }
    }
}
