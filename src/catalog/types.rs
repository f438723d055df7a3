//! Catalog types: crags, sectors and routes.
//!
//! Crags, sectors and routes are identified by natural keys. A sector is
//! qualified by its crag and a route by its sector and crag, so the same
//! route name may appear in two different sectors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A climbing area containing one or more sectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crag {
    /// Unique crag name
    pub name: String,
    /// Free-text location
    pub location: Option<String>,
    /// Free-text description
    pub description: Option<String>,
}

impl Crag {
    /// Create a crag with no location or description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            description: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Natural key of a sector: its name within a crag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorKey {
    pub name: String,
    pub crag: String,
}

impl SectorKey {
    pub fn new(name: impl Into<String>, crag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            crag: crag.into(),
        }
    }

    /// Key of a route inside this sector.
    pub fn route(&self, name: impl Into<String>) -> RouteKey {
        RouteKey {
            name: name.into(),
            sector: self.name.clone(),
            crag: self.crag.clone(),
        }
    }
}

impl fmt::Display for SectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.crag)
    }
}

/// A named sub-area of a crag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub key: SectorKey,
    pub description: Option<String>,
}

impl Sector {
    pub fn new(name: impl Into<String>, crag: impl Into<String>) -> Self {
        Self {
            key: SectorKey::new(name, crag),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Natural key of a route: (route, sector, crag).
///
/// Attempts, comments and recommendations carry this triple instead of a
/// surrogate route id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey {
    pub name: String,
    pub sector: String,
    pub crag: String,
}

impl RouteKey {
    pub fn new(
        name: impl Into<String>,
        sector: impl Into<String>,
        crag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            sector: sector.into(),
            crag: crag.into(),
        }
    }

    /// Key of the sector holding this route.
    pub fn sector_key(&self) -> SectorKey {
        SectorKey::new(self.sector.clone(), self.crag.clone())
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.sector, self.crag)
    }
}

/// A single climbable line within a sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub key: RouteKey,
    pub description: Option<String>,
    /// Difficulty grade, free text (e.g. "6a+", "V4")
    pub grade: Option<String>,
    /// Climbing style (e.g. "Sport", "Trad")
    pub style: Option<String>,
    /// Approximate height in metres
    pub height_m: Option<u32>,
    /// Name of whoever bolted the route
    pub equipper: Option<String>,
    /// When the route was equipped
    pub equipped_on: Option<NaiveDate>,
}

impl Route {
    /// Create a route with no metadata.
    pub fn new(key: RouteKey) -> Self {
        Self {
            key,
            description: None,
            grade: None,
            style: None,
            height_m: None,
            equipper: None,
            equipped_on: None,
        }
    }

    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = Some(grade.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_height(mut self, height_m: u32) -> Self {
        self.height_m = Some(height_m);
        self
    }

    pub fn with_equipper(mut self, equipper: impl Into<String>, on: Option<NaiveDate>) -> Self {
        self.equipper = Some(equipper.into());
        self.equipped_on = on;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
