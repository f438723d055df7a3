//! Catalog storage operations.
//!
//! Provides persistence for:
//! - Crags
//! - Sectors
//! - Routes
//!
//! Renames cascade to every dependent row through the schema's
//! `ON UPDATE CASCADE` keys; deletes cascade the same way.

use rusqlite::{params, Connection, OptionalExtension};

use crate::catalog::{Crag, Route, RouteKey, Sector, SectorKey};
use crate::logbook::types::DATE_FORMAT;
use crate::storage::database::{parse_date, require, DatabaseError};
use crate::storage::filter::{RouteFilter, WhereClause};

const ROUTE_COLUMNS: &str = "v.nom, v.nom_sector, v.nom_crag_sector, v.descripcio, v.grau_dificultat,
     v.estil, v.alcada_aproximada_metres, v.equipador, v.data_equipament";

/// Catalog store for crags, sectors and routes.
pub struct CatalogStore<'a> {
    conn: &'a Connection,
}

impl<'a> CatalogStore<'a> {
    /// Create a new catalog store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Crag Operations ==========

    /// Insert a new crag.
    pub fn insert_crag(&self, crag: &Crag) -> Result<(), DatabaseError> {
        require("crag name", &crag.name)?;

        self.conn.execute(
            "INSERT INTO crag (nom, localitzacio, descripcio) VALUES (?1, ?2, ?3)",
            params![crag.name, crag.location, crag.description],
        )?;

        tracing::info!(crag = %crag.name, "Added crag");
        Ok(())
    }

    /// Get a crag by name.
    pub fn get_crag(&self, name: &str) -> Result<Option<Crag>, DatabaseError> {
        let crag = self
            .conn
            .query_row(
                "SELECT nom, localitzacio, descripcio FROM crag WHERE nom = ?1",
                params![name],
                |row| {
                    Ok(Crag {
                        name: row.get(0)?,
                        location: row.get(1)?,
                        description: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(crag)
    }

    /// List all crags ordered by name.
    pub fn list_crags(&self) -> Result<Vec<Crag>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT nom, localitzacio, descripcio FROM crag ORDER BY nom")?;

        let rows = stmt.query_map([], |row| {
            Ok(Crag {
                name: row.get(0)?,
                location: row.get(1)?,
                description: row.get(2)?,
            })
        })?;

        let mut crags = Vec::new();
        for row in rows {
            crags.push(row?);
        }
        Ok(crags)
    }

    /// Update the crag currently named `name`. `crag.name` may differ to rename it.
    pub fn update_crag(&self, name: &str, crag: &Crag) -> Result<(), DatabaseError> {
        require("crag name", &crag.name)?;

        let rows_affected = self.conn.execute(
            "UPDATE crag SET nom = ?2, localitzacio = ?3, descripcio = ?4 WHERE nom = ?1",
            params![name, crag.name, crag.location, crag.description],
        )?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Crag {}", name)));
        }

        tracing::info!(crag = %name, renamed_to = %crag.name, "Updated crag");
        Ok(())
    }

    /// Delete a crag together with its sectors, routes and route activity.
    pub fn delete_crag(&self, name: &str) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM crag WHERE nom = ?1", params![name])?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Crag {}", name)));
        }

        tracing::info!(crag = %name, "Deleted crag");
        Ok(())
    }

    // ========== Sector Operations ==========

    /// Insert a new sector into an existing crag.
    pub fn insert_sector(&self, sector: &Sector) -> Result<(), DatabaseError> {
        require("sector name", &sector.key.name)?;
        require("crag", &sector.key.crag)?;

        self.conn.execute(
            "INSERT INTO sector (nom, nom_crag, descripcio) VALUES (?1, ?2, ?3)",
            params![sector.key.name, sector.key.crag, sector.description],
        )?;

        tracing::info!(sector = %sector.key, "Added sector");
        Ok(())
    }

    /// Get a sector by key.
    pub fn get_sector(&self, key: &SectorKey) -> Result<Option<Sector>, DatabaseError> {
        let sector = self
            .conn
            .query_row(
                "SELECT nom, nom_crag, descripcio FROM sector WHERE nom = ?1 AND nom_crag = ?2",
                params![key.name, key.crag],
                |row| {
                    Ok(Sector {
                        key: SectorKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                        description: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(sector)
    }

    /// List sectors, optionally restricted to one crag, ordered by crag then name.
    pub fn list_sectors(&self, crag: Option<&str>) -> Result<Vec<Sector>, DatabaseError> {
        let mut clause = WhereClause::new();
        if let Some(crag) = crag {
            clause.eq("nom_crag", crag.to_string());
        }

        let sql = format!(
            "SELECT nom, nom_crag, descripcio FROM sector{} ORDER BY nom_crag, nom",
            clause.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt.query_map(clause.params(), |row| {
            Ok(Sector {
                key: SectorKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                description: row.get(2)?,
            })
        })?;

        let mut sectors = Vec::new();
        for row in rows {
            sectors.push(row?);
        }
        Ok(sectors)
    }

    /// Update the sector at `key`; `sector.key` may rename it or move it to another crag.
    pub fn update_sector(&self, key: &SectorKey, sector: &Sector) -> Result<(), DatabaseError> {
        require("sector name", &sector.key.name)?;
        require("crag", &sector.key.crag)?;

        let rows_affected = self.conn.execute(
            "UPDATE sector SET nom = ?3, nom_crag = ?4, descripcio = ?5
             WHERE nom = ?1 AND nom_crag = ?2",
            params![
                key.name,
                key.crag,
                sector.key.name,
                sector.key.crag,
                sector.description
            ],
        )?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Sector {}", key)));
        }

        tracing::info!(sector = %key, "Updated sector");
        Ok(())
    }

    /// Delete a sector together with its routes and their activity.
    pub fn delete_sector(&self, key: &SectorKey) -> Result<(), DatabaseError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM sector WHERE nom = ?1 AND nom_crag = ?2",
            params![key.name, key.crag],
        )?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Sector {}", key)));
        }

        tracing::info!(sector = %key, "Deleted sector");
        Ok(())
    }

    // ========== Route Operations ==========

    /// Insert a new route into an existing sector.
    pub fn insert_route(&self, route: &Route) -> Result<(), DatabaseError> {
        require("route name", &route.key.name)?;
        require("sector", &route.key.sector)?;
        require("crag", &route.key.crag)?;

        self.conn.execute(
            "INSERT INTO via (nom, nom_sector, nom_crag_sector, descripcio, grau_dificultat,
             estil, alcada_aproximada_metres, equipador, data_equipament)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                route.key.name,
                route.key.sector,
                route.key.crag,
                route.description,
                route.grade,
                route.style,
                route.height_m,
                route.equipper,
                route
                    .equipped_on
                    .map(|d| d.format(DATE_FORMAT).to_string()),
            ],
        )?;

        tracing::info!(route = %route.key, "Added route");
        Ok(())
    }

    /// Get a route by key.
    pub fn get_route(&self, key: &RouteKey) -> Result<Option<Route>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM via v WHERE v.nom = ?1 AND v.nom_sector = ?2 AND v.nom_crag_sector = ?3",
            ROUTE_COLUMNS
        );
        let row = self
            .conn
            .query_row(
                &sql,
                params![key.name, key.sector, key.crag],
                RouteRow::from_row,
            )
            .optional()?;

        row.map(RouteRow::into_route).transpose()
    }

    /// List routes matching the filter, ordered by crag, sector and name.
    pub fn list_routes(&self, filter: &RouteFilter) -> Result<Vec<Route>, DatabaseError> {
        let mut clause = WhereClause::new();
        filter.apply(&mut clause);

        let sql = format!(
            "SELECT {} FROM via v{} ORDER BY v.nom_crag_sector, v.nom_sector, v.nom",
            ROUTE_COLUMNS,
            clause.sql()
        );
        tracing::debug!(?filter, "Listing routes");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(clause.params(), RouteRow::from_row)?;

        let mut routes = Vec::new();
        for row in rows {
            routes.push(row?.into_route()?);
        }
        Ok(routes)
    }

    /// Update the route at `key`; `route.key` may rename or move it.
    pub fn update_route(&self, key: &RouteKey, route: &Route) -> Result<(), DatabaseError> {
        require("route name", &route.key.name)?;
        require("sector", &route.key.sector)?;
        require("crag", &route.key.crag)?;

        let rows_affected = self.conn.execute(
            "UPDATE via SET nom = ?4, nom_sector = ?5, nom_crag_sector = ?6, descripcio = ?7,
             grau_dificultat = ?8, estil = ?9, alcada_aproximada_metres = ?10,
             equipador = ?11, data_equipament = ?12
             WHERE nom = ?1 AND nom_sector = ?2 AND nom_crag_sector = ?3",
            params![
                key.name,
                key.sector,
                key.crag,
                route.key.name,
                route.key.sector,
                route.key.crag,
                route.description,
                route.grade,
                route.style,
                route.height_m,
                route.equipper,
                route
                    .equipped_on
                    .map(|d| d.format(DATE_FORMAT).to_string()),
            ],
        )?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Route {}", key)));
        }

        tracing::info!(route = %key, "Updated route");
        Ok(())
    }

    /// Delete a route together with its attempts, comments and recommendations.
    pub fn delete_route(&self, key: &RouteKey) -> Result<(), DatabaseError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM via WHERE nom = ?1 AND nom_sector = ?2 AND nom_crag_sector = ?3",
            params![key.name, key.sector, key.crag],
        )?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Route {}", key)));
        }

        tracing::info!(route = %key, "Deleted route");
        Ok(())
    }

    /// Distinct difficulty grades in use, sorted.
    pub fn list_grades(&self) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT grau_dificultat FROM via
             WHERE grau_dificultat IS NOT NULL AND grau_dificultat <> ''
             ORDER BY grau_dificultat",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut grades = Vec::new();
        for row in rows {
            grades.push(row?);
        }
        Ok(grades)
    }
}

/// Intermediate struct for reading route rows from database.
struct RouteRow {
    name: String,
    sector: String,
    crag: String,
    description: Option<String>,
    grade: Option<String>,
    style: Option<String>,
    height_m: Option<u32>,
    equipper: Option<String>,
    equipped_on: Option<String>,
}

impl RouteRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            sector: row.get(1)?,
            crag: row.get(2)?,
            description: row.get(3)?,
            grade: row.get(4)?,
            style: row.get(5)?,
            height_m: row.get(6)?,
            equipper: row.get(7)?,
            equipped_on: row.get(8)?,
        })
    }

    fn into_route(self) -> Result<Route, DatabaseError> {
        let equipped_on = self
            .equipped_on
            .as_deref()
            .map(|s| parse_date("data_equipament", s))
            .transpose()?;

        Ok(Route {
            key: RouteKey::new(self.name, self.sector, self.crag),
            description: self.description,
            grade: self.grade,
            style: self.style,
            height_m: self.height_m,
            equipper: self.equipper,
            equipped_on,
        })
    }
}
