//! Catalog of crags, sectors and routes.

pub mod types;

pub use types::{Crag, Route, RouteKey, Sector, SectorKey};
