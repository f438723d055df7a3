//! Storage module for database and configuration.

pub mod catalog_store;
pub mod climber_store;
pub mod config;
pub mod database;
pub mod filter;
pub mod logbook_store;
pub mod schema;
pub mod stats_store;

pub use catalog_store::CatalogStore;
pub use climber_store::ClimberStore;
pub use config::{AppConfig, ConfigError, DashboardSettings, DatabaseSettings, LoggingSettings};
pub use database::{Database, DatabaseError};
pub use filter::{ActivityFilter, AttemptFilter, RouteFilter};
pub use logbook_store::LogbookStore;
pub use stats_store::{
    ActivityEntry, AscentTypeCount, ClimberSummary, GradeCount, RatedRoute, RatingCount,
    StatsStore, Totals,
};
