//! Cascading deletes and renames across the catalog and the logbook.

use chrono::NaiveDate;

use cragbook::catalog::{Crag, Route, RouteKey, Sector, SectorKey};
use cragbook::climbers::Climber;
use cragbook::logbook::{AscentType, NewAttempt, NewComment, NewRecommendation, Rating};
use cragbook::storage::filter::{ActivityFilter, AttemptFilter, RouteFilter};
use cragbook::storage::schema::TABLES;
use cragbook::storage::Database;

fn row_count(db: &Database, table: &str) -> i64 {
    db.connection()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap()
}

/// Two crags with one route each, and activity from two climbers on both.
fn populated() -> Database {
    let db = Database::open_in_memory().unwrap();
    let catalog = db.catalog();
    for (crag, sector, route) in [
        ("Montserrat", "Paret Nord", "Diedre"),
        ("Siurana", "El Pati", "Migranya"),
    ] {
        catalog.insert_crag(&Crag::new(crag)).unwrap();
        catalog.insert_sector(&Sector::new(sector, crag)).unwrap();
        catalog
            .insert_route(&Route::new(RouteKey::new(route, sector, crag)))
            .unwrap();
    }

    for username in ["alice", "bob"] {
        db.climbers()
            .insert_climber(&Climber::new(username, "pw"))
            .unwrap();
    }

    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let logbook = db.logbook();
    for route in [
        RouteKey::new("Diedre", "Paret Nord", "Montserrat"),
        RouteKey::new("Migranya", "El Pati", "Siurana"),
    ] {
        for climber in ["alice", "bob"] {
            logbook
                .log_attempt(
                    &NewAttempt::new(climber, route.clone(), date)
                        .with_type(AscentType::Redpoint)
                        .completed_in(None),
                )
                .unwrap();
            logbook
                .add_comment(&NewComment::new(climber, route.clone(), "Good"))
                .unwrap();
            logbook
                .add_recommendation(&NewRecommendation::new(
                    climber,
                    route.clone(),
                    Rating::new(4).unwrap(),
                ))
                .unwrap();
        }
    }
    db
}

#[test]
fn test_delete_crag_removes_everything_below_it() {
    let db = populated();
    db.catalog().delete_crag("Montserrat").unwrap();

    let catalog = db.catalog();
    assert!(catalog.get_crag("Montserrat").unwrap().is_none());
    assert!(catalog
        .get_sector(&SectorKey::new("Paret Nord", "Montserrat"))
        .unwrap()
        .is_none());
    assert!(catalog
        .list_routes(&RouteFilter::in_crag("Montserrat"))
        .unwrap()
        .is_empty());

    let montserrat = ActivityFilter::default().crag("Montserrat");
    let logbook = db.logbook();
    assert!(logbook
        .list_attempts(&AttemptFilter {
            activity: montserrat.clone(),
            ..Default::default()
        })
        .unwrap()
        .is_empty());
    assert!(logbook.list_completions(&montserrat).unwrap().is_empty());
    assert!(logbook.list_comments(&montserrat).unwrap().is_empty());
    assert!(logbook
        .list_recommendations(&montserrat)
        .unwrap()
        .is_empty());

    // Siurana is untouched
    assert_eq!(row_count(&db, "intent"), 2);
    assert_eq!(row_count(&db, "encadenament"), 2);
    assert_eq!(row_count(&db, "comentari"), 2);
    assert_eq!(row_count(&db, "recomanacio"), 2);
}

#[test]
fn test_no_orphaned_completions_after_deletes() {
    let db = populated();
    let logbook = db.logbook();

    let attempts = logbook.list_attempts(&AttemptFilter::for_climber("bob")).unwrap();
    for attempt in &attempts {
        logbook.delete_attempt(attempt.id).unwrap();
    }
    db.catalog()
        .delete_route(&RouteKey::new("Migranya", "El Pati", "Siurana"))
        .unwrap();
    db.climbers().delete_climber("alice").unwrap();

    let orphans: i64 = db
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM encadenament e
             LEFT JOIN intent i ON i.id_intent = e.id_intent
             WHERE i.id_intent IS NULL",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);
    assert_eq!(row_count(&db, "encadenament"), 0);
}

#[test]
fn test_crag_rename_propagates_everywhere() {
    let db = populated();
    db.catalog()
        .update_crag("Siurana", &Crag::new("Siurana de Prades"))
        .unwrap();

    let renamed = RouteKey::new("Migranya", "El Pati", "Siurana de Prades");
    assert!(db.catalog().get_route(&renamed).unwrap().is_some());

    let on_route = ActivityFilter::default().on_route(&renamed);
    let logbook = db.logbook();
    assert_eq!(
        logbook
            .list_attempts(&AttemptFilter {
                activity: on_route.clone(),
                ..Default::default()
            })
            .unwrap()
            .len(),
        2
    );
    assert_eq!(logbook.list_comments(&on_route).unwrap().len(), 2);
    assert_eq!(logbook.list_recommendations(&on_route).unwrap().len(), 2);

    assert!(logbook
        .list_comments(&ActivityFilter::default().crag("Siurana"))
        .unwrap()
        .is_empty());
}

#[test]
fn test_deleting_everything_leaves_empty_tables() {
    let db = populated();
    db.catalog().delete_crag("Montserrat").unwrap();
    db.catalog().delete_crag("Siurana").unwrap();
    db.climbers().delete_climber("alice").unwrap();
    db.climbers().delete_climber("bob").unwrap();

    for table in TABLES {
        assert_eq!(row_count(&db, table), 0, "{} not empty", table);
    }
}
