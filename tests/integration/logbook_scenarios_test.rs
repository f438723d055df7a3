//! End-to-end logbook scenarios against an on-disk database.
//!
//! 1. Register a climber
//! 2. Log an attempt and mark it completed
//! 3. Rate the route, then change the rating through an update
//! 4. Reopen the file and read everything back

use chrono::NaiveDate;
use rusqlite::params;

use cragbook::catalog::{Crag, Route, RouteKey, Sector};
use cragbook::climbers::{ClimberLevel, Registration, Session};
use cragbook::logbook::{
    AscentTime, AscentType, AttemptUpdate, CompletionChange, NewAttempt, NewRecommendation, Rating,
};
use cragbook::storage::filter::{ActivityFilter, AttemptFilter};
use cragbook::storage::{Database, DatabaseError};

fn diedre() -> RouteKey {
    RouteKey::new("Diedre", "Paret Nord", "Montserrat")
}

fn seed_catalog(db: &Database) {
    let catalog = db.catalog();
    catalog
        .insert_crag(&Crag::new("Montserrat").with_location("Catalunya"))
        .unwrap();
    catalog
        .insert_sector(&Sector::new("Paret Nord", "Montserrat"))
        .unwrap();
    catalog
        .insert_route(&Route::new(diedre()).with_grade("6a+").with_height(180))
        .unwrap();
}

fn register_alice(db: &Database) -> Session {
    let mut registration = Registration::new("alice", "secret");
    registration.level = Some(ClimberLevel::Beginner);
    Session::register(&db.climbers(), registration).unwrap()
}

#[test]
fn test_flash_attempt_marked_completed() {
    let db = Database::open_in_memory().unwrap();
    seed_catalog(&db);
    register_alice(&db);

    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let attempt = db
        .logbook()
        .log_attempt(&NewAttempt::new("alice", diedre(), date).with_type(AscentType::Flash))
        .unwrap();
    assert!(!attempt.is_completed());

    db.logbook()
        .update_attempt(
            attempt.id,
            &AttemptUpdate {
                ascent_type: Some(AscentType::Flash),
                date,
                completion: CompletionChange::Completed(Some(
                    AscentTime::from_hms(0, 12, 30).unwrap(),
                )),
            },
        )
        .unwrap();

    let conn = db.connection();
    let attempts: i64 = conn
        .query_row("SELECT COUNT(*) FROM intent", [], |row| row.get(0))
        .unwrap();
    assert_eq!(attempts, 1);

    let (id, time): (i64, String) = conn
        .query_row(
            "SELECT e.id_intent, e.temps_ascensio FROM encadenament e
             JOIN intent i ON i.id_intent = e.id_intent
             WHERE i.nom_usuari_escalador = ?1 AND i.tipus_ascensio = 'Flash'
               AND i.data_intent = '2024-05-01'",
            params!["alice"],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(id, attempt.id);
    assert_eq!(time, "00:12:30");

    let level: String = conn
        .query_row(
            "SELECT nivell FROM escalador WHERE nom_usuari = 'alice'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(level, "Beginner");
}

#[test]
fn test_second_recommendation_must_be_an_update() {
    let db = Database::open_in_memory().unwrap();
    seed_catalog(&db);
    register_alice(&db);
    let logbook = db.logbook();

    let first = logbook
        .add_recommendation(&NewRecommendation::new(
            "alice",
            diedre(),
            Rating::new(4).unwrap(),
        ))
        .unwrap();

    let err = logbook
        .add_recommendation(&NewRecommendation::new(
            "alice",
            diedre(),
            Rating::new(5).unwrap(),
        ))
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UniqueConstraintViolation(_)));

    logbook
        .update_recommendation(first.id, Rating::new(5).unwrap(), None)
        .unwrap();

    let stored = logbook
        .find_recommendation("alice", &diedre())
        .unwrap()
        .expect("recommendation exists");
    assert_eq!(stored.id, first.id);
    assert_eq!(stored.rating.value(), 5);
    assert_eq!(
        logbook
            .list_recommendations(&ActivityFilter::default())
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_logbook_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cragbook.db");
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    {
        let db = Database::open(&path).unwrap();
        seed_catalog(&db);
        register_alice(&db);
        db.logbook()
            .log_attempt(
                &NewAttempt::new("alice", diedre(), date)
                    .with_type(AscentType::Flash)
                    .completed_in(AscentTime::from_hms(0, 12, 30).ok()),
            )
            .unwrap();
    }

    let db = Database::open(&path).unwrap();
    let session = Session::login(&db.climbers(), "alice", "secret").unwrap();
    let attempts = db
        .logbook()
        .list_attempts(&AttemptFilter::for_climber(session.username()).completed(true))
        .unwrap();
    assert_eq!(attempts.len(), 1);
    let completion = attempts[0].completion.as_ref().expect("completed");
    assert_eq!(
        completion.ascent_time.map(|t| t.to_string()).as_deref(),
        Some("00:12:30")
    );

    // Foreign keys stay enforced on the reopened connection
    let err = db
        .logbook()
        .log_attempt(&NewAttempt::new("alice", RouteKey::new("Nowhere", "Paret Nord", "Montserrat"), date))
        .unwrap_err();
    assert!(matches!(err, DatabaseError::ForeignKeyViolation(_)));
}

#[test]
fn test_route_triples_unique_across_sectors() {
    let db = Database::open_in_memory().unwrap();
    seed_catalog(&db);
    let catalog = db.catalog();
    catalog
        .insert_sector(&Sector::new("Agulles", "Montserrat"))
        .unwrap();

    // Same route name in another sector is a different route
    catalog
        .insert_route(&Route::new(RouteKey::new("Diedre", "Agulles", "Montserrat")))
        .unwrap();

    let err = catalog.insert_route(&Route::new(diedre())).unwrap_err();
    assert!(matches!(err, DatabaseError::UniqueConstraintViolation(_)));

    // Renaming a sector onto an existing name in the same crag is rejected too
    let err = catalog
        .update_sector(
            &cragbook::catalog::SectorKey::new("Agulles", "Montserrat"),
            &Sector::new("Paret Nord", "Montserrat"),
        )
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UniqueConstraintViolation(_)));
}
