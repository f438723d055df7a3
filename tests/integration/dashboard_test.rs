//! Admin and climber dashboards driven through the public API.

use chrono::NaiveDate;

use cragbook::catalog::{Crag, Route, RouteKey, Sector};
use cragbook::climbers::{Registration, Session};
use cragbook::dashboard::{
    dispatch, dispatch_with, ClimberDesk, DeskError, Surface, View, ViewPage, ViewRequest,
};
use cragbook::logbook::{AscentTime, AscentType, NewAttempt, Rating};
use cragbook::storage::config::DashboardSettings;
use cragbook::storage::filter::{ActivityFilter, AttemptFilter};
use cragbook::storage::Database;

fn route(name: &str) -> RouteKey {
    RouteKey::new(name, "Paret Nord", "Montserrat")
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

/// Catalog created by alice from her desk, activity from alice and bob.
fn setup() -> Database {
    let db = Database::open_in_memory().unwrap();
    Session::register(&db.climbers(), Registration::new("alice", "a")).unwrap();
    Session::register(&db.climbers(), Registration::new("bob", "b")).unwrap();

    let alice = ClimberDesk::login(&db, "alice", "a").unwrap();
    alice.add_crag(&Crag::new("Montserrat")).unwrap();
    alice
        .add_sector(&Sector::new("Paret Nord", "Montserrat"))
        .unwrap();
    alice
        .add_route(&Route::new(route("Diedre")).with_grade("6a+"))
        .unwrap();
    alice
        .add_route(&Route::new(route("Esperó")).with_grade("6b"))
        .unwrap();

    alice
        .log_attempt(
            &NewAttempt::new("alice", route("Diedre"), day(1))
                .with_type(AscentType::Flash)
                .completed_in(AscentTime::from_hms(0, 12, 30).ok()),
        )
        .unwrap();
    alice
        .log_attempt(&NewAttempt::new("alice", route("Esperó"), day(2)))
        .unwrap();
    alice
        .recommend(route("Diedre"), Rating::new(5).unwrap(), Some("Classic"))
        .unwrap();
    alice.comment(route("Diedre"), "Polished start").unwrap();

    let bob = ClimberDesk::login(&db, "bob", "b").unwrap();
    bob.log_attempt(
        &NewAttempt::new("bob", route("Esperó"), day(3))
            .with_type(AscentType::Onsight)
            .completed_in(None),
    )
    .unwrap();
    bob.recommend(route("Esperó"), Rating::new(3).unwrap(), None)
        .unwrap();
    bob.recommend(route("Diedre"), Rating::new(4).unwrap(), None)
        .unwrap();

    db
}

#[test]
fn test_every_view_renders_for_admin() {
    let db = setup();
    for view in View::ALL {
        let page = dispatch(&db, &Surface::Admin, ViewRequest::unfiltered(view)).unwrap();
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("view").is_some(), "{} has no tag", view);
    }
}

#[test]
fn test_admin_overview_numbers() {
    let db = setup();
    let settings = DashboardSettings {
        top_routes_limit: 1,
        recent_activity_limit: 2,
    };
    let page = dispatch_with(&db, &Surface::Admin, ViewRequest::Dashboard, &settings).unwrap();
    let ViewPage::AdminOverview(overview) = page else {
        panic!("expected the admin overview");
    };

    assert_eq!(overview.totals.crags, 1);
    assert_eq!(overview.totals.routes, 2);
    assert_eq!(overview.totals.climbers, 2);
    assert_eq!(overview.totals.attempts, 3);
    assert_eq!(overview.routes_by_grade.len(), 2);

    assert_eq!(overview.top_rated_routes.len(), 1);
    assert_eq!(overview.top_rated_routes[0].route, route("Diedre"));

    assert_eq!(overview.recent_activity.len(), 2);
    assert_eq!(overview.recent_activity[0].climber, "bob");
}

#[test]
fn test_climber_sees_only_own_activity() {
    let db = setup();
    let alice = Session::login(&db.climbers(), "alice", "a").unwrap();
    let surface = Surface::Climber(alice);

    let page = dispatch(
        &db,
        &surface,
        ViewRequest::Attempts(AttemptFilter::default()),
    )
    .unwrap();
    let ViewPage::Attempts(attempts) = page else {
        panic!("expected attempts");
    };
    assert_eq!(attempts.len(), 2);
    assert!(attempts.iter().all(|a| a.climber == "alice"));

    let page = dispatch(
        &db,
        &surface,
        ViewRequest::Recommendations(ActivityFilter::default()),
    )
    .unwrap();
    let ViewPage::Recommendations(recommendations) = page else {
        panic!("expected recommendations");
    };
    assert_eq!(recommendations.recommendations.len(), 1);
    assert_eq!(recommendations.distribution.len(), 1);
    assert_eq!(recommendations.distribution[0].rating, 5);

    assert!(matches!(
        dispatch(&db, &surface, ViewRequest::Climbers),
        Err(DeskError::ViewUnavailable(_))
    ));
}

#[test]
fn test_completions_page_breakdowns() {
    let db = setup();
    let page = dispatch(
        &db,
        &Surface::Admin,
        ViewRequest::Completions(ActivityFilter::default()),
    )
    .unwrap();
    let ViewPage::Completions(completions) = page else {
        panic!("expected completions");
    };

    assert_eq!(completions.completions.len(), 2);
    assert_eq!(completions.completions[0].climber, "bob");
    assert_eq!(completions.completions[0].grade.as_deref(), Some("6b"));
    assert_eq!(completions.by_grade.len(), 2);
    assert_eq!(completions.by_ascent_type.len(), 2);
}

#[test]
fn test_bob_cannot_edit_alices_comment() {
    let db = setup();
    let comment_id = db
        .logbook()
        .list_comments(&ActivityFilter::for_climber("alice"))
        .unwrap()[0]
        .id;

    let bob = ClimberDesk::login(&db, "bob", "b").unwrap();
    assert!(matches!(
        bob.edit_comment(comment_id, "Not polished at all"),
        Err(DeskError::PermissionDenied(_))
    ));
    assert_eq!(
        db.logbook().get_comment(comment_id).unwrap().unwrap().text,
        "Polished start"
    );
}
