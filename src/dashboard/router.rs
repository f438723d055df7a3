//! View dispatch for the admin and climber dashboards.

use serde::{Deserialize, Serialize};

use crate::catalog::{Crag, Route, Sector};
use crate::climbers::Session;
use crate::dashboard::DeskError;
use crate::logbook::{Attempt, Comment, CompletedAscent, Recommendation};
use crate::storage::config::DashboardSettings;
use crate::storage::database::Database;
use crate::storage::filter::{ActivityFilter, AttemptFilter, RouteFilter};
use crate::storage::stats_store::{
    ActivityEntry, AscentTypeCount, ClimberSummary, GradeCount, RatedRoute, RatingCount, Totals,
};

/// Navigable dashboard pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum View {
    /// Totals, charts and recent activity
    #[default]
    Dashboard,
    Crags,
    Sectors,
    Routes,
    /// Registered climbers (admin only)
    Climbers,
    Attempts,
    Completions,
    Comments,
    Recommendations,
}

impl View {
    pub const ALL: [View; 9] = [
        View::Dashboard,
        View::Crags,
        View::Sectors,
        View::Routes,
        View::Climbers,
        View::Attempts,
        View::Completions,
        View::Comments,
        View::Recommendations,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Crags => "Crags",
            View::Sectors => "Sectors",
            View::Routes => "Routes",
            View::Climbers => "Climbers",
            View::Attempts => "Attempts",
            View::Completions => "Completions",
            View::Comments => "Comments",
            View::Recommendations => "Recommendations",
        }
    }

    /// Look up a page by name, ignoring case.
    pub fn from_name(name: &str) -> Option<View> {
        let name = name.trim();
        View::ALL
            .into_iter()
            .find(|view| view.name().eq_ignore_ascii_case(name))
    }

    /// Whether the page can be opened from `surface`.
    pub fn is_available_to(&self, surface: &Surface) -> bool {
        match surface {
            Surface::Admin => true,
            Surface::Climber(_) => *self != View::Climbers,
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Who is looking at the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    /// Unrestricted administration surface
    Admin,
    /// A logged-in climber; activity pages only show their own records
    Climber(Session),
}

/// A page together with its typed inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewRequest {
    Dashboard,
    Crags,
    Sectors { crag: Option<String> },
    Routes(RouteFilter),
    Climbers,
    Attempts(AttemptFilter),
    Completions(ActivityFilter),
    Comments(ActivityFilter),
    Recommendations(ActivityFilter),
}

impl ViewRequest {
    /// The page with no narrowing applied.
    pub fn unfiltered(view: View) -> Self {
        match view {
            View::Dashboard => ViewRequest::Dashboard,
            View::Crags => ViewRequest::Crags,
            View::Sectors => ViewRequest::Sectors { crag: None },
            View::Routes => ViewRequest::Routes(RouteFilter::default()),
            View::Climbers => ViewRequest::Climbers,
            View::Attempts => ViewRequest::Attempts(AttemptFilter::default()),
            View::Completions => ViewRequest::Completions(ActivityFilter::default()),
            View::Comments => ViewRequest::Comments(ActivityFilter::default()),
            View::Recommendations => ViewRequest::Recommendations(ActivityFilter::default()),
        }
    }

    pub fn view(&self) -> View {
        match self {
            ViewRequest::Dashboard => View::Dashboard,
            ViewRequest::Crags => View::Crags,
            ViewRequest::Sectors { .. } => View::Sectors,
            ViewRequest::Routes(_) => View::Routes,
            ViewRequest::Climbers => View::Climbers,
            ViewRequest::Attempts(_) => View::Attempts,
            ViewRequest::Completions(_) => View::Completions,
            ViewRequest::Comments(_) => View::Comments,
            ViewRequest::Recommendations(_) => View::Recommendations,
        }
    }
}

/// Admin landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminOverview {
    pub totals: Totals,
    pub routes_by_grade: Vec<GradeCount>,
    pub top_rated_routes: Vec<RatedRoute>,
    pub recent_activity: Vec<ActivityEntry>,
}

/// Climber landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimberOverview {
    pub totals: Totals,
    pub summary: Option<ClimberSummary>,
    pub completions_by_grade: Vec<GradeCount>,
    pub completions_by_ascent_type: Vec<AscentTypeCount>,
    pub recent_attempts: Vec<Attempt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutesPage {
    pub routes: Vec<Route>,
    /// Every grade in the catalog, for the grade selector
    pub grades: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionsPage {
    pub completions: Vec<CompletedAscent>,
    pub by_grade: Vec<GradeCount>,
    pub by_ascent_type: Vec<AscentTypeCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationsPage {
    pub recommendations: Vec<Recommendation>,
    pub average_by_route: Vec<RatedRoute>,
    pub distribution: Vec<RatingCount>,
}

/// Data behind one rendered page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "data")]
pub enum ViewPage {
    AdminOverview(AdminOverview),
    ClimberOverview(ClimberOverview),
    Crags(Vec<Crag>),
    Sectors(Vec<Sector>),
    Routes(RoutesPage),
    Climbers(Vec<ClimberSummary>),
    Attempts(Vec<Attempt>),
    Completions(CompletionsPage),
    Comments(Vec<Comment>),
    Recommendations(RecommendationsPage),
}

/// Build a page with the default dashboard settings.
pub fn dispatch(
    db: &Database,
    surface: &Surface,
    request: ViewRequest,
) -> Result<ViewPage, DeskError> {
    dispatch_with(db, surface, request, &DashboardSettings::default())
}

/// Build the page `request` names, as seen from `surface`.
pub fn dispatch_with(
    db: &Database,
    surface: &Surface,
    request: ViewRequest,
    settings: &DashboardSettings,
) -> Result<ViewPage, DeskError> {
    let view = request.view();
    if !view.is_available_to(surface) {
        return Err(DeskError::ViewUnavailable(view.name().to_string()));
    }
    tracing::debug!(%view, "Dispatching view");

    let page = match request {
        ViewRequest::Dashboard => match surface {
            Surface::Admin => ViewPage::AdminOverview(admin_overview(db, settings)?),
            Surface::Climber(session) => {
                ViewPage::ClimberOverview(climber_overview(db, session, settings)?)
            }
        },
        ViewRequest::Crags => ViewPage::Crags(db.catalog().list_crags()?),
        ViewRequest::Sectors { crag } => {
            ViewPage::Sectors(db.catalog().list_sectors(crag.as_deref())?)
        }
        ViewRequest::Routes(filter) => ViewPage::Routes(RoutesPage {
            routes: db.catalog().list_routes(&filter)?,
            grades: db.catalog().list_grades()?,
        }),
        ViewRequest::Climbers => ViewPage::Climbers(db.stats().climber_summaries()?),
        ViewRequest::Attempts(mut filter) => {
            scope_to(surface, &mut filter.activity);
            ViewPage::Attempts(db.logbook().list_attempts(&filter)?)
        }
        ViewRequest::Completions(mut filter) => {
            scope_to(surface, &mut filter);
            let stats = db.stats();
            ViewPage::Completions(CompletionsPage {
                completions: db.logbook().list_completions(&filter)?,
                by_grade: stats.completions_by_grade(&filter)?,
                by_ascent_type: stats.completions_by_ascent_type(&filter)?,
            })
        }
        ViewRequest::Comments(mut filter) => {
            scope_to(surface, &mut filter);
            ViewPage::Comments(db.logbook().list_comments(&filter)?)
        }
        ViewRequest::Recommendations(mut filter) => {
            scope_to(surface, &mut filter);
            let stats = db.stats();
            ViewPage::Recommendations(RecommendationsPage {
                recommendations: db.logbook().list_recommendations(&filter)?,
                average_by_route: stats
                    .average_rating_by_route(&filter, settings.top_routes_limit)?,
                distribution: stats.rating_distribution(&filter)?,
            })
        }
    };

    Ok(page)
}

/// Climbers only ever see their own activity, whatever the filter asked for.
fn scope_to(surface: &Surface, filter: &mut ActivityFilter) {
    if let Surface::Climber(session) = surface {
        filter.climber = Some(session.username().to_string());
    }
}

fn admin_overview(
    db: &Database,
    settings: &DashboardSettings,
) -> Result<AdminOverview, DeskError> {
    let stats = db.stats();
    Ok(AdminOverview {
        totals: stats.totals()?,
        routes_by_grade: stats.routes_by_grade()?,
        top_rated_routes: stats.top_rated_routes(settings.top_routes_limit)?,
        recent_activity: stats.recent_activity(settings.recent_activity_limit)?,
    })
}

fn climber_overview(
    db: &Database,
    session: &Session,
    settings: &DashboardSettings,
) -> Result<ClimberOverview, DeskError> {
    let stats = db.stats();
    let own = ActivityFilter::for_climber(session.username());

    let summary = stats
        .climber_summaries()?
        .into_iter()
        .find(|s| session.owns(&s.username));

    let mut recent_attempts = db
        .logbook()
        .list_attempts(&AttemptFilter::for_climber(session.username()))?;
    recent_attempts.truncate(settings.recent_activity_limit);

    Ok(ClimberOverview {
        totals: stats.totals()?,
        summary,
        completions_by_grade: stats.completions_by_grade(&own)?,
        completions_by_ascent_type: stats.completions_by_ascent_type(&own)?,
        recent_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RouteKey;
    use crate::climbers::Registration;
    use crate::logbook::{AscentType, NewAttempt, NewComment};
    use chrono::NaiveDate;

    fn seeded() -> (Database, Session) {
        let db = Database::open_in_memory().unwrap();
        let catalog = db.catalog();
        catalog.insert_crag(&Crag::new("Siurana")).unwrap();
        catalog
            .insert_sector(&Sector::new("El Pati", "Siurana"))
            .unwrap();
        catalog
            .insert_route(&Route::new(route()).with_grade("7b"))
            .unwrap();

        let alice = Session::register(&db.climbers(), Registration::new("alice", "pw")).unwrap();
        Session::register(&db.climbers(), Registration::new("bob", "pw")).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        for climber in ["alice", "bob"] {
            db.logbook()
                .log_attempt(
                    &NewAttempt::new(climber, route(), day)
                        .with_type(AscentType::Redpoint)
                        .completed_in(None),
                )
                .unwrap();
            db.logbook()
                .add_comment(&NewComment::new(climber, route(), "Polished crux"))
                .unwrap();
        }
        (db, alice)
    }

    fn route() -> RouteKey {
        RouteKey::new("Migranya", "El Pati", "Siurana")
    }

    #[test]
    fn test_view_from_name() {
        assert_eq!(View::from_name("Routes"), Some(View::Routes));
        assert_eq!(View::from_name("recommendations"), Some(View::Recommendations));
        assert_eq!(View::from_name("Leaderboard"), None);
        for view in View::ALL {
            assert_eq!(View::from_name(view.name()), Some(view));
            assert_eq!(ViewRequest::unfiltered(view).view(), view);
        }
    }

    #[test]
    fn test_admin_sees_all_activity() {
        let (db, _) = seeded();
        let page = dispatch(
            &db,
            &Surface::Admin,
            ViewRequest::Attempts(AttemptFilter::default()),
        )
        .unwrap();
        match page {
            ViewPage::Attempts(attempts) => assert_eq!(attempts.len(), 2),
            other => panic!("unexpected page {:?}", other),
        }

        let page = dispatch(&db, &Surface::Admin, ViewRequest::Climbers).unwrap();
        assert!(matches!(page, ViewPage::Climbers(ref c) if c.len() == 2));
    }

    #[test]
    fn test_climber_activity_is_scoped() {
        let (db, alice) = seeded();
        let surface = Surface::Climber(alice);

        // Asking for bob's comments still only yields alice's
        let page = dispatch(
            &db,
            &surface,
            ViewRequest::Comments(ActivityFilter::for_climber("bob")),
        )
        .unwrap();
        match page {
            ViewPage::Comments(comments) => {
                assert_eq!(comments.len(), 1);
                assert_eq!(comments[0].climber, "alice");
            }
            other => panic!("unexpected page {:?}", other),
        }

        let page = dispatch(&db, &surface, ViewRequest::Attempts(AttemptFilter::default())).unwrap();
        assert!(matches!(page, ViewPage::Attempts(ref a) if a.len() == 1 && a[0].climber == "alice"));
    }

    #[test]
    fn test_climber_cannot_open_climbers_view() {
        let (db, alice) = seeded();
        let err = dispatch(&db, &Surface::Climber(alice), ViewRequest::Climbers).unwrap_err();
        assert!(matches!(err, DeskError::ViewUnavailable(ref v) if v == "Climbers"));
    }

    #[test]
    fn test_catalog_views_unrestricted_for_climbers() {
        let (db, alice) = seeded();
        let page = dispatch(
            &db,
            &Surface::Climber(alice),
            ViewRequest::Routes(RouteFilter::in_crag("Siurana")),
        )
        .unwrap();
        match page {
            ViewPage::Routes(routes) => {
                assert_eq!(routes.routes.len(), 1);
                assert_eq!(routes.grades, vec!["7b".to_string()]);
            }
            other => panic!("unexpected page {:?}", other),
        }
    }

    #[test]
    fn test_overviews() {
        let (db, alice) = seeded();

        match dispatch(&db, &Surface::Admin, ViewRequest::Dashboard).unwrap() {
            ViewPage::AdminOverview(overview) => {
                assert_eq!(overview.totals.attempts, 2);
                assert_eq!(overview.recent_activity.len(), 2);
            }
            other => panic!("unexpected page {:?}", other),
        }

        match dispatch(&db, &Surface::Climber(alice), ViewRequest::Dashboard).unwrap() {
            ViewPage::ClimberOverview(overview) => {
                assert_eq!(overview.totals.climbers, 2);
                let summary = overview.summary.expect("alice has a summary");
                assert_eq!(summary.attempts, 1);
                assert_eq!(summary.completions, 1);
                assert_eq!(overview.recent_attempts.len(), 1);
            }
            other => panic!("unexpected page {:?}", other),
        }
    }

    #[test]
    fn test_page_serializes_with_view_tag() {
        let (db, _) = seeded();
        let page = dispatch(&db, &Surface::Admin, ViewRequest::Crags).unwrap();
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["view"], "Crags");
        assert_eq!(json["data"][0]["name"], "Siurana");
    }
}
