//! Cragbook - Climbing Logbook
//!
//! Command-line entry point: loads the configuration, opens the database and
//! runs one subcommand.

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cragbook::climbers::{Registration, Session};
use cragbook::dashboard::{dispatch_with, ClimberDesk, Surface, View, ViewRequest};
use cragbook::logbook::{AscentTime, AscentType, NewAttempt, Rating};
use cragbook::storage::config::{self, AppConfig};
use cragbook::storage::filter::{ActivityFilter, AttemptFilter, RouteFilter};
use cragbook::{ClimberLevel, Crag, Database, Route, RouteKey, Sector};

#[derive(Parser)]
#[command(name = "cragbook", version, about = "Climbing logbook: crags, routes and ascents")]
struct Cli {
    /// Configuration file (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// SQLite database file, overriding the configuration
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and a default configuration file
    Init,
    /// Register a climber
    Register {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_name = "YYYY-MM-DD")]
        birth_date: Option<NaiveDate>,
        #[arg(long)]
        level: Option<ClimberLevel>,
    },
    /// Add a crag
    AddCrag {
        name: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a sector to a crag
    AddSector {
        crag: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a route to a sector
    AddRoute {
        #[command(flatten)]
        route: RouteArgs,
        #[arg(long)]
        grade: Option<String>,
        #[arg(long)]
        style: Option<String>,
        #[arg(long, value_name = "METRES")]
        height: Option<u32>,
        #[arg(long)]
        equipper: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        equipped_on: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Log an attempt as the given climber
    LogAttempt {
        #[command(flatten)]
        login: LoginArgs,
        #[command(flatten)]
        route: RouteArgs,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: NaiveDate,
        #[arg(long = "type", value_name = "ASCENT_TYPE")]
        ascent_type: Option<AscentType>,
        /// Mark the attempt as completed
        #[arg(long)]
        completed: bool,
        /// Ascent time of the completion; implies --completed
        #[arg(long, value_name = "HH:MM:SS")]
        time: Option<AscentTime>,
    },
    /// Rate a route (1-5)
    Recommend {
        #[command(flatten)]
        login: LoginArgs,
        #[command(flatten)]
        route: RouteArgs,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        note: Option<String>,
    },
    /// Comment on a route
    Comment {
        #[command(flatten)]
        login: LoginArgs,
        #[command(flatten)]
        route: RouteArgs,
        text: String,
    },
    /// Delete a crag with everything recorded under it
    DeleteCrag { name: String },
    /// Print a dashboard page as JSON
    View {
        /// Dashboard, Crags, Sectors, Routes, Climbers, Attempts, Completions,
        /// Comments or Recommendations
        page: String,
        /// Show the page as this climber sees it
        #[arg(long = "as", value_name = "USERNAME", requires = "password")]
        user: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args)]
struct RouteArgs {
    crag: String,
    sector: String,
    #[arg(value_name = "ROUTE")]
    name: String,
}

impl RouteArgs {
    fn key(&self) -> RouteKey {
        RouteKey::new(&self.name, &self.sector, &self.crag)
    }
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long = "as", value_name = "USERNAME")]
    user: String,
    #[arg(long)]
    password: String,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    climber: Option<String>,
    #[arg(long)]
    crag: Option<String>,
    #[arg(long)]
    sector: Option<String>,
    #[arg(long)]
    route: Option<String>,
    #[arg(long)]
    grade: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    from: Option<NaiveDate>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    to: Option<NaiveDate>,
    #[arg(long = "type", value_name = "ASCENT_TYPE")]
    ascent_type: Option<AscentType>,
    #[arg(long)]
    completed: Option<bool>,
}

impl FilterArgs {
    fn activity(&self) -> ActivityFilter {
        ActivityFilter {
            climber: self.climber.clone(),
            crag: self.crag.clone(),
            sector: self.sector.clone(),
            route: self.route.clone(),
            grade: self.grade.clone(),
            date_from: self.from,
            date_to: self.to,
        }
    }

    fn request(&self, view: View) -> ViewRequest {
        match view {
            View::Sectors => ViewRequest::Sectors {
                crag: self.crag.clone(),
            },
            View::Routes => ViewRequest::Routes(RouteFilter {
                crag: self.crag.clone(),
                sector: self.sector.clone(),
                grade: self.grade.clone(),
            }),
            View::Attempts => ViewRequest::Attempts(AttemptFilter {
                activity: self.activity(),
                ascent_type: self.ascent_type,
                completed: self.completed,
            }),
            View::Completions => ViewRequest::Completions(self.activity()),
            View::Comments => ViewRequest::Comments(self.activity()),
            View::Recommendations => ViewRequest::Recommendations(self.activity()),
            View::Dashboard | View::Crags | View::Climbers => ViewRequest::unfiltered(view),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::get_config_path);
    let mut app_config = config::load_config_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(database) = &cli.database {
        // Relative to the working directory, not the data directory
        app_config.database.path = Some(std::env::current_dir()?.join(database));
    }

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting Cragbook v{}", env!("CARGO_PKG_VERSION"));

    let db_path = app_config.database_path();
    let db = Database::open(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;

    run(cli.command, &db, &app_config, &config_path)
}

fn run(
    command: Commands,
    db: &Database,
    app_config: &AppConfig,
    config_path: &std::path::Path,
) -> anyhow::Result<()> {
    match command {
        Commands::Init => {
            if !config_path.exists() {
                config::save_config_to(config_path, app_config)?;
            }
            println!("Database ready at {}", app_config.database_path().display());
        }
        Commands::Register {
            username,
            password,
            birth_date,
            level,
        } => {
            let registration = Registration {
                username,
                password,
                birth_date,
                level,
            };
            let session = Session::register(&db.climbers(), registration)?;
            println!("Registered {}", session.username());
        }
        Commands::AddCrag {
            name,
            location,
            description,
        } => {
            db.catalog().insert_crag(&Crag {
                name,
                location,
                description,
            })?;
            println!("Added crag");
        }
        Commands::AddSector {
            crag,
            name,
            description,
        } => {
            let mut sector = Sector::new(name, crag);
            sector.description = description;
            db.catalog().insert_sector(&sector)?;
            println!("Added sector");
        }
        Commands::AddRoute {
            route,
            grade,
            style,
            height,
            equipper,
            equipped_on,
            description,
        } => {
            db.catalog().insert_route(&Route {
                key: route.key(),
                description,
                grade,
                style,
                height_m: height,
                equipper,
                equipped_on,
            })?;
            println!("Added route {}", route.key());
        }
        Commands::LogAttempt {
            login,
            route,
            date,
            ascent_type,
            completed,
            time,
        } => {
            let desk = ClimberDesk::login(db, &login.user, &login.password)?;
            let mut attempt = NewAttempt::new(login.user, route.key(), date);
            attempt.ascent_type = ascent_type;
            if completed || time.is_some() {
                attempt = attempt.completed_in(time);
            }
            let attempt = desk.log_attempt(&attempt)?;
            println!("Logged attempt {}", attempt.id);
        }
        Commands::Recommend {
            login,
            route,
            rating,
            note,
        } => {
            let rating = Rating::new(rating)?;
            let desk = ClimberDesk::login(db, &login.user, &login.password)?;
            let recommendation = desk.recommend(route.key(), rating, note.as_deref())?;
            println!("Saved recommendation {}", recommendation.id);
        }
        Commands::Comment { login, route, text } => {
            let desk = ClimberDesk::login(db, &login.user, &login.password)?;
            let comment = desk.comment(route.key(), &text)?;
            println!("Saved comment {}", comment.id);
        }
        Commands::DeleteCrag { name } => {
            db.catalog().delete_crag(&name)?;
            println!("Deleted crag {}", name);
        }
        Commands::View {
            page,
            user,
            password,
            filter,
        } => {
            let Some(view) = View::from_name(&page) else {
                bail!("unknown page {:?}", page);
            };
            let surface = match (user, password) {
                (Some(user), Some(password)) => {
                    Surface::Climber(Session::login(&db.climbers(), &user, &password)?)
                }
                _ => Surface::Admin,
            };
            let page = dispatch_with(db, &surface, filter.request(view), &app_config.dashboard)?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
    }

    Ok(())
}
