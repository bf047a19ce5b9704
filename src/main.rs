//! StudyBuddy command-line entry point
//!
//! Loads configuration, initializes logging and the database, then runs one
//! operation and prints its result as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use StudyBuddy::{
    config::Settings,
    database::{create_pool, run_migrations, DatabaseService},
    models::{CreateCourseRequest, CreateTopicRequest, UpdateCourseRequest, UpdateTopicRequest},
    services::{self, AuthContext, ChatTurn, RegisterRequest, ServiceFactory},
    utils::{logging, StudyBuddyError},
};

#[derive(Parser, Debug)]
#[command(name = "studybuddy", version, about = "AI study assistant backend")]
struct Cli {
    /// Configuration file; defaults to config.toml plus STUDYBUDDY__ variables
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply database migrations
    Migrate,

    /// Create a learner account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },

    /// Log in and print the account token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Revoke an account token
    Logout {
        #[arg(long)]
        token: String,
    },

    /// List active topics, or show one
    Topics {
        #[arg(long)]
        id: Option<i64>,
    },

    /// List courses, or show one
    Courses {
        #[arg(long)]
        id: Option<i64>,
    },

    /// Saved study plans, newest first, or one by id
    History {
        #[arg(long)]
        token: String,
        #[arg(long)]
        id: Option<i64>,
    },

    /// Generate and save a study plan
    Plan {
        #[arg(long)]
        token: String,
        #[arg(long)]
        topic: String,
        #[arg(long)]
        duration: String,
    },

    /// Generate study notes
    Notes {
        #[arg(long)]
        topic: String,
        #[arg(long = "subtopic")]
        subtopics: Vec<String>,
    },

    /// Generate a multiple-choice quiz
    Quiz {
        #[arg(long)]
        topic: String,
        #[arg(long = "subtopic")]
        subtopics: Vec<String>,
    },

    /// Ask the tutor a question
    Tutor {
        message: Vec<String>,
        #[arg(long, default_value = "general")]
        subject: String,
        #[arg(long, default_value = "intermediate")]
        difficulty: String,
        /// JSON file holding earlier turns: [{"role": "...", "content": "..."}]
        #[arg(long)]
        history: Option<String>,
    },

    /// Personalised recommendations from recent sessions
    Recommend {
        #[arg(long)]
        token: String,
    },

    /// Platform analytics (staff only)
    Analytics {
        #[arg(long)]
        token: String,
    },

    /// Dashboard and catalog management (staff only)
    Admin {
        #[arg(long)]
        token: String,
        #[command(subcommand)]
        action: AdminAction,
    },

    /// Check database and AI configuration
    Health,
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    /// List user accounts
    Users {
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Change a user's active or staff flag
    UpdateUser {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        staff: Option<bool>,
    },

    /// Latest registrations and system events
    Activity,

    /// Sessions per learner
    Progress,

    /// List every topic, including inactive ones
    Topics,

    CreateTopic {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },

    UpdateTopic {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },

    DeleteTopic {
        #[arg(long)]
        id: i64,
    },

    CreateCourse {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        duration_hours: Option<i32>,
        #[arg(long)]
        published: Option<bool>,
        #[arg(long = "topic")]
        topic_ids: Vec<i64>,
    },

    /// Update a course; passing any --topic replaces its topic links
    UpdateCourse {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        duration_hours: Option<i32>,
        #[arg(long)]
        published: Option<bool>,
        #[arg(long = "topic")]
        topic_ids: Vec<i64>,
    },

    DeleteCourse {
        #[arg(long)]
        id: i64,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Migrate => "migrate",
            Commands::Register { .. } => "register",
            Commands::Login { .. } => "login",
            Commands::Logout { .. } => "logout",
            Commands::Topics { .. } => "topics",
            Commands::Courses { .. } => "courses",
            Commands::History { .. } => "history",
            Commands::Plan { .. } => "plan",
            Commands::Notes { .. } => "notes",
            Commands::Quiz { .. } => "quiz",
            Commands::Tutor { .. } => "tutor",
            Commands::Recommend { .. } => "recommend",
            Commands::Analytics { .. } => "analytics",
            Commands::Admin { .. } => "admin",
            Commands::Health => "health",
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect(settings: &Settings) -> Result<DatabaseService> {
    info!("Connecting to database...");
    let pool = create_pool(&settings.database)
        .await
        .context("cannot connect to the database")?;
    Ok(DatabaseService::new(pool))
}

async fn authenticate(factory: &ServiceFactory, token: &str) -> Result<AuthContext> {
    Ok(factory.auth_service.authenticate(token).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::new()?,
    };
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    let span = info_span!("command", name = cli.command.name(), run_id = %Uuid::new_v4());
    let result = run(cli.command, settings).instrument(span).await;
    if let Some(err) = result.as_ref().err().and_then(|e| e.downcast_ref::<StudyBuddyError>()) {
        error!(
            severity = %err.severity(),
            recoverable = err.is_recoverable(),
            status = err.status_code(),
            "Command failed: {}",
            err
        );
    }
    result
}

async fn run(command: Commands, settings: Settings) -> Result<()> {
    info!("Starting {}", StudyBuddy::info());

    // Commands that only need the generation gateway
    let command = match command {
        Commands::Notes { topic, subtopics } => {
            let tools = services::build_study_tools(&settings)?;
            return print_json(&tools.generate_notes(&topic, subtopics).await?);
        }
        Commands::Quiz { topic, subtopics } => {
            let tools = services::build_study_tools(&settings)?;
            return print_json(&tools.generate_quiz(&topic, subtopics).await?);
        }
        Commands::Tutor { message, subject, difficulty, history } => {
            let history: Vec<ChatTurn> = match history {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("cannot read history file {}", path))?;
                    serde_json::from_str(&raw).context("history file is not a JSON list of turns")?
                }
                None => Vec::new(),
            };
            let tools = services::build_study_tools(&settings)?;
            let response = tools
                .tutor_chat(&message.join(" "), &subject, &difficulty, &history)
                .await?;
            return print_json(&response);
        }
        other => other,
    };

    let database = connect(&settings).await?;

    if let Commands::Migrate = command {
        run_migrations(database.pool()).await?;
        return print_json(&serde_json::json!({ "migrated": true }));
    }

    let factory = ServiceFactory::new(&settings, database)?;

    match command {
        Commands::Register { username, password, email } => {
            let user = factory
                .auth_service
                .register(RegisterRequest { username, password, email, ..Default::default() })
                .await?;
            print_json(&user)
        }
        Commands::Login { username, password } => {
            print_json(&factory.auth_service.login(&username, &password).await?)
        }
        Commands::Logout { token } => {
            let revoked = factory.auth_service.logout(&token).await?;
            print_json(&serde_json::json!({ "revoked": revoked }))
        }
        Commands::Topics { id: Some(id) } => print_json(&factory.catalog_service.get_topic(id).await?),
        Commands::Topics { id: None } => print_json(&factory.catalog_service.active_topics().await?),
        Commands::Courses { id: Some(id) } => print_json(&factory.catalog_service.get_course(id).await?),
        Commands::Courses { id: None } => print_json(&factory.catalog_service.list_courses().await?),
        Commands::History { token, id } => {
            let ctx = authenticate(&factory, &token).await?;
            match id {
                Some(id) => print_json(&factory.study_service.study_session(&ctx.user, id).await?),
                None => print_json(&factory.study_service.study_history(&ctx.user).await?),
            }
        }
        Commands::Plan { token, topic, duration } => {
            let ctx = authenticate(&factory, &token).await?;
            let session = factory
                .study_service
                .generate_study_plan(&ctx.user, &topic, &duration)
                .await?;
            print_json(&session)
        }
        Commands::Recommend { token } => {
            let ctx = authenticate(&factory, &token).await?;
            let (analysis, recommendations) = factory.study_service.recommend_for_user(&ctx.user).await?;
            print_json(&serde_json::json!({
                "analysis": analysis,
                "recommendations": recommendations,
            }))
        }
        Commands::Analytics { token } => {
            let ctx = authenticate(&factory, &token).await?;
            factory.auth_service.require_staff(&ctx)?;
            print_json(&factory.admin_service.analytics().await?)
        }
        Commands::Admin { token, action } => {
            let ctx = authenticate(&factory, &token).await?;
            factory.auth_service.require_staff(&ctx)?;
            run_admin(&factory, &ctx, action).await
        }
        Commands::Health => {
            let status = factory.health_check().await;
            for issue in status.get_issues() {
                tracing::warn!(issue = %issue, "Health check issue");
            }
            print_json(&status)
        }
        Commands::Migrate | Commands::Notes { .. } | Commands::Quiz { .. } | Commands::Tutor { .. } => Ok(()),
    }
}

async fn run_admin(factory: &ServiceFactory, ctx: &AuthContext, action: AdminAction) -> Result<()> {
    let admin = &factory.admin_service;
    let catalog = &factory.catalog_service;

    match action {
        AdminAction::Users { limit, offset } => print_json(&admin.list_users(limit, offset).await?),
        AdminAction::UpdateUser { id, active, staff } => {
            print_json(&admin.update_user(ctx.user_id(), id, active, staff).await?)
        }
        AdminAction::Activity => print_json(&admin.recent_activities().await?),
        AdminAction::Progress => print_json(&admin.learner_progress().await?),
        AdminAction::Topics => print_json(&catalog.all_topics().await?),
        AdminAction::CreateTopic { name, description, active } => {
            let request = CreateTopicRequest { name, description, is_active: active };
            print_json(&catalog.create_topic(request).await?)
        }
        AdminAction::UpdateTopic { id, name, description, active } => {
            let request = UpdateTopicRequest { name, description, is_active: active };
            print_json(&catalog.update_topic(id, request).await?)
        }
        AdminAction::DeleteTopic { id } => {
            catalog.delete_topic(id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        AdminAction::CreateCourse { name, description, duration_hours, published, topic_ids } => {
            let request = CreateCourseRequest {
                name,
                description,
                duration_hours,
                is_published: published,
                topic_ids,
            };
            print_json(&catalog.create_course(request).await?)
        }
        AdminAction::UpdateCourse { id, name, description, duration_hours, published, topic_ids } => {
            let request = UpdateCourseRequest {
                name,
                description,
                duration_hours,
                is_published: published,
                topic_ids: (!topic_ids.is_empty()).then_some(topic_ids),
            };
            print_json(&catalog.update_course(id, request).await?)
        }
        AdminAction::DeleteCourse { id } => {
            catalog.delete_course(id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}
