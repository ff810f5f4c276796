//! Cadence CLI - focus sessions, lead management and follow-up maintenance

mod command;
mod focus;
mod output;

use anyhow::{Context, Result};
use cadence_core::application::focus::{FocusConfig, FocusPorts, FocusSession};
use cadence_core::application::followup::{
    AfcAdvancer, ContactImporter, FollowUpCycle, FollowUpProcessor, LeadService, TaskService,
};
use cadence_core::application::worker::InteractionWorker;
use cadence_core::domain::{Lead, Phone, PhoneKind, QueueKind};
use cadence_core::port::id_provider::UuidProvider;
use cadence_core::port::time_provider::SystemTimeProvider;
use cadence_core::port::{
    FocusLocation, FollowUpStore, IdProvider, InteractionRepository, LeadRepository, TaskRepository,
    TimeProvider,
};
use cadence_infra_sqlite::{
    create_pool, run_migrations, SqliteFollowUpStore, SqliteInteractionRepository,
    SqliteLeadRepository, SqliteTaskRepository,
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use output::{InteractionTableRow, LeadTableRow, ResumeLocationBar, TaskTableRow, TerminalNotifier};
use std::sync::Arc;
use std::time::Duration;
use tabled::Table;
use tracing_subscriber::EnvFilter;

const DEFAULT_DB_PATH: &str = "~/.cadence/crm.db";

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence CRM command-line interface", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database path
    #[arg(long, env = "CADENCE_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Tasks,
    Leads,
}

impl From<KindArg> for QueueKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Tasks => QueueKind::Tasks,
            KindArg::Leads => QueueKind::Leads,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Work through a queue of tasks or leads one at a time
    Focus {
        /// Queue kind (ignored with --location)
        #[arg(short, long, value_enum, default_value = "tasks")]
        kind: KindArg,

        /// Comma-separated ids; defaults to open tasks or recent leads
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,

        /// Resume a session from its location string
        #[arg(long)]
        location: Option<String>,

        /// Item to start on
        #[arg(long)]
        start: Option<String>,

        /// Queue size when ids are not given
        #[arg(short, long, default_value = "100")]
        limit: i64,

        /// Pause before advancing after a successful log (ms)
        #[arg(long, env = "CADENCE_ADVANCE_DELAY_MS", default_value = "500")]
        advance_delay_ms: u64,
    },

    /// List open tasks
    Tasks {
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },

    /// List leads, newest first
    Leads {
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },

    /// Show the interaction history of a lead
    History {
        lead_id: String,
    },

    /// Add a lead manually (starts its follow-up cycle)
    AddLead {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        phone: Option<String>,

        #[arg(short, long)]
        course: Option<String>,
    },

    /// Delete a lead with its tasks and interactions
    DeleteLead {
        lead_id: String,
    },

    /// Mark a task completed
    CompleteTask {
        task_id: String,
    },

    /// Import contacts from a JSON array file
    Import {
        file: std::path::PathBuf,

        /// Skip contacts whose email already exists instead of updating them
        #[arg(long)]
        only_new: bool,
    },

    /// Close overdue follow-ups as unresponsive (normally done by the daemon)
    Advance,

    /// Run pending interactions through the follow-up cycle (normally done by the daemon)
    Process,
}

struct App {
    leads: Arc<dyn LeadRepository>,
    tasks: Arc<dyn TaskRepository>,
    interactions: Arc<dyn InteractionRepository>,
    followups: Arc<dyn FollowUpStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl App {
    async fn connect(db_path: &str) -> Result<Self> {
        let url = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            let path = shellexpand::tilde(db_path).into_owned();
            if let Some(parent) = std::path::Path::new(&path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
            }
            format!("sqlite://{}", path)
        };

        let pool = create_pool(&url).await.context("Failed to open database")?;
        run_migrations(&pool).await.context("Migration failed")?;

        Ok(Self {
            leads: Arc::new(SqliteLeadRepository::new(pool.clone())),
            tasks: Arc::new(SqliteTaskRepository::new(pool.clone())),
            interactions: Arc::new(SqliteInteractionRepository::new(pool.clone())),
            followups: Arc::new(SqliteFollowUpStore::new(pool)),
            id_provider: Arc::new(UuidProvider),
            time_provider: Arc::new(SystemTimeProvider),
        })
    }

    fn cycle(&self) -> FollowUpCycle {
        FollowUpCycle::new(
            Arc::clone(&self.leads),
            Arc::clone(&self.tasks),
            Arc::clone(&self.interactions),
            Arc::clone(&self.id_provider),
            Arc::clone(&self.time_provider),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Library logs go to stderr; quiet unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let app = App::connect(&cli.db).await?;

    match cli.command {
        Commands::Focus {
            kind,
            ids,
            location,
            start,
            limit,
            advance_delay_ms,
        } => {
            let location = match location {
                Some(query) => FocusLocation::parse(&query),
                None => {
                    let kind = QueueKind::from(kind);
                    let ids = if ids.is_empty() {
                        default_queue_ids(&app, kind, limit).await?
                    } else {
                        ids
                    };
                    let location = FocusLocation::new(kind, ids);
                    match start {
                        Some(start) => location.with_current(start),
                        None => location,
                    }
                }
            };

            let location_bar = Arc::new(ResumeLocationBar::default());
            let ports = FocusPorts {
                tasks: Arc::clone(&app.tasks),
                leads: Arc::clone(&app.leads),
                interactions: Arc::clone(&app.interactions),
                notifier: Arc::new(TerminalNotifier),
                location_bar: location_bar.clone(),
                id_provider: Arc::clone(&app.id_provider),
                time_provider: Arc::clone(&app.time_provider),
            };
            let mut session = FocusSession::new(
                ports,
                FocusConfig {
                    advance_delay: Duration::from_millis(advance_delay_ms),
                },
            );

            let loaded = session.open(location).await;
            println!("{}", format!("Loaded {} items", loaded).cyan().bold());
            focus::run(session, location_bar).await?;
        }

        Commands::Tasks { limit } => {
            let rows: Vec<TaskTableRow> = app
                .tasks
                .list_open(limit)
                .await?
                .into_iter()
                .map(TaskTableRow::from)
                .collect();
            print_table("Open tasks", rows);
        }

        Commands::Leads { limit } => {
            let rows: Vec<LeadTableRow> = app
                .leads
                .list(limit)
                .await?
                .into_iter()
                .map(LeadTableRow::from)
                .collect();
            print_table("Leads", rows);
        }

        Commands::History { lead_id } => {
            let rows: Vec<InteractionTableRow> = app
                .interactions
                .find_for_lead(&lead_id)
                .await?
                .into_iter()
                .map(InteractionTableRow::from)
                .collect();
            print_table(&format!("Interactions for {}", lead_id), rows);
        }

        Commands::AddLead {
            name,
            email,
            phone,
            course,
        } => {
            let mut lead = Lead::new(
                app.id_provider.generate_id(),
                app.time_provider.now_millis(),
                name,
            );
            lead.email = email;
            lead.course = course;
            lead.phones = phone
                .into_iter()
                .map(|number| Phone {
                    number,
                    kind: PhoneKind::Both,
                })
                .collect();

            let lead = LeadService::new(app.cycle()).create(lead).await?;
            println!(
                "{}",
                format!("✓ Lead {} created ({})", lead.name, lead.id).green().bold()
            );
        }

        Commands::DeleteLead { lead_id } => {
            let stats = LeadService::new(app.cycle()).delete(&lead_id).await?;
            println!(
                "{}",
                format!(
                    "✓ Lead {} deleted with {} tasks and {} interactions",
                    lead_id, stats.tasks_deleted, stats.interactions_deleted
                )
                .green()
                .bold()
            );
        }

        Commands::CompleteTask { task_id } => {
            let outcome = TaskService::new(app.cycle()).complete(&task_id).await?;
            if outcome.already_completed {
                println!("{}", format!("Task {} was already completed", task_id).yellow());
            } else {
                println!("{}", format!("✓ Task {} completed", task_id).green().bold());
                if outcome.follow_up_logged {
                    println!("{}", "Follow-up logged; the cycle restarts for this lead.".cyan());
                }
            }
        }

        Commands::Import { file, only_new } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let summary = ContactImporter::new(app.cycle())
                .import_json(&json, only_new)
                .await?;
            println!("{}", "✓ Import finished".green().bold());
            println!(
                "  created: {}  updated: {}  skipped: {}",
                summary.created, summary.updated, summary.skipped
            );
        }

        Commands::Advance => {
            let advanced = AfcAdvancer::new(app.cycle()).run_once().await?;
            println!(
                "{}",
                format!("✓ {} overdue follow-ups closed", advanced).green().bold()
            );
        }

        Commands::Process => {
            let worker = InteractionWorker::new(
                Arc::clone(&app.interactions),
                Arc::new(FollowUpProcessor::new(app.cycle(), app.followups.clone())),
                Arc::clone(&app.time_provider),
            );
            let mut total = 0;
            loop {
                let handled = worker.process_pending().await?;
                if handled == 0 {
                    break;
                }
                total += handled;
            }
            println!("{}", format!("✓ {} interactions processed", total).green().bold());
        }
    }

    Ok(())
}

async fn default_queue_ids(app: &App, kind: QueueKind, limit: i64) -> Result<Vec<String>> {
    let ids = match kind {
        QueueKind::Tasks => app
            .tasks
            .list_open(limit)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect(),
        QueueKind::Leads => app
            .leads
            .list(limit)
            .await?
            .into_iter()
            .filter(|l| !l.is_closed())
            .map(|l| l.id)
            .collect(),
    };
    Ok(ids)
}

fn print_table<T: tabled::Tabled>(title: &str, rows: Vec<T>) {
    println!("{}", title.cyan().bold());
    if rows.is_empty() {
        println!("{}", "  (none)".dimmed());
        return;
    }
    println!("{}", Table::new(rows));
}
