//! labwatch - lab monitoring sweeper and operator CLI.

#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use uuid::Uuid;

use labwatch::entities::{week_start_of, Alert, AlertSeverity, AlertType};
use labwatch::{Engine, EngineConfig, MemoryStore, Store};
use notify::Notifier;

#[derive(Parser)]
#[command(name = "labwatch")]
#[command(about = "Monitoring and alerting for lab tasks, schedules and activity", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Snapshot file backing the store (overrides LABWATCH_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every detector once
    Sweep,

    /// Run a single detector
    Detect {
        /// Alert type (overdue_task, inactive_student, project_risk, velocity_drop, blocked_task)
        alert_type: AlertType,
    },

    /// Sweep and dispatch reminders on a fixed cadence until interrupted
    Watch {
        /// Seconds between alert sweeps
        #[arg(long)]
        sweep_interval_secs: Option<u64>,

        /// Seconds between reminder passes
        #[arg(long)]
        reminder_interval_secs: Option<u64>,
    },

    /// Send due task reminders once
    Remind,

    /// List unresolved alerts
    Alerts {
        /// Only alerts linked to this person
        #[arg(short, long)]
        person: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Active alert counts by severity and type
    Stats,

    /// Resolve an alert
    Resolve {
        #[arg(long)]
        id: Uuid,

        /// Resolver person id
        #[arg(long)]
        by: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Validate one person's schedule for a week
    Validate {
        #[arg(short, long)]
        person: String,

        /// Any date in the week (YYYY-MM-DD)
        #[arg(short, long)]
        week: NaiveDate,
    },

    /// Schedule compliance for everyone with a schedule in a week
    Compliance {
        /// Any date in the week (YYYY-MM-DD)
        #[arg(short, long)]
        week: NaiveDate,
    },

    /// Activity velocity per person
    Velocity {
        #[arg(short, long)]
        person: Option<String>,

        #[arg(long, default_value_t = 14)]
        window_days: u32,
    },

    /// Seed default alert configurations where missing
    SeedConfig,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = EngineConfig::from_env();
    if let Some(path) = cli.store {
        config.store_path = path;
    }

    let store = Arc::new(
        MemoryStore::load(&config.store_path)
            .await
            .with_context(|| format!("failed to load store from {}", config.store_path.display()))?,
    );
    let engine = Engine::new(
        Arc::clone(&store) as Arc<dyn Store>,
        Arc::new(Notifier::from_env()),
        &config,
    );

    match cli.command {
        Commands::Sweep => {
            engine.alerts.ensure_default_configurations().await?;
            let report = engine.alerts.run_all_detectors(Utc::now()).await;
            save(&store, &config).await?;
            print_json(&report)?;
        }

        Commands::Detect { alert_type } => {
            engine.alerts.ensure_default_configurations().await?;
            let report = engine
                .alerts
                .run_detector(alert_type, Utc::now())
                .await
                .with_context(|| format!("{alert_type} detector failed"))?;
            save(&store, &config).await?;
            print_json(&report)?;
        }

        Commands::Watch {
            sweep_interval_secs,
            reminder_interval_secs,
        } => {
            if let Some(secs) = sweep_interval_secs {
                config.sweep_interval = Duration::from_secs(secs);
            }
            if let Some(secs) = reminder_interval_secs {
                config.reminder_interval = Duration::from_secs(secs);
            }
            watch(&engine, &store, &config).await?;
        }

        Commands::Remind => {
            let report = engine.reminders.dispatch_due_reminders(Utc::now()).await?;
            save(&store, &config).await?;
            print_json(&report)?;
        }

        Commands::Alerts { person, json } => {
            let alerts = engine.alerts.get_active(person.as_deref()).await?;
            if json {
                print_json(&alerts)?;
            } else {
                print_alerts(&alerts);
            }
        }

        Commands::Stats => {
            print_json(&engine.alerts.get_statistics().await?)?;
        }

        Commands::Resolve { id, by, reason } => {
            let alert = engine
                .alerts
                .resolve(id, &by, reason.as_deref())
                .await
                .with_context(|| format!("failed to resolve alert {id}"))?;
            save(&store, &config).await?;
            println!("{} {} ({})", "Resolved".green(), alert.title, alert.id);
        }

        Commands::Validate { person, week } => {
            let validation = engine
                .schedules
                .validate(&person, week_start_of(week))
                .await?;
            print_json(&validation)?;
        }

        Commands::Compliance { week } => {
            let rows = engine.schedules.compliance_report(week_start_of(week)).await?;
            print_json(&rows)?;
        }

        Commands::Velocity {
            person,
            window_days,
        } => {
            let metrics = engine
                .velocity
                .analyze(person.as_deref(), window_days, Utc::now())
                .await?;
            print_json(&metrics)?;
        }

        Commands::SeedConfig => {
            let inserted = engine.alerts.ensure_default_configurations().await?;
            save(&store, &config).await?;
            println!("Seeded {inserted} alert configuration(s)");
        }
    }

    Ok(())
}

async fn watch(engine: &Engine, store: &MemoryStore, config: &EngineConfig) -> Result<()> {
    engine.alerts.ensure_default_configurations().await?;
    save(store, config).await?;

    info!(
        store = %config.store_path.display(),
        sweep_interval_secs = config.sweep_interval.as_secs(),
        reminder_interval_secs = config.reminder_interval.as_secs(),
        "Watching"
    );

    let mut sweep_tick = tokio::time::interval(config.sweep_interval);
    sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut reminder_tick = tokio::time::interval(config.reminder_interval);
    reminder_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = sweep_tick.tick() => {
                if engine.alerts.run_all_detectors(Utc::now()).await.is_some() {
                    if let Err(e) = save(store, config).await {
                        error!(error = %e, "Failed to save snapshot after sweep");
                    }
                }
            }
            _ = reminder_tick.tick() => {
                match engine.reminders.dispatch_due_reminders(Utc::now()).await {
                    Ok(report) if report.tasks > 0 => {
                        if let Err(e) = save(store, config).await {
                            error!(error = %e, "Failed to save snapshot after reminders");
                        }
                    }
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "Reminder pass failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down");
                break;
            }
        }
    }

    save(store, config).await
}

async fn save(store: &MemoryStore, config: &EngineConfig) -> Result<()> {
    store
        .save(&config.store_path)
        .await
        .with_context(|| format!("failed to save store to {}", config.store_path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_alerts(alerts: &[Alert]) {
    if alerts.is_empty() {
        println!("{}", "No active alerts".green());
        return;
    }

    for alert in alerts {
        let severity = match alert.severity {
            AlertSeverity::Critical => "CRITICAL".red().bold(),
            AlertSeverity::High => "HIGH".red(),
            AlertSeverity::Medium => "MEDIUM".yellow(),
            AlertSeverity::Low => "LOW".normal(),
        };
        println!(
            "{:<10} {:<17} {}  {}",
            severity,
            alert.alert_type.as_str(),
            alert.title.bold(),
            alert.id.to_string().dimmed()
        );
        println!("{:<28} {}", "", alert.message);
    }
}
