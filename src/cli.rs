use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::{Args, Parser, Subcommand};

use crate::channels::email::mailer_from_config;
use crate::config::{Config, DatabaseConfig, EnvLookup, process_env};
use crate::db::{Database, connect_from_config};
use crate::integrations::asana::AsanaClient;
use crate::legal::reminders::{ReminderOptions, send_reminders};
use crate::legal::seed::seed;
use crate::legal::sync::{SyncOptions, sync_matters};

/// Deadline tracker - reminder emails and Asana sync for legal matters
#[derive(Parser, Debug)]
#[command(name = "deadline-tracker")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(long, global = true, env = "DEADLINE_TRACKER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database file (overrides DATABASE_PATH and the settings file)
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send reminder emails for deadlines due today
    SendReminders(ReminderArgs),

    /// Pull tasks from linked Asana projects into deadlines
    SyncAsana(SyncArgs),

    /// Install the standard deadline types
    SeedData(SeedArgs),
}

/// Arguments for the `send-reminders` command
#[derive(Args, Debug)]
pub struct ReminderArgs {
    /// Preview reminders without sending emails
    #[arg(long)]
    pub dry_run: bool,

    /// Show per-deadline decisions
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for the `sync-asana` command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Preview the sync without saving changes
    #[arg(long)]
    pub dry_run: bool,

    /// Show per-task decisions
    #[arg(short, long)]
    pub verbose: bool,

    /// Sync only the matter with this id
    #[arg(long, value_name = "ID")]
    pub matter_id: Option<i64>,
}

/// Arguments for the `seed-data` command
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Also create sample clients, matters, and deadlines
    #[arg(long)]
    pub with_samples: bool,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::SendReminders(args) => args.verbose,
            Commands::SyncAsana(args) => args.verbose,
            Commands::SeedData(_) => false,
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    run_with(cli, &process_env).await
}

async fn open_database(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn Database>> {
    connect_from_config(config)
        .await
        .with_context(|| format!("failed to open database {}", config.path.display()))
}

/// Each command validates its own configuration and preconditions before the
/// database is opened.
pub async fn run_with(cli: Cli, env: EnvLookup<'_>) -> anyhow::Result<()> {
    let mut config = Config::load_with(cli.config.as_deref(), env)
        .context("failed to load configuration")?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    match cli.command {
        Commands::SendReminders(args) => {
            let email = config
                .email(env)
                .context("invalid email configuration")?;
            let mailer = mailer_from_config(&email)?;
            let db = open_database(&config.database).await?;
            let options = ReminderOptions {
                dry_run: args.dry_run,
                verbose: args.verbose,
                from_address: email.from_address.clone(),
            };
            let summary =
                send_reminders(db.as_ref(), mailer.as_ref(), &options, Local::now()).await?;
            println!("{}", summary.summary_line(args.dry_run));
        }
        Commands::SyncAsana(args) => {
            let asana = config
                .asana(env)
                .context("invalid Asana configuration")?;
            let client = AsanaClient::from_config(&asana)?;
            let db = open_database(&config.database).await?;
            let options = SyncOptions {
                dry_run: args.dry_run,
                verbose: args.verbose,
                matter_id: args.matter_id,
            };
            let summary = sync_matters(db.as_ref(), &client, &options).await?;
            println!("{}", summary.summary_line());
        }
        Commands::SeedData(args) => {
            let db = open_database(&config.database).await?;
            let summary = seed(db.as_ref(), args.with_samples, Local::now().date_naive()).await?;
            println!("{} deadline types created.", summary.types_created);
            if args.with_samples {
                println!(
                    "Sample data created: {} clients, {} matters, {} deadlines.",
                    summary.clients_created, summary.matters_created, summary.deadlines_created
                );
            }
        }
    }
    Ok(())
}
