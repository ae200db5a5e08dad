//! CLI commands for relaybot using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{
    get_settings_path, load_settings, load_settings_or_default, mask_token, save_settings, Settings,
    TOKEN_ENV,
};
use crate::storage::SqliteJournal;

/// relaybot - Telegram relay that journals chats to SQLite.
#[derive(Parser)]
#[command(name = "relaybot")]
#[command(version)]
#[command(about = "Echo bot with a SQLite journal and allow-listed scripts", long_about = None)]
pub struct Commands {
    /// Settings file (defaults to ~/.relaybot/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Connect to Telegram and relay messages until interrupted
    Run {
        /// Bot token; overrides the settings file
        #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
        token: Option<String>,
    },

    /// Write a settings file with defaults
    Setup {
        /// Bot token to store in the settings file
        #[arg(long)]
        token: Option<String>,

        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },

    /// Show the resolved settings
    Config,

    /// Show how many records the journal holds
    Stats,
}

impl Commands {
    pub async fn run(self) -> Result<()> {
        let config = self.config.as_deref();
        match self.command {
            Command::Run { token } => run_bot(config, token.as_deref()).await,
            Command::Setup { token, force } => setup(config, token, force),
            Command::Config => show_config(config),
            Command::Stats => show_stats(config),
        }
    }
}

fn settings_path(config: Option<&Path>) -> Result<PathBuf> {
    match config {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(get_settings_path()?),
    }
}

/// An explicit `--config` must load and validate; the default location may be absent.
fn load_for_run(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(p) => Ok(load_settings(Some(p))?),
        None => Ok(load_settings_or_default(None)),
    }
}

async fn run_bot(config: Option<&Path>, token: Option<&str>) -> Result<()> {
    let settings = load_for_run(config)?;
    let token = settings.resolve_token(token)?;
    crate::telegram::run_telegram_bot(&settings, token).await?;
    Ok(())
}

fn setup(config: Option<&Path>, token: Option<String>, force: bool) -> Result<()> {
    let path = settings_path(config)?;
    if path.exists() && !force {
        anyhow::bail!(
            "Settings already exist at {}. Use --force to overwrite.",
            path.display()
        );
    }

    let mut settings = Settings::default();
    settings.telegram.bot_token = token;
    save_settings(&path, &settings)?;

    println!("✅ Wrote settings to {}", path.display());
    if settings.telegram.bot_token.is_none() {
        println!("   No token stored; pass --token or set {} when running.", TOKEN_ENV);
    }
    Ok(())
}

fn show_config(config: Option<&Path>) -> Result<()> {
    let path = settings_path(config)?;
    let settings = load_settings(Some(path.as_path()))?;

    println!("📋 Settings: {}", path.display());
    let token = settings
        .telegram
        .bot_token
        .as_deref()
        .map(mask_token)
        .unwrap_or_else(|| "(not set)".to_string());
    println!("   Bot token:   {}", token);
    println!("   Database:    {}", settings.storage.database_path.display());
    println!("   Scripts dir: {}", settings.scripts.directory.display());
    println!(
        "   Scripts:     *{} via {} (timeout {}s)",
        settings.scripts.extension, settings.scripts.interpreter, settings.scripts.timeout_seconds
    );
    Ok(())
}

fn show_stats(config: Option<&Path>) -> Result<()> {
    let settings = load_for_run(config)?;
    let journal = SqliteJournal::new(settings.storage.database_path.clone());
    let counts = journal.counts()?;

    println!("📋 Journal: {}", journal.path().display());
    println!("   Messages:  {}", counts.messages);
    println!("   Responses: {}", counts.responses);
    println!("   Locations: {}", counts.locations);
    Ok(())
}
