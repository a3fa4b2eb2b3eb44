//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use claimdesk_core::api::ApiSettings;
use claimdesk_core::config::{self, Config};
use claimdesk_core::logging;
use claimdesk_core::session::{SessionStore, TokenStore};
use tokio::runtime::Runtime;

mod commands;

#[derive(Parser)]
#[command(name = "claimdesk")]
#[command(version)]
#[command(about = "Insurance claim review from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,
        /// Read from CLAIMDESK_PASSWORD, or prompted when omitted
        #[arg(long, env = "CLAIMDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        /// Read from CLAIMDESK_PASSWORD, or prompted when omitted
        #[arg(long, env = "CLAIMDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Remove the stored session token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Upload the four claim documents and print the decision
    Analyze {
        #[arg(long, value_name = "PDF")]
        policy: PathBuf,
        #[arg(long, value_name = "PDF")]
        claim: PathBuf,
        #[arg(long, value_name = "PDF")]
        bills: PathBuf,
        #[arg(long = "doctor-notes", value_name = "PDF")]
        doctor_notes: PathBuf,
        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List previous analyses
    History {
        #[arg(long)]
        json: bool,
    },
    /// Show one previous analysis
    Show {
        #[arg(value_name = "ID", value_parser = analysis_id)]
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the API origin
    SetUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("load config")?;
    let _log_guard = match logging::init(&config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    // one tokio runtime for everything
    let rt = Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli.command, &config).await })
}

fn analysis_id(raw: &str) -> Result<String, String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err("analysis id must not be empty".to_string());
    }
    Ok(id.to_string())
}

fn session_store(config: &Config) -> Result<SessionStore> {
    let settings = ApiSettings::from_config(config)?;
    let tokens = TokenStore::new(config::paths::session_path());
    Ok(SessionStore::new(tokens, settings))
}

async fn dispatch(command: Option<Commands>, config: &Config) -> Result<()> {
    let Some(command) = command else {
        return claimdesk_tui::run_dashboard(session_store(config)?).await;
    };

    match command {
        Commands::Login { email, password } => {
            commands::auth::login(&session_store(config)?, email, password).await
        }
        Commands::Register {
            email,
            full_name,
            password,
        } => {
            let store = session_store(config)?;
            commands::auth::register(&store, email, full_name, password).await
        }
        Commands::Logout => commands::auth::logout(&session_store(config)?),
        Commands::Whoami => commands::auth::whoami(&session_store(config)?).await,
        Commands::Analyze {
            policy,
            claim,
            bills,
            doctor_notes,
            json,
        } => {
            let paths = commands::claims::DocumentPaths {
                policy,
                claim,
                bills,
                doctor_notes,
            };
            commands::claims::analyze(&session_store(config)?, &paths, json).await
        }
        Commands::History { json } => {
            commands::claims::history(&session_store(config)?, json).await
        }
        Commands::Show { id, json } => {
            commands::claims::show(&session_store(config)?, &id, json).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetUrl { url } => commands::config::set_url(&url),
        },
    }
}
