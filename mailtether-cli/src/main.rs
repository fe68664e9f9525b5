//! Mailtether CLI
//!
//! Command-line interface for managing the Mailtether integration on a site.
//!
//! # Usage
//!
//! ```bash
//! # Save the access token issued by Mailtether
//! mailtether token save mm_live_abc123
//!
//! # Verify the token against the API
//! mailtether test
//!
//! # Turn on content sync (provisions an application password)
//! mailtether sync enable
//!
//! # Show the one-time application password
//! mailtether password reveal
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use mailtether_core::{
    FileOptionStore, HttpApiFactory, LocalPasswordIssuer, Notice, NoticeKind, OperatorGate,
    OutcomeCode, OwnerId, SettingsService,
};

mod config;

#[derive(Parser)]
#[command(name = "mailtether")]
#[command(about = "Manage the Mailtether integration for this site")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the stored access token
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Test the connection to the Mailtether API
    Test,

    /// Control content sync
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },

    /// Manage the site application password
    Password {
        #[command(subcommand)]
        command: PasswordCommands,
    },

    /// Show the stored integration state
    Status,
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Save an access token issued by Mailtether
    Save {
        /// The access token
        token: String,
    },
}

#[derive(Subcommand)]
enum SyncCommands {
    /// Enable content sync and provision an application password
    Enable,

    /// Disable content sync
    Disable,
}

#[derive(Subcommand)]
enum PasswordCommands {
    /// Replace the managed application password with a fresh one
    Regenerate,

    /// Print the staged application password (works once)
    Reveal,
}

/// Concrete service wiring used by every command.
type CliService = SettingsService<
    FileOptionStore,
    HttpApiFactory,
    LocalPasswordIssuer<FileOptionStore>,
    OperatorGate,
>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = config::load_config()?;
    info!("Loaded configuration from {:?}", config.config_path);

    let service = build_service(&config)?;

    match cli.command {
        Commands::Token { command } => match command {
            TokenCommands::Save { token } => save_token(&service, &token).await,
        },
        Commands::Test => test_connection(&service).await,
        Commands::Sync { command } => match command {
            SyncCommands::Enable => set_sync(&service, true).await,
            SyncCommands::Disable => set_sync(&service, false).await,
        },
        Commands::Password { command } => match command {
            PasswordCommands::Regenerate => regenerate_password(&service).await,
            PasswordCommands::Reveal => reveal_password(&service).await,
        },
        Commands::Status => show_status(&service).await,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

fn build_service(config: &config::CliConfig) -> Result<CliService> {
    let store = Arc::new(FileOptionStore::load_from_path(config.store_path.clone())?);
    let factory = Arc::new(HttpApiFactory::new());
    let issuer = Arc::new(LocalPasswordIssuer::new(Arc::clone(&store)));
    let gate = OperatorGate::new(Some(OwnerId::new(config.operator_id)));
    let api = config.api_config()?;

    Ok(SettingsService::new(store, factory, issuer, gate, api))
}

fn print_notice(outcome: OutcomeCode) {
    let notice = Notice::for_code(outcome);
    match notice.kind {
        NoticeKind::Success => println!("{}", notice.message),
        NoticeKind::Error => eprintln!("Error: {}", notice.message),
    }
}

async fn save_token(service: &CliService, token: &str) -> Result<()> {
    let outcome = service.save_token(token).await?;
    print_notice(outcome);
    Ok(())
}

async fn test_connection(service: &CliService) -> Result<()> {
    let outcome = service.test_connection().await?;
    print_notice(outcome);

    let status = service.connection_status().await?;
    println!("Status: {} ({})", status.state.label(), status.message);
    Ok(())
}

async fn set_sync(service: &CliService, enabled: bool) -> Result<()> {
    let outcome = service.set_sync_enabled(enabled).await?;
    print_notice(outcome);

    let status = service.app_password_status().await?;
    println!(
        "Application password: {} ({})",
        status.state.label(),
        status.message
    );
    Ok(())
}

async fn regenerate_password(service: &CliService) -> Result<()> {
    let outcome = service.regenerate_application_password().await?;
    print_notice(outcome);
    Ok(())
}

async fn reveal_password(service: &CliService) -> Result<()> {
    match service.reveal_staged_password().await? {
        Some(secret) => {
            println!("Application password (shown once, store it now):");
            println!("{}", secret.expose());
        }
        None => {
            eprintln!("No staged application password. It may have expired or already been revealed.");
        }
    }
    Ok(())
}

async fn show_status(service: &CliService) -> Result<()> {
    let has_token = service.has_token().await?;
    let sync = service.sync_enabled().await?;
    let connection = service.connection_status().await?;
    let password = service.app_password_status().await?;

    println!(
        "Access token:         {}",
        if has_token { "saved" } else { "not saved" }
    );
    println!(
        "Content sync:         {}",
        if sync { "enabled" } else { "disabled" }
    );

    println!("Connection:           {}", connection.state.label());
    if !connection.message.is_empty() {
        println!("  {}", connection.message);
    }
    if let Some(tested_at) = connection.tested_at {
        println!("  Last tested: {}", tested_at);
    }

    println!("Application password: {}", password.state.label());
    if !password.message.is_empty() {
        println!("  {}", password.message);
    }
    if let Some(updated_at) = password.updated_at {
        println!("  Last updated: {}", updated_at);
    }

    Ok(())
}
