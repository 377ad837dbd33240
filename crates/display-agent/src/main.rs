// ============================================
// File: crates/display-agent/src/main.rs
// ============================================
//! # Display Agent Entry Point
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing
//! - Configuration loading with one-shot environment overrides
//! - One-shot device registration
//! - Command agent execution
//!
//! ## Usage
//! ```bash
//! # Periodic (systemd timer / cron): report identity to the registry.
//! # Exits non-zero on any failed attempt so the scheduler's failure
//! # logging fires.
//! display-agent register
//!
//! # Long-running: serve authenticated reboot/shutdown commands
//! display-agent start
//!
//! # Other commands
//! display-agent status              # Credential presence and identity
//! display-agent validate            # Validate config file
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `register` is scheduled externally (reference cadence: 5 minutes);
//!   it never loops or retries internally
//! - The agent needs privileges for systemctl reboot/poweroff; use
//!   --dry-run to exercise it without them

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use display_agent::{AgentConfig, CommandAgent, HostControl, NoopHost, SystemdHost};
use display_common::DeviceIdentity;
use display_registrar::RegistryClient;

const DEFAULT_CONFIG_PATH: &str = "/etc/inpatient-display/agent.toml";

// ============================================
// CLI Definition
// ============================================

/// Display appliance agent
///
/// Registers this device with the central display registry and serves
/// authenticated reboot/shutdown commands on the local network.
#[derive(Parser, Debug)]
#[command(name = "display-agent")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report this device's identity to the registry (one attempt)
    Register {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Run the command agent listener
    Start {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Log host actions instead of performing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show credential presence and detected device identity
    Status {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging("info");

    let result = match cli.command {
        Commands::Register { config } => cmd_register(config).await,
        Commands::Start { config, dry_run } => cmd_start(config, dry_run).await,
        Commands::Status { config } => cmd_status(config).await,
        Commands::Validate { config } => cmd_validate(config).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Runs one registration attempt. Any outcome other than new/updated
/// exits non-zero so the external scheduler can detect the failure.
async fn cmd_register(config_path: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&config_path).await?;

    let client = RegistryClient::new(config.registry.clone(), config.credential_store())?;
    let outcome = client.register().await?;

    if outcome.is_success() {
        println!("{outcome}");
        Ok(())
    } else {
        Err(anyhow::anyhow!("registration failed: {outcome}"))
    }
}

/// Runs the command agent.
async fn cmd_start(config_path: PathBuf, dry_run: bool) -> anyhow::Result<()> {
    let config = load_config(&config_path).await?;

    // Re-initialize logging with the configured level.
    init_logging(&config.logging.level);

    let host: Arc<dyn HostControl> = if dry_run {
        info!("Dry-run mode: host actions will be logged, not performed");
        Arc::new(NoopHost::new())
    } else {
        Arc::new(SystemdHost::new())
    };

    let agent = CommandAgent::new(config, host);
    agent.run().await?;
    Ok(())
}

/// Shows credential presence (never the value) and detected identity.
async fn cmd_status(config_path: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&config_path).await?;
    let store = config.credential_store();

    println!("Display Appliance Status");
    println!("========================================");
    println!();
    println!(
        "Credential:    {}",
        if store.is_configured() {
            "configured"
        } else {
            "MISSING"
        }
    );
    println!("Key file:      {}", store.key_file().display());

    match DeviceIdentity::detect() {
        Ok(identity) => {
            println!("Hostname:      {}", identity.hostname);
            println!("Primary IP:    {}", identity.ip);
        }
        Err(e) => {
            println!("Identity:      unavailable ({e})");
        }
    }

    println!("Registry:      {}", config.registry.base_url);
    println!(
        "Cadence:       every {}s (external scheduler)",
        config.registry.register_interval_secs
    );
    println!("Listener:      {}", config.listener.bind_addr);
    println!();

    Ok(())
}

/// Validates the configuration file.
async fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!("Config file not found: {}", config_path.display());
        println!("The agent will use default values.");
        return Ok(());
    }

    let config = AgentConfig::load(&config_path).await?;

    println!("Configuration is valid");
    println!();
    println!("Listener:");
    println!("   Bind:           {}", config.listener.bind_addr);
    println!("   Reboot delay:   {}s", config.listener.reboot_delay_secs);
    println!();
    println!("Registry:");
    println!("   Base URL:       {}", config.registry.base_url);
    println!(
        "   Timeout:        {}s",
        config.registry.request_timeout_secs
    );
    println!();
    println!("Credential:");
    println!("   Key file:       {}", config.credential.key_file);
    if let Some(unit) = &config.credential.legacy_unit_file {
        println!("   Legacy unit:    {unit}");
    }

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads config (defaults when the file is absent) and applies
/// environment overrides exactly once.
async fn load_config(path: &PathBuf) -> anyhow::Result<AgentConfig> {
    let mut config = if path.exists() {
        AgentConfig::load(path).await?
    } else {
        info!("Config file not found, using defaults");
        AgentConfig::default()
    };
    config.apply_env_overrides()?;
    Ok(config)
}
