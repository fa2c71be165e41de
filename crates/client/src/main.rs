//! usbip-console
//!
//! Terminal console for a USB/IP management backend: publish local USB
//! devices, attach devices exported by other hosts, manage virtual devices
//! and browse the backend log.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::config::ConsoleConfig;
use client::network::ConsoleClient;
use client::tui;
use common::{FilterCriteria, LogTable, setup_logging};
use protocol::{
    ApiRequest, AttachDeviceRequest, BindDeviceRequest, DetachDeviceRequest, LogsRequest,
    RemoteDevicesRequest,
};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "usbip-console")]
#[command(author, version, about = "USB/IP Console - Manage USB/IP devices from the terminal")]
#[command(long_about = "
Terminal console for a USB/IP management backend. Without a command it
starts the interactive TUI; with a command it performs one call and exits.

EXAMPLES:
    # Run with default config (interactive TUI)
    usbip-console

    # Publish a local device
    usbip-console bind 1-1.2

    # List devices exported by a saved or ad-hoc server
    usbip-console remote lab-pi

    # Show backend errors from one day
    usbip-console logs --level error --from 2024-03-01 --to 2024-03-01

CONFIGURATION:
    The console looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/usbip-console/console.toml
    3. /etc/usbip-console/console.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Backend base URL, overriding the configuration
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish a local device over USB/IP
    Bind {
        /// Bus ID (e.g. 1-1.2)
        busid: String,
    },
    /// List devices exported by a USB/IP server
    Remote {
        /// Saved server name or address
        host: String,
    },
    /// Attach a device exported by a USB/IP server
    Attach {
        /// Saved server name or address
        host: String,
        /// Bus ID on the server
        busid: String,
    },
    /// Detach the device on a local port
    Detach {
        /// Port number from the attached list
        port: String,
    },
    /// Print backend log records
    Logs {
        /// Number of records to fetch
        #[arg(long)]
        limit: Option<u32>,
        /// Only this level (debug, info, warning, error, critical)
        #[arg(long, default_value = "")]
        level: String,
        /// Only this source
        #[arg(long, default_value = "")]
        source: String,
        /// First day to include (YYYY-MM-DD)
        #[arg(long, default_value = "")]
        from: String,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long, default_value = "")]
        to: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = ConsoleConfig::default();
        let path = ConsoleConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    // Load configuration first (to get log level from config if not specified)
    let mut config = if let Some(ref path) = args.config {
        ConsoleConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        ConsoleConfig::load_or_default()
    };

    if let Some(url) = args.backend_url {
        config.backend.base_url = url;
        config.validate().context("Invalid --backend-url")?;
    }

    // Use CLI log level if specified, otherwise use config value
    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.console.log_level.clone());

    // The TUI owns the terminal, so its logs always go to a file
    let log_file = match args.command {
        None => Some(config.tui_log_file()),
        Some(_) => config.log_file(),
    };
    setup_logging(&log_level, log_file.as_deref()).context("Failed to setup logging")?;

    info!("usbip-console v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", config.backend.base_url);

    let client = ConsoleClient::new(&config.backend.base_url, config.timeout())
        .context("Failed to create HTTP client")?;

    let result = match args.command {
        None => run_tui_mode(client, &config).await,
        Some(command) => {
            login(&client, &config).await?;
            run_command(&client, &config, command).await
        }
    };

    info!("Console shutting down...");
    result
}

/// Log in when credentials are configured
async fn login(client: &ConsoleClient, config: &ConsoleConfig) -> Result<()> {
    match config.credentials() {
        Some((username, password)) => client
            .login(username, password)
            .await
            .context("Failed to log in to the backend"),
        None => {
            debug!("No credentials configured, skipping login");
            Ok(())
        }
    }
}

/// Run in TUI mode (interactive)
async fn run_tui_mode(client: ConsoleClient, config: &ConsoleConfig) -> Result<()> {
    info!("Starting TUI mode");

    // A failed login is shown in the console instead of aborting it
    if let Some((username, password)) = config.credentials() {
        if let Err(e) = client.login(username, password).await {
            warn!("Login failed: {}", e);
            common::notify(&format!("Login failed: {}", e), e.severity());
        }
    }

    tui::run(client, config).await
}

/// Resolve a saved server name to its address
fn resolve_host<'a>(host: &'a str, config: &'a ConsoleConfig) -> &'a str {
    match config.find_remote_host(host) {
        Some(saved) => {
            debug!("Resolved server '{}' to {}", host, saved.address);
            &saved.address
        }
        None => host,
    }
}

/// Send one state-changing request and print the backend's answer
async fn send_and_report<R: ApiRequest>(client: &ConsoleClient, req: &R, fallback: &str) -> Result<()> {
    let reply = client.send(req).await?;
    println!("{}", reply.message_or(fallback));
    Ok(())
}

async fn run_command(client: &ConsoleClient, config: &ConsoleConfig, command: Command) -> Result<()> {
    match command {
        Command::Bind { busid } => {
            let req = BindDeviceRequest::new(&busid);
            send_and_report(client, &req, &format!("Device {} published", req.busid)).await
        }
        Command::Remote { host } => {
            let req = RemoteDevicesRequest::new(resolve_host(&host, config));
            let devices = client.send(&req).await?.data.unwrap_or_default();
            if devices.is_empty() {
                println!("{} exports no devices", req.ip);
            }
            for device in devices {
                println!("{}", device.info);
                for detail in &device.details {
                    println!("    {}", detail);
                }
            }
            Ok(())
        }
        Command::Attach { host, busid } => {
            let req = AttachDeviceRequest::new(resolve_host(&host, config), &busid);
            let fallback = format!("Attached {} from {}", req.busid, req.ip);
            send_and_report(client, &req, &fallback).await
        }
        Command::Detach { port } => {
            let req = DetachDeviceRequest::new(&port);
            send_and_report(client, &req, &format!("Detached port {}", req.port)).await
        }
        Command::Logs {
            limit,
            level,
            source,
            from,
            to,
        } => {
            let criteria = FilterCriteria::from_form(&level, &source, &from, &to)?;
            let req = LogsRequest {
                limit: limit.unwrap_or(config.console.log_limit),
            };
            let records = client.send(&req).await?.data.unwrap_or_default();

            let mut table = LogTable::default();
            table.load(records);
            let outcome = table.apply(criteria);

            for entry in table.visible() {
                println!(
                    "{:<19}  {:<8}  {:<10}  {}",
                    entry.timestamp,
                    entry.level.as_str(),
                    entry.source,
                    entry.message
                );
            }
            println!(
                "Showing {} of {} entries",
                outcome.visible_count, outcome.total
            );
            Ok(())
        }
    }
}
