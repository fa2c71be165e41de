//! Terminal User Interface
//!
//! Provides an interactive console for the USB/IP management backend.
//!
//! # Layout
//!
//! The TUI is organized in four sections:
//! - **Top Panel**: Status bar showing the backend URL and device counts
//! - **Tabs**: Local, Remote, Attached, Virtual, Ports, Logs
//! - **Center Panel**: The selected page
//! - **Bottom Panel**: Help bar with context-sensitive keybindings
//!
//! Notifications are drawn as toasts in the top-right corner and expire
//! on their own.
//!
//! # Keybindings
//!
//! - `1`-`6`, `h/l`: Switch page
//! - `j/k` or arrow keys: Navigate lists
//! - `Enter`: Page action (bind, query, attach, toggle, filter)
//! - `d`: Detach / delete (with confirmation)
//! - `c`: Create virtual device or port, clear log filter
//! - `f`: Edit log filter
//! - `r`: Refresh all lists
//! - `x`: Dismiss oldest notification
//! - `q`: Quit (with confirmation)
//! - `?`: Show help

pub mod app;
pub mod events;
pub mod ui;

use anyhow::{Context, Result};
use crossterm::{
    event::Event,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use protocol::{
    ApiRequest, DeviceOverview, ListDevicesRequest, ListVirtualDevicesRequest,
    ListVirtualPortsRequest, LogRecord, LogsRequest, RemoteDevice, RemoteDevicesRequest,
    SearchDeviceInfoRequest, Severity, VirtualDevice, VirtualPort,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;
use crate::network::{ApiError, ConsoleClient};

pub use app::{App, AppAction, InputMode, Page};
pub use events::EventHandler;

/// Messages sent from async tasks to the TUI
#[derive(Debug)]
pub enum TuiMessage {
    /// Local and attached device lists fetched
    DevicesLoaded(DeviceOverview),
    /// Exported devices of a remote server fetched
    RemoteDevicesLoaded {
        host: String,
        devices: Vec<RemoteDevice>,
    },
    VirtualDevicesLoaded(Vec<VirtualDevice>),
    VirtualPortsLoaded(Vec<VirtualPort>),
    LogsLoaded(Vec<LogRecord>),
    /// Device info search returned a description
    DeviceInfoFound { busid: String, info: String },
    /// A state-changing call succeeded
    ActionSucceeded { message: String, refresh: bool },
    /// A call failed
    RequestFailed(ApiError),
    /// Status message
    StatusMessage(String),
}

/// Apply a message from a background task to the application state
///
/// Successful state changes schedule a refresh `app.refresh_delay` after
/// `now`; a newer success moves the deadline.
pub fn apply_message(app: &mut App, msg: TuiMessage, now: Instant) {
    match msg {
        TuiMessage::DevicesLoaded(overview) => {
            app.set_overview(overview);
        }
        TuiMessage::RemoteDevicesLoaded { host, devices } => {
            app.set_status(format!("{} exports {} device(s)", host, devices.len()));
            app.set_remote_devices(host, devices);
        }
        TuiMessage::VirtualDevicesLoaded(devices) => {
            app.set_virtual_devices(devices);
        }
        TuiMessage::VirtualPortsLoaded(ports) => {
            app.set_virtual_ports(ports);
        }
        TuiMessage::LogsLoaded(records) => {
            app.set_logs(records);
            if app.page == Page::Logs {
                app.set_status(app.log_summary());
            }
        }
        TuiMessage::DeviceInfoFound { busid, info } => {
            app.notifier
                .notify(&format!("Found info for {}", busid), Severity::Info);
            app.show_device_info(busid, info);
        }
        TuiMessage::ActionSucceeded { message, refresh } => {
            app.notifier.notify(&message, Severity::Success);
            if refresh {
                app.schedule_refresh(now);
            }
        }
        TuiMessage::RequestFailed(error) => {
            warn!("Backend call failed: {}", error);
            app.notifier.notify(&error.to_string(), error.severity());
        }
        TuiMessage::StatusMessage(msg) => {
            app.set_status(msg);
        }
    }
}

/// TUI runner that manages the terminal and event loop
pub struct TuiRunner {
    /// Terminal instance
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Application state
    app: App,
    /// Event handler
    event_handler: EventHandler,
    /// Backend client
    client: ConsoleClient,
    /// Number of log records to fetch
    log_limit: u32,
    /// Channel for receiving messages from async tasks
    message_rx: mpsc::Receiver<TuiMessage>,
    /// Channel for sending messages from async tasks
    message_tx: mpsc::Sender<TuiMessage>,
}

impl TuiRunner {
    /// Create a new TUI runner
    pub fn new(client: ConsoleClient, config: &ConsoleConfig) -> Result<Self> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal")?;

        // Create message channel
        let (message_tx, message_rx) = mpsc::channel(100);

        let notifier = common::Notifier::global().clone();
        notifier.set_ttl(config.notification_ttl());

        let app = App::new(client.base_url(), notifier, config.refresh_delay())
            .with_remote_hosts(&config.remote_hosts);

        Ok(Self {
            terminal,
            app,
            event_handler: EventHandler::new(),
            client,
            log_limit: config.console.log_limit,
            message_rx,
            message_tx,
        })
    }

    /// Run the TUI main loop
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting TUI");

        self.spawn_refresh();

        // Initial render
        self.terminal.draw(|f| ui::render(f, &self.app))?;

        loop {
            // Process any pending messages from async tasks
            while let Ok(msg) = self.message_rx.try_recv() {
                apply_message(&mut self.app, msg, Instant::now());
            }

            // Poll for terminal events
            if let Some(event) = self.event_handler.poll()? {
                let action = match event {
                    Event::Key(key) => self.event_handler.handle_key(&mut self.app, key),
                    Event::Resize(_, _) => {
                        // Terminal will re-render on next draw
                        AppAction::None
                    }
                    _ => AppAction::None,
                };

                // Handle the action
                self.handle_action(action);
            }

            // Expire toasts and run a refresh once it is due
            self.app.notifier.expire();
            if self.app.take_due_refresh(Instant::now()) {
                debug!("Running scheduled refresh");
                self.spawn_refresh();
            }

            // Check if we should quit
            if self.app.should_quit {
                break;
            }

            // Render
            self.terminal.draw(|f| ui::render(f, &self.app))?;
        }

        info!("TUI shutting down");
        Ok(())
    }

    /// Handle an application action
    fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::None => {}
            AppAction::Quit => {
                // Cleanup will happen in the caller
            }
            AppAction::Refresh => {
                self.app.cancel_refresh();
                self.app.set_status("Refreshing...".to_string());
                self.spawn_refresh();
            }
            AppAction::LoadRemote(req) => {
                self.app.set_status(format!("Querying {}...", req.ip));
                self.spawn_load_remote(req);
            }
            AppAction::SearchDeviceInfo(req) => {
                self.app
                    .set_status(format!("Searching info for {}...", req.device_id));
                self.spawn_search(req);
            }
            AppAction::Bind(req) => {
                let fallback = format!("Device {} published", req.busid);
                self.spawn_command(req, fallback);
            }
            AppAction::Attach(req) => {
                let fallback = format!("Attached {} from {}", req.busid, req.ip);
                self.spawn_command(req, fallback);
            }
            AppAction::Detach(req) => {
                let fallback = format!("Detached port {}", req.port);
                self.spawn_command(req, fallback);
            }
            AppAction::SaveAlias(req) => {
                let fallback = format!("Alias saved for {}", req.busid);
                self.spawn_command(req, fallback);
            }
            AppAction::NamePort(req) => {
                let fallback = format!("Port {} renamed", req.port_number);
                self.spawn_command(req, fallback);
            }
            AppAction::CreateVirtualDevice(req) => {
                let fallback = format!("Virtual device '{}' created", req.name);
                self.spawn_command(req, fallback);
            }
            AppAction::ToggleVirtualDevice(req) => {
                self.spawn_command(req, "Virtual device toggled".to_string());
            }
            AppAction::DeleteVirtualDevice(req) => {
                self.spawn_command(req, "Virtual device deleted".to_string());
            }
            AppAction::CreateVirtualPort(req) => {
                let fallback = format!("Virtual port {} created", req.port_number);
                self.spawn_command(req, fallback);
            }
            AppAction::DeleteVirtualPort(req) => {
                self.spawn_command(req, "Virtual port deleted".to_string());
            }
        }
    }

    /// Spawn async task for a state-changing call
    fn spawn_command<R>(&self, req: R, fallback: String)
    where
        R: ApiRequest + Send + Sync + 'static,
        R::Data: Send,
    {
        let client = self.client.clone();
        let tx = self.message_tx.clone();

        tokio::spawn(async move {
            let msg = match client.send(&req).await {
                Ok(reply) => TuiMessage::ActionSucceeded {
                    message: reply.message_or(&fallback),
                    refresh: true,
                },
                Err(e) => TuiMessage::RequestFailed(e),
            };
            let _ = tx.send(msg).await;
        });
    }

    /// Spawn async task to list the devices of a remote server
    fn spawn_load_remote(&self, req: RemoteDevicesRequest) {
        let client = self.client.clone();
        let tx = self.message_tx.clone();

        tokio::spawn(async move {
            let msg = match client.send(&req).await {
                Ok(reply) => TuiMessage::RemoteDevicesLoaded {
                    host: req.ip.clone(),
                    devices: reply.data.unwrap_or_default(),
                },
                Err(e) => TuiMessage::RequestFailed(e),
            };
            let _ = tx.send(msg).await;
        });
    }

    /// Spawn async task to search device info
    fn spawn_search(&self, req: SearchDeviceInfoRequest) {
        let client = self.client.clone();
        let tx = self.message_tx.clone();

        tokio::spawn(async move {
            let msg = match client.send(&req).await {
                Ok(reply) => match reply.data {
                    Some(info) if !info.trim().is_empty() => TuiMessage::DeviceInfoFound {
                        busid: req.device_id.clone(),
                        info,
                    },
                    _ => TuiMessage::RequestFailed(ApiError::Rejected {
                        status: 404,
                        message: reply.message_or("No information found for this device"),
                    }),
                },
                Err(e) => TuiMessage::RequestFailed(e),
            };
            let _ = tx.send(msg).await;
        });
    }

    /// Spawn async task to re-fetch every list
    ///
    /// Stops at the first failure so an unreachable backend yields one
    /// notification instead of one per list.
    fn spawn_refresh(&self) {
        let client = self.client.clone();
        let tx = self.message_tx.clone();
        let remote = self.app.remote_host.clone().map(|h| RemoteDevicesRequest::new(&h));
        let log_limit = self.log_limit;

        tokio::spawn(async move {
            if let Err(e) = refresh_all(&client, &tx, remote, log_limit).await {
                let _ = tx.send(TuiMessage::RequestFailed(e)).await;
            }
        });
    }
}

async fn refresh_all(
    client: &ConsoleClient,
    tx: &mpsc::Sender<TuiMessage>,
    remote: Option<RemoteDevicesRequest>,
    log_limit: u32,
) -> std::result::Result<(), ApiError> {
    let overview = client.send(&ListDevicesRequest {}).await?;
    let _ = tx
        .send(TuiMessage::DevicesLoaded(overview.data.unwrap_or_default()))
        .await;

    let devices = client.send(&ListVirtualDevicesRequest {}).await?;
    let _ = tx
        .send(TuiMessage::VirtualDevicesLoaded(devices.data.unwrap_or_default()))
        .await;

    let ports = client.send(&ListVirtualPortsRequest {}).await?;
    let _ = tx
        .send(TuiMessage::VirtualPortsLoaded(ports.data.unwrap_or_default()))
        .await;

    let logs = client.send(&LogsRequest { limit: log_limit }).await?;
    let _ = tx
        .send(TuiMessage::LogsLoaded(logs.data.unwrap_or_default()))
        .await;

    if let Some(req) = remote {
        let reply = client.send(&req).await?;
        let _ = tx
            .send(TuiMessage::RemoteDevicesLoaded {
                host: req.ip,
                devices: reply.data.unwrap_or_default(),
            })
            .await;
    }

    Ok(())
}

impl Drop for TuiRunner {
    fn drop(&mut self) {
        // Restore terminal state
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the TUI application
///
/// This is the main entry point for TUI mode. It creates a TuiRunner
/// and runs the main event loop.
///
/// # Arguments
/// * `client` - Backend client, already logged in if credentials are set
/// * `config` - Console configuration
///
/// # Example
/// ```no_run
/// use client::config::ConsoleConfig;
/// use client::network::ConsoleClient;
/// use client::tui::run;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ConsoleConfig::default();
///     let client = ConsoleClient::new(&config.backend.base_url, config.timeout())?;
///     run(client, &config).await
/// }
/// ```
pub async fn run(client: ConsoleClient, config: &ConsoleConfig) -> Result<()> {
    let mut runner = TuiRunner::new(client, config)?;
    let result = runner.run().await;

    // Drop pending toasts so a later session starts clean
    runner.app.notifier.reset();

    result
}
