//! TUI rendering with ratatui
//!
//! Renders the terminal user interface using ratatui widgets and layouts.

use protocol::{LogLevel, Severity};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState,
        Tabs, Wrap,
    },
};

use super::app::{ActivePane, App, Confirmation, FilterField, InputMode, Page, Prompt};

/// Colors used in the UI
mod colors {
    use ratatui::style::Color;

    pub const RUNNING: Color = Color::Green;
    pub const STOPPED: Color = Color::DarkGray;
    pub const ATTACHED: Color = Color::Green;

    pub const ACTIVE_BORDER: Color = Color::Cyan;
    pub const INACTIVE_BORDER: Color = Color::Gray;

    pub const HIGHLIGHT_BG: Color = Color::DarkGray;
    pub const STATUS_BAR_BG: Color = Color::Blue;
    pub const HELP_BAR_BG: Color = Color::DarkGray;

    // Toast notification colors
    pub const TOAST_INFO_BG: Color = Color::Blue;
    pub const TOAST_SUCCESS_BG: Color = Color::Green;
    pub const TOAST_WARNING_BG: Color = Color::Yellow;
    pub const TOAST_DANGER_BG: Color = Color::Red;
}

/// Most toasts drawn at once
const MAX_VISIBLE_TOASTS: usize = 5;

/// Render the complete UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Length(1), // Page tabs
            Constraint::Min(10),   // Page content
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    render_status_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_help_bar(frame, app, chunks[3]);

    // Render overlays based on input mode
    match &app.input_mode {
        InputMode::Prompt(prompt) => render_prompt_dialog(frame, prompt),
        InputMode::Confirm(confirmation) => render_confirm_dialog(frame, confirmation),
        InputMode::LogFilter { focus } => render_filter_dialog(frame, app, *focus),
        InputMode::Help => render_help_overlay(frame),
        InputMode::ConfirmQuit => render_quit_dialog(frame),
        InputMode::Normal => {}
    }

    // Render toast notifications (in top-right corner)
    render_toasts(frame, app);
}

/// Render the top status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_text = format!(
        " Backend: {} | Local: {} | Attached: {} | Virtual: {}/{} running",
        app.backend_url,
        app.local_devices.len(),
        app.attached_devices.len(),
        app.running_virtual_count(),
        app.virtual_devices.len()
    );

    let status_message = app
        .status_message
        .as_ref()
        .map(|m| format!(" | {}", m))
        .unwrap_or_default();

    let paragraph = Paragraph::new(Line::from(vec![
        Span::styled(status_text, Style::default().fg(Color::White)),
        Span::styled(status_message, Style::default().fg(Color::Yellow)),
    ]))
    .style(Style::default().bg(colors::STATUS_BAR_BG))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" USB/IP Console ")
            .title_style(Style::default().add_modifier(Modifier::BOLD)),
    );

    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = Page::ALL
        .iter()
        .enumerate()
        .map(|(i, page)| format!("{} {}", i + 1, page.title()))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.page.index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(colors::ACTIVE_BORDER)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.page {
        Page::Local => render_local_page(frame, app, area),
        Page::Remote => render_remote_page(frame, app, area),
        Page::Attached => render_attached_page(frame, app, area),
        Page::Virtual => render_virtual_page(frame, app, area),
        Page::Ports => render_ports_page(frame, app, area),
        Page::Logs => render_logs_page(frame, app, area),
    }
}

fn pane_block(title: &str, is_active: bool) -> Block<'_> {
    let border_color = if is_active {
        colors::ACTIVE_BORDER
    } else {
        colors::INACTIVE_BORDER
    };

    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title)
        .title_style(if is_active {
            Style::default()
                .fg(colors::ACTIVE_BORDER)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        })
}

fn render_placeholder(frame: &mut Frame, area: Rect, block: Block<'_>, text: &str) {
    let paragraph = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Render a selectable list, or a placeholder when it is empty
fn render_list(
    frame: &mut Frame,
    area: Rect,
    block: Block<'_>,
    items: Vec<ListItem<'_>>,
    selected: usize,
    empty_text: &str,
) {
    if items.is_empty() {
        render_placeholder(frame, area, block, empty_text);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(colors::HIGHLIGHT_BG)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_local_page(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let items: Vec<ListItem> = app
        .local_devices
        .iter()
        .map(|device| {
            let mut spans = vec![
                Span::styled(
                    format!("{:<8} ", device.busid),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{} ", device.vid_pid().unwrap_or_else(|| "????:????".to_string())),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(device.display_name().to_string()),
            ];
            if let Some(alias) = &device.alias {
                spans.push(Span::styled(
                    format!(" [{}]", alias),
                    Style::default().fg(Color::Magenta),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    render_list(
        frame,
        chunks[0],
        pane_block(" Local Devices ", true),
        items,
        app.selected_index(Page::Local),
        "No USB devices found",
    );

    let mut lines = Vec::new();
    if let Some(device) = app.selected_local() {
        lines.push(Line::from(Span::styled(
            device.display_name().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(format!("Bus ID: {}", device.busid)));
        for detail in &device.details {
            lines.push(Line::from(detail.clone()));
        }
        if let Some(panel) = app.device_info.as_ref().filter(|p| p.busid == device.busid) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Device info",
                Style::default().fg(Color::Yellow),
            )));
            for line in panel.text.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
    }

    let details = Paragraph::new(lines)
        .block(pane_block(" Details ", false))
        .wrap(Wrap { trim: false });
    frame.render_widget(details, chunks[1]);
}

fn render_remote_page(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35), // Host list
            Constraint::Percentage(65), // Device list
        ])
        .split(area);

    let hosts_active = app.active_pane == ActivePane::Hosts;
    let host_items: Vec<ListItem> = app
        .remote_hosts
        .iter()
        .map(|host| {
            let current = app.remote_host.as_deref() == Some(host.address.as_str());
            let (icon, color) = if current {
                ("[*]", colors::ATTACHED)
            } else {
                ("[ ]", Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::raw(host.display_name()),
            ]))
        })
        .collect();

    render_list(
        frame,
        chunks[0],
        pane_block(
            if hosts_active { " Servers (active) " } else { " Servers " },
            hosts_active,
        ),
        host_items,
        app.selected_host,
        "No servers\nPress a to add one",
    );

    let title = match &app.remote_host {
        Some(host) if !hosts_active => format!(" Devices on {} (active) ", host),
        Some(host) => format!(" Devices on {} ", host),
        None => " Devices ".to_string(),
    };
    let block = pane_block(&title, !hosts_active);

    if app.remote_host.is_none() {
        render_placeholder(frame, chunks[1], block, "Select a server and press Enter");
        return;
    }

    let device_items: Vec<ListItem> = app
        .remote_devices
        .iter()
        .map(|device| {
            let mut lines = vec![Line::from(vec![
                Span::styled(
                    format!("{:<8} ", device.busid),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(device.info.clone()),
            ])];
            for detail in &device.details {
                lines.push(Line::from(Span::styled(
                    format!("         {}", detail),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    render_list(
        frame,
        chunks[1],
        block,
        device_items,
        app.selected_index(Page::Remote),
        "No exported devices",
    );
}

fn render_attached_page(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .attached_devices
        .iter()
        .map(|device| {
            let mut spans = vec![
                Span::styled(
                    format!("Port {:<4} ", device.port),
                    Style::default().fg(colors::ATTACHED),
                ),
                Span::raw(device.info.clone()),
            ];
            if let (Some(host), Some(busid)) = (&device.remote_host, &device.remote_busid) {
                spans.push(Span::styled(
                    format!("  <- {}/{}", host, busid),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if let Some(name) = &device.custom_name {
                spans.push(Span::styled(
                    format!(" [{}]", name),
                    Style::default().fg(Color::Magenta),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    render_list(
        frame,
        area,
        pane_block(" Attached Devices ", true),
        items,
        app.selected_index(Page::Attached),
        "No attached devices",
    );
}

fn render_virtual_page(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .virtual_devices
        .iter()
        .map(|device| {
            let (icon, color) = if device.is_running {
                ("[+]", colors::RUNNING)
            } else {
                ("[ ]", colors::STOPPED)
            };
            let size = device
                .storage_size
                .map(|mb| format!(", {} MB", mb))
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::styled(
                    format!("[{}] ", device.id),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(device.name.clone()),
                Span::styled(
                    format!(" ({}{})", device.device_type.as_str(), size),
                    Style::default().fg(Color::Cyan),
                ),
            ]))
        })
        .collect();

    render_list(
        frame,
        area,
        pane_block(" Virtual Devices ", true),
        items,
        app.selected_index(Page::Virtual),
        "No virtual devices\nPress c to create one",
    );
}

fn render_ports_page(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .virtual_ports
        .iter()
        .map(|port| {
            let device = port
                .device_id
                .and_then(|id| app.virtual_devices.iter().find(|d| d.id == id))
                .map(|d| format!("  -> {}", d.name))
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("Port {:<4} ", port.port_number),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(port.name.clone().unwrap_or_default()),
                Span::styled(device, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    render_list(
        frame,
        area,
        pane_block(" Virtual Ports ", true),
        items,
        app.selected_index(Page::Ports),
        "No virtual ports\nPress c to create one",
    );
}

fn level_color(level: &LogLevel) -> Color {
    match level {
        LogLevel::Debug => Color::DarkGray,
        LogLevel::Info => Color::White,
        LogLevel::Warning => Color::Yellow,
        LogLevel::Error => Color::Red,
        LogLevel::Critical => Color::Magenta,
        LogLevel::Other(_) => Color::Gray,
    }
}

fn render_logs_page(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.logs.criteria().is_unrestricted() {
        format!(" Logs - {} ", app.log_summary())
    } else {
        format!(" Logs (filtered) - {} ", app.log_summary())
    };
    let block = pane_block(&title, true);

    let rows: Vec<Row> = app
        .logs
        .visible()
        .map(|entry| {
            Row::new(vec![
                Cell::from(entry.timestamp.clone()),
                Cell::from(entry.level.as_str()).style(Style::default().fg(level_color(&entry.level))),
                Cell::from(entry.source.clone()),
                Cell::from(entry.message.clone()),
            ])
        })
        .collect();

    if rows.is_empty() {
        let text = if app.logs.entries().is_empty() {
            "No log entries"
        } else {
            "No entries match the filter\nPress c to clear it"
        };
        render_placeholder(frame, area, block, text);
        return;
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(19),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Min(20),
        ],
    )
    .header(
        Row::new(vec!["Time", "Level", "Source", "Message"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(block)
    .row_highlight_style(
        Style::default()
            .bg(colors::HIGHLIGHT_BG)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = TableState::default();
    state.select(Some(app.selected_index(Page::Logs)));

    frame.render_stateful_widget(table, area, &mut state);
}

/// Render the bottom help bar
fn render_help_bar(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = match &app.input_mode {
        InputMode::Normal => match app.page {
            Page::Local => "j/k: Navigate | Enter/b: Bind | s: Device info | n: Alias | r: Refresh | q: Quit | ?: Help",
            Page::Remote => match app.active_pane {
                ActivePane::Hosts => "Tab: Switch | j/k: Navigate | Enter: Query | a: Add server | q: Quit | ?: Help",
                ActivePane::Devices => "Tab: Switch | j/k: Navigate | Enter: Attach | r: Refresh | q: Quit | ?: Help",
            },
            Page::Attached => "j/k: Navigate | d: Detach | n: Name port | r: Refresh | q: Quit | ?: Help",
            Page::Virtual => "j/k: Navigate | c: Create | t/Enter: Start/Stop | d: Delete | q: Quit | ?: Help",
            Page::Ports => "j/k: Navigate | c: Create | d: Delete | r: Refresh | q: Quit | ?: Help",
            Page::Logs => "j/k: Navigate | f: Filter | c: Clear filter | r: Reload | q: Quit | ?: Help",
        },
        InputMode::Prompt(_) => "Enter: Confirm | Esc: Cancel",
        InputMode::Confirm(_) => "y: Yes | n: No",
        InputMode::LogFilter { .. } => "Tab: Next field | Enter: Apply | Esc: Close",
        InputMode::Help => "Press any key to close",
        InputMode::ConfirmQuit => "y: Quit | n: Cancel",
    };

    let paragraph = Paragraph::new(help_text)
        .style(Style::default().fg(Color::White).bg(colors::HELP_BAR_BG))
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn dialog_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::ACTIVE_BORDER))
}

/// Render a single-value input dialog
fn render_prompt_dialog(frame: &mut Frame, prompt: &Prompt) {
    let area = centered_rect(60, 20, frame.area());

    // Clear the area first
    frame.render_widget(Clear, area);

    let block = dialog_block(prompt.pending.title());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Label
            Constraint::Length(3), // Input
            Constraint::Min(0),    // Spacing
        ])
        .split(inner);

    let label = Paragraph::new(prompt.pending.label()).style(Style::default().fg(Color::White));
    frame.render_widget(label, chunks[0]);

    let input_text = format!("{}_", prompt.input); // Show cursor
    let input_widget = Paragraph::new(input_text)
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(input_widget, chunks[1]);
}

fn render_confirm_dialog(frame: &mut Frame, confirmation: &Confirmation) {
    let area = centered_rect(50, 15, frame.area());
    frame.render_widget(Clear, area);

    let text = Text::from(vec![
        Line::from(""),
        Line::from(Span::styled(
            confirmation.question(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [Y]es  ", Style::default().fg(Color::Green)),
            Span::styled("  [N]o  ", Style::default().fg(Color::Red)),
        ]),
    ]);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title(" Confirm ")
                .title_style(Style::default().add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_filter_dialog(frame: &mut Frame, app: &App, focus: FilterField) {
    let area = centered_rect(60, 45, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = Vec::new();
    for field in FilterField::ALL {
        let focused = field == focus;
        let value = app.log_form.field(field);
        let shown = if focused {
            format!("{}_", value)
        } else if value.is_empty() {
            "all".to_string()
        } else {
            value.to_string()
        };
        let marker = if focused { "> " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}{:<20}", marker, field.label()),
                Style::default().fg(if focused {
                    colors::ACTIVE_BORDER
                } else {
                    Color::White
                }),
            ),
            Span::styled(
                shown,
                Style::default().fg(if focused { Color::Cyan } else { Color::Gray }),
            ),
        ]));
    }

    lines.push(Line::from(""));
    let levels: Vec<&str> = LogLevel::ALL.iter().map(|l| l.as_str()).collect();
    lines.push(Line::from(Span::styled(
        format!("Levels: {}", levels.join(", ")),
        Style::default().fg(Color::DarkGray),
    )));
    let sources = app.logs.sources();
    if !sources.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Sources: {}", sources.join(", ")),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(Span::styled(
        app.log_summary(),
        Style::default().fg(Color::Yellow),
    )));

    let paragraph = Paragraph::new(lines)
        .block(dialog_block(" Filter Logs "))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Render the help overlay
fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(70, 80, frame.area());

    // Clear the area first
    frame.render_widget(Clear, area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().add_modifier(Modifier::BOLD),
        ))
    };

    let help_text = Text::from(vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::UNDERLINED),
        )),
        Line::from(""),
        heading("Navigation"),
        Line::from("  1-6          Jump to page"),
        Line::from("  h/l, Left/Right  Previous / next page"),
        Line::from("  Up / k       Move selection up"),
        Line::from("  Down / j     Move selection down"),
        Line::from("  Tab          Switch pane (Remote)"),
        Line::from(""),
        heading("Devices"),
        Line::from("  Enter / b    Bind selected local device"),
        Line::from("  s            Search device info"),
        Line::from("  n            Set alias / name port"),
        Line::from("  a            Add USB/IP server (Remote)"),
        Line::from("  Enter        Query server / attach device (Remote)"),
        Line::from("  d            Detach device / delete virtual item"),
        Line::from("  c            Create virtual device or port"),
        Line::from("  t            Start / stop virtual device"),
        Line::from(""),
        heading("Logs"),
        Line::from("  f            Edit filter (level, source, dates)"),
        Line::from("  c            Clear filter"),
        Line::from(""),
        heading("General"),
        Line::from("  r            Refresh all lists"),
        Line::from("  x            Dismiss oldest notification"),
        Line::from("  ?            Show this help"),
        Line::from("  q            Quit (with confirmation)"),
        Line::from("  Ctrl+C       Quit immediately"),
    ]);

    let paragraph = Paragraph::new(help_text)
        .block(dialog_block(" Help "))
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

/// Render the quit confirmation dialog
fn render_quit_dialog(frame: &mut Frame) {
    let area = centered_rect(40, 15, frame.area());

    // Clear the area first
    frame.render_widget(Clear, area);

    let text = Text::from(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Are you sure you want to quit?",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [Y]es  ", Style::default().fg(Color::Green)),
            Span::styled("  [N]o  ", Style::default().fg(Color::Red)),
        ]),
    ]);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title(" Quit ")
                .title_style(Style::default().add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Render toast notifications in the top-right corner
fn render_toasts(frame: &mut Frame, app: &App) {
    let toasts = app.notifier.snapshot();
    if toasts.is_empty() {
        return;
    }

    let area = frame.area();
    let toast_width = 50u16.min(area.width.saturating_sub(4));
    let toast_height = 1u16;
    let margin = 2u16;

    // Start from top-right, below status bar and tabs
    let start_x = area.width.saturating_sub(toast_width + margin);
    let start_y = 5u16;

    for (i, toast) in toasts.iter().enumerate().take(MAX_VISIBLE_TOASTS) {
        let y = start_y + (i as u16) * (toast_height + 1);
        if y + toast_height > area.height.saturating_sub(2) {
            break; // No room for more toasts
        }

        let toast_area = Rect::new(start_x, y, toast_width, toast_height);

        let (bg_color, fg_color, icon) = match toast.severity {
            Severity::Info => (colors::TOAST_INFO_BG, Color::White, "i"),
            Severity::Success => (colors::TOAST_SUCCESS_BG, Color::Black, "+"),
            Severity::Warning => (colors::TOAST_WARNING_BG, Color::Black, "!"),
            Severity::Danger => (colors::TOAST_DANGER_BG, Color::White, "X"),
        };

        let max_msg_len = toast_width.saturating_sub(4) as usize;
        let msg = truncate(&toast.message, max_msg_len);

        let line = Line::from(vec![
            Span::styled(
                format!("[{}] ", icon),
                Style::default().fg(fg_color).bg(bg_color),
            ),
            Span::styled(msg, Style::default().fg(fg_color).bg(bg_color)),
        ]);

        let paragraph = Paragraph::new(line).style(Style::default().bg(bg_color));

        frame.render_widget(Clear, toast_area);
        frame.render_widget(paragraph, toast_area);
    }
}

/// Shorten `text` to `max` characters, ending in "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::clock::ManualClock;
    use common::test_utils::{create_mock_local_device, create_mock_log_records};
    use common::{NotificationQueue, Notifier};
    use protocol::DeviceOverview;
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;
    use std::time::Duration;

    fn test_app() -> App {
        let notifier = Notifier::new(NotificationQueue::new(Arc::new(ManualClock::new())));
        App::new("http://127.0.0.1:5000", notifier, Duration::from_millis(1000))
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let centered = centered_rect(50, 50, area);

        // Should be centered
        assert!(centered.x > 0);
        assert!(centered.y > 0);
        assert!(centered.x + centered.width < area.width);
        assert!(centered.y + centered.height < area.height);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Gerät Überwachung", 8), "Gerät...");
    }

    #[test]
    fn test_render_local_page() {
        let mut app = test_app();
        app.set_overview(DeviceOverview {
            local_devices: vec![create_mock_local_device("1-1.4", "0781", "5567")],
            attached_devices: Vec::new(),
        });

        let screen = draw(&app);
        assert!(screen.contains("USB/IP Console"));
        assert!(screen.contains("1-1.4"));
        assert!(screen.contains("0781:5567"));
    }

    #[test]
    fn test_render_log_summary() {
        let mut app = test_app();
        app.set_logs(create_mock_log_records(10));
        app.set_page(Page::Logs);

        let screen = draw(&app);
        assert!(screen.contains("Showing 10 of 10 entries"));
        assert!(screen.contains("Test message 1"));
    }

    #[test]
    fn test_render_toasts() {
        let app = test_app();
        app.notifier.notify("Device 1-1 published", Severity::Success);

        let screen = draw(&app);
        assert!(screen.contains("Device 1-1 published"));
    }

    #[test]
    fn test_render_dialogs() {
        let mut app = test_app();
        app.show_quit_confirm();
        assert!(draw(&app).contains("Are you sure you want to quit?"));

        app.set_page(Page::Logs);
        app.start_log_filter();
        assert!(draw(&app).contains("Filter Logs"));
    }
}
