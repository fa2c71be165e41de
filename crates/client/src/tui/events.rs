//! TUI event handling
//!
//! Handles keyboard input using crossterm and dispatches actions to the application.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

use super::app::{App, AppAction, InputMode, Page};

/// Event handler for TUI input
pub struct EventHandler {
    /// Tick rate for polling events
    tick_rate: Duration,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Create a new event handler
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(100),
        }
    }

    /// Poll for next event
    ///
    /// Returns Some(Event) if an event occurred, None if tick timeout elapsed.
    pub fn poll(&self) -> Result<Option<Event>> {
        if event::poll(self.tick_rate)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    /// Handle a key event and return the resulting action
    pub fn handle_key(&self, app: &mut App, key: KeyEvent) -> AppAction {
        // Ctrl+C quits from every mode
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            app.confirm_quit();
            return AppAction::Quit;
        }

        match &app.input_mode {
            InputMode::Normal => self.handle_normal_mode(app, key),
            InputMode::Prompt(_) => self.handle_prompt_mode(app, key),
            InputMode::Confirm(_) => self.handle_confirm_mode(app, key),
            InputMode::LogFilter { .. } => self.handle_filter_mode(app, key),
            InputMode::Help => self.handle_help_mode(app, key),
            InputMode::ConfirmQuit => self.handle_confirm_quit_mode(app, key),
        }
    }

    /// Handle key events in normal navigation mode
    fn handle_normal_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            // Quit
            KeyCode::Char('q') => {
                app.show_quit_confirm();
                AppAction::None
            }

            // Pages
            KeyCode::Char(c @ '1'..='6') => {
                let idx = c as usize - '1' as usize;
                app.set_page(Page::ALL[idx]);
                AppAction::None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                app.next_page();
                AppAction::None
            }
            KeyCode::Left | KeyCode::Char('h') => {
                app.prev_page();
                AppAction::None
            }

            // Navigation
            KeyCode::Tab => {
                app.toggle_pane();
                AppAction::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.navigate_up();
                AppAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.navigate_down();
                AppAction::None
            }

            // Actions
            KeyCode::Enter => app.handle_enter(),
            KeyCode::Char('b') if app.page == Page::Local => app.handle_bind(),
            KeyCode::Char('t') if app.page == Page::Virtual => app.handle_toggle(),
            KeyCode::Char('r') => AppAction::Refresh,
            KeyCode::Char('d') => {
                app.handle_delete();
                AppAction::None
            }
            KeyCode::Char('c') => {
                app.handle_create();
                AppAction::None
            }
            KeyCode::Char('n') => {
                app.handle_name();
                AppAction::None
            }
            KeyCode::Char('s') if app.page == Page::Local => {
                app.start_search();
                AppAction::None
            }
            KeyCode::Char('a') => {
                app.start_add_host();
                AppAction::None
            }
            KeyCode::Char('f') if app.page == Page::Logs => {
                app.start_log_filter();
                AppAction::None
            }
            KeyCode::Char('x') => {
                app.dismiss_toast();
                AppAction::None
            }

            // Help
            KeyCode::Char('?') => {
                app.show_help();
                AppAction::None
            }

            _ => AppAction::None,
        }
    }

    /// Handle key events while a prompt is open
    fn handle_prompt_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc => app.finish_prompt(false),
            KeyCode::Enter => app.finish_prompt(true),
            KeyCode::Backspace => {
                app.prompt_backspace();
                AppAction::None
            }
            KeyCode::Char(c) if !c.is_control() => {
                app.prompt_push(c);
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    /// Handle key events in the yes/no dialog
    fn handle_confirm_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.cancel_input();
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    /// Handle key events in the log filter form
    fn handle_filter_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Enter => {
                app.apply_log_filter();
            }
            KeyCode::Tab | KeyCode::Down => app.next_filter_field(),
            KeyCode::Backspace => app.filter_backspace(),
            KeyCode::Char(c) if !c.is_control() => app.filter_push(c),
            _ => {}
        }
        AppAction::None
    }

    /// Handle key events in help overlay mode
    fn handle_help_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q') => {
                app.cancel_input();
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    /// Handle key events in quit confirmation mode
    fn handle_confirm_quit_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.confirm_quit();
                AppAction::Quit
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.cancel_input();
                AppAction::None
            }
            _ => AppAction::None,
        }
    }
}
