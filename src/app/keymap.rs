use crate::app::types::{ActivePanel, InputMode, Popup, View};
use crate::app::{keymap_ext::AppKeymapExt, App};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::Backend, Terminal};

impl App {
    pub fn handle_key<B: Backend>(&mut self, key: KeyEvent, terminal: &mut Terminal<B>) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return self.handle_key_q();
        }
        if self.popup.is_some() {
            return self.handle_popup_key(key);
        }
        match self.input_mode {
            InputMode::Help => self.handle_help_key(key),
            InputMode::Search => self.handle_search_key(key),
            InputMode::Normal => match self.view {
                View::Hosts => self.handle_hosts_key(key, terminal),
                View::Processes => self.handle_processes_key(key),
                View::Debug => self.handle_debug_key(key),
            },
        }
    }

    /// Keys shared by every view.
    fn handle_global_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => self.handle_key_q()?,
            KeyCode::Char('?') => {
                self.help_scroll_position = 0;
                self.input_mode = InputMode::Help;
            }
            KeyCode::Char('1') => self.view = View::Hosts,
            KeyCode::Char('2') | KeyCode::Char('p') => self.view = View::Processes,
            KeyCode::Char('3') | KeyCode::Char('d') => self.view = View::Debug,
            KeyCode::Char('R') => self.handle_key_reload()?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn handle_hosts_key<B: Backend>(&mut self, key: KeyEvent, terminal: &mut Terminal<B>) -> Result<()> {
        if self.handle_global_key(key)? {
            return Ok(());
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => self.switch_panel(),
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => self.switch_panel_back(),
            KeyCode::Enter => self.handle_key_enter(terminal)?,
            KeyCode::Char('s') | KeyCode::Char('/') => self.enter_search_mode(),
            KeyCode::Char('e') => self.handle_key_e()?,
            KeyCode::Char('r') => self.handle_key_reload()?,
            KeyCode::Char('y') => self.handle_key_y(),
            _ => {}
        }
        Ok(())
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => self.clear_search(),
            KeyCode::Enter => self.accept_search(),
            KeyCode::Down => self.search_select_next(),
            KeyCode::Up => self.search_select_previous(),
            KeyCode::Backspace => {
                self.search_query.pop();
                self.filter_hosts();
            }
            KeyCode::Char(c) => {
                self.search_query.push(c);
                self.filter_hosts();
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_processes_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.handle_global_key(key)? {
            return Ok(());
        }
        let Some(id) = self.selected_process_id() else {
            return Ok(());
        };
        let outcome = match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.process_select_next();
                Ok(())
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.process_select_previous();
                Ok(())
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.toggle_process_details();
                Ok(())
            }
            KeyCode::Char('z') => self.launcher.pause(id),
            KeyCode::Char('r') => self.launcher.resume(id),
            KeyCode::Char('x') if self.preferences.confirm_kill => {
                self.popup = Some(Popup::ConfirmKill(id));
                Ok(())
            }
            KeyCode::Char('x') => self.launcher.kill(id),
            _ => Ok(()),
        };
        if let Err(e) = outcome {
            self.set_status(format!("Error: {}", e));
        }
        Ok(())
    }

    fn handle_debug_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.handle_global_key(key)? {
            return Ok(());
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.debug_scroll = self.debug_scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => self.debug_scroll = self.debug_scroll.saturating_sub(1),
            KeyCode::Char('c') => {
                self.console.clear();
                self.debug_scroll = 0;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_help_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => self.input_mode = InputMode::Normal,
            KeyCode::Down | KeyCode::Char('j') => {
                self.help_scroll_position = self.help_scroll_position.saturating_add(1)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.help_scroll_position = self.help_scroll_position.saturating_sub(1)
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup.clone() {
            Some(Popup::ConfirmKill(id)) => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.popup = None;
                    if let Err(e) = self.launcher.kill(id) {
                        self.set_status(format!("Error: {}", e));
                    }
                }
                KeyCode::Char('n') | KeyCode::Esc => self.popup = None,
                _ => {}
            },
            Some(Popup::Error { .. }) => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                    self.popup = None;
                }
            }
            None => {}
        }
        Ok(())
    }

    // Handle key
    pub fn handle_key_enter<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        match self.active_panel {
            ActivePanel::Groups => self.active_panel = ActivePanel::Hosts,
            ActivePanel::Hosts => self.active_panel = ActivePanel::Associations,
            ActivePanel::Associations => self.launch_selected(terminal)?,
        }
        Ok(())
    }

    pub fn handle_key_q(&mut self) -> Result<()> {
        if self.launcher.live_count() > 0 {
            tracing::info!("Quitting with {} processes still running", self.launcher.live_count());
        }
        self.should_quit = true;
        Ok(())
    }

    /// Open the selected host file in the default editor, then reload.
    pub fn handle_key_e(&mut self) -> Result<()> {
        let Some(path) = self.current_host_path() else {
            self.set_status("No host selected");
            return Ok(());
        };

        if let Err(e) = open::that(&path) {
            tracing::error!("Failed to open editor: {}", e);
            self.set_status(format!("Failed to open editor: {}", e));
            return Ok(());
        }

        self.handle_key_reload()
    }

    pub fn handle_key_reload(&mut self) -> Result<()> {
        match self.reload() {
            Ok(()) => self.set_status("Configuration reloaded"),
            Err(e) => self.show_error("Reload failed", format!("{:#}", e)),
        }
        Ok(())
    }

    /// Copy the resolved command of the selected association.
    pub fn handle_key_y(&mut self) {
        let command = match self.resolved_command() {
            Some(Ok(command)) => command,
            Some(Err(e)) => {
                self.show_error("Unable to resolve the command", e.to_string());
                return;
            }
            None => {
                self.set_status("No association selected");
                return;
            }
        };
        let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(command.clone()));
        match copied {
            Ok(()) => self.set_status(format!("Copied: {}", command)),
            Err(e) => {
                tracing::warn!("Clipboard unavailable: {}", e);
                self.set_status(format!("Failed to copy: {}", e));
            }
        }
    }
}
