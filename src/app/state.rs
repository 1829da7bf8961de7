use crate::app::types::{ActivePanel, AssociationRow, FilteredHost, InputMode, Popup, View};
use crate::app::App;
use crate::catalog::Catalog;
use crate::config::ConfigManager;
use crate::debug_log::DebugConsole;
use crate::error::LaunchError;
use crate::launcher::Launcher;
use crate::model::{Group, Host};
use crate::preferences::Preferences;
use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use ratatui::{backend::Backend, widgets::ListState, Terminal};
use std::collections::HashSet;
use std::time::Instant;

impl App {
    pub fn new(
        config_manager: ConfigManager,
        catalog: Catalog,
        preferences: Preferences,
        console: DebugConsole,
    ) -> Self {
        let launcher = Launcher::new(preferences.poll_interval);
        let mut app = Self {
            should_quit: false,
            config_manager,
            catalog,
            launcher,
            preferences,
            console,
            input_mode: InputMode::Normal,
            active_panel: ActivePanel::Groups,
            view: View::Hosts,
            popup: None,
            status_message: None,
            selected_group: 0,
            selected_host: 0,
            selected_association: 0,
            association_rows: Vec::new(),
            group_list_state: ListState::default(),
            host_list_state: ListState::default(),
            association_list_state: ListState::default(),
            search_query: String::new(),
            filtered_hosts: Vec::new(),
            search_selected: 0,
            selected_process: 0,
            expanded_processes: HashSet::new(),
            process_list_state: ListState::default(),
            debug_scroll: 0,
            help_scroll_position: 0,
        };
        app.group_list_state.select(Some(0));
        app.update_hosts_for_selected_group();
        app
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    pub fn show_error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.popup = Some(Popup::Error {
            title: title.into(),
            message: message.into(),
        });
    }

    /// Re-read everything from disk, keeping the selection where possible.
    pub fn reload(&mut self) -> Result<()> {
        let group = self.current_group().map(|g| g.name.clone());
        let host = self.current_host().map(|h| h.name.clone());

        tracing::info!("Reloading the configuration from {:?}", self.config_manager.config_dir());
        self.catalog.reload().context("Failed to reload the configuration")?;

        self.selected_group = group
            .and_then(|name| self.catalog.groups().iter().position(|g| g.name == name))
            .unwrap_or(0);
        self.group_list_state.select(Some(self.selected_group));
        self.update_hosts_for_selected_group();
        let position = host.and_then(|name| self.current_hosts().iter().position(|h| h.name == name));
        if let Some(position) = position {
            self.select_host(position);
        }
        if self.input_mode == InputMode::Search {
            self.filter_hosts();
        }
        Ok(())
    }

    // Browsing

    pub fn current_group(&self) -> Option<&Group> {
        self.catalog.groups().iter().nth(self.selected_group)
    }

    pub fn current_hosts(&self) -> Vec<&Host> {
        match self.current_group() {
            Some(group) => self
                .catalog
                .hosts(&group.name)
                .map(|hosts| hosts.iter().collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    pub fn current_host(&self) -> Option<&Host> {
        self.current_hosts().get(self.selected_host).copied()
    }

    pub fn current_association(&self) -> Option<&AssociationRow> {
        self.association_rows.get(self.selected_association)
    }

    pub fn switch_panel(&mut self) {
        self.active_panel = match self.active_panel {
            ActivePanel::Groups => ActivePanel::Hosts,
            ActivePanel::Hosts => ActivePanel::Associations,
            ActivePanel::Associations => ActivePanel::Groups,
        };
        tracing::debug!("Switched to {:?} panel", self.active_panel);
    }

    pub fn switch_panel_back(&mut self) {
        self.active_panel = match self.active_panel {
            ActivePanel::Groups => ActivePanel::Associations,
            ActivePanel::Hosts => ActivePanel::Groups,
            ActivePanel::Associations => ActivePanel::Hosts,
        };
    }

    pub fn update_hosts_for_selected_group(&mut self) {
        let empty = self.current_hosts().is_empty();
        self.selected_host = 0;
        self.host_list_state.select(if empty { None } else { Some(0) });
        self.update_associations_for_selected_host();
    }

    fn select_host(&mut self, position: usize) {
        self.selected_host = position;
        self.host_list_state.select(Some(position));
        self.update_associations_for_selected_host();
    }

    pub fn update_associations_for_selected_host(&mut self) {
        self.association_rows = self
            .current_host()
            .map(|host| {
                host.associations()
                    .map(|(destination, association)| AssociationRow {
                        destination: destination.name.clone(),
                        value: destination.value.clone(),
                        service: association.service.clone(),
                        arguments: association.arguments.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.selected_association = 0;
        self.association_list_state
            .select((!self.association_rows.is_empty()).then_some(0));
    }

    pub fn select_next(&mut self) {
        self.step_selection(1);
    }

    pub fn select_previous(&mut self) {
        self.step_selection(-1);
    }

    fn step_selection(&mut self, step: isize) {
        let wrap = |current: usize, total: usize| -> usize {
            (current as isize + step).rem_euclid(total as isize) as usize
        };
        match self.active_panel {
            ActivePanel::Groups => {
                let total = self.catalog.groups().len();
                if total == 0 {
                    return;
                }
                self.selected_group = wrap(self.selected_group, total);
                self.group_list_state.select(Some(self.selected_group));
                self.update_hosts_for_selected_group();
            }
            ActivePanel::Hosts => {
                let total = self.current_hosts().len();
                if total == 0 {
                    return;
                }
                let position = wrap(self.selected_host, total);
                self.select_host(position);
            }
            ActivePanel::Associations => {
                let total = self.association_rows.len();
                if total == 0 {
                    return;
                }
                self.selected_association = wrap(self.selected_association, total);
                self.association_list_state.select(Some(self.selected_association));
            }
        }
    }

    // Search logic

    pub fn enter_search_mode(&mut self) {
        self.input_mode = InputMode::Search;
        self.search_query.clear();
        self.filter_hosts();
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.filtered_hosts.clear();
        self.search_selected = 0;
        self.input_mode = InputMode::Normal;
    }

    /// Fuzzy-match every host of every group against the query, best first.
    pub fn filter_hosts(&mut self) {
        let matcher = SkimMatcherV2::default();
        let mut matches = Vec::new();
        for group in self.catalog.groups().iter() {
            let Ok(hosts) = self.catalog.hosts(&group.name) else {
                continue;
            };
            for host in hosts.iter() {
                if self.search_query.is_empty() {
                    matches.push(FilteredHost {
                        group: group.name.clone(),
                        host: host.name.clone(),
                        score: 0,
                        matched_indices: Vec::new(),
                    });
                    continue;
                }
                let by_name = matcher.fuzzy_indices(&host.name, &self.search_query);
                let by_description = matcher
                    .fuzzy_match(&host.description, &self.search_query)
                    .map(|score| (score, Vec::new()));
                let best = match (by_name, by_description) {
                    (Some(name), Some(description)) if description.0 > name.0 => Some(description),
                    (Some(name), _) => Some(name),
                    (None, description) => description,
                };
                if let Some((score, matched_indices)) = best {
                    matches.push(FilteredHost {
                        group: group.name.clone(),
                        host: host.name.clone(),
                        score,
                        matched_indices,
                    });
                }
            }
        }
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        self.filtered_hosts = matches;

        if self.search_selected >= self.filtered_hosts.len() {
            self.search_selected = 0;
        }
        self.host_list_state.select(if self.filtered_hosts.is_empty() {
            None
        } else {
            Some(self.search_selected)
        });
    }

    pub fn search_select_next(&mut self) {
        if self.filtered_hosts.is_empty() {
            return;
        }
        self.search_selected = (self.search_selected + 1) % self.filtered_hosts.len();
        self.host_list_state.select(Some(self.search_selected));
    }

    pub fn search_select_previous(&mut self) {
        if self.filtered_hosts.is_empty() {
            return;
        }
        let total = self.filtered_hosts.len();
        self.search_selected = (self.search_selected + total - 1) % total;
        self.host_list_state.select(Some(self.search_selected));
    }

    /// Leave search mode with the chosen host selected in its group.
    pub fn accept_search(&mut self) {
        let Some(found) = self.filtered_hosts.get(self.search_selected).cloned() else {
            self.clear_search();
            return;
        };
        self.clear_search();
        let group = self.catalog.groups().iter().position(|g| g.name == found.group);
        if let Some(group) = group {
            self.selected_group = group;
            self.group_list_state.select(Some(group));
            self.update_hosts_for_selected_group();
        }
        let position = self.current_hosts().iter().position(|h| h.name == found.host);
        if let Some(position) = position {
            self.select_host(position);
        }
        self.active_panel = ActivePanel::Associations;
    }

    // Processes

    pub fn poll_processes(&mut self) {
        let exited = self.launcher.poll_all();
        if let Some(id) = exited.last() {
            if let Some(record) = self.launcher.record(*id) {
                let message = format!("Process #{} ({}) ended: {}", id, record.service, record.status());
                self.set_status(message);
            }
        }
    }

    pub fn selected_process_id(&self) -> Option<u64> {
        self.launcher.records().get(self.selected_process).map(|r| r.id)
    }

    pub fn process_select_next(&mut self) {
        let total = self.launcher.records().len();
        if total > 0 {
            self.selected_process = (self.selected_process + 1) % total;
        }
    }

    pub fn process_select_previous(&mut self) {
        let total = self.launcher.records().len();
        if total > 0 {
            self.selected_process = (self.selected_process + total - 1) % total;
        }
    }

    pub fn toggle_process_details(&mut self) {
        if let Some(id) = self.selected_process_id() {
            if !self.expanded_processes.remove(&id) {
                self.expanded_processes.insert(id);
            }
        }
    }

    /// Launch the selected association. Terminal services get the terminal
    /// until they exit.
    pub fn launch_selected<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let (Some(group), Some(host), Some(row)) = (
            self.current_group().map(|g| g.name.clone()),
            self.current_host().map(|h| h.name.clone()),
            self.current_association().cloned(),
        ) else {
            self.set_status("Nothing to launch");
            return Ok(());
        };

        let (entity, destination, service) =
            match self.catalog.target(&group, &host, &row.destination, &row.service, &row.arguments) {
                Ok(target) => (target.host.clone(), target.destination.clone(), target.service.clone()),
                Err(e) => {
                    self.set_status(format!("Error: {}", e));
                    return Ok(());
                }
            };
        let in_terminal = service.terminal;
        if in_terminal {
            self.transition_to_terminal_mode(terminal)?;
        }

        let launched = self
            .launcher
            .launch(&entity, &destination, &service, &row.arguments);
        let outcome = match launched {
            Ok(id) if in_terminal => self.launcher.wait(id).map(|()| id),
            other => other,
        };
        if in_terminal {
            self.restore_tui_mode(terminal)?;
        }

        match outcome {
            Ok(id) => {
                let status = self
                    .launcher
                    .record(id)
                    .map(|r| format!("Process #{} started: {}", id, r.command))
                    .unwrap_or_default();
                self.set_status(status);
            }
            Err(LaunchError::Template(e)) => {
                self.show_error(
                    "Unable to launch the service",
                    format!("{} on {}/{}: {}", row.service, host, row.destination, e),
                );
            }
            Err(e) => self.set_status(format!("Error: {}", e)),
        }
        Ok(())
    }

    pub fn transition_to_terminal_mode<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(&mut stdout, LeaveAlternateScreen, DisableMouseCapture)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        tracing::debug!("TUI suspended for a terminal service");
        Ok(())
    }

    pub fn restore_tui_mode<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        enable_raw_mode().context("Failed to re-enable raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(&mut stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to re-enter alternate screen")?;
        terminal.clear().context("Failed to clear terminal")?;
        tracing::debug!("TUI restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Arguments, DestinationType, HostEditor, Service};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let config = ConfigManager::new(Some(PathBuf::from(dir.path()))).unwrap();
        let mut catalog = Catalog::open(&config).unwrap();
        catalog
            .add_service(Service::new("ssh", "Secure shell", "ssh {address}"))
            .unwrap();
        catalog.add_group(Group::new("lab", "Lab machines")).unwrap();
        for (group, name) in [("", "router"), ("lab", "builder"), ("lab", "backup")] {
            let mut editor = HostEditor::new();
            editor.name = name.into();
            editor.description = format!("The {}", name);
            editor.add_destination("lan", "10.0.0.5", DestinationType::Ipv4).unwrap();
            editor
                .add_association("lan", "ssh", Arguments::new(), catalog.services())
                .unwrap();
            catalog.commit_host(group, &editor).unwrap();
        }
        let app = App::new(config, catalog, Preferences::default(), DebugConsole::new(10));
        (dir, app)
    }

    #[test]
    fn selection_follows_groups() {
        let (_dir, mut app) = app();
        assert_eq!(app.current_host().unwrap().name, "router");
        assert_eq!(app.association_rows.len(), 1);

        app.select_next();
        assert_eq!(app.current_group().unwrap().name, "lab");
        assert_eq!(app.current_host().unwrap().name, "backup");

        app.active_panel = ActivePanel::Hosts;
        app.select_next();
        assert_eq!(app.current_host().unwrap().name, "builder");
        app.select_next();
        assert_eq!(app.current_host().unwrap().name, "backup");
    }

    #[test]
    fn search_jumps_to_the_host() {
        let (_dir, mut app) = app();
        app.enter_search_mode();
        assert_eq!(app.filtered_hosts.len(), 3);

        app.search_query = "bld".into();
        app.filter_hosts();
        assert_eq!(app.filtered_hosts[0].host, "builder");

        app.accept_search();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.current_group().unwrap().name, "lab");
        assert_eq!(app.current_host().unwrap().name, "builder");
        assert_eq!(app.active_panel, ActivePanel::Associations);
    }

    #[test]
    fn reload_keeps_the_selection() {
        let (_dir, mut app) = app();
        app.select_next();
        app.active_panel = ActivePanel::Hosts;
        app.select_next();
        app.reload().unwrap();
        assert_eq!(app.current_host().unwrap().name, "builder");
    }
}
