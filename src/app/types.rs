use crate::catalog::Catalog;
use crate::config::ConfigManager;
use crate::debug_log::DebugConsole;
use crate::launcher::Launcher;
use crate::model::{Arguments, ProcessId};
use crate::preferences::Preferences;
use ratatui::widgets::ListState;
use std::collections::HashSet;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePanel {
    Groups,
    Hosts,
    Associations,
}

/// The full-screen page currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Hosts,
    Processes,
    Debug,
}

/// Modal dialogs. While one is open it receives every key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    Error { title: String, message: String },
    ConfirmKill(ProcessId),
}

/// A host matching the search query, with the matched character positions
/// of its name.
#[derive(Debug, Clone)]
pub struct FilteredHost {
    pub group: String,
    pub host: String,
    pub score: i64,
    pub matched_indices: Vec<usize>,
}

/// One launchable line of the associations panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationRow {
    pub destination: String,
    pub value: String,
    pub service: String,
    pub arguments: Arguments,
}

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub config_manager: ConfigManager,
    pub catalog: Catalog,
    pub launcher: Launcher,
    pub preferences: Preferences,
    pub console: DebugConsole,

    pub input_mode: InputMode,
    pub active_panel: ActivePanel,
    pub view: View,
    pub popup: Option<Popup>,
    pub status_message: Option<(String, Instant)>,

    // Browsing
    pub selected_group: usize,
    pub selected_host: usize,
    pub selected_association: usize,
    pub association_rows: Vec<AssociationRow>,
    pub group_list_state: ListState,
    pub host_list_state: ListState,
    pub association_list_state: ListState,

    // Search Mode
    pub search_query: String,
    pub filtered_hosts: Vec<FilteredHost>,
    pub search_selected: usize,

    // Processes
    pub selected_process: usize,
    pub expanded_processes: HashSet<ProcessId>,
    pub process_list_state: ListState,

    pub debug_scroll: u16,
    pub help_scroll_position: u16,
}
