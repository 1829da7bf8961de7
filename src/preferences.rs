use crate::error::StoreError;
use crate::settings::Settings;
use std::path::PathBuf;
use std::time::Duration;

const SECTION_PREFERENCES: &str = "preferences";

const POLL_INTERVAL: &str = "poll interval";
const DEBUG_SHOW_INFO: &str = "debug show info";
const DEBUG_SHOW_WARNING: &str = "debug show warning";
const DEBUG_SHOW_ERROR: &str = "debug show error";
const DEBUG_TIMESTAMP: &str = "debug timestamp";
const DEBUG_BUFFER_SIZE: &str = "debug buffer size";
const CONFIRM_KILL: &str = "confirm kill";

/// User preferences kept in `settings.conf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub poll_interval: Duration,
    pub debug_show_info: bool,
    pub debug_show_warning: bool,
    pub debug_show_error: bool,
    pub debug_timestamp: bool,
    pub debug_buffer_size: usize,
    pub confirm_kill: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            debug_show_info: true,
            debug_show_warning: true,
            debug_show_error: true,
            debug_timestamp: true,
            debug_buffer_size: 500,
            confirm_kill: false,
        }
    }
}

impl Preferences {
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Self::default();
        let get_bool = |key: &str, default: bool| settings.get_bool(SECTION_PREFERENCES, key, default);

        let poll_ms = settings.get_int(
            SECTION_PREFERENCES,
            POLL_INTERVAL,
            defaults.poll_interval.as_millis() as i64,
        );
        let buffer_size = settings.get_int(
            SECTION_PREFERENCES,
            DEBUG_BUFFER_SIZE,
            defaults.debug_buffer_size as i64,
        );

        Self {
            // Sub-100ms polling would only burn CPU
            poll_interval: Duration::from_millis(poll_ms.max(100) as u64),
            debug_show_info: get_bool(DEBUG_SHOW_INFO, defaults.debug_show_info),
            debug_show_warning: get_bool(DEBUG_SHOW_WARNING, defaults.debug_show_warning),
            debug_show_error: get_bool(DEBUG_SHOW_ERROR, defaults.debug_show_error),
            debug_timestamp: get_bool(DEBUG_TIMESTAMP, defaults.debug_timestamp),
            debug_buffer_size: buffer_size.max(1) as usize,
            confirm_kill: get_bool(CONFIRM_KILL, defaults.confirm_kill),
        }
    }

    pub fn write_to(&self, settings: &mut Settings) {
        settings.set_int(SECTION_PREFERENCES, POLL_INTERVAL, self.poll_interval.as_millis() as i64);
        settings.set_bool(SECTION_PREFERENCES, DEBUG_SHOW_INFO, self.debug_show_info);
        settings.set_bool(SECTION_PREFERENCES, DEBUG_SHOW_WARNING, self.debug_show_warning);
        settings.set_bool(SECTION_PREFERENCES, DEBUG_SHOW_ERROR, self.debug_show_error);
        settings.set_bool(SECTION_PREFERENCES, DEBUG_TIMESTAMP, self.debug_timestamp);
        settings.set_int(SECTION_PREFERENCES, DEBUG_BUFFER_SIZE, self.debug_buffer_size as i64);
        settings.set_bool(SECTION_PREFERENCES, CONFIRM_KILL, self.confirm_kill);
    }

    /// Load the preferences file, writing the defaults out on first run.
    pub fn load(path: impl Into<PathBuf>) -> Result<(Self, Settings), StoreError> {
        let mut settings = Settings::load(path)?;
        let preferences = Self::from_settings(&settings);
        if !settings.path().exists() {
            preferences.write_to(&mut settings);
            settings.save()?;
        }
        Ok((preferences, settings))
    }
}
