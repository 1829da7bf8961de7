use crate::preferences::Preferences;
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

const DEBUG_FORMAT_TIMESTAMP: &str = "[%Y-%m-%d %H:%M:%S]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DebugLine {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub text: String,
}

impl DebugLine {
    pub fn format(&self, with_timestamp: bool) -> String {
        if with_timestamp {
            format!(
                "{} {}: {}",
                self.timestamp.format(DEBUG_FORMAT_TIMESTAMP),
                self.severity.as_str(),
                self.text
            )
        } else {
            format!("{}: {}", self.severity.as_str(), self.text)
        }
    }
}

/// Bounded buffer behind the debug console. Cloning shares the buffer.
#[derive(Debug, Clone)]
pub struct DebugConsole {
    lines: Arc<Mutex<VecDeque<DebugLine>>>,
    capacity: usize,
}

impl DebugConsole {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, severity: Severity, text: impl Into<String>) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() == self.capacity {
                lines.pop_front();
            }
            lines.push_back(DebugLine {
                timestamp: Local::now(),
                severity,
                text: text.into(),
            });
        }
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }

    /// Lines passing the severity filters, formatted for display.
    pub fn render(&self, preferences: &Preferences) -> Vec<(Severity, String)> {
        let Ok(lines) = self.lines.lock() else {
            return Vec::new();
        };
        lines
            .iter()
            .filter(|line| match line.severity {
                Severity::Info => preferences.debug_show_info,
                Severity::Warning => preferences.debug_show_warning,
                Severity::Error => preferences.debug_show_error,
            })
            .map(|line| (line.severity, line.format(preferences.debug_timestamp)))
            .collect()
    }

    pub fn layer(&self) -> DebugLayer {
        DebugLayer {
            console: self.clone(),
        }
    }
}

/// Copies this crate's INFO, WARN and ERROR events into a [`DebugConsole`].
pub struct DebugLayer {
    console: DebugConsole,
}

impl<S: Subscriber> Layer<S> for DebugLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(env!("CARGO_CRATE_NAME")) {
            return;
        }
        let severity = match *metadata.level() {
            Level::ERROR => Severity::Error,
            Level::WARN => Severity::Warning,
            Level::INFO => Severity::Info,
            _ => return,
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.console.push(severity, visitor.finish());
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn buffer_drops_oldest_lines() {
        let console = DebugConsole::new(2);
        console.push(Severity::Info, "one");
        console.push(Severity::Warning, "two");
        console.push(Severity::Error, "three");

        let lines = console.render(&Preferences {
            debug_timestamp: false,
            ..Preferences::default()
        });
        assert_eq!(
            lines,
            vec![
                (Severity::Warning, "WARNING: two".to_string()),
                (Severity::Error, "ERROR: three".to_string()),
            ]
        );
    }

    #[test]
    fn severity_filters_apply() {
        let console = DebugConsole::new(10);
        console.push(Severity::Info, "hello");
        console.push(Severity::Error, "boom");

        let preferences = Preferences {
            debug_show_info: false,
            ..Preferences::default()
        };
        let lines = console.render(&preferences);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.ends_with("ERROR: boom"));
    }

    #[test]
    fn layer_captures_crate_events() {
        let console = DebugConsole::new(10);
        let subscriber = tracing_subscriber::registry().with(console.layer());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(pid = 42, "Process started");
            tracing::debug!("not captured");
        });

        let lines = console.render(&Preferences {
            debug_timestamp: false,
            ..Preferences::default()
        });
        assert_eq!(lines, vec![(Severity::Info, "INFO: Process started pid=42".to_string())]);
    }
}
