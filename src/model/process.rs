use chrono::{DateTime, Local};

pub type ProcessId = u64;

pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Start,
    Pause,
    Stop,
}

impl StatusIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusIcon::Start => "start",
            StatusIcon::Pause => "pause",
            StatusIcon::Stop => "stop",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            StatusIcon::Start => "▶",
            StatusIcon::Pause => "⏸",
            StatusIcon::Stop => "■",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessDetail {
    pub timestamp: DateTime<Local>,
    pub status: String,
    pub icon: StatusIcon,
}

/// A launched command and its history. Records live for the session only.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub id: ProcessId,
    pub timestamp: DateTime<Local>,
    pub host: String,
    pub destination: String,
    pub service: String,
    pub command: String,
    pub pid: u32,
    pub details: Vec<ProcessDetail>,
}

impl ProcessRecord {
    pub fn new(
        id: ProcessId,
        host: impl Into<String>,
        destination: impl Into<String>,
        service: impl Into<String>,
        command: impl Into<String>,
        pid: u32,
    ) -> Self {
        Self {
            id,
            timestamp: Local::now(),
            host: host.into(),
            destination: destination.into(),
            service: service.into(),
            command: command.into(),
            pid,
            details: Vec::new(),
        }
    }

    pub fn add_detail(&mut self, status: impl Into<String>, icon: StatusIcon) {
        self.details.push(ProcessDetail {
            timestamp: Local::now(),
            status: status.into(),
            icon,
        });
    }

    /// The latest status line, shown on the record's own row.
    pub fn status(&self) -> &str {
        self.details.last().map(|d| d.status.as_str()).unwrap_or("")
    }

    pub fn icon(&self) -> Option<StatusIcon> {
        self.details.last().map(|d| d.icon)
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}
