use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Loading,
    Page { current: u32, count: u32 },
    LoadFailed(String),
}

/// Text shown next to the page: position within the document, or why the
/// document could not be shown, plus the last render error if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIndicator {
    status: Status,
    error: Option<String>,
}

impl StatusIndicator {
    pub fn new() -> Self {
        Self { status: Status::Loading, error: None }
    }

    pub fn show_page(&mut self, current: u32, count: u32) {
        if !matches!(self.status, Status::LoadFailed(_)) {
            self.status = Status::Page { current, count };
        }
    }

    /// Replaces the page text for good.
    pub fn show_load_failure(&mut self, reason: impl Into<String>) {
        self.status = Status::LoadFailed(reason.into());
        self.error = None;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn text(&self) -> String {
        self.to_string()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_load_failure(&self) -> bool {
        matches!(self.status, Status::LoadFailed(_))
    }
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            Status::Loading => f.write_str("Loading…"),
            Status::Page { current, count } => write!(f, "{current} / {count}"),
            Status::LoadFailed(reason) => write!(f, "Failed to load PDF: {reason}"),
        }
    }
}
