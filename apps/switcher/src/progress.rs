//! Structured progress events emitted by long-running workflows.
//!
//! Workflows receive a [`Reporter`] and call [`Reporter::emit`] at each step.
//! Delivery is best-effort: a reporter may be silent, and the bridge in
//! [`crate::bridge`] drops events when its buffer is full.

use std::fmt;
use std::sync::Arc;

/// Step of a workflow that an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ReleaseFetch,
    ReleaseSelect,
    Download,
    Verify,
    Extract,
    GoInstall,
    ScopeUpdate,
    ShimUpdate,
    LintSync,
    Delete,
    Switch,
    Done,
}

impl Stage {
    /// Returns the stable kebab-case name of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReleaseFetch => "release-fetch",
            Self::ReleaseSelect => "release-select",
            Self::Download => "download",
            Self::Verify => "verify",
            Self::Extract => "extract",
            Self::GoInstall => "go-install",
            Self::ScopeUpdate => "scope-update",
            Self::ShimUpdate => "shim-update",
            Self::LintSync => "lint-sync",
            Self::Delete => "delete",
            Self::Switch => "switch",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One progress notification.
///
/// `current` and `total` are byte counts for transfers and zero otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub message: String,
    pub current: u64,
    pub total: u64,
}

impl ProgressEvent {
    /// Returns `true` if the event carries transfer byte counts.
    #[must_use]
    pub const fn is_transfer(&self) -> bool {
        self.current > 0 || self.total > 0
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_transfer() {
            write!(
                f,
                "[{}] {} {}",
                self.stage,
                self.message,
                format_transfer(self.current, self.total)
            )
        } else {
            write!(f, "[{}] {}", self.stage, self.message)
        }
    }
}

type Sink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Cloneable handle that forwards events to a sink, or discards them.
#[derive(Clone, Default)]
pub struct Reporter {
    sink: Option<Sink>,
}

impl Reporter {
    /// Creates a reporter that calls `sink` for every event.
    pub fn new(sink: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        Self {
            sink: Some(Arc::new(sink)),
        }
    }

    /// Creates a reporter that discards every event.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Sends a full event to the sink, if any.
    pub fn emit(&self, stage: Stage, message: impl Into<String>, current: u64, total: u64) {
        if let Some(sink) = &self.sink {
            sink(ProgressEvent {
                stage,
                message: message.into(),
                current,
                total,
            });
        }
    }

    /// Sends an event without byte counts.
    pub fn step(&self, stage: Stage, message: impl Into<String>) {
        self.emit(stage, message, 0, 0);
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("silent", &self.sink.is_none())
            .finish()
    }
}

/// Formats bytes into a human-readable string (B, KB, MB, GB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Formats transfer progress as `current / total (pct%)`.
///
/// Without a known total only the downloaded amount is shown. The
/// percentage is capped at 100.
#[must_use]
pub fn format_transfer(current: u64, total: u64) -> String {
    if total == 0 {
        return format!("{} downloaded", format_bytes(current));
    }

    #[allow(clippy::cast_precision_loss)]
    let percent = (current as f64 / total as f64 * 100.0).min(100.0);
    format!(
        "{} / {} ({percent:.0}%)",
        format_bytes(current),
        format_bytes(total)
    )
}
