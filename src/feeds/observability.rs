use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::InputMode;
use crate::error::FeedError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FeedSeverity {
    /// The operation failed.
    Error,
    /// Transport failure or a missing collaborator.
    Critical,
}

impl FeedSeverity {
    /// Severity assigned to a failed operation.
    pub fn for_error(err: &FeedError) -> Self {
        match err {
            FeedError::Transport(_) => Self::Critical,
            FeedError::CapabilityUnavailable(_) => Self::Critical,
            FeedError::Configuration(_)
            | FeedError::RemoteApi { .. }
            | FeedError::ResourceNotFound { .. }
            | FeedError::InvalidReference(_)
            | FeedError::Unclassified(_) => Self::Error,
        }
    }
}

/// Which entry operation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOperation {
    FromUrl,
    FromAttachment,
    HealthCheck,
}

impl FeedOperation {
    pub fn name(self) -> &'static str {
        match self {
            Self::FromUrl => "get_feeds_from_url",
            Self::FromAttachment => "get_feeds_from_attachment",
            Self::HealthCheck => "check_health",
        }
    }
}

/// Context about one entry-operation invocation.
#[derive(Debug, Clone)]
pub struct FeedContext {
    pub operation: FeedOperation,
    pub input_mode: InputMode,
}

/// Stats reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    /// Records produced (returned or forwarded).
    pub records: usize,
    /// Whether the records were forwarded to ingestion instead of returned.
    pub forwarded: bool,
}

/// Observer interface for feed operation outcomes.
///
/// Implementations must not fail; a broken sink never masks the operation's own result.
pub trait FeedObserver: Send + Sync {
    /// Called when an operation succeeds.
    fn on_success(&self, _ctx: &FeedContext, _stats: FeedStats) {}

    /// Called when an operation fails.
    fn on_failure(&self, _ctx: &FeedContext, _severity: FeedSeverity, _error: &FeedError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &FeedContext, severity: FeedSeverity, error: &FeedError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn FeedObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn FeedObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl FeedObserver for CompositeObserver {
    fn on_success(&self, ctx: &FeedContext, stats: FeedStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &FeedContext, severity: FeedSeverity, error: &FeedError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &FeedContext, severity: FeedSeverity, error: &FeedError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits feed events as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl FeedObserver for TracingObserver {
    fn on_success(&self, ctx: &FeedContext, stats: FeedStats) {
        tracing::info!(
            operation = ctx.operation.name(),
            input = %ctx.input_mode,
            records = stats.records,
            forwarded = stats.forwarded,
            "feed operation succeeded"
        );
    }

    fn on_failure(&self, ctx: &FeedContext, severity: FeedSeverity, error: &FeedError) {
        tracing::warn!(
            operation = ctx.operation.name(),
            input = %ctx.input_mode,
            ?severity,
            %error,
            "feed operation failed"
        );
    }

    fn on_alert(&self, ctx: &FeedContext, severity: FeedSeverity, error: &FeedError) {
        tracing::error!(
            operation = ctx.operation.name(),
            input = %ctx.input_mode,
            ?severity,
            %error,
            "feed operation alert"
        );
    }
}

/// Appends feed events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl FeedObserver for FileObserver {
    fn on_success(&self, ctx: &FeedContext, stats: FeedStats) {
        self.append_line(&format!(
            "{} ok operation={} input={} records={} forwarded={}",
            unix_ts(),
            ctx.operation.name(),
            ctx.input_mode,
            stats.records,
            stats.forwarded
        ));
    }

    fn on_failure(&self, ctx: &FeedContext, severity: FeedSeverity, error: &FeedError) {
        self.append_line(&format!(
            "{} fail severity={:?} operation={} input={} err={}",
            unix_ts(),
            severity,
            ctx.operation.name(),
            ctx.input_mode,
            error
        ));
    }

    fn on_alert(&self, ctx: &FeedContext, severity: FeedSeverity, error: &FeedError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} operation={} input={} err={}",
            unix_ts(),
            severity,
            ctx.operation.name(),
            ctx.input_mode,
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
