use chrono::{DateTime, Utc};

/// How a sync attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::Failed => "failed",
            RunOutcome::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "succeeded" => RunOutcome::Succeeded,
            "cancelled" => RunOutcome::Cancelled,
            _ => RunOutcome::Failed,
        }
    }
}

/// Entry that could not be merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub path: String,
    pub reason: String,
}

/// Counters for one merge pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub appended: usize,
    /// Skipped because the ledger already had them
    pub already_applied: usize,
    /// Dropped during extraction
    pub unreadable: usize,
    pub failed: Vec<FailedEntry>,
    pub polls: u32,
    pub watermark: Option<i64>,
}

impl SyncReport {
    pub fn written(&self) -> usize {
        self.created + self.appended
    }

    pub fn skipped(&self) -> usize {
        self.already_applied + self.unreadable
    }
}

/// One row of the sync history
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRun {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: RunOutcome,
    pub entries_written: i64,
    pub entries_skipped: i64,
    pub entries_failed: i64,
    pub watermark: Option<i64>,
    pub message: Option<String>,
}

impl SyncRun {
    /// Starts a new history row; the outcome is filled in by [`SyncRun::finish`]
    pub fn start() -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            outcome: RunOutcome::Failed,
            entries_written: 0,
            entries_skipped: 0,
            entries_failed: 0,
            watermark: None,
            message: None,
        }
    }

    pub fn finish(&mut self, outcome: RunOutcome, report: Option<&SyncReport>, message: Option<String>) {
        self.finished_at = Some(Utc::now());
        self.outcome = outcome;
        if let Some(report) = report {
            self.entries_written = report.written() as i64;
            self.entries_skipped = report.skipped() as i64;
            self.entries_failed = report.failed.len() as i64;
            self.watermark = report.watermark;
        }
        self.message = message;
    }
}
