use serde::{Deserialize, Serialize};

/// Server-side export job state as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    NotStarted,
    Started,
    Running,
    Done,
    Failed,
    /// Anything the client does not know; treated like `Failed`
    Unknown(String),
}

impl JobStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "not-started" | "not_started" => JobStatus::NotStarted,
            "started" => JobStatus::Started,
            "running" => JobStatus::Running,
            "done" => JobStatus::Done,
            "failed" => JobStatus::Failed,
            other => JobStatus::Unknown(other.to_string()),
        }
    }

    /// Job is still being prepared and should be polled again
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Started | JobStatus::Running)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::NotStarted => "not-started",
            JobStatus::Started => "started",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
            JobStatus::Unknown(other) => other,
        }
    }
}

/// Body returned by the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<serde_json::Number>,
}

impl StatusResponse {
    pub fn job_status(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }

    /// Watermark supplied with a `done` status
    pub fn watermark(&self) -> Option<i64> {
        let number = self.last_sync.as_ref()?;
        number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64))
    }
}
