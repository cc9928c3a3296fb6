use serde::Serialize;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Processing stage a journal event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Parse,
    Plan,
    Execute,
    Generate,
    Apply,
    Rollback,
    Summary,
}

/// One line of the JSONL run journal.
#[derive(Debug, Serialize)]
pub struct RunEvent {
    pub timestamp_ms: u128,
    pub session: String,
    pub stage: RunStage,

    pub file: Option<String>,

    pub inserted: Option<usize>,
    pub skipped: Option<usize>,
    pub generated: Option<usize>,

    pub message: Option<String>,
}

impl RunEvent {
    pub fn now(session: &str, stage: RunStage) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            session: session.to_string(),
            stage,
            file: None,
            inserted: None,
            skipped: None,
            generated: None,
            message: None,
        }
    }

    pub fn with_file(mut self, path: &Path) -> Self {
        self.file = Some(path.display().to_string());
        self
    }

    pub fn with_counts(mut self, inserted: usize, skipped: usize) -> Self {
        self.inserted = Some(inserted);
        self.skipped = Some(skipped);
        self
    }

    pub fn with_generated(mut self, generated: usize) -> Self {
        self.generated = Some(generated);
        self
    }

    pub fn with_message(mut self, message: impl ToString) -> Self {
        self.message = Some(message.to_string());
        self
    }
}
