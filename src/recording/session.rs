use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::recording::interaction_model::InteractionRecord;

/// Lifecycle of a recording session.
///
/// ```text
/// recording -> paused -> recording -> stopped -> processing -> completed
///                                                           \-> error
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Recording,
    Paused,
    Stopped,
    Processing,
    Completed,
    Error,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Recording => "recording",
            SessionStatus::Paused => "paused",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Processing => "processing",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// A recorded session. Owned by the persistence layer; the engine only reads
/// snapshots of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    pub status: SessionStatus,
    #[serde(default)]
    pub start_url: String,
    #[serde(default)]
    pub interactions: Vec<InteractionRecord>,
    pub started_at: u64,
    pub updated_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<u64>,
}

impl Session {
    /// Begin a new session in the `recording` state.
    pub fn start(id: &str, name: &str, start_url: &str, now_ms: u64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            status: SessionStatus::Recording,
            start_url: start_url.to_string(),
            interactions: Vec::new(),
            started_at: now_ms,
            updated_at: now_ms,
            ended_at: None,
        }
    }

    /// Append an interaction. Only allowed while recording.
    pub fn record(&mut self, interaction: InteractionRecord) -> EngineResult<()> {
        if self.status != SessionStatus::Recording {
            return Err(EngineError::InvalidTransition {
                from: self.status.to_string(),
                to: "record".into(),
            });
        }
        self.updated_at = self.updated_at.max(interaction.timestamp);
        self.interactions.push(interaction);
        Ok(())
    }

    pub fn pause(&mut self, now_ms: u64) -> EngineResult<()> {
        self.transition(&[SessionStatus::Recording], SessionStatus::Paused, now_ms)
    }

    pub fn resume(&mut self, now_ms: u64) -> EngineResult<()> {
        self.transition(&[SessionStatus::Paused], SessionStatus::Recording, now_ms)
    }

    pub fn stop(&mut self, now_ms: u64) -> EngineResult<()> {
        self.transition(
            &[SessionStatus::Recording, SessionStatus::Paused],
            SessionStatus::Stopped,
            now_ms,
        )?;
        self.ended_at = Some(now_ms);
        Ok(())
    }

    pub fn begin_processing(&mut self, now_ms: u64) -> EngineResult<()> {
        self.transition(&[SessionStatus::Stopped], SessionStatus::Processing, now_ms)
    }

    pub fn complete(&mut self, now_ms: u64) -> EngineResult<()> {
        self.transition(&[SessionStatus::Processing], SessionStatus::Completed, now_ms)
    }

    pub fn fail(&mut self, now_ms: u64) -> EngineResult<()> {
        self.transition(&[SessionStatus::Processing], SessionStatus::Error, now_ms)
    }

    /// Whether capture may still append to this session.
    pub fn is_live(&self) -> bool {
        matches!(self.status, SessionStatus::Recording | SessionStatus::Paused)
    }

    /// URL the session started at, falling back to the first interaction's.
    pub fn initial_url(&self) -> Option<&str> {
        if !self.start_url.is_empty() {
            return Some(&self.start_url);
        }
        self.interactions.first().map(|i| i.url.as_str())
    }

    fn transition(
        &mut self,
        allowed_from: &[SessionStatus],
        to: SessionStatus,
        now_ms: u64,
    ) -> EngineResult<()> {
        if !allowed_from.contains(&self.status) {
            return Err(EngineError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = now_ms;
        Ok(())
    }
}
