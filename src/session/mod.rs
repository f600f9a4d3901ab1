// src/session/mod.rs — Experience sessions and their history
//
// One session per visitor run. Finished sessions go to the front of a capped
// history that is written to `sessions.json` after every change
// (temp file + rename).

use chrono::{DateTime, Local, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Timeout,
    Error,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Timeout => "timeout",
            SessionStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    UserCompleted,
    Timeout,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub question_id: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub duration_ms: Option<u64>,
    pub completion_reason: Option<CompletionReason>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub responses: Vec<SessionResponse>,
    pub generated_artwork_id: Option<String>,
    #[serde(default)]
    pub metadata: SessionMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub total: usize,
    pub completed: usize,
    pub timeout: usize,
    pub error: usize,
    /// Mean duration of completed sessions, whole seconds.
    pub average_duration_secs: u64,
    pub today_count: usize,
    /// Percentage of sessions that completed, rounded.
    pub completion_rate: u32,
}

/// `session_<unix millis>_<9 base36 chars>`
pub fn generate_session_id() -> String {
    const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("session_{}_{suffix}", Utc::now().timestamp_millis())
}

pub struct SessionManager {
    current: Option<Session>,
    history: VecDeque<Session>,
    max_history: usize,
    history_path: Option<PathBuf>,
}

impl SessionManager {
    /// History kept in memory only.
    pub fn in_memory(max_history: usize) -> Self {
        Self {
            current: None,
            history: VecDeque::new(),
            max_history,
            history_path: None,
        }
    }

    /// Load history from `path`. An unreadable file starts an empty history.
    pub fn load(path: impl Into<PathBuf>, max_history: usize) -> Self {
        let path = path.into();
        let history = match read_history(&path) {
            Ok(mut history) => {
                history.truncate(max_history);
                history
            }
            Err(e) => {
                tracing::warn!("Failed to load session history from {}: {e}", path.display());
                VecDeque::new()
            }
        };
        Self {
            current: None,
            history,
            max_history,
            history_path: Some(path),
        }
    }

    pub fn start_session(&mut self) -> &Session {
        if self.current.is_some() {
            self.end_session(
                SessionStatus::Error,
                Some("New session started before completion".into()),
            );
        }

        let session = Session {
            id: generate_session_id(),
            start_time: Utc::now(),
            end_time: None,
            status: SessionStatus::Active,
            responses: Vec::new(),
            generated_artwork_id: None,
            metadata: SessionMetadata::default(),
        };
        tracing::info!(session_id = %session.id, "Session started");
        self.current.insert(session)
    }

    /// Returns false when there is no active session.
    pub fn add_response(&mut self, question_id: &str, answer: &str) -> bool {
        match self.current.as_mut() {
            Some(session) if session.status == SessionStatus::Active => {
                session.responses.push(SessionResponse {
                    question_id: question_id.to_string(),
                    answer: answer.to_string(),
                    timestamp: Utc::now(),
                });
                true
            }
            _ => {
                tracing::warn!("No active session to add response to");
                false
            }
        }
    }

    pub fn set_generated_artwork_id(&mut self, artwork_id: &str) -> bool {
        match self.current.as_mut() {
            Some(session) => {
                session.generated_artwork_id = Some(artwork_id.to_string());
                true
            }
            None => {
                tracing::warn!("No active session to set artwork ID");
                false
            }
        }
    }

    /// Finalize the current session and push it onto the history.
    pub fn end_session(
        &mut self,
        status: SessionStatus,
        error_message: Option<String>,
    ) -> Option<Session> {
        let Some(mut session) = self.current.take() else {
            tracing::warn!("No active session to end");
            return None;
        };

        let end = Utc::now();
        session.end_time = Some(end);
        session.status = status;
        session.metadata.duration_ms = Some((end - session.start_time).num_milliseconds().max(0) as u64);
        session.metadata.completion_reason = match status {
            SessionStatus::Completed => Some(CompletionReason::UserCompleted),
            SessionStatus::Timeout => Some(CompletionReason::Timeout),
            SessionStatus::Error => Some(CompletionReason::Error),
            SessionStatus::Active => None,
        };
        if status == SessionStatus::Error {
            session.metadata.error_message = error_message;
        }

        tracing::info!(session_id = %session.id, status = status.as_str(), "Session ended");
        self.push_history(session.clone());
        Some(session)
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Newest first.
    pub fn history(&self) -> Vec<Session> {
        self.history.iter().cloned().collect()
    }

    pub fn stats(&self) -> SessionStats {
        let total = self.history.len();
        let count = |status: SessionStatus| self.history.iter().filter(|s| s.status == status).count();
        let completed = count(SessionStatus::Completed);

        let completed_ms: u64 = self
            .history
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .map(|s| s.metadata.duration_ms.unwrap_or(0))
            .sum();
        let average_duration_secs = if completed > 0 {
            (completed_ms as f64 / completed as f64 / 1000.0).round() as u64
        } else {
            0
        };

        let today = Local::now().date_naive();
        let today_count = self
            .history
            .iter()
            .filter(|s| s.start_time.with_timezone(&Local).date_naive() == today)
            .count();

        let completion_rate = if total > 0 {
            (completed as f64 / total as f64 * 100.0).round() as u32
        } else {
            0
        };

        SessionStats {
            total,
            completed,
            timeout: count(SessionStatus::Timeout),
            error: count(SessionStatus::Error),
            average_duration_secs,
            today_count,
            completion_rate,
        }
    }

    /// Abandon the current session (recorded as an error).
    pub fn reset(&mut self) {
        if self.current.is_some() {
            self.end_session(SessionStatus::Error, Some("Session manager reset".into()));
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.save_history();
    }

    fn push_history(&mut self, session: Session) {
        self.history.push_front(session);
        self.history.truncate(self.max_history);
        self.save_history();
    }

    fn save_history(&self) {
        let Some(path) = &self.history_path else {
            return;
        };
        if let Err(e) = write_history(path, &self.history) {
            tracing::warn!("Failed to save session history: {e}");
        }
    }
}

fn read_history(path: &Path) -> anyhow::Result<VecDeque<Session>> {
    if !path.exists() {
        return Ok(VecDeque::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_history(path: &Path, history: &VecDeque<Session>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(history)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
