// src/flow/mod.rs — Timed question flow
//
// One countdown covers the whole question phase. The owner polls the flow
// (a tokio interval in the server, after every answer in the terminal kiosk)
// and the configured policy decides what happens once the countdown hits zero.

pub mod questions;

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::infra::errors::TalkArtError;
use questions::{Question, Response};

/// What to do when the countdown runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Answer the current question with its first option, one question per poll.
    Skip,
    /// Stop and hand over whatever has been answered.
    Proceed,
    /// Push the deadline back so half of the limit remains.
    Extend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Idle,
    Active,
    Completed,
    TimedOut,
    Stopped,
}

impl FlowStatus {
    /// The flow produced a response set the caller should act on.
    pub fn is_finished(self) -> bool {
        matches!(self, FlowStatus::Completed | FlowStatus::TimedOut)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    /// Flow not running.
    Idle,
    Ticking {
        remaining: Duration,
    },
    /// A question was answered on the visitor's behalf.
    Skipped {
        question_id: String,
        answer: String,
        completed: bool,
    },
    TimedOut,
    Extended {
        remaining: Duration,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub question_number: usize,
    pub total_questions: usize,
    pub percentage: f64,
    pub time_elapsed_ms: u64,
    pub time_remaining_ms: u64,
}

pub struct QuestionFlow {
    questions: Vec<Question>,
    max_duration: Duration,
    policy: TimeoutPolicy,
    max_extensions: u32,
    index: usize,
    responses: Vec<Response>,
    status: FlowStatus,
    started_at: Option<Instant>,
    deadline: Option<Instant>,
    extensions: u32,
    hit_timeout: bool,
}

impl QuestionFlow {
    pub fn new(questions: Vec<Question>, max_duration: Duration, policy: TimeoutPolicy) -> Self {
        Self {
            questions,
            max_duration,
            policy,
            max_extensions: 1,
            index: 0,
            responses: Vec::new(),
            status: FlowStatus::Idle,
            started_at: None,
            deadline: None,
            extensions: 0,
            hit_timeout: false,
        }
    }

    pub fn with_max_extensions(mut self, max_extensions: u32) -> Self {
        self.max_extensions = max_extensions;
        self
    }

    /// (Re)start from the first question with a full countdown.
    pub fn start(&mut self, now: Instant) {
        self.index = 0;
        self.responses.clear();
        self.extensions = 0;
        self.hit_timeout = false;
        self.started_at = Some(now);
        self.deadline = Some(now + self.max_duration);
        self.status = if self.questions.is_empty() {
            FlowStatus::Completed
        } else {
            FlowStatus::Active
        };
    }

    pub fn stop(&mut self) {
        if self.status == FlowStatus::Active {
            self.status = FlowStatus::Stopped;
        }
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == FlowStatus::Active
    }

    /// Whether the countdown expired at any point during this run.
    pub fn hit_timeout(&self) -> bool {
        self.hit_timeout
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.is_active() {
            self.questions.get(self.index)
        } else {
            None
        }
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Record the visitor's answer. Returns the full response list once the
    /// last question has been answered.
    pub fn select_answer(&mut self, answer: &str) -> Result<Option<Vec<Response>>, TalkArtError> {
        let question = self.current_question().ok_or(TalkArtError::FlowInactive)?;
        if !question.has_option(answer) {
            return Err(TalkArtError::InvalidAnswer {
                question_id: question.id.clone(),
                answer: answer.to_string(),
            });
        }
        let response = Response::for_question(question, answer);
        Ok(self.record(response))
    }

    fn record(&mut self, response: Response) -> Option<Vec<Response>> {
        self.responses.push(response);
        self.index += 1;
        if self.index >= self.questions.len() {
            self.status = FlowStatus::Completed;
            Some(self.responses.clone())
        } else {
            None
        }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline
            .map(|d| d.saturating_duration_since(now))
            .unwrap_or(self.max_duration)
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started_at
            .map(|s| now.saturating_duration_since(s))
            .unwrap_or_default()
    }

    /// Advance the timer. Applies the timeout policy when the countdown is at zero.
    pub fn poll(&mut self, now: Instant) -> FlowEvent {
        if !self.is_active() {
            return FlowEvent::Idle;
        }

        let remaining = self.remaining(now);
        if !remaining.is_zero() {
            return FlowEvent::Ticking { remaining };
        }

        self.hit_timeout = true;
        match self.policy {
            TimeoutPolicy::Skip => self.skip_current(),
            TimeoutPolicy::Extend if self.extensions < self.max_extensions => {
                self.extensions += 1;
                let remaining = self.max_duration / 2;
                self.deadline = Some(now + remaining);
                tracing::debug!(extension = self.extensions, "question flow deadline extended");
                FlowEvent::Extended { remaining }
            }
            TimeoutPolicy::Extend | TimeoutPolicy::Proceed => {
                self.status = FlowStatus::TimedOut;
                FlowEvent::TimedOut
            }
        }
    }

    fn skip_current(&mut self) -> FlowEvent {
        let Some(question) = self.questions.get(self.index) else {
            self.status = FlowStatus::TimedOut;
            return FlowEvent::TimedOut;
        };
        let Some(answer) = question.default_answer().map(str::to_string) else {
            self.status = FlowStatus::TimedOut;
            return FlowEvent::TimedOut;
        };
        let question_id = question.id.clone();
        let response = Response::for_question(question, &answer);
        let completed = self.record(response).is_some();
        FlowEvent::Skipped {
            question_id,
            answer,
            completed,
        }
    }

    pub fn progress(&self, now: Instant) -> Progress {
        let total = self.questions.len();
        let number = (self.index + 1).min(total.max(1));
        let percentage = if total == 0 {
            100.0
        } else {
            number as f64 / total as f64 * 100.0
        };
        Progress {
            question_number: number,
            total_questions: total,
            percentage,
            time_elapsed_ms: self.elapsed(now).as_millis() as u64,
            time_remaining_ms: self.remaining(now).as_millis() as u64,
        }
    }
}
