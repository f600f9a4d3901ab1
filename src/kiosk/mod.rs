// src/kiosk/mod.rs — One visitor's walk through the experience
//
// start -> questions -> generation -> result, with an error phase that falls
// back to start on its own after a short pause. The kiosk itself is plain
// synchronous state; timers and generation are driven from outside.

pub mod pipeline;

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::art::prompt;
use crate::flow::questions::{Question, Response};
use crate::flow::{FlowEvent, FlowStatus, Progress, QuestionFlow};
use crate::infra::config::ExperienceConfig;
use crate::infra::errors::{TalkArtError, USER_ERROR_MESSAGE};
use crate::session::{SessionManager, SessionStatus};
use crate::store::Artwork;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Start,
    Questions,
    Generation,
    Result,
    Error,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Questions => "questions",
            Phase::Generation => "generation",
            Phase::Result => "result",
            Phase::Error => "error",
        }
    }
}

/// Everything the generator needs, taken out of the kiosk so the lock can be
/// released while the image is being made.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub session_id: String,
    pub responses: Vec<Response>,
    pub timed_out: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct KioskSnapshot {
    pub phase: Phase,
    pub session_id: Option<String>,
    pub question: Option<Question>,
    pub progress: Option<Progress>,
    pub responses: Vec<Response>,
    pub artwork: Option<Artwork>,
    pub summary: Option<String>,
    pub error: Option<String>,
}

pub struct Kiosk {
    flow: QuestionFlow,
    sessions: SessionManager,
    phase: Phase,
    session_id: Option<String>,
    timed_out: bool,
    artwork: Option<Artwork>,
    summary: Option<String>,
    error: Option<String>,
    error_at: Option<Instant>,
    error_reset: Duration,
}

impl Kiosk {
    pub fn new(questions: Vec<Question>, config: &ExperienceConfig, sessions: SessionManager) -> Self {
        let flow = QuestionFlow::new(questions, config.question_time_limit(), config.timeout_policy)
            .with_max_extensions(config.max_extensions);
        Self {
            flow,
            sessions,
            phase: Phase::Start,
            session_id: None,
            timed_out: false,
            artwork: None,
            summary: None,
            error: None,
            error_at: None,
            error_reset: Duration::from_secs(config.error_reset_secs),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionManager {
        &mut self.sessions
    }

    pub fn flow(&self) -> &QuestionFlow {
        &self.flow
    }

    /// Begin a new visit. Allowed from start, result and error.
    pub fn start_experience(&mut self, now: Instant) -> Result<String, TalkArtError> {
        if !matches!(self.phase, Phase::Start | Phase::Result | Phase::Error) {
            return Err(self.wrong_phase("start"));
        }
        self.clear_outcome();

        let session_id = self.sessions.start_session().id.clone();
        self.flow.start(now);
        self.session_id = Some(session_id.clone());
        self.phase = Phase::Questions;
        Ok(session_id)
    }

    /// Answer the current question. Returns true once the questions are done.
    pub fn answer(&mut self, answer: &str, now: Instant) -> Result<bool, TalkArtError> {
        if self.phase != Phase::Questions {
            return Err(self.wrong_phase("questions"));
        }
        let shown = self.flow.current_question().map(|q| q.id.clone());
        // A countdown that already expired takes precedence over the click.
        self.tick(now);
        if self.ready_for_generation() {
            return Ok(true);
        }
        let question_id = self
            .flow
            .current_question()
            .map(|q| q.id.clone())
            .ok_or(TalkArtError::FlowInactive)?;
        if shown.as_deref() != Some(question_id.as_str()) {
            // The click was meant for a question that was just skipped.
            tracing::debug!(question_id = %question_id, "Dropping answer for a skipped question");
            return Ok(false);
        }

        let done = self.flow.select_answer(answer)?.is_some();
        self.sessions.add_response(&question_id, answer);
        Ok(done)
    }

    /// Advance timers. Returns the flow event when the questions are running.
    pub fn tick(&mut self, now: Instant) -> FlowEvent {
        match self.phase {
            Phase::Questions => {
                let event = self.flow.poll(now);
                match &event {
                    FlowEvent::Skipped {
                        question_id, answer, ..
                    } => {
                        tracing::info!(question_id = %question_id, answer = %answer, "Question timed out, default answer used");
                        self.sessions.add_response(question_id, answer);
                    }
                    FlowEvent::TimedOut => tracing::info!("Question time limit reached"),
                    _ => {}
                }
                event
            }
            Phase::Error => {
                if self
                    .error_at
                    .is_some_and(|at| now.saturating_duration_since(at) >= self.error_reset)
                {
                    tracing::debug!("Error phase expired, back to start");
                    self.phase = Phase::Start;
                    self.clear_outcome();
                }
                FlowEvent::Idle
            }
            _ => FlowEvent::Idle,
        }
    }

    pub fn ready_for_generation(&self) -> bool {
        self.phase == Phase::Questions && self.flow.status().is_finished()
    }

    pub fn begin_generation(&mut self) -> Result<GenerationJob, TalkArtError> {
        if !self.ready_for_generation() {
            return Err(self.wrong_phase("questions"));
        }
        let session_id = self.session_id.clone().ok_or(TalkArtError::NoActiveSession)?;
        self.timed_out = self.flow.hit_timeout() || self.flow.status() == FlowStatus::TimedOut;
        self.phase = Phase::Generation;
        Ok(GenerationJob {
            session_id,
            responses: self.flow.responses().to_vec(),
            timed_out: self.timed_out,
        })
    }

    /// Whether a generation job for `session_id` is still the one in flight.
    fn awaits(&self, session_id: &str) -> bool {
        self.phase == Phase::Generation && self.session_id.as_deref() == Some(session_id)
    }

    /// Show the finished artwork. Returns false when the kiosk has moved on
    /// (reset or a new visitor) and the result was dropped.
    pub fn complete_generation(&mut self, session_id: &str, artwork: Artwork) -> bool {
        if !self.awaits(session_id) {
            tracing::debug!(session_id, phase = self.phase.as_str(), "Dropping stale generation result");
            return false;
        }
        self.sessions.set_generated_artwork_id(&artwork.id);
        let status = if self.timed_out {
            SessionStatus::Timeout
        } else {
            SessionStatus::Completed
        };
        self.sessions.end_session(status, None);

        self.summary = Some(prompt::summarize(self.flow.responses()));
        self.artwork = Some(artwork);
        self.phase = Phase::Result;
        true
    }

    /// Record a failure. Visitors only ever see the static message.
    /// Returns false when the failure belongs to a session that is gone.
    pub fn fail_generation(&mut self, session_id: &str, message: &str, now: Instant) -> bool {
        if !self.awaits(session_id) {
            tracing::debug!(session_id, "Dropping stale generation failure: {message}");
            return false;
        }
        tracing::error!(session_id, "Experience failed: {message}");
        self.flow.stop();
        if self.sessions.current().is_some() {
            self.sessions.end_session(SessionStatus::Error, Some(message.to_string()));
        }
        self.error = Some(USER_ERROR_MESSAGE.to_string());
        self.error_at = Some(now);
        self.phase = Phase::Error;
        true
    }

    pub fn reset(&mut self) {
        self.flow.stop();
        self.sessions.reset();
        self.session_id = None;
        self.clear_outcome();
        self.phase = Phase::Start;
    }

    pub fn snapshot(&self, now: Instant) -> KioskSnapshot {
        let in_questions = self.phase == Phase::Questions;
        KioskSnapshot {
            phase: self.phase,
            session_id: self.session_id.clone(),
            question: self.flow.current_question().filter(|_| in_questions).cloned(),
            progress: in_questions.then(|| self.flow.progress(now)),
            responses: self.flow.responses().to_vec(),
            artwork: self.artwork.clone(),
            summary: self.summary.clone(),
            error: self.error.clone(),
        }
    }

    fn clear_outcome(&mut self) {
        self.timed_out = false;
        self.artwork = None;
        self.summary = None;
        self.error = None;
        self.error_at = None;
    }

    fn wrong_phase(&self, expected: &str) -> TalkArtError {
        TalkArtError::WrongPhase {
            phase: self.phase.as_str().to_string(),
            expected: expected.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::questions::default_questions;
    use crate::flow::TimeoutPolicy;
    use chrono::Utc;

    fn kiosk(policy: TimeoutPolicy) -> Kiosk {
        let config = ExperienceConfig {
            question_time_limit_secs: 45,
            timeout_policy: policy,
            ..ExperienceConfig::default()
        };
        Kiosk::new(default_questions(), &config, SessionManager::in_memory(50))
    }

    fn artwork(session_id: &str) -> Artwork {
        Artwork {
            id: "art-1".into(),
            session_id: session_id.into(),
            image_url: "http://localhost:3000/api/talkart/image/art-1".into(),
            image_path: None,
            prompt: "p".into(),
            responses: vec![],
            style: String::new(),
            themes: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            share_code: "AbCd1234".into(),
            view_count: 0,
            likes: 0,
            featured: false,
            demo: true,
        }
    }

    #[test]
    fn test_happy_path() {
        let mut k = kiosk(TimeoutPolicy::Skip);
        let t0 = Instant::now();
        let session_id = k.start_experience(t0).unwrap();
        assert_eq!(k.phase(), Phase::Questions);

        assert!(!k.answer("花火と浴衣", t0).unwrap());
        assert!(!k.answer("家族との温かい思い出", t0).unwrap());
        assert!(k.answer("懐かしくて温かかった", t0).unwrap());
        assert!(k.ready_for_generation());

        let job = k.begin_generation().unwrap();
        assert_eq!(job.session_id, session_id);
        assert_eq!(job.responses.len(), 3);
        assert!(!job.timed_out);
        assert_eq!(k.phase(), Phase::Generation);

        assert!(k.complete_generation(&session_id, artwork(&session_id)));
        let snap = k.snapshot(t0);
        assert_eq!(snap.phase, Phase::Result);
        assert!(snap.summary.unwrap().contains("花火と浴衣"));
        assert!(snap.question.is_none());

        let history = k.sessions().history();
        assert_eq!(history[0].status, SessionStatus::Completed);
        assert_eq!(history[0].responses.len(), 3);
        assert_eq!(history[0].generated_artwork_id.as_deref(), Some("art-1"));
    }

    #[test]
    fn test_wrong_phase_is_rejected() {
        let mut k = kiosk(TimeoutPolicy::Skip);
        let now = Instant::now();
        assert!(matches!(k.answer("花火と浴衣", now), Err(TalkArtError::WrongPhase { .. })));
        assert!(k.begin_generation().is_err());

        k.start_experience(now).unwrap();
        assert!(k.start_experience(now).is_err());
        assert!(matches!(
            k.answer("たこ焼き", now),
            Err(TalkArtError::InvalidAnswer { .. })
        ));
    }

    #[test]
    fn test_skip_policy_fills_in_answers() {
        let mut k = kiosk(TimeoutPolicy::Skip);
        let t0 = Instant::now();
        k.start_experience(t0).unwrap();
        k.answer("屋台とかき氷", t0).unwrap();

        let late = t0 + Duration::from_secs(46);
        while !k.ready_for_generation() {
            k.tick(late);
        }
        let job = k.begin_generation().unwrap();
        assert!(job.timed_out);
        assert_eq!(job.responses.len(), 3);
        assert_eq!(job.responses[1].selected_answer, "友達との楽しい時間");

        assert!(k.complete_generation(&job.session_id, artwork(&job.session_id)));
        assert_eq!(k.sessions().history()[0].status, SessionStatus::Timeout);
    }

    #[test]
    fn test_proceed_policy_keeps_partial_answers() {
        let mut k = kiosk(TimeoutPolicy::Proceed);
        let t0 = Instant::now();
        k.start_experience(t0).unwrap();
        k.answer("お神輿と太鼓", t0).unwrap();

        // the late click loses to the expired countdown
        let done = k.answer("友達との楽しい時間", t0 + Duration::from_secs(60)).unwrap();
        assert!(done);
        let job = k.begin_generation().unwrap();
        assert_eq!(job.responses.len(), 1);
    }

    #[test]
    fn test_error_resets_after_pause() {
        let mut k = kiosk(TimeoutPolicy::Skip);
        let t0 = Instant::now();
        k.start_experience(t0).unwrap();
        for answer in ["花火と浴衣", "友達との楽しい時間", "ワクワクして楽しかった"] {
            k.answer(answer, t0).unwrap();
        }
        let job = k.begin_generation().unwrap();
        assert!(k.fail_generation(&job.session_id, "provider exploded", t0));

        let snap = k.snapshot(t0);
        assert_eq!(snap.phase, Phase::Error);
        assert_eq!(snap.error.as_deref(), Some(USER_ERROR_MESSAGE));
        let history = k.sessions().history();
        assert_eq!(history[0].status, SessionStatus::Error);
        assert_eq!(history[0].metadata.error_message.as_deref(), Some("provider exploded"));

        k.tick(t0 + Duration::from_secs(1));
        assert_eq!(k.phase(), Phase::Error);
        k.tick(t0 + Duration::from_secs(3));
        assert_eq!(k.phase(), Phase::Start);
        assert!(k.snapshot(t0).error.is_none());
    }

    #[test]
    fn test_reset_abandons_session() {
        let mut k = kiosk(TimeoutPolicy::Skip);
        let now = Instant::now();
        k.start_experience(now).unwrap();
        k.answer("花火と浴衣", now).unwrap();
        k.reset();

        assert_eq!(k.phase(), Phase::Start);
        assert!(k.snapshot(now).session_id.is_none());
        let history = k.sessions().history();
        assert_eq!(history[0].status, SessionStatus::Error);
        assert_eq!(
            history[0].metadata.error_message.as_deref(),
            Some("Session manager reset")
        );
    }

    #[test]
    fn test_stale_outcome_is_ignored_after_restart() {
        let mut k = kiosk(TimeoutPolicy::Skip);
        let t0 = Instant::now();
        k.start_experience(t0).unwrap();
        for answer in ["花火と浴衣", "友達との楽しい時間", "ワクワクして楽しかった"] {
            k.answer(answer, t0).unwrap();
        }
        let old = k.begin_generation().unwrap();
        k.reset();
        let current = k.start_experience(t0).unwrap();

        assert!(!k.fail_generation(&old.session_id, "provider exploded", t0));
        assert!(!k.complete_generation(&old.session_id, artwork(&old.session_id)));
        assert_eq!(k.phase(), Phase::Questions);
        assert_eq!(k.sessions().current().unwrap().id, current);
        assert!(k.snapshot(t0).artwork.is_none());

        // Same phase but another visitor's session still does not match
        for answer in ["屋台とかき氷", "一人で感じた特別な瞬間", "神秘的で心が震えた"] {
            k.answer(answer, t0).unwrap();
        }
        k.begin_generation().unwrap();
        assert!(!k.complete_generation(&old.session_id, artwork(&old.session_id)));
        assert_eq!(k.phase(), Phase::Generation);
    }

    #[test]
    fn test_click_on_skipped_question_is_dropped() {
        let t0 = Instant::now();
        let mut skip = kiosk(TimeoutPolicy::Skip);
        skip.start_experience(t0).unwrap();
        // The expired countdown skips question one; the click is not
        // re-applied to question two.
        let done = skip.answer("花火と浴衣", t0 + Duration::from_secs(46)).unwrap();
        assert!(!done);
        let responses = skip.flow().responses();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].question_id, "festival_memory");
    }

    #[test]
    fn test_snapshot_during_questions() {
        let mut k = kiosk(TimeoutPolicy::Skip);
        let t0 = Instant::now();
        k.start_experience(t0).unwrap();
        let snap = k.snapshot(t0 + Duration::from_secs(5));
        assert_eq!(snap.question.unwrap().id, "festival_memory");
        let progress = snap.progress.unwrap();
        assert_eq!(progress.question_number, 1);
        assert_eq!(progress.total_questions, 3);
        assert_eq!(progress.time_remaining_ms, 40_000);
    }
}
