// src/infra/errors.rs — Error types for TalkArt

use thiserror::Error;

/// Static message shown to visitors whenever anything in the experience fails.
pub const USER_ERROR_MESSAGE: &str = "アート生成中にエラーが発生しました。もう一度お試しください。";

#[derive(Error, Debug)]
pub enum TalkArtError {
    // Generation
    #[error("Image provider '{provider}' error: {message}")]
    Generation { provider: String, message: String },

    #[error("Image generation timed out after {secs}s")]
    GenerationTimeout { secs: u64 },

    // Experience flow
    #[error("'{answer}' is not an option for question '{question_id}'")]
    InvalidAnswer { question_id: String, answer: String },

    #[error("No active question flow")]
    FlowInactive,

    #[error("No active session")]
    NoActiveSession,

    #[error("Experience is in phase '{phase}', expected '{expected}'")]
    WrongPhase { phase: String, expected: String },

    // Gallery
    #[error("Image error: {0}")]
    Image(String),

    // Infra
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TalkArtError {
    /// Errors caused by the caller's input rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TalkArtError::InvalidAnswer { .. }
                | TalkArtError::FlowInactive
                | TalkArtError::NoActiveSession
                | TalkArtError::WrongPhase { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(TalkArtError::FlowInactive.is_client_error());
        assert!(TalkArtError::WrongPhase {
            phase: "start".into(),
            expected: "questions".into()
        }
        .is_client_error());
        assert!(!TalkArtError::GenerationTimeout { secs: 30 }.is_client_error());
        assert!(!TalkArtError::Image("broken".into()).is_client_error());
    }

    #[test]
    fn test_display_messages() {
        let err = TalkArtError::InvalidAnswer {
            question_id: "emotion".into(),
            answer: "nope".into(),
        };
        assert_eq!(
            err.to_string(),
            "'nope' is not an option for question 'emotion'"
        );
    }
}
