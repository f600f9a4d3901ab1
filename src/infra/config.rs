// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::flow::questions::{default_questions, Question};
use crate::flow::TimeoutPolicy;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub experience: ExperienceConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub gallery: GalleryConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    /// Question catalogue. Empty means the built-in summer-festival set.
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceConfig {
    /// Countdown for the whole question phase.
    pub question_time_limit_secs: u64,
    pub timeout_policy: TimeoutPolicy,
    /// How many times `extend` may push the deadline back before giving up.
    pub max_extensions: u32,
    pub poll_interval_ms: u64,
    /// Delay before an errored experience returns to the start screen.
    pub error_reset_secs: u64,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            question_time_limit_secs: 45,
            timeout_policy: TimeoutPolicy::Skip,
            max_extensions: 1,
            poll_interval_ms: 100,
            error_reset_secs: 3,
        }
    }
}

impl ExperienceConfig {
    pub fn question_time_limit(&self) -> Duration {
        Duration::from_secs(self.question_time_limit_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// `dalle3` for the OpenAI image API, or a URL of a compatible endpoint.
    pub endpoint: String,
    /// Falls back to OPENAI_API_KEY / TALKART_ART_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub size: String,
    pub quality: String,
    pub image_style: String,
    pub art_style: String,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "dalle3".into(),
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            model: "dall-e-3".into(),
            size: "1024x1024".into(),
            quality: "standard".into(),
            image_style: "vivid".into(),
            art_style: "watercolor Japanese art".into(),
            timeout_secs: 30,
        }
    }
}

impl GenerationConfig {
    /// Configured key, else the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .or_else(|| std::env::var("TALKART_ART_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub max_display_count: u32,
    pub board_width: f64,
    pub board_height: f64,
    pub item_width: f64,
    pub item_height: f64,
    pub max_placement_attempts: u32,
    /// Artworks kept in the realtime replay buffer.
    pub realtime_buffer: usize,
    pub keepalive_secs: u64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            max_display_count: 50,
            board_width: 1600.0,
            board_height: 1000.0,
            item_width: 200.0,
            item_height: 200.0,
            max_placement_attempts: 50,
            realtime_buffer: 20,
            keepalive_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Oldest artworks beyond this count are removed on insert. 0 keeps everything.
    pub max_artworks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix for image and share links handed to clients.
    pub public_base_url: String,
    /// Bearer token guarding admin routes. None leaves them open.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    pub max_proxy_bytes: usize,
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://127.0.0.1:3000".into(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            public_base_url: "http://localhost:3000".into(),
            token: None,
            cors_origins: default_cors_origins(),
            max_proxy_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub history_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { history_size: 50 }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// The question catalogue in effect.
    pub fn questions(&self) -> Vec<Question> {
        if self.questions.is_empty() {
            default_questions()
        } else {
            self.questions.clone()
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        for q in &self.questions {
            if q.options.is_empty() {
                anyhow::bail!("question '{}' has no options", q.id);
            }
        }
        if self.gallery.item_width <= 0.0 || self.gallery.item_height <= 0.0 {
            anyhow::bail!("gallery item dimensions must be positive");
        }
        Ok(())
    }
}
