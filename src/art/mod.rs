// src/art/mod.rs — Image generation layer

pub mod custom;
pub mod dalle;
pub mod placeholder;
pub mod prompt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::flow::questions::Response;
use crate::infra::config::GenerationConfig;
use crate::infra::errors::TalkArtError;
use prompt::ArtPrompt;

/// Core trait that all image backends implement.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, TalkArtError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub style: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Remote URL or `data:` URL.
    pub image_url: String,
    /// Prompt as rewritten by the backend, when it reports one.
    pub revised_prompt: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub demo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedArtwork {
    pub image_url: String,
    pub prompt: String,
    pub style: String,
    pub themes: Vec<String>,
    pub elements: Vec<String>,
    pub mood: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub generation_ms: u64,
    pub provider: String,
    pub demo: bool,
}

/// Pick a backend from config: no key means placeholder, `dalle3` means OpenAI,
/// anything else is treated as a compatible endpoint URL.
pub fn resolve_provider(config: &GenerationConfig) -> Arc<dyn ImageProvider> {
    let Some(api_key) = config.resolve_api_key() else {
        tracing::warn!("No image API key configured, using placeholder images");
        return Arc::new(placeholder::PlaceholderProvider);
    };

    if config.endpoint == "dalle3" {
        Arc::new(dalle::DalleProvider::new(api_key, config))
    } else {
        Arc::new(custom::CustomEndpointProvider::new(
            api_key,
            config.endpoint.clone(),
        ))
    }
}

pub struct ArtGenerator {
    provider: Arc<dyn ImageProvider>,
    style: String,
    timeout: Duration,
}

impl ArtGenerator {
    pub fn new(provider: Arc<dyn ImageProvider>, style: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            style: style.into(),
            timeout,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(resolve_provider(config), config.art_style.clone(), config.timeout())
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn create_prompt(&self, responses: &[Response]) -> Result<ArtPrompt, TalkArtError> {
        Ok(prompt::build_prompt(responses, &self.style)?)
    }

    /// Call the backend directly with a ready-made prompt, under the timeout.
    pub async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, TalkArtError> {
        match tokio::time::timeout(self.timeout, self.provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(TalkArtError::GenerationTimeout {
                secs: self.timeout.as_secs(),
            }),
        }
    }

    /// Build the prompt from the answers and generate the artwork.
    pub async fn generate_artwork(
        &self,
        responses: &[Response],
        session_id: &str,
    ) -> Result<GeneratedArtwork, TalkArtError> {
        let started = Instant::now();
        let art_prompt = self.create_prompt(responses)?;

        let request = ImageRequest {
            prompt: art_prompt.base_prompt.clone(),
            style: art_prompt.style.clone(),
            session_id: session_id.to_string(),
        };

        tracing::info!(
            session_id,
            provider = self.provider.id(),
            elements = art_prompt.elements.len(),
            "Generating artwork"
        );
        let image = self.generate_image(&request).await?;

        Ok(GeneratedArtwork {
            image_url: image.image_url,
            prompt: image.revised_prompt.unwrap_or(art_prompt.base_prompt),
            style: art_prompt.style,
            themes: art_prompt.themes,
            elements: art_prompt.elements,
            mood: art_prompt.mood,
            session_id: session_id.to_string(),
            created_at: Utc::now(),
            generation_ms: started.elapsed().as_millis() as u64,
            provider: self.provider.id().to_string(),
            demo: image.demo,
        })
    }
}

/// HEAD the image to confirm it is reachable. Inline data URLs always pass.
pub async fn validate_image(client: &reqwest::Client, image_url: &str) -> bool {
    if image_url.starts_with("data:image/") {
        return true;
    }
    match client.head(image_url).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(e) => {
            tracing::debug!("Image validation failed for {image_url}: {e}");
            false
        }
    }
}
