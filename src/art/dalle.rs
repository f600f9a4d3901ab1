// src/art/dalle.rs — OpenAI image generation (DALL-E)

use async_trait::async_trait;
use serde::Deserialize;

use super::{GeneratedImage, ImageProvider, ImageRequest};
use crate::infra::config::GenerationConfig;
use crate::infra::errors::TalkArtError;

pub struct DalleProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    model: String,
    size: String,
    quality: String,
    style: String,
}

impl DalleProvider {
    pub fn new(api_key: String, config: &GenerationConfig) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            size: config.size.clone(),
            quality: config.quality.clone(),
            style: config.image_style.clone(),
        }
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": self.size,
            "quality": self.quality,
            "style": self.style,
        })
    }

    fn error(&self, message: impl Into<String>) -> TalkArtError {
        TalkArtError::Generation {
            provider: "dalle".into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
    b64_json: Option<String>,
    revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

#[async_trait]
impl ImageProvider for DalleProvider {
    fn id(&self) -> &str {
        "dalle"
    }

    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, TalkArtError> {
        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(&request.prompt))
            .send()
            .await
            .map_err(|e| self.error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| status.to_string());
            tracing::error!(status = status.as_u16(), "DALL-E API error: {message}");
            return Err(self.error(message));
        }

        let body: ImagesResponse = response
            .json()
            .await
            .map_err(|e| self.error(format!("unreadable response: {e}")))?;
        let first = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| self.error("response contained no images"))?;

        let image_url = match (first.url, first.b64_json) {
            (Some(url), _) => url,
            (None, Some(b64)) => format!("data:image/png;base64,{b64}"),
            (None, None) => return Err(self.error("image has neither url nor b64_json")),
        };

        tracing::info!(session_id = %request.session_id, "DALL-E image ready");
        Ok(GeneratedImage {
            image_url,
            revised_prompt: first.revised_prompt,
            model: Some(self.model.clone()),
            demo: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_uses_config() {
        let provider = DalleProvider::new("sk".into(), &GenerationConfig::default());
        let body = provider.request_body("a festival");
        assert_eq!(body["model"], "dall-e-3");
        assert_eq!(body["n"], 1);
        assert_eq!(body["size"], "1024x1024");
        assert_eq!(body["quality"], "standard");
        assert_eq!(body["style"], "vivid");
        assert_eq!(body["prompt"], "a festival");
    }

    #[test]
    fn test_parse_images_response() {
        let json = r#"{"created":1,"data":[{"url":"https://x/y.png","revised_prompt":"better"}]}"#;
        let parsed: ImagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data[0].url.as_deref(), Some("https://x/y.png"));
        assert_eq!(parsed.data[0].revised_prompt.as_deref(), Some("better"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = GenerationConfig {
            base_url: "http://localhost:9999/v1/".into(),
            ..GenerationConfig::default()
        };
        let provider = DalleProvider::new("sk".into(), &config);
        assert_eq!(provider.base_url, "http://localhost:9999/v1");
    }
}
