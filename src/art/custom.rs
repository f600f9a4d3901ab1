// src/art/custom.rs — Generic diffusion endpoint (Stable Diffusion style JSON API)

use async_trait::async_trait;
use serde::Deserialize;

use super::{GeneratedImage, ImageProvider, ImageRequest};
use crate::infra::errors::TalkArtError;

const NEGATIVE_PROMPT: &str = "low quality, blurry, distorted";

pub struct CustomEndpointProvider {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
}

impl CustomEndpointProvider {
    pub fn new(api_key: String, endpoint: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    fn request_body(request: &ImageRequest) -> serde_json::Value {
        let style = if request.style.is_empty() {
            "watercolor"
        } else {
            request.style.as_str()
        };
        serde_json::json!({
            "prompt": request.prompt,
            "negative_prompt": NEGATIVE_PROMPT,
            "width": 512,
            "height": 512,
            "num_inference_steps": 30,
            "guidance_scale": 7.5,
            "style_preset": style,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EndpointResponse {
    images: Vec<EndpointImage>,
}

#[derive(Debug, Deserialize)]
struct EndpointImage {
    url: String,
}

#[async_trait]
impl ImageProvider for CustomEndpointProvider {
    fn id(&self) -> &str {
        "custom"
    }

    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, TalkArtError> {
        let err = |message: String| TalkArtError::Generation {
            provider: "custom".into(),
            message,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|e| err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(err(format!("Generation API error: {status}")));
        }

        let body: EndpointResponse = response
            .json()
            .await
            .map_err(|e| err(format!("unreadable response: {e}")))?;
        let image = body
            .images
            .into_iter()
            .next()
            .ok_or_else(|| err("response contained no images".into()))?;

        Ok(GeneratedImage {
            image_url: image.url,
            revised_prompt: None,
            model: None,
            demo: false,
        })
    }
}
