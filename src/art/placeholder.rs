// src/art/placeholder.rs — Offline stand-in used when no API key is configured

use async_trait::async_trait;
use base64::Engine;

use super::{GeneratedImage, ImageProvider, ImageRequest};
use crate::infra::errors::TalkArtError;

const PLACEHOLDER_SVG: &str = r##"<svg width="1024" height="1024" xmlns="http://www.w3.org/2000/svg">
  <rect width="1024" height="1024" fill="#E5E7EB"/>
  <text x="512" y="512" font-family="Arial" font-size="48" fill="#9CA3AF" text-anchor="middle" dominant-baseline="middle">画像生成APIキーが設定されていません</text>
</svg>"##;

pub struct PlaceholderProvider;

/// The placeholder image as a `data:` URL.
pub fn placeholder_data_url() -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(PLACEHOLDER_SVG);
    format!("data:image/svg+xml;base64,{encoded}")
}

#[async_trait]
impl ImageProvider for PlaceholderProvider {
    fn id(&self) -> &str {
        "placeholder"
    }

    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, TalkArtError> {
        tracing::info!(session_id = %request.session_id, "Returning placeholder artwork");
        Ok(GeneratedImage {
            image_url: placeholder_data_url(),
            revised_prompt: None,
            model: None,
            demo: true,
        })
    }
}
