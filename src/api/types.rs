// src/api/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gallery::BoardItem;
use crate::store::{Artwork, ArtworkAnswer};

/// Request body for a one-off image generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub image_url: String,
    pub prompt: String,
    pub metadata: GenerateMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMetadata {
    pub created_at: DateTime<Utc>,
    pub session_id: String,
    /// Milliseconds.
    pub generation_time: u64,
    pub style: String,
    pub model: Option<String>,
    pub demo: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardQuery {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Body for adding an artwork produced elsewhere.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArtworkRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "sessionId")]
    pub session_id: String,
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    pub prompt: String,
    #[serde(default)]
    pub responses: Vec<ArtworkAnswer>,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub demo: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeaturedRequest {
    pub featured: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyImageRequest {
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyImageResponse {
    pub data_url: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

/// `{success, data, timestamp}` wrapper used by the gallery routes.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GalleryPage {
    pub artworks: Vec<Artwork>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct Board {
    pub width: f64,
    pub height: f64,
    pub items: Vec<BoardItem>,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub success: bool,
    pub clients: usize,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
