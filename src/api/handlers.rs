// src/api/handlers.rs

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use std::time::Instant;

use crate::api::{auth, share, types::*, ApiState};
use crate::art::ImageRequest;
use crate::gallery::build_board;
use crate::gallery::layout::MAX_BOARD_SIDE;
use crate::infra::errors::{TalkArtError, USER_ERROR_MESSAGE};
use crate::kiosk::KioskSnapshot;
use crate::session::{Session, SessionStats};
use crate::store::images::{decode_data_url, ImageBytes};
use crate::store::{Artwork, GalleryStats, NewArtwork};

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

const MAX_PAGE_SIZE: u32 = 100;

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn internal(e: impl std::fmt::Display) -> ApiError {
    tracing::error!("API error: {e}");
    error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn not_found() -> ApiError {
    error(StatusCode::NOT_FOUND, "Artwork not found")
}

/// Map library errors onto status codes. Generation failures only ever show
/// the static visitor message.
fn from_talkart(e: TalkArtError) -> ApiError {
    if e.is_client_error() {
        tracing::debug!("Rejected request: {e}");
    }
    match e {
        TalkArtError::InvalidAnswer { .. } => error(StatusCode::BAD_REQUEST, e.to_string()),
        TalkArtError::FlowInactive | TalkArtError::NoActiveSession | TalkArtError::WrongPhase { .. } => {
            error(StatusCode::CONFLICT, e.to_string())
        }
        TalkArtError::GenerationTimeout { .. } => {
            tracing::warn!("{e}");
            error(StatusCode::GATEWAY_TIMEOUT, USER_ERROR_MESSAGE)
        }
        TalkArtError::Generation { .. } | TalkArtError::Http(_) => {
            tracing::warn!("{e}");
            error(StatusCode::BAD_GATEWAY, USER_ERROR_MESSAGE)
        }
        _ => internal(e),
    }
}

fn image_response(image: ImageBytes) -> Response {
    (
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        image.bytes,
    )
        .into_response()
}

/// GET /api/talkart/health
pub async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "talkart",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.generator.provider_id(),
        "clients": state.hub.client_count(),
        "timestamp": chrono::Utc::now(),
    }))
}

/// POST /api/talkart/generate — Generate an image for a ready-made prompt.
pub async fn generate(
    State(state): State<ApiState>,
    Json(body): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let prompt = body.prompt.filter(|p| !p.trim().is_empty());
    let session_id = body.session_id.filter(|s| !s.trim().is_empty());
    let (Some(prompt), Some(session_id)) = (prompt, session_id) else {
        return Err(error(StatusCode::BAD_REQUEST, "Prompt and sessionId are required"));
    };

    let style = body.style.unwrap_or_else(|| state.generator.style().to_string());
    let request = ImageRequest {
        prompt: prompt.clone(),
        style: style.clone(),
        session_id: session_id.clone(),
    };

    tracing::debug!(session_id = %session_id, "Direct generation request");
    let started = Instant::now();
    let image = state.generator.generate_image(&request).await.map_err(from_talkart)?;

    Ok(Json(GenerateResponse {
        image_url: image.image_url,
        prompt: image.revised_prompt.unwrap_or(prompt),
        metadata: GenerateMetadata {
            created_at: chrono::Utc::now(),
            session_id,
            generation_time: started.elapsed().as_millis() as u64,
            style,
            model: image.model,
            demo: image.demo,
        },
    }))
}

/// GET /api/talkart/gallery — Newest artworks first.
pub async fn list_gallery(
    State(state): State<ApiState>,
    Query(query): Query<GalleryQuery>,
) -> ApiResult<Json<Envelope<GalleryPage>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let artworks = state
        .store
        .recent_artworks(limit, offset)
        .await
        .map_err(internal)?;
    let total = state.store.count_artworks().await.map_err(internal)?;

    Ok(Json(Envelope::ok(GalleryPage { artworks, total })))
}

/// POST /api/talkart/gallery — Add an artwork record. Known ids are returned as-is.
pub async fn create_artwork(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<CreateArtworkRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Artwork>>)> {
    auth::check_auth(&state, &headers)?;

    if body.image_url.trim().is_empty() || body.session_id.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "session_id and image_url are required"));
    }

    if let Some(id) = body.id.as_deref() {
        if let Some(existing) = state.store.get_artwork(id.to_string()).await.map_err(internal)? {
            return Ok((StatusCode::OK, Json(Envelope::ok(existing))));
        }
    }

    let mut new = NewArtwork::new(&body.session_id, &body.image_url, &body.prompt);
    if let Some(id) = body.id {
        new.id = id;
    }
    new.responses = body.responses;
    new.style = body.style;
    new.themes = body.themes;
    new.demo = body.demo;

    let artwork = state.store.insert_artwork(new).await.map_err(internal)?;
    state.hub.publish(artwork.clone());
    Ok((StatusCode::CREATED, Json(Envelope::ok(artwork))))
}

/// GET /api/talkart/gallery/board — Artworks with bulletin-board positions.
pub async fn gallery_board(
    State(state): State<ApiState>,
    Query(query): Query<BoardQuery>,
) -> ApiResult<Json<Envelope<Board>>> {
    let dims = [query.width, query.height];
    if dims.iter().flatten().any(|d| !d.is_finite()) {
        return Err(error(StatusCode::BAD_REQUEST, "width and height must be finite numbers"));
    }
    let side = |d: Option<f64>, default: f64| {
        d.filter(|d| *d > 0.0).unwrap_or(default).min(MAX_BOARD_SIDE)
    };
    let width = side(query.width, state.gallery.board_width);
    let height = side(query.height, state.gallery.board_height);
    let limit = query
        .limit
        .unwrap_or(state.gallery.max_display_count)
        .clamp(1, MAX_PAGE_SIZE);

    let artworks = state.store.recent_artworks(limit, 0).await.map_err(internal)?;
    let items = build_board(artworks, width, height, &state.gallery);
    Ok(Json(Envelope::ok(Board { width, height, items })))
}

/// GET /api/talkart/gallery/stats
pub async fn gallery_stats(State(state): State<ApiState>) -> ApiResult<Json<Envelope<GalleryStats>>> {
    let stats = state.store.gallery_stats().await.map_err(internal)?;
    Ok(Json(Envelope::ok(stats)))
}

/// GET /api/talkart/artwork/{code} — Share code first, then id.
pub async fn get_artwork(
    State(state): State<ApiState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Envelope<Artwork>>> {
    let artwork = state
        .store
        .find_by_code_or_id(code)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    Ok(Json(Envelope::ok(artwork)))
}

/// DELETE /api/talkart/artwork/{id}
pub async fn delete_artwork(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    auth::check_auth(&state, &headers)?;

    let removed = state
        .store
        .delete_artwork(id.clone())
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    if let Some(path) = removed.image_path.as_deref() {
        if let Err(e) = state.images.remove(path).await {
            tracing::warn!("Failed to remove image {path}: {e}");
        }
    }
    tracing::info!(artwork_id = %id, "Artwork deleted");

    Ok(Json(serde_json::json!({ "success": true, "id": id })))
}

/// POST /api/talkart/artwork/{id}/like
pub async fn like_artwork(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Artwork>>> {
    let artwork = state
        .store
        .add_like(id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    Ok(Json(Envelope::ok(artwork)))
}

/// PUT /api/talkart/artwork/{id}/featured
pub async fn set_featured(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<FeaturedRequest>,
) -> ApiResult<Json<Envelope<Artwork>>> {
    auth::check_auth(&state, &headers)?;

    let artwork = state
        .store
        .set_featured(id, body.featured)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    Ok(Json(Envelope::ok(artwork)))
}

/// POST /api/talkart/stream — Push an artwork to every connected screen.
pub async fn broadcast(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(artwork): Json<Artwork>,
) -> ApiResult<Json<BroadcastResponse>> {
    auth::check_auth(&state, &headers)?;
    let clients = state.hub.publish(artwork);
    Ok(Json(BroadcastResponse {
        success: true,
        clients,
    }))
}

/// POST /api/talkart/proxy-image — Fetch an image and hand it back as a data URL.
pub async fn proxy_image(
    State(state): State<ApiState>,
    Json(body): Json<ProxyImageRequest>,
) -> ApiResult<Json<ProxyImageResponse>> {
    let Some(url) = body.image_url.filter(|u| !u.trim().is_empty()) else {
        return Err(error(StatusCode::BAD_REQUEST, "Image URL is required"));
    };

    let fetched = if url.starts_with("data:") {
        decode_data_url(&url)
    } else {
        state.images.fetch_remote(&url).await
    };
    let image = fetched.map_err(|e| {
        tracing::warn!("Image proxy failed for {url}: {e}");
        error(StatusCode::BAD_GATEWAY, "Failed to proxy image")
    })?;

    Ok(Json(ProxyImageResponse {
        size: image.bytes.len(),
        data_url: image.to_data_url(),
        content_type: image.content_type,
    }))
}

/// GET /api/talkart/image/{id} — Stored image bytes.
pub async fn get_image(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult<Response> {
    let artwork = state
        .store
        .get_artwork(id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;

    if let Some(path) = artwork.image_path.as_deref() {
        let image = state.images.read(path).await.map_err(|e| {
            tracing::warn!("Stored image {path} unreadable: {e}");
            error(StatusCode::NOT_FOUND, "Image not found")
        })?;
        return Ok(image_response(image));
    }

    if artwork.image_url.starts_with("data:") {
        let image = decode_data_url(&artwork.image_url).map_err(internal)?;
        return Ok(image_response(image));
    }
    Ok(Redirect::temporary(&artwork.image_url).into_response())
}

/// GET /api/talkart/share/{id}
pub async fn share_page(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult<Html<String>> {
    let artwork = state
        .store
        .find_by_code_or_id(id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    let html = share::render_share_page(&artwork.id, &state.public_base_url).map_err(internal)?;
    Ok(Html(html))
}

/// GET /api/talkart/experience
pub async fn experience(State(state): State<ApiState>) -> Json<KioskSnapshot> {
    let kiosk = state.kiosk.lock().await;
    Json(kiosk.snapshot(Instant::now()))
}

/// POST /api/talkart/experience/start
pub async fn start_experience(State(state): State<ApiState>) -> ApiResult<Json<KioskSnapshot>> {
    let mut kiosk = state.kiosk.lock().await;
    let now = Instant::now();
    kiosk.start_experience(now).map_err(from_talkart)?;
    Ok(Json(kiosk.snapshot(now)))
}

/// POST /api/talkart/experience/answer — Generation starts in the background
/// once the last question is answered.
pub async fn answer(
    State(state): State<ApiState>,
    Json(body): Json<AnswerRequest>,
) -> ApiResult<Json<KioskSnapshot>> {
    let now = Instant::now();
    let (done, snapshot) = {
        let mut kiosk = state.kiosk.lock().await;
        let done = kiosk.answer(&body.answer, now).map_err(from_talkart)?;
        (done, kiosk.snapshot(now))
    };

    if done {
        let kiosk = state.kiosk.clone();
        let pipeline = state.pipeline.clone();
        tokio::spawn(async move {
            pipeline.run_generation(&kiosk).await;
        });
    }
    Ok(Json(snapshot))
}

/// POST /api/talkart/experience/reset
pub async fn reset_experience(State(state): State<ApiState>) -> Json<KioskSnapshot> {
    let mut kiosk = state.kiosk.lock().await;
    kiosk.reset();
    Json(kiosk.snapshot(Instant::now()))
}

/// GET /api/talkart/sessions — Newest first.
pub async fn list_sessions(
    State(state): State<ApiState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<Session>> {
    let kiosk = state.kiosk.lock().await;
    let mut history = kiosk.sessions().history();
    if let Some(limit) = query.limit {
        history.truncate(limit);
    }
    Json(history)
}

/// GET /api/talkart/sessions/stats
pub async fn session_stats(State(state): State<ApiState>) -> Json<SessionStats> {
    let kiosk = state.kiosk.lock().await;
    Json(kiosk.sessions().stats())
}
