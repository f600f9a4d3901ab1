// src/api/mod.rs — HTTP server for the kiosk, gallery screens and share links

pub mod auth;
pub mod handlers;
pub mod share;
pub mod stream;
pub mod types;

use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::art::ArtGenerator;
use crate::gallery::realtime::RealtimeHub;
use crate::infra::config::{Config, GalleryConfig};
use crate::kiosk::pipeline::{spawn_kiosk_driver, Pipeline};
use crate::kiosk::Kiosk;
use crate::session::SessionManager;
use crate::store::images::ImageStore;
use crate::store::StoreHandle;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StoreHandle,
    pub images: Arc<ImageStore>,
    pub generator: Arc<ArtGenerator>,
    pub hub: Arc<RealtimeHub>,
    pub kiosk: Arc<Mutex<Kiosk>>,
    pub pipeline: Arc<Pipeline>,
    pub gallery: Arc<GalleryConfig>,
    pub public_base_url: String,
    pub token: Option<String>,
}

impl ApiState {
    pub fn new(
        config: &Config,
        store: StoreHandle,
        generator: ArtGenerator,
        images: ImageStore,
        sessions: SessionManager,
    ) -> Self {
        let generator = Arc::new(generator);
        let images = Arc::new(images);
        let hub = Arc::new(RealtimeHub::new(config.gallery.realtime_buffer));
        let kiosk = Kiosk::new(config.questions(), &config.experience, sessions);
        let pipeline = Pipeline {
            generator: generator.clone(),
            images: images.clone(),
            store: store.clone(),
            hub: hub.clone(),
            public_base_url: config.server.public_base_url.clone(),
            max_artworks: config.storage.max_artworks,
        };

        Self {
            store,
            images,
            generator,
            hub,
            kiosk: Arc::new(Mutex::new(kiosk)),
            pipeline: Arc::new(pipeline),
            gallery: Arc::new(config.gallery.clone()),
            public_base_url: config.server.public_base_url.clone(),
            token: config.server.token.clone(),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{o}'");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/talkart/health", get(handlers::health))
        .route("/api/talkart/generate", post(handlers::generate))
        .route(
            "/api/talkart/gallery",
            get(handlers::list_gallery).post(handlers::create_artwork),
        )
        .route("/api/talkart/gallery/board", get(handlers::gallery_board))
        .route("/api/talkart/gallery/stats", get(handlers::gallery_stats))
        .route(
            "/api/talkart/artwork/{id}",
            get(handlers::get_artwork).delete(handlers::delete_artwork),
        )
        .route("/api/talkart/artwork/{id}/like", post(handlers::like_artwork))
        .route("/api/talkart/artwork/{id}/featured", put(handlers::set_featured))
        .route(
            "/api/talkart/stream",
            get(stream::stream).post(handlers::broadcast),
        )
        .route("/api/talkart/proxy-image", post(handlers::proxy_image))
        .route("/api/talkart/image/{id}", get(handlers::get_image))
        .route("/api/talkart/share/{id}", get(handlers::share_page))
        .route("/api/talkart/experience", get(handlers::experience))
        .route("/api/talkart/experience/start", post(handlers::start_experience))
        .route("/api/talkart/experience/answer", post(handlers::answer))
        .route("/api/talkart/experience/reset", post(handlers::reset_experience))
        .route("/api/talkart/sessions", get(handlers::list_sessions))
        .route("/api/talkart/sessions/stats", get(handlers::session_stats))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Start the server and its background tasks (blocking).
pub async fn start_server(config: &Config, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let driver = spawn_kiosk_driver(
        state.kiosk.clone(),
        state.pipeline.clone(),
        config.experience.poll_interval(),
    );
    let keepalive = stream::spawn_keepalive(
        state.hub.clone(),
        Duration::from_secs(config.gallery.keepalive_secs.max(1)),
    );

    let router = build_router(state, &config.server.cors_origins);

    tracing::info!("TalkArt server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await;

    driver.abort();
    keepalive.abort();
    served?;
    Ok(())
}
