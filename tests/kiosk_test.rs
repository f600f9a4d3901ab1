// tests/kiosk_test.rs — Integration test: kiosk + pipeline with a mock image provider

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::{Mutex, Notify};
use tokio_test::{assert_err, assert_ok};

use talkart::art::placeholder::placeholder_data_url;
use talkart::art::{ArtGenerator, GeneratedImage, ImageProvider, ImageRequest};
use talkart::flow::questions::default_questions;
use talkart::gallery::realtime::{RealtimeEvent, RealtimeHub};
use talkart::infra::config::ExperienceConfig;
use talkart::infra::errors::{TalkArtError, USER_ERROR_MESSAGE};
use talkart::kiosk::pipeline::Pipeline;
use talkart::kiosk::{Kiosk, Phase};
use talkart::session::{SessionManager, SessionStatus};
use talkart::store::images::ImageStore;
use talkart::store::{self, spawn_store_server};

/// Returns an inline image and counts calls.
struct MockProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl ImageProvider for MockProvider {
    fn id(&self) -> &str {
        "mock"
    }

    async fn generate(&self, _request: &ImageRequest) -> Result<GeneratedImage, TalkArtError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GeneratedImage {
            image_url: placeholder_data_url(),
            revised_prompt: None,
            model: Some("mock-1".into()),
            demo: false,
        })
    }
}

struct FailingProvider;

#[async_trait]
impl ImageProvider for FailingProvider {
    fn id(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _request: &ImageRequest) -> Result<GeneratedImage, TalkArtError> {
        Err(TalkArtError::Generation {
            provider: "failing".into(),
            message: "quota exceeded".into(),
        })
    }
}

/// Parks inside `generate` until released, then fails.
struct GatedProvider {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl ImageProvider for GatedProvider {
    fn id(&self) -> &str {
        "gated"
    }

    async fn generate(&self, _request: &ImageRequest) -> Result<GeneratedImage, TalkArtError> {
        self.entered.notify_one();
        self.release.notified().await;
        Err(TalkArtError::Generation {
            provider: "gated".into(),
            message: "boom".into(),
        })
    }
}

struct Fixture {
    _tmp: TempDir,
    pipeline: Arc<Pipeline>,
    hub: Arc<RealtimeHub>,
}

fn fixture(provider: Arc<dyn ImageProvider>, max_artworks: u32) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let (handle, _task) = spawn_store_server(store::in_memory().unwrap());
    let hub = Arc::new(RealtimeHub::new(20));
    let pipeline = Arc::new(Pipeline {
        generator: Arc::new(ArtGenerator::new(provider, "watercolor", Duration::from_secs(5))),
        images: Arc::new(ImageStore::new(tmp.path().join("images"), 1024 * 1024)),
        store: handle,
        hub: hub.clone(),
        public_base_url: "http://kiosk.local:3000/".into(),
        max_artworks,
    });
    Fixture {
        _tmp: tmp,
        pipeline,
        hub,
    }
}

fn kiosk() -> Mutex<Kiosk> {
    Mutex::new(Kiosk::new(
        default_questions(),
        &ExperienceConfig::default(),
        SessionManager::in_memory(50),
    ))
}

async fn answer_all(kiosk: &Mutex<Kiosk>) {
    let mut k = kiosk.lock().await;
    let now = Instant::now();
    k.start_experience(now).unwrap();
    for answer in ["花火と浴衣", "家族との温かい思い出", "神秘的で心が震えた"] {
        k.answer(answer, now).unwrap();
    }
    assert!(k.ready_for_generation());
}

#[tokio::test]
async fn test_full_experience_publishes_artwork() {
    let provider = Arc::new(MockProvider {
        calls: AtomicUsize::new(0),
    });
    let fx = fixture(provider.clone(), 0);
    let mut sub = fx.hub.subscribe();
    let kiosk = kiosk();

    answer_all(&kiosk).await;
    let artwork = assert_ok!(fx.pipeline.run_generation(&kiosk).await.unwrap());

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        artwork.image_url,
        format!("http://kiosk.local:3000/api/talkart/image/{}", artwork.id)
    );
    let file = artwork.image_path.clone().unwrap();
    assert!(fx.pipeline.images.read(&file).await.is_ok());
    assert_eq!(artwork.responses.len(), 3);
    assert!(artwork.themes.contains(&"fireworks".to_string()));
    assert!(artwork.prompt.contains("mystical and awe-inspiring"));

    // Stored and broadcast
    let stored = fx.pipeline.store.get_artwork(artwork.id.clone()).await.unwrap();
    assert_eq!(stored.unwrap().share_code, artwork.share_code);
    match sub.receiver.recv().await.unwrap() {
        RealtimeEvent::NewArtwork { artwork: pushed } => assert_eq!(pushed.id, artwork.id),
        other => panic!("unexpected event {other:?}"),
    }

    // Kiosk reached the result screen and closed the session
    let k = kiosk.lock().await;
    let snapshot = k.snapshot(Instant::now());
    assert_eq!(snapshot.phase, Phase::Result);
    assert_eq!(snapshot.artwork.unwrap().id, artwork.id);
    let history = k.sessions().history();
    assert_eq!(history[0].status, SessionStatus::Completed);
    assert_eq!(history[0].generated_artwork_id.as_deref(), Some(artwork.id.as_str()));
}

#[tokio::test]
async fn test_failure_shows_static_message_then_resets() {
    let fx = fixture(Arc::new(FailingProvider), 0);
    let kiosk = kiosk();

    answer_all(&kiosk).await;
    let message = assert_err!(fx.pipeline.run_generation(&kiosk).await.unwrap());
    assert!(message.contains("quota exceeded"));

    let mut k = kiosk.lock().await;
    let now = Instant::now();
    let snapshot = k.snapshot(now);
    assert_eq!(snapshot.phase, Phase::Error);
    assert_eq!(snapshot.error.as_deref(), Some(USER_ERROR_MESSAGE));
    assert_eq!(k.sessions().history()[0].status, SessionStatus::Error);

    k.tick(now + Duration::from_secs(3));
    assert_eq!(k.phase(), Phase::Start);
    assert_eq!(fx.pipeline.store.count_artworks().await.unwrap(), 0);
}

#[tokio::test]
async fn test_late_failure_does_not_touch_next_visitor() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let fx = fixture(
        Arc::new(GatedProvider {
            entered: entered.clone(),
            release: release.clone(),
        }),
        0,
    );
    let kiosk = Arc::new(kiosk());
    answer_all(&kiosk).await;

    let pipeline = fx.pipeline.clone();
    let shared = kiosk.clone();
    let task = tokio::spawn(async move { pipeline.run_generation(&shared).await });
    entered.notified().await;

    let next_session = {
        let mut k = kiosk.lock().await;
        k.reset();
        k.start_experience(Instant::now()).unwrap()
    };
    release.notify_one();
    let outcome = task.await.unwrap().unwrap();
    assert!(outcome.is_err());

    let k = kiosk.lock().await;
    assert_eq!(k.phase(), Phase::Questions);
    assert!(k.snapshot(Instant::now()).error.is_none());
    assert_eq!(k.sessions().current().unwrap().id, next_session);
    let history = k.sessions().history();
    let abandoned = &history[0];
    assert_eq!(abandoned.status, SessionStatus::Error);
    assert_eq!(
        abandoned.metadata.error_message.as_deref(),
        Some("Session manager reset")
    );
}

#[tokio::test]
async fn test_run_generation_is_noop_until_ready() {
    let fx = fixture(
        Arc::new(MockProvider {
            calls: AtomicUsize::new(0),
        }),
        0,
    );
    let kiosk = kiosk();
    assert!(fx.pipeline.run_generation(&kiosk).await.is_none());

    kiosk.lock().await.start_experience(Instant::now()).unwrap();
    assert!(fx.pipeline.run_generation(&kiosk).await.is_none());
}

#[tokio::test]
async fn test_retention_removes_old_images() {
    let fx = fixture(
        Arc::new(MockProvider {
            calls: AtomicUsize::new(0),
        }),
        2,
    );

    let mut saved = Vec::new();
    for i in 0..3 {
        let responses = Vec::new();
        let artwork = fx
            .pipeline
            .generate_and_publish(&format!("session_{i}"), &responses)
            .await
            .unwrap();
        saved.push(artwork);
    }

    assert_eq!(fx.pipeline.store.count_artworks().await.unwrap(), 2);
    let oldest = saved[0].image_path.clone().unwrap();
    assert!(fx.pipeline.images.read(&oldest).await.is_err());
    let newest = saved[2].image_path.clone().unwrap();
    assert!(fx.pipeline.images.read(&newest).await.is_ok());
}
