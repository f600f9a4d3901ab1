// src/kiosk/pipeline.rs — Answers in, published artwork out
//
// generator -> image directory -> artwork store -> realtime hub. Used by the
// HTTP kiosk driver and the terminal kiosk alike.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{GenerationJob, Kiosk};
use crate::art::{validate_image, ArtGenerator};
use crate::flow::questions::Response;
use crate::gallery::realtime::RealtimeHub;
use crate::infra::errors::TalkArtError;
use crate::store::images::ImageStore;
use crate::store::{Artwork, ArtworkAnswer, NewArtwork, StoreHandle};

pub struct Pipeline {
    pub generator: Arc<ArtGenerator>,
    pub images: Arc<ImageStore>,
    pub store: StoreHandle,
    pub hub: Arc<RealtimeHub>,
    pub public_base_url: String,
    /// 0 keeps everything.
    pub max_artworks: u32,
}

/// Link under which a stored image is served.
pub fn image_link(public_base_url: &str, artwork_id: &str) -> String {
    format!(
        "{}/api/talkart/image/{artwork_id}",
        public_base_url.trim_end_matches('/')
    )
}

impl Pipeline {
    pub async fn generate_and_publish(
        &self,
        session_id: &str,
        responses: &[Response],
    ) -> Result<Artwork, TalkArtError> {
        let art = self.generator.generate_artwork(responses, session_id).await?;

        let mut new = NewArtwork::new(session_id, &art.image_url, &art.prompt);
        new.responses = responses.iter().map(ArtworkAnswer::from).collect();
        new.style = art.style.clone();
        new.themes = art.themes.clone();
        new.demo = art.demo;

        // Remote URLs from the provider expire, so keep a local copy when we can.
        match self.images.save(&art.image_url, session_id).await {
            Ok(file_name) => {
                new.image_url = image_link(&self.public_base_url, &new.id);
                new.image_path = Some(file_name);
            }
            Err(e) => {
                tracing::warn!(session_id, "Keeping provider image URL, copy failed: {e}");
                if !validate_image(self.images.client(), &art.image_url).await {
                    tracing::warn!(session_id, "Provider image URL is not reachable");
                }
            }
        }

        let artwork = self.store.insert_artwork(new).await?;
        tracing::info!(
            artwork_id = %artwork.id,
            share_code = %artwork.share_code,
            generation_ms = art.generation_ms,
            "Artwork saved"
        );

        if self.max_artworks > 0 {
            self.enforce_retention().await;
        }

        self.hub.publish(artwork.clone());
        Ok(artwork)
    }

    async fn enforce_retention(&self) {
        match self.store.trim_to(self.max_artworks).await {
            Ok(removed) => {
                for old in removed {
                    if let Some(path) = old.image_path.as_deref() {
                        if let Err(e) = self.images.remove(path).await {
                            tracing::warn!("Failed to remove image {path}: {e}");
                        }
                    }
                }
            }
            Err(e) => tracing::warn!("Failed to trim gallery: {e}"),
        }
    }

    /// Take the finished answers out of the kiosk, generate without holding
    /// the lock, and report the outcome back. No-op unless the kiosk is ready.
    pub async fn run_generation(&self, kiosk: &Mutex<Kiosk>) -> Option<Result<Artwork, String>> {
        let job: GenerationJob = {
            let mut k = kiosk.lock().await;
            if !k.ready_for_generation() {
                return None;
            }
            k.begin_generation().ok()?
        };

        let outcome = self.generate_and_publish(&job.session_id, &job.responses).await;

        let mut k = kiosk.lock().await;
        match outcome {
            Ok(artwork) => {
                k.complete_generation(&job.session_id, artwork.clone());
                Some(Ok(artwork))
            }
            Err(e) => {
                let message = e.to_string();
                k.fail_generation(&job.session_id, &message, Instant::now());
                Some(Err(message))
            }
        }
    }
}

/// Poll the kiosk timers and start generation as soon as the questions end.
pub fn spawn_kiosk_driver(
    kiosk: Arc<Mutex<Kiosk>>,
    pipeline: Arc<Pipeline>,
    poll_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let ready = {
                let mut k = kiosk.lock().await;
                k.tick(Instant::now());
                k.ready_for_generation()
            };
            if ready {
                let kiosk = kiosk.clone();
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    pipeline.run_generation(&kiosk).await;
                });
            }
        }
    })
}
