// src/cli/serve.rs — `talkart serve`

use crate::api::{self, ApiState};
use crate::art::ArtGenerator;
use crate::infra::config::Config;
use crate::infra::paths;
use crate::store::spawn_store_server;

pub async fn run_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    paths::ensure_dirs().await?;
    let store = super::open_store()?;
    let (store, _store_task) = spawn_store_server(store);

    let generator = ArtGenerator::from_config(&config.generation);
    tracing::info!(provider = generator.provider_id(), "Image provider ready");

    let state = ApiState::new(
        &config,
        store,
        generator,
        super::image_store(&config),
        super::load_sessions(&config),
    );
    api::start_server(&config, state).await
}
