// src/cli/mod.rs — CLI definition (clap derive)

pub mod gallery;
pub mod play;
pub mod serve;
pub mod sessions;
pub mod status;

use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::art::ArtGenerator;
use crate::gallery::realtime::RealtimeHub;
use crate::infra::config::Config;
use crate::infra::paths;
use crate::kiosk::pipeline::Pipeline;
use crate::session::SessionManager;
use crate::store::images::ImageStore;
use crate::store::{self as artstore, Store, StoreHandle};

#[derive(Parser)]
#[command(name = "talkart", about = "Summer-festival memory kiosk", version)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (kiosk, gallery screens, share links)
    Serve {
        /// Bind address (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run the experience in this terminal
    Play,
    /// Inspect and curate the gallery
    Gallery {
        #[command(subcommand)]
        action: GalleryAction,
    },
    /// Experience session history
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
    /// Show paths, provider and counts
    Status,
}

#[derive(Subcommand, Clone)]
pub enum GalleryAction {
    /// List artworks, newest first
    List {
        #[arg(short, long, default_value = "20")]
        limit: u32,
        #[arg(long, default_value = "0")]
        offset: u32,
        /// Only featured artworks
        #[arg(long)]
        featured: bool,
    },
    /// Show one artwork by share code or id
    Show { code: String },
    /// Delete an artwork and its stored image
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Mark an artwork as featured
    Feature {
        id: String,
        /// Remove the featured flag instead
        #[arg(long)]
        off: bool,
    },
    /// Add a like
    Like { id: String },
    /// Gallery totals
    Stats,
    /// Write all artworks as JSON (stdout when no path)
    Export { path: Option<String> },
    /// Load artworks from an export file
    Import { path: String },
    /// Print board positions for a number of items
    Layout {
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        #[arg(short, long, default_value = "10")]
        count: usize,
    },
}

#[derive(Subcommand, Clone)]
pub enum SessionsAction {
    /// Recent sessions, newest first
    List {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Completion statistics
    Stats,
    /// Forget the session history
    Clear {
        #[arg(short, long)]
        yes: bool,
    },
}

/// Open the gallery database under the data directory.
pub fn open_store() -> anyhow::Result<Store> {
    artstore::open(&paths::db_path())
}

pub fn image_store(config: &Config) -> ImageStore {
    ImageStore::new(paths::images_dir(), config.server.max_proxy_bytes)
}

pub fn load_sessions(config: &Config) -> SessionManager {
    SessionManager::load(paths::session_history_path(), config.session.history_size)
}

/// Generation pipeline over an already running store actor.
pub fn build_pipeline(config: &Config, store: StoreHandle, hub: Arc<RealtimeHub>) -> Pipeline {
    Pipeline {
        generator: Arc::new(ArtGenerator::from_config(&config.generation)),
        images: Arc::new(image_store(config)),
        store,
        hub,
        public_base_url: config.server.public_base_url.clone(),
        max_artworks: config.storage.max_artworks,
    }
}

/// Ask before doing something destructive.
pub fn confirm(message: &str) -> bool {
    inquire::Confirm::new(message)
        .with_default(false)
        .prompt()
        .unwrap_or(false)
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
