// src/gallery/mod.rs — Gallery wall: placement and live updates

pub mod layout;
pub mod realtime;

use serde::Serialize;

use crate::infra::config::GalleryConfig;
use crate::store::Artwork;
use layout::{GalleryLayoutEngine, LayoutPosition};

#[derive(Debug, Clone, Serialize)]
pub struct BoardItem {
    pub artwork: Artwork,
    pub position: LayoutPosition,
}

/// Pin `artworks` onto a fresh board of the given size.
pub fn build_board(artworks: Vec<Artwork>, width: f64, height: f64, config: &GalleryConfig) -> Vec<BoardItem> {
    let mut engine = GalleryLayoutEngine::new(width, height, config.item_width, config.item_height)
        .with_max_attempts(config.max_placement_attempts as usize);
    artworks
        .into_iter()
        .enumerate()
        .map(|(i, artwork)| BoardItem {
            position: engine.generate_position(i),
            artwork,
        })
        .collect()
}
