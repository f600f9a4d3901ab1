// src/store/mod.rs — Gallery persistence (SQLite + image directory)

pub mod artworks;
pub mod images;
pub mod schema;
pub mod server;

use rusqlite::Connection;
use std::path::Path;

pub use artworks::{Artwork, ArtworkAnswer, GalleryStats, NewArtwork, Store};
pub use server::{spawn_store_server, StoreHandle};

/// Open (or create) the database at the given path and run migrations.
pub fn open(path: &Path) -> anyhow::Result<Store> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    schema::run_migrations(&conn)?;
    Ok(Store::new(conn))
}

/// Create an in-memory database (for testing).
pub fn in_memory() -> anyhow::Result<Store> {
    let conn = Connection::open_in_memory()?;
    schema::run_migrations(&conn)?;
    Ok(Store::new(conn))
}
