// src/store/server.rs — Async message passing for Store
//
// The rusqlite connection lives on one task; everything async talks to it
// through a cloneable handle.

use tokio::sync::{mpsc, oneshot};

use super::artworks::{Artwork, GalleryStats, NewArtwork, Store};

type Reply<T> = oneshot::Sender<anyhow::Result<T>>;

#[derive(Debug)]
pub enum StoreCommand {
    InsertArtwork {
        artwork: NewArtwork,
        resp: Reply<Artwork>,
    },
    GetArtwork {
        id: String,
        resp: Reply<Option<Artwork>>,
    },
    FindByCodeOrId {
        code: String,
        resp: Reply<Option<Artwork>>,
    },
    RecentArtworks {
        limit: u32,
        offset: u32,
        resp: Reply<Vec<Artwork>>,
    },
    FeaturedArtworks {
        resp: Reply<Vec<Artwork>>,
    },
    CountArtworks {
        resp: Reply<i64>,
    },
    AddLike {
        id: String,
        resp: Reply<Option<Artwork>>,
    },
    SetFeatured {
        id: String,
        featured: bool,
        resp: Reply<Option<Artwork>>,
    },
    DeleteArtwork {
        id: String,
        resp: Reply<Option<Artwork>>,
    },
    TrimTo {
        max: u32,
        resp: Reply<Vec<Artwork>>,
    },
    GalleryStats {
        resp: Reply<GalleryStats>,
    },
}

/// A handle to the Store that uses message passing.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreCommand>,
}

impl StoreHandle {
    pub fn new(tx: mpsc::Sender<StoreCommand>) -> Self {
        Self { tx }
    }

    async fn call<T>(&self, build: impl FnOnce(Reply<T>) -> StoreCommand) -> anyhow::Result<T> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx.send(build(resp_tx)).await?;
        resp_rx.await?
    }

    pub async fn insert_artwork(&self, artwork: NewArtwork) -> anyhow::Result<Artwork> {
        self.call(|resp| StoreCommand::InsertArtwork { artwork, resp })
            .await
    }

    pub async fn get_artwork(&self, id: String) -> anyhow::Result<Option<Artwork>> {
        self.call(|resp| StoreCommand::GetArtwork { id, resp }).await
    }

    pub async fn find_by_code_or_id(&self, code: String) -> anyhow::Result<Option<Artwork>> {
        self.call(|resp| StoreCommand::FindByCodeOrId { code, resp })
            .await
    }

    pub async fn recent_artworks(&self, limit: u32, offset: u32) -> anyhow::Result<Vec<Artwork>> {
        self.call(|resp| StoreCommand::RecentArtworks {
            limit,
            offset,
            resp,
        })
        .await
    }

    pub async fn featured_artworks(&self) -> anyhow::Result<Vec<Artwork>> {
        self.call(|resp| StoreCommand::FeaturedArtworks { resp })
            .await
    }

    pub async fn count_artworks(&self) -> anyhow::Result<i64> {
        self.call(|resp| StoreCommand::CountArtworks { resp }).await
    }

    pub async fn add_like(&self, id: String) -> anyhow::Result<Option<Artwork>> {
        self.call(|resp| StoreCommand::AddLike { id, resp }).await
    }

    pub async fn set_featured(&self, id: String, featured: bool) -> anyhow::Result<Option<Artwork>> {
        self.call(|resp| StoreCommand::SetFeatured { id, featured, resp })
            .await
    }

    pub async fn delete_artwork(&self, id: String) -> anyhow::Result<Option<Artwork>> {
        self.call(|resp| StoreCommand::DeleteArtwork { id, resp })
            .await
    }

    pub async fn trim_to(&self, max: u32) -> anyhow::Result<Vec<Artwork>> {
        self.call(|resp| StoreCommand::TrimTo { max, resp }).await
    }

    pub async fn gallery_stats(&self) -> anyhow::Result<GalleryStats> {
        self.call(|resp| StoreCommand::GalleryStats { resp }).await
    }
}

/// Spawn the store server and return a handle.
pub fn spawn_store_server(store: Store) -> (StoreHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(100);
    let handle = StoreHandle::new(tx);
    let join_handle = tokio::spawn(run_store_server(store, rx));
    (handle, join_handle)
}

/// The background task that owns the Store.
pub async fn run_store_server(store: Store, mut rx: mpsc::Receiver<StoreCommand>) {
    while let Some(cmd) = rx.recv().await {
        // A dropped receiver means the caller went away; nothing to do.
        match cmd {
            StoreCommand::InsertArtwork { artwork, resp } => {
                let _ = resp.send(store.insert_artwork(&artwork));
            }
            StoreCommand::GetArtwork { id, resp } => {
                let _ = resp.send(store.get_artwork(&id));
            }
            StoreCommand::FindByCodeOrId { code, resp } => {
                let _ = resp.send(store.find_by_code_or_id(&code));
            }
            StoreCommand::RecentArtworks {
                limit,
                offset,
                resp,
            } => {
                let _ = resp.send(store.recent_artworks(limit, offset));
            }
            StoreCommand::FeaturedArtworks { resp } => {
                let _ = resp.send(store.featured_artworks());
            }
            StoreCommand::CountArtworks { resp } => {
                let _ = resp.send(store.count_artworks());
            }
            StoreCommand::AddLike { id, resp } => {
                let _ = resp.send(store.add_like(&id));
            }
            StoreCommand::SetFeatured { id, featured, resp } => {
                let _ = resp.send(store.set_featured(&id, featured));
            }
            StoreCommand::DeleteArtwork { id, resp } => {
                let _ = resp.send(store.delete_artwork(&id));
            }
            StoreCommand::TrimTo { max, resp } => {
                let _ = resp.send(store.trim_to(max));
            }
            StoreCommand::GalleryStats { resp } => {
                let _ = resp.send(store.gallery_stats());
            }
        }
    }
    tracing::debug!("Store server stopped");
}
