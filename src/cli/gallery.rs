// src/cli/gallery.rs — `talkart gallery ...`

use crate::cli::GalleryAction;
use crate::gallery::layout::GalleryLayoutEngine;
use crate::infra::config::Config;
use crate::store::{Artwork, Store};

pub async fn run_gallery(config: &Config, action: GalleryAction) -> anyhow::Result<()> {
    let store = super::open_store()?;

    match action {
        GalleryAction::List {
            limit,
            offset,
            featured,
        } => {
            let artworks = if featured {
                store.featured_artworks()?
            } else {
                store.recent_artworks(limit, offset)?
            };
            print_list(&store, &artworks)?;
        }
        GalleryAction::Show { code } => match store.find_by_code_or_id(&code)? {
            Some(artwork) => print_detail(config, &artwork),
            None => anyhow::bail!("Artwork '{code}' not found"),
        },
        GalleryAction::Delete { id, yes } => {
            if store.get_artwork(&id)?.is_none() {
                anyhow::bail!("Artwork '{id}' not found");
            }
            if !yes && !super::confirm(&format!("Delete artwork {id}?")) {
                println!("Cancelled.");
                return Ok(());
            }
            if let Some(removed) = store.delete_artwork(&id)? {
                if let Some(path) = removed.image_path.as_deref() {
                    super::image_store(config).remove(path).await?;
                }
                println!("Deleted {id}.");
            }
        }
        GalleryAction::Feature { id, off } => match store.set_featured(&id, !off)? {
            Some(a) => println!(
                "{} is {}featured.",
                a.share_code,
                if a.featured { "" } else { "no longer " }
            ),
            None => anyhow::bail!("Artwork '{id}' not found"),
        },
        GalleryAction::Like { id } => match store.add_like(&id)? {
            Some(a) => println!("{} now has {} likes.", a.share_code, a.likes),
            None => anyhow::bail!("Artwork '{id}' not found"),
        },
        GalleryAction::Stats => {
            let stats = store.gallery_stats()?;
            println!("Gallery");
            println!("  Total:     {}", stats.total);
            println!("  Today:     {}", stats.today);
            println!("  Featured:  {}", stats.featured);
            println!("  Likes:     {}", stats.total_likes);
            println!("  Views:     {}", stats.total_views);
        }
        GalleryAction::Export { path } => {
            let json = store.export_json()?;
            match path {
                Some(path) => {
                    tokio::fs::write(&path, json).await?;
                    println!("Exported {} artworks to {path}.", store.count_artworks()?);
                }
                None => println!("{json}"),
            }
        }
        GalleryAction::Import { path } => {
            let data = tokio::fs::read_to_string(&path).await?;
            let imported = store.import_json(&data)?;
            println!("Imported {imported} artworks.");
        }
        GalleryAction::Layout {
            width,
            height,
            count,
        } => {
            let g = &config.gallery;
            let mut engine = GalleryLayoutEngine::new(
                width.unwrap_or(g.board_width),
                height.unwrap_or(g.board_height),
                g.item_width,
                g.item_height,
            )
            .with_max_attempts(g.max_placement_attempts as usize);
            println!("{}", serde_json::to_string_pretty(&engine.layout(count))?);
        }
    }
    Ok(())
}

fn print_list(store: &Store, artworks: &[Artwork]) -> anyhow::Result<()> {
    if artworks.is_empty() {
        println!("No artworks yet.");
        return Ok(());
    }
    for a in artworks {
        println!(
            "  {}  {}  {:>3} likes {}  {}",
            a.share_code,
            a.created_at.format("%m-%d %H:%M"),
            a.likes,
            if a.featured { "★" } else { " " },
            super::truncate(&a.prompt, 50),
        );
    }
    println!();
    println!("  {} shown, {} total", artworks.len(), store.count_artworks()?);
    Ok(())
}

fn print_detail(config: &Config, a: &Artwork) {
    let base = config.server.public_base_url.trim_end_matches('/');
    println!("Artwork {}", a.id);
    println!("  Share code: {}", a.share_code);
    println!("  Share link: {base}/api/talkart/share/{}", a.id);
    println!("  Session:    {}", a.session_id);
    println!("  Created:    {}", a.created_at.to_rfc3339());
    println!("  Image:      {}", a.image_url);
    if let Some(path) = &a.image_path {
        println!("  File:       {path}");
    }
    println!("  Views:      {}", a.view_count);
    println!("  Likes:      {}", a.likes);
    println!("  Featured:   {}", if a.featured { "yes" } else { "no" });
    if !a.themes.is_empty() {
        println!("  Themes:     {}", a.themes.join(", "));
    }
    for r in &a.responses {
        println!("  - {}: {}", r.question_id, r.answer);
    }
    println!();
    println!("{}", a.prompt);
}
