// src/cli/status.rs — System status display

use crate::art::resolve_provider;
use crate::infra::config::Config;
use crate::infra::paths;

pub async fn show_status(config: &Config) -> anyhow::Result<()> {
    let db_path = paths::db_path();
    let config_path = paths::config_file_path();

    println!("talkart v{}", env!("CARGO_PKG_VERSION"));
    println!();

    if config_path.exists() {
        println!("  Config:     {} (loaded)", config_path.display());
    } else {
        println!("  Config:     (using defaults)");
    }

    if db_path.exists() {
        let size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);
        println!("  Database:   {} ({})", db_path.display(), format_bytes(size));
        let store = super::open_store()?;
        let stats = store.gallery_stats()?;
        println!("  Artworks:   {} ({} today, {} featured)", stats.total, stats.today, stats.featured);
    } else {
        println!("  Database:   (not initialized)");
    }

    println!(
        "  Images:     {} ({} files)",
        paths::images_dir().display(),
        count_dir_entries(&paths::images_dir())
    );

    let provider = resolve_provider(&config.generation);
    println!("  Provider:   {}", provider.id());
    println!(
        "  Questions:  {} ({}s limit, {:?} on timeout)",
        config.questions().len(),
        config.experience.question_time_limit_secs,
        config.experience.timeout_policy
    );
    println!(
        "  Server:     {}:{} ({})",
        config.server.host,
        config.server.port,
        if config.server.token.is_some() { "admin token set" } else { "no admin token" }
    );

    let stats = super::load_sessions(config).stats();
    println!(
        "  Sessions:   {} recorded, {}% completed",
        stats.total, stats.completion_rate
    );
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1}MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes}B")
    }
}

fn count_dir_entries(path: &std::path::Path) -> usize {
    std::fs::read_dir(path)
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(2048), "2.0KB");
        assert_eq!(format_bytes(3 * 1_048_576), "3.0MB");
    }
}
