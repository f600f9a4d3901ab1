// src/cli/sessions.rs — `talkart sessions ...`

use chrono::Local;

use crate::cli::SessionsAction;
use crate::infra::config::Config;

pub async fn run_sessions(config: &Config, action: SessionsAction) -> anyhow::Result<()> {
    let mut sessions = super::load_sessions(config);

    match action {
        SessionsAction::List { limit } => {
            let history = sessions.history();
            if history.is_empty() {
                println!("No sessions recorded.");
                return Ok(());
            }
            for s in history.iter().take(limit) {
                let duration = s
                    .metadata
                    .duration_ms
                    .map(|ms| format!("{:.0}s", ms as f64 / 1000.0))
                    .unwrap_or_else(|| "-".into());
                println!(
                    "  {}  {:<9}  {:>5}  {} answers  {}",
                    s.start_time.with_timezone(&Local).format("%m-%d %H:%M"),
                    s.status.as_str(),
                    duration,
                    s.responses.len(),
                    s.generated_artwork_id.as_deref().unwrap_or("-"),
                );
                if let Some(err) = &s.metadata.error_message {
                    println!("      {err}");
                }
            }
        }
        SessionsAction::Stats => {
            let stats = sessions.stats();
            println!("Sessions");
            println!("  Total:        {}", stats.total);
            println!("  Completed:    {}", stats.completed);
            println!("  Timed out:    {}", stats.timeout);
            println!("  Errors:       {}", stats.error);
            println!("  Avg duration: {}s", stats.average_duration_secs);
            println!("  Today:        {}", stats.today_count);
            println!("  Completion:   {}%", stats.completion_rate);
        }
        SessionsAction::Clear { yes } => {
            if !yes && !super::confirm("Clear the session history?") {
                println!("Cancelled.");
                return Ok(());
            }
            sessions.clear_history();
            println!("Session history cleared.");
        }
    }
    Ok(())
}
