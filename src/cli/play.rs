// src/cli/play.rs — Terminal kiosk
//
// Same kiosk and pipeline as the server, driven by inquire prompts. The
// countdown is checked after every answer.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::gallery::realtime::RealtimeHub;
use crate::infra::config::Config;
use crate::infra::errors::USER_ERROR_MESSAGE;
use crate::infra::paths;
use crate::kiosk::Kiosk;
use crate::store::spawn_store_server;

const START: &str = "はじめる";
const QUIT: &str = "終了";

pub async fn run_play(config: &Config) -> anyhow::Result<()> {
    paths::ensure_dirs().await?;
    let (store, _store_task) = spawn_store_server(super::open_store()?);
    let hub = Arc::new(RealtimeHub::new(config.gallery.realtime_buffer));
    let pipeline = super::build_pipeline(config, store, hub);
    let kiosk = Mutex::new(Kiosk::new(
        config.questions(),
        &config.experience,
        super::load_sessions(config),
    ));

    println!("TalkArt — 夏祭りの思い出アート");
    println!("画像生成: {}", pipeline.generator.provider_id());
    println!();

    loop {
        let choice = inquire::Select::new("夏祭りの思い出をアートにしませんか？", vec![START, QUIT])
            .prompt()
            .unwrap_or(QUIT);
        if choice == QUIT {
            break;
        }

        kiosk.lock().await.start_experience(Instant::now())?;
        if !ask_questions(&kiosk).await? {
            kiosk.lock().await.reset();
            println!("中断しました。");
            continue;
        }

        println!();
        println!("アートを生成しています...");
        match pipeline.run_generation(&kiosk).await {
            Some(Ok(artwork)) => {
                let snapshot = kiosk.lock().await.snapshot(Instant::now());
                println!();
                if let Some(summary) = snapshot.summary {
                    println!("{summary}");
                    println!();
                }
                println!("  画像:     {}", artwork.image_url);
                println!("  共有コード: {}", artwork.share_code);
                println!(
                    "  共有リンク: {}/api/talkart/share/{}",
                    config.server.public_base_url.trim_end_matches('/'),
                    artwork.id
                );
                if artwork.demo {
                    println!("  (APIキー未設定のためデモ画像です)");
                }
                println!();
            }
            Some(Err(_)) => {
                println!("{USER_ERROR_MESSAGE}");
                println!();
            }
            None => {}
        }
    }

    let stats = kiosk.lock().await.sessions().stats();
    println!(
        "本日の体験: {} 件 (完了率 {}%)",
        stats.today_count, stats.completion_rate
    );
    Ok(())
}

/// Walk through the questions. Returns false when the visitor cancels.
async fn ask_questions(kiosk: &Mutex<Kiosk>) -> anyhow::Result<bool> {
    loop {
        let (question, progress) = {
            let mut k = kiosk.lock().await;
            let now = Instant::now();
            k.tick(now);
            if k.ready_for_generation() {
                return Ok(true);
            }
            match k.flow().current_question().cloned() {
                Some(q) => (q, k.flow().progress(now)),
                None => return Ok(true),
            }
        };

        let help = format!(
            "質問 {}/{}  残り {} 秒",
            progress.question_number,
            progress.total_questions,
            progress.time_remaining_ms / 1000
        );
        let Ok(answer) = inquire::Select::new(&question.text, question.options.clone())
            .with_help_message(&help)
            .prompt()
        else {
            return Ok(false);
        };

        if kiosk.lock().await.answer(&answer, Instant::now())? {
            return Ok(true);
        }
    }
}
