mod config;
mod harvester;
mod insight;
mod miner;
mod model;
mod normalizer;
mod notifier;
mod scoring;

use config::{AppConfig, load_config};
use harvester::PageFetcher;
use insight::{InsightReport, InsightRequester};
use miner::Miner;
use notifier::TelegramNotifier;
use notifier::telegram::format::build_messages;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let config: AppConfig = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let miner = Miner::with_default_sources(PageFetcher::new());
    let notifier = TelegramNotifier::new(
        config.telegram_bot_token.clone(),
        config.telegram_channel_id.clone(),
    );

    info!(
        "🚀 Garimpo started! Mining every {}s",
        config.check_interval_seconds
    );
    if let Err(e) = notifier
        .notify_text("🚀 Garimpo na área! Minerando os próximos produtos vencedores...")
        .await
    {
        warn!("Startup notification failed: {:?}", e);
    }

    loop {
        run_pipeline(&miner, &notifier, &config).await;
        info!(
            "⏳ Waiting {}s until the next run...",
            config.check_interval_seconds
        );
        sleep(Duration::from_secs(config.check_interval_seconds)).await;
    }
}

/// One full discovery cycle: mine, annotate, format, deliver. Each stage
/// failure degrades locally; the cycle never takes the loop down with it.
async fn run_pipeline(miner: &Miner, notifier: &TelegramNotifier, config: &AppConfig) {
    info!("⛏️ Starting mining run (limit {})...", config.mining_limit);
    let outcome = miner.run(config.mining_limit).await;

    for report in &outcome.diagnostics.reports {
        match &report.error {
            Some(error) => warn!("{} → {}", report.label, error),
            None => info!("{} → {} candidates", report.label, report.count),
        }
    }

    if outcome.products.is_empty() {
        warn!("📭 No eligible candidates this run.");
        return;
    }

    let insight = match InsightRequester::new(config.openai_api_key.clone()) {
        Ok(requester) => match requester.analyze(&outcome.products).await {
            Ok(report) => report,
            Err(e) => {
                warn!("🧠 Annotation failed, continuing without insights: {}", e);
                InsightReport::default()
            }
        },
        Err(e) => {
            warn!("🧠 {}", e);
            InsightReport::default()
        }
    };

    let messages = build_messages(&outcome.products, &insight);
    info!("✉️ Sending {} messages...", messages.len());
    for message in &messages {
        if let Err(e) = notifier.notify(message).await {
            warn!("❌ Telegram send error: {}", e);
        }
    }

    info!(
        "✅ Run finished: {} products, {} messages",
        outcome.products.len(),
        messages.len()
    );
}
