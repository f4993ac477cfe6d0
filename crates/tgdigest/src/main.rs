use chrono::Utc;

use tgdigest_core::{
    config::Config,
    messaging::port::DigestSink,
    pipeline::{run_digest, DigestPorts, Outcome, RunReport, RunSettings},
};
use tgdigest_openai::OpenAiClient;
use tgdigest_telegram::{BotSink, MtprotoClient, MtprotoConfig};

#[tokio::main]
async fn main() -> Result<(), tgdigest_core::Error> {
    tgdigest_core::logging::init("tgdigest")?;

    let cfg = Config::load()?;

    let generator = OpenAiClient::new(
        cfg.openai_api_key.clone(),
        cfg.openai_base_url.clone(),
        cfg.openai_timeout,
    )?;

    let telegram = MtprotoClient::new(MtprotoConfig {
        api_id: cfg.telegram_api_id,
        api_hash: cfg.telegram_api_hash.clone(),
        session: cfg.telegram_session.clone(),
    });

    let bot = cfg.telegram_bot_token.as_deref().map(BotSink::from_token);
    let sink: &dyn DigestSink = match &bot {
        Some(bot) => {
            tracing::info!("delivering through the Bot API");
            bot as &dyn DigestSink
        }
        None => &telegram as &dyn DigestSink,
    };

    let settings = RunSettings::from_config(&cfg);
    let ports = DigestPorts {
        session: &telegram,
        source: &telegram,
        generator: &generator,
        sink,
    };

    let report = run_digest(ports, &settings, Utc::now()).await?;
    log_report(&report);
    Ok(())
}

fn log_report(report: &RunReport) {
    for ch in &report.channels {
        match &ch.error {
            Some(err) => tracing::warn!(channel = %ch.channel, error = %err, "channel skipped"),
            None => tracing::info!(
                channel = %ch.channel,
                received = ch.received,
                kept = ch.kept,
                "channel summary"
            ),
        }
    }
    match report.outcome {
        Outcome::NoContent => tracing::info!("No new posts in the window; nothing sent"),
        Outcome::Completed => tracing::info!(
            topics = report.topics.len(),
            digest = ?report.digest,
            joke = ?report.joke,
            "Digest run finished"
        ),
    }
}
