//! The digest pipeline: fetch → normalize → aggregate → topics → digest →
//! links → length guard → dispatch, then the same tail for the joke.
//!
//! Runs once, sequentially, over a single platform session that is closed on
//! every exit path.

pub mod aggregate;
pub mod compose;
pub mod fetch;
pub mod guard;
pub mod links;
pub mod normalize;
pub mod prompt;
pub mod topics;

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::{
    config::Config,
    domain::{Channel, Destination},
    messaging::port::{ChannelSource, DigestSink, PlatformSession},
    model::client::TextGenerator,
    Result,
};

use self::{
    aggregate::AggregateDocument,
    fetch::{fetch_channel, possibly_truncated, ChannelFetch},
    guard::LengthGuard,
    links::rewrite_links,
    normalize::normalize_channel,
    prompt::PromptTemplate,
    topics::{extract_topics, TopicList},
};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// The external collaborators of one run.
#[derive(Clone, Copy)]
pub struct DigestPorts<'a> {
    pub session: &'a dyn PlatformSession,
    pub source: &'a dyn ChannelSource,
    pub generator: &'a dyn TextGenerator,
    pub sink: &'a dyn DigestSink,
}

/// The subset of [`Config`] the pipeline needs.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub channels: Vec<Channel>,
    pub destination: Destination,
    pub days_back: f64,
    pub fetch_limit: usize,
    pub message_limit: usize,
    pub model: String,
    pub template: PromptTemplate,
}

impl RunSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            channels: cfg.channels.clone(),
            destination: cfg.destination.clone(),
            days_back: cfg.days_back,
            fetch_limit: cfg.fetch_limit,
            message_limit: cfg.telegram_message_limit,
            model: cfg.openai_model.clone(),
            template: cfg.template.clone(),
        }
    }

    /// Earliest unix time a post may carry to be included.
    pub fn cutoff(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp() - (self.days_back * SECONDS_PER_DAY) as i64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No channel produced a qualifying post; nothing was generated or sent.
    NoContent,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchStatus {
    Sent,
    SkippedTooLong { len: usize },
    /// Not attempted because an earlier stage did not produce a sendable digest.
    SkippedDependency,
    /// Turned off in the prompt template, or never reached.
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: Channel,
    pub received: usize,
    pub kept: usize,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: Outcome,
    pub channels: Vec<ChannelReport>,
    pub topics: TopicList,
    pub digest: DispatchStatus,
    pub joke: DispatchStatus,
}

impl RunReport {
    fn no_content(channels: Vec<ChannelReport>) -> Self {
        Self {
            outcome: Outcome::NoContent,
            channels,
            topics: TopicList::default(),
            digest: DispatchStatus::Disabled,
            joke: DispatchStatus::Disabled,
        }
    }
}

/// Run the whole pipeline once.
///
/// The session is connected first and disconnected on every path, including
/// a failed connect, the "no content" early return and fatal errors.
pub async fn run_digest(
    ports: DigestPorts<'_>,
    settings: &RunSettings,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    let result = match ports.session.connect().await {
        Ok(()) => run_connected(ports, settings, now).await,
        Err(e) => Err(e),
    };
    ports.session.disconnect().await;
    tracing::info!("Disconnected from Telegram");
    result
}

async fn run_connected(
    ports: DigestPorts<'_>,
    settings: &RunSettings,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    let cutoff = settings.cutoff(now);
    tracing::info!(
        "Looking for messages from the last {} days (since {}, {cutoff})",
        settings.days_back,
        DateTime::from_timestamp(cutoff, 0)
            .map(|d| d.to_rfc3339())
            .unwrap_or_default()
    );

    let (aggregate, channels) = collect(ports.source, settings, cutoff).await;
    if aggregate.is_empty() {
        tracing::info!("No new messages found");
        return Ok(RunReport::no_content(channels));
    }
    tracing::info!(
        "Aggregated {} posts from {} channels",
        aggregate.post_count(),
        aggregate.sections().len()
    );
    let document = aggregate.render();

    let template = &settings.template;
    let topics = if template.priority_topics {
        extract_topics(ports.generator, &settings.model, template, &document).await?
    } else {
        TopicList::default()
    };

    let date = now.with_timezone(&Local).date_naive();
    let mut report = RunReport {
        outcome: Outcome::Completed,
        channels,
        topics,
        digest: DispatchStatus::Disabled,
        joke: DispatchStatus::Disabled,
    };

    let guard = LengthGuard::new(settings.message_limit);
    let digest = digest_text(ports, settings, date, &report.topics, &document).await?;
    report.digest = dispatch(ports.sink, &settings.destination, &guard, "Summary", &digest).await?;

    if !template.closing_joke {
        return Ok(report);
    }
    if report.digest != DispatchStatus::Sent {
        tracing::warn!("joke skipped: digest was not sent");
        report.joke = DispatchStatus::SkippedDependency;
        return Ok(report);
    }

    let joke = compose::compose_joke(ports.generator, &settings.model, template, &digest).await?;
    let joke = rewrite_links(&joke);
    report.joke = dispatch(ports.sink, &settings.destination, &guard, "Joke", &joke).await?;
    Ok(report)
}

async fn collect(
    source: &dyn ChannelSource,
    settings: &RunSettings,
    cutoff: i64,
) -> (AggregateDocument, Vec<ChannelReport>) {
    let mut aggregate = AggregateDocument::new();
    let mut reports = Vec::with_capacity(settings.channels.len());

    for channel in &settings.channels {
        let posts = match fetch_channel(source, channel, settings.fetch_limit).await {
            ChannelFetch::Fetched(posts) => posts,
            ChannelFetch::Failed(error) => {
                reports.push(ChannelReport {
                    channel: channel.clone(),
                    received: 0,
                    kept: 0,
                    error: Some(error),
                });
                continue;
            }
        };

        if possibly_truncated(&posts, settings.fetch_limit, cutoff) {
            tracing::warn!(
                channel = %channel,
                "fetch cap of {} reached inside the window; older posts may be missing",
                settings.fetch_limit
            );
        }

        let kept = normalize_channel(&posts, channel, cutoff);
        tracing::info!(channel = %channel, "Messages after date filtering: {}", kept.len());
        reports.push(ChannelReport {
            channel: channel.clone(),
            received: posts.len(),
            kept: kept.len(),
            error: None,
        });
        aggregate.push(channel.clone(), kept);
    }

    (aggregate, reports)
}

async fn digest_text(
    ports: DigestPorts<'_>,
    settings: &RunSettings,
    date: NaiveDate,
    topics: &TopicList,
    document: &str,
) -> Result<String> {
    let digest = compose::compose_digest(
        ports.generator,
        &settings.model,
        &settings.template,
        date,
        topics,
        document,
    )
    .await?;
    Ok(rewrite_links(&digest))
}

/// Length-check and send one message. Oversized text is logged in full and
/// not sent; a send failure is fatal.
async fn dispatch(
    sink: &dyn DigestSink,
    destination: &Destination,
    guard: &LengthGuard,
    label: &str,
    text: &str,
) -> Result<DispatchStatus> {
    if !guard.allows(text) {
        let len = LengthGuard::measure(text);
        tracing::error!(
            "{label} exceeds Telegram message limit ({len} > {}); not sent:\n{text}",
            guard.ceiling()
        );
        return Ok(DispatchStatus::SkippedTooLong { len });
    }
    sink.send_markdown(destination, text).await?;
    tracing::info!("{label} sent to {destination}");
    Ok(DispatchStatus::Sent)
}
