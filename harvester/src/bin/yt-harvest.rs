use clap::Parser;
use eyre::Context;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_channel_harvester::{ChannelTarget, HarvestConfig, Harvester, InnertubeClient};

/// Harvest per-video statistics for a list of channel tabs.
///
/// Settings not given as flags are read from `YT_HARVEST_*` environment variables.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Channel tab URLs, e.g. https://www.youtube.com/@someone/videos
    urls: Vec<String>,

    /// File with one channel tab URL per line; `#` starts a comment
    #[arg(long)]
    channels_file: Option<PathBuf>,

    /// Where to write the dataset
    #[arg(short, long, default_value = "youtube_stats.json")]
    output: PathBuf,

    /// Detail requests in flight per channel
    #[arg(long)]
    concurrency: Option<usize>,

    /// Upper bound on videos harvested per channel
    #[arg(long)]
    max_videos: Option<usize>,

    /// Web client version to identify as
    #[arg(long)]
    client_version: Option<String>,

    /// Key sent with every API request
    #[arg(long)]
    api_key: Option<String>,
}

impl Args {
    fn config(&self) -> HarvestConfig {
        let mut config = HarvestConfig::from_env();
        if let Some(n) = self.concurrency {
            config.concurrency_per_channel = n;
        }
        if let Some(n) = self.max_videos {
            config.max_videos_per_channel = n;
        }
        if let Some(version) = &self.client_version {
            config.client.version = version.clone();
        }
        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone());
        }
        config.normalized()
    }

    async fn targets(&self) -> eyre::Result<Vec<ChannelTarget>> {
        let mut urls = self.urls.clone();
        if let Some(path) = &self.channels_file {
            let listing = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("read channel list {}", path.display()))?;
            urls.extend(parse_channel_list(&listing));
        }
        Ok(urls.into_iter().map(ChannelTarget::from_url).collect())
    }
}

fn parse_channel_list(listing: &str) -> impl Iterator<Item = String> + '_ {
    listing
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let targets = args.targets().await?;
    if targets.is_empty() {
        eyre::bail!("no channels given; pass URLs or --channels-file");
    }

    let config = args.config();
    tracing::info!(
        channels = targets.len(),
        concurrency = config.concurrency_per_channel,
        max_videos = config.max_videos_per_channel,
        client_version = %config.client.version,
        "starting harvest"
    );

    let client = InnertubeClient::new(&config).context("set up HTTP client")?;
    let harvester = Harvester::new(client, config);
    let dataset = harvester.harvest(&targets).await;

    let json = serde_json::to_string_pretty(&dataset).context("serialize dataset")?;
    tokio::fs::write(&args.output, json)
        .await
        .with_context(|| format!("write {}", args.output.display()))?;

    for summary in dataset.channel_summaries() {
        tracing::info!(
            channel = %summary.channel_name,
            videos = summary.videos,
            views = summary.views,
            likes = summary.likes,
            comments = summary.comments,
            average_views = summary.average_views,
            subscribers = summary.subscribers,
            "channel summary"
        );
    }
    tracing::info!(
        videos = dataset.total_videos,
        channels = dataset.total_channels,
        engagement_rate = %format!("{:.2}%", dataset.engagement_rate()),
        output = %args.output.display(),
        "harvest complete"
    );
    Ok(())
}
