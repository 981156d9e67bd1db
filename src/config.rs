use crate::cycle::CycleSettings;
use crate::error::MonitorError;
use crate::keywords::KeywordSet;
use crate::monitor::LoopTiming;
use clap::{Parser, ValueEnum};
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

const INTERVAL_JITTER: Duration = Duration::from_secs(10);
const FAILURE_COOLDOWN: Duration = Duration::from_secs(60);
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const READY_TIMEOUT: Duration = Duration::from_secs(10);
const DWELL_MIN: Duration = Duration::from_secs(1);
const DWELL_MAX: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererKind {
    /// Plain HTTP fetch, no script execution. Server-rendered pages only.
    Http,
    /// Headless Chromium.
    #[cfg(feature = "chromium")]
    Chromium,
}

#[cfg(feature = "chromium")]
const DEFAULT_RENDERER: RendererKind = RendererKind::Chromium;
#[cfg(not(feature = "chromium"))]
const DEFAULT_RENDERER: RendererKind = RendererKind::Http;

/// Watches a forum listing page and sends a Telegram message for new posts
/// whose title contains one of the keywords.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Telegram chat receiving the alerts
    #[arg(long, env = "CHAT_ID")]
    pub chat_id: String,

    /// Comma separated keywords, matched case-insensitively
    #[arg(long, env = "KEYWORDS")]
    pub keywords: String,

    /// Seconds between checks
    #[arg(long, env = "CHECK_INTERVAL", default_value_t = 300)]
    pub check_interval: u64,

    /// Listing page to watch
    #[arg(long, env = "TARGET_URL")]
    pub target_url: String,

    /// File recording the posts already notified
    #[arg(long, env = "SEEN_POSTS_FILE", default_value = "seen_posts.json")]
    pub seen_posts_file: PathBuf,

    #[arg(long, env = "RENDERER", value_enum, default_value_t = DEFAULT_RENDERER)]
    pub renderer: RendererKind,

    /// Chromium executable, searched for when unset
    #[cfg(feature = "chromium")]
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Directory receiving a copy of every fetched page
    #[arg(long, env = "SNAPSHOT_DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// Log file written next to the console output, empty to disable
    #[arg(long, env = "LOG_FILE", default_value = "monitor.log")]
    pub log_file: PathBuf,
}

/// Settings fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub target_url: String,
    pub keywords: KeywordSet,
    pub destination: String,
    pub seen_posts_file: PathBuf,
    pub snapshot_dir: Option<PathBuf>,
    pub interval: Duration,
    pub jitter: Duration,
    pub cooldown: Duration,
    pub navigation_timeout: Duration,
    pub ready_timeout: Duration,
    pub dwell_min: Duration,
    pub dwell_max: Duration,
}

impl MonitorConfig {
    pub fn from_args(args: &Args) -> Result<MonitorConfig, MonitorError> {
        let url = Url::parse(args.target_url.trim())
            .map_err(|e| MonitorError::Config(format!("TARGET_URL {:?}: {}", args.target_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MonitorError::Config(format!(
                "TARGET_URL must be http or https, got {}",
                url.scheme()
            )));
        }
        if args.chat_id.trim().is_empty() {
            return Err(MonitorError::Config("CHAT_ID is empty".to_string()));
        }

        Ok(MonitorConfig {
            target_url: url.to_string(),
            keywords: KeywordSet::parse(&args.keywords),
            destination: args.chat_id.trim().to_string(),
            seen_posts_file: args.seen_posts_file.clone(),
            snapshot_dir: args.snapshot_dir.clone(),
            interval: Duration::from_secs(args.check_interval),
            jitter: INTERVAL_JITTER,
            cooldown: FAILURE_COOLDOWN,
            navigation_timeout: NAVIGATION_TIMEOUT,
            ready_timeout: READY_TIMEOUT,
            dwell_min: DWELL_MIN,
            dwell_max: DWELL_MAX,
        })
    }

    pub fn cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            target_url: self.target_url.clone(),
            navigation_timeout: self.navigation_timeout,
            ready_timeout: self.ready_timeout,
            dwell_min: self.dwell_min,
            dwell_max: self.dwell_max,
            snapshot_dir: self.snapshot_dir.clone(),
        }
    }

    pub fn loop_timing(&self) -> LoopTiming {
        LoopTiming {
            interval: self.interval,
            jitter: self.jitter,
            cooldown: self.cooldown,
        }
    }
}
