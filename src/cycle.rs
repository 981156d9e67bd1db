use crate::error::{MonitorError, RenderError};
use crate::extract::extract;
use crate::keywords::KeywordSet;
use crate::ledger::SeenPosts;
use crate::notify::{NotificationChannel, Notifier};
use crate::render::{RenderSession, Renderer, SessionProfile};
use crate::snapshot::save_snapshot;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub target_url: String,
    pub navigation_timeout: Duration,
    pub ready_timeout: Duration,
    /// Bounds of the pause between page readiness and reading the markup.
    pub dwell_min: Duration,
    pub dwell_max: Duration,
    pub snapshot_dir: Option<PathBuf>,
}

/// Counts of what one completed cycle did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Size of the rendered markup, `None` when the fetch failed.
    pub page_bytes: Option<usize>,
    pub extracted: usize,
    pub matched: usize,
    pub notified: usize,
    pub failed: usize,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page_bytes {
            Some(bytes) => write!(f, "page {} bytes", bytes)?,
            None => write!(f, "page unavailable")?,
        }
        write!(
            f,
            ", extracted {}, matched {}, notified {}, failed {}",
            self.extracted, self.matched, self.notified, self.failed
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Cancellation arrived mid-cycle; the remaining posts were not processed.
    Cancelled,
}

/// One fetch, parse, filter and notify pass over the target page.
pub struct FetchCycle<C> {
    renderer: Box<dyn Renderer>,
    notifier: Notifier<C>,
    keywords: KeywordSet,
    settings: CycleSettings,
}

impl<C: NotificationChannel> FetchCycle<C> {
    pub fn new(
        renderer: Box<dyn Renderer>,
        notifier: Notifier<C>,
        keywords: KeywordSet,
        settings: CycleSettings,
    ) -> Self {
        FetchCycle {
            renderer,
            notifier,
            keywords,
            settings,
        }
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// Runs one cycle. The browser session is closed on every path once opened.
    ///
    /// Fetch problems end the cycle early with an empty report. Failing to open
    /// a session or to persist the ledger is returned as an error.
    pub async fn run(
        &self,
        seen: &mut SeenPosts,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome, MonitorError> {
        info!("Checking {}", self.settings.target_url);

        let profile = SessionProfile::random();
        let mut session = self.renderer.open(&profile).await?;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(CycleOutcome::Cancelled),
            res = self.process(session.as_mut(), seen) => res.map(CycleOutcome::Completed),
        };

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {}", e);
        }
        debug!("Browser session closed");

        outcome
    }

    async fn process(
        &self,
        session: &mut dyn RenderSession,
        seen: &mut SeenPosts,
    ) -> Result<CycleReport, MonitorError> {
        let url = self.settings.target_url.as_str();
        let mut report = CycleReport::default();

        let html = match self.fetch(session).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                return Ok(report);
            }
        };
        info!("Fetched page, length: {} bytes", html.len());
        report.page_bytes = Some(html.len());

        if let Some(dir) = &self.settings.snapshot_dir {
            save_snapshot(dir, url, &html);
        }

        let extraction = extract(&html, url);
        let posts = extraction.posts();
        info!(
            "Found {} posts ({} strategy)",
            posts.len(),
            extraction.strategy()
        );
        report.extracted = posts.len();

        let mut failed = HashSet::new();
        for post in posts {
            if seen.contains(&post.id) || failed.contains(post.id.as_str()) {
                continue;
            }
            let matched = self.keywords.matched(&post.title);
            if matched.is_empty() {
                continue;
            }

            report.matched += 1;
            info!("Matched keywords [{}]: {}", matched.join(", "), post.title);

            match self.notifier.notify(post).await {
                Ok(()) => {
                    seen.record_and_persist(&post.id)?;
                    report.notified += 1;
                }
                Err(e) => {
                    failed.insert(post.id.as_str());
                    report.failed += 1;
                    error!("Failed to send notification for {}: {}", post.id, e);
                }
            }
        }

        Ok(report)
    }

    async fn fetch(&self, session: &mut dyn RenderSession) -> Result<String, RenderError> {
        let settings = &self.settings;

        timeout(settings.navigation_timeout, session.navigate(&settings.target_url))
            .await
            .map_err(|_| RenderError::Timeout {
                stage: "Navigation",
                after: settings.navigation_timeout,
            })??;

        timeout(settings.ready_timeout, session.wait_ready())
            .await
            .map_err(|_| RenderError::Timeout {
                stage: "Waiting for page body",
                after: settings.ready_timeout,
            })??;

        tokio::time::sleep(self.dwell()).await;

        let html = session.content().await?;
        if html.trim().is_empty() {
            return Err(RenderError::EmptyPage);
        }
        Ok(html)
    }

    fn dwell(&self) -> Duration {
        let (min, max) = (self.settings.dwell_min, self.settings.dwell_max);
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}
