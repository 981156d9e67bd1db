#![allow(dead_code)]

use forum_monitor::{
    CycleSettings, FetchCycle, KeywordSet, NotificationChannel, Notifier, NotifyError,
    RenderError, RenderSession, Renderer, SessionProfile,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const BASE_URL: &str = "https://forum.example.com/";

pub fn listing(items: &[(&str, &str)]) -> String {
    let items = items
        .iter()
        .map(|(href, title)| {
            format!(
                r#"<li class="post-list-item"><div class="post-title"><a href="{}">{}</a></div></li>"#,
                href, title
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "<html><head><title>Latest</title></head><body><ul>{}</ul></body></html>",
        items
    )
}

#[derive(Clone)]
pub enum Page {
    Markup(String),
    /// Navigation never completes.
    Hang,
    /// Navigation succeeds but the body never shows up.
    NeverReady(String),
}

/// Serves a fixed page and counts sessions.
#[derive(Clone)]
pub struct FakeRenderer {
    pub page: Arc<Mutex<Page>>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    /// Number of upcoming `open` calls that fail.
    pub failing_opens: Arc<AtomicUsize>,
    /// Cancels the token when the n-th session is opened.
    pub cancel_on_open: Option<(usize, CancellationToken)>,
}

impl FakeRenderer {
    pub fn new(page: Page) -> Self {
        FakeRenderer {
            page: Arc::new(Mutex::new(page)),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            failing_opens: Arc::new(AtomicUsize::new(0)),
            cancel_on_open: None,
        }
    }

    pub fn set_page(&self, page: Page) {
        *self.page.lock().unwrap() = page;
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Renderer for FakeRenderer {
    async fn open(&self, _profile: &SessionProfile) -> Result<Box<dyn RenderSession>, RenderError> {
        let pending_failures = self.failing_opens.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.failing_opens.store(pending_failures - 1, Ordering::SeqCst);
            return Err(RenderError::Launch("browser crashed".to_string()));
        }

        let n = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, cancel)) = &self.cancel_on_open {
            if *at == n {
                cancel.cancel();
            }
        }

        Ok(Box::new(FakeSession {
            page: self.page.lock().unwrap().clone(),
            loaded: None,
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct FakeSession {
    page: Page,
    loaded: Option<String>,
    closed: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl RenderSession for FakeSession {
    async fn navigate(&mut self, _url: &str) -> Result<(), RenderError> {
        match &self.page {
            Page::Markup(markup) => {
                self.loaded = Some(markup.clone());
                Ok(())
            }
            Page::NeverReady(markup) => {
                self.loaded = Some(markup.clone());
                Ok(())
            }
            Page::Hang => std::future::pending().await,
        }
    }

    async fn wait_ready(&mut self) -> Result<(), RenderError> {
        match self.page {
            Page::NeverReady(_) => std::future::pending().await,
            _ => Ok(()),
        }
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        Ok(self.loaded.take().unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Records every message it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub attempts: Arc<AtomicUsize>,
    pub failing: Arc<AtomicBool>,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, destination: &str, message: &str) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Api("Too Many Requests".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.to_string()));
        Ok(())
    }
}

pub fn settings() -> CycleSettings {
    CycleSettings {
        target_url: BASE_URL.to_string(),
        navigation_timeout: Duration::from_millis(200),
        ready_timeout: Duration::from_millis(200),
        dwell_min: Duration::ZERO,
        dwell_max: Duration::ZERO,
        snapshot_dir: None,
    }
}

pub fn fetch_cycle(
    renderer: &FakeRenderer,
    channel: &RecordingChannel,
    keywords: &str,
) -> FetchCycle<RecordingChannel> {
    FetchCycle::new(
        Box::new(renderer.clone()),
        Notifier::new(channel.clone(), "chat-1"),
        KeywordSet::parse(keywords),
        settings(),
    )
}
