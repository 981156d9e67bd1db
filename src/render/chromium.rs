//! Headless Chromium backend, enabled with the `chromium` feature.

use super::{RenderSession, Renderer, SessionProfile};
use crate::error::RenderError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const READY_POLL: Duration = Duration::from_millis(250);

/// Launches a fresh browser process for every session.
#[derive(Debug, Default)]
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
}

impl ChromiumRenderer {
    pub fn new(executable: Option<PathBuf>) -> Self {
        ChromiumRenderer { executable }
    }
}

#[async_trait::async_trait]
impl Renderer for ChromiumRenderer {
    async fn open(&self, profile: &SessionProfile) -> Result<Box<dyn RenderSession>, RenderError> {
        let mut builder = BrowserConfig::builder()
            .window_size(profile.width, profile.height)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", profile.user_agent));
        if let Some(executable) = &self.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(RenderError::Launch(e.to_string()));
            }
        };

        debug!(
            "Launched Chromium {}x{} as {}",
            profile.width, profile.height, profile.user_agent
        );
        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler,
        }))
    }
}

struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

#[async_trait::async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn wait_ready(&mut self) -> Result<(), RenderError> {
        while self.page.find_element("body").await.is_err() {
            tokio::time::sleep(READY_POLL).await;
        }
        Ok(())
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.page
            .content()
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        let mut session = *self;
        let closed = session.browser.close().await;
        if let Err(e) = session.browser.wait().await {
            warn!("Chromium did not exit cleanly: {}", e);
        }
        session.handler.abort();
        closed
            .map(|_| ())
            .map_err(|e| RenderError::Launch(e.to_string()))
    }
}
