//! Browser backends that turn a URL into rendered page markup.
//!
//! A [`Renderer`] opens one [`RenderSession`] per fetch cycle. Sessions are
//! never reused, and each one is opened with a fresh [`SessionProfile`].

#[cfg(feature = "chromium")]
pub mod chromium;
mod http;

pub use http::HttpRenderer;

use crate::error::RenderError;
use rand::seq::SliceRandom;
use rand::Rng;

const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// Identifying parameters of a browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProfile {
    pub user_agent: String,
    pub width: u32,
    pub height: u32,
}

impl SessionProfile {
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        SessionProfile {
            user_agent: USER_AGENTS
                .choose(&mut rng)
                .unwrap_or(&USER_AGENTS[0])
                .to_string(),
            width: rng.gen_range(1024..=1920),
            height: rng.gen_range(768..=1080),
        }
    }
}

#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a new session. The caller must close it.
    async fn open(&self, profile: &SessionProfile) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// One browser session. Timeouts are enforced by the caller.
#[async_trait::async_trait]
pub trait RenderSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError>;
    /// Resolves once the document body is present.
    async fn wait_ready(&mut self) -> Result<(), RenderError>;
    async fn content(&mut self) -> Result<String, RenderError>;
    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}
