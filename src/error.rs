use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Browser session error: {0}")]
    Render(#[from] RenderError),
    #[error("Failed to persist seen posts to {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode seen posts")]
    Encode(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Navigation failed: {0}")]
    Navigation(String),
    #[error("Page has no body element")]
    NotReady,
    #[error("{stage} timed out after {after:?}")]
    Timeout {
        stage: &'static str,
        after: Duration,
    },
    #[error("Empty page content")]
    EmptyPage,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Notification API error: {0}")]
    Api(String),
}
