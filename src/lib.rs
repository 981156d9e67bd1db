pub mod config;
pub mod cycle;
pub mod extract;
pub mod keywords;
pub mod ledger;
pub mod monitor;
pub mod notify;
pub mod render;

mod error;
mod snapshot;

pub use config::{Args, MonitorConfig, RendererKind};
pub use cycle::{CycleOutcome, CycleReport, CycleSettings, FetchCycle};
pub use error::{MonitorError, NotifyError, RenderError};
pub use extract::{extract, Extraction};
pub use keywords::KeywordSet;
pub use ledger::SeenPosts;
pub use monitor::{LoopTiming, Monitor, MonitorState};
pub use notify::{NotificationChannel, Notifier, TelegramChannel};
pub use render::{HttpRenderer, RenderSession, Renderer, SessionProfile};

/// A post found on the listing page.
///
/// `id` is the href exactly as the page wrote it and identifies the post across
/// fetches; `link` is that href made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub link: String,
}
