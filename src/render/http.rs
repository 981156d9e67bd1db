use super::{RenderSession, Renderer, SessionProfile};
use crate::error::RenderError;
use tracing::debug;

/// Fetches pages over plain HTTP.
///
/// Scripts are not executed and there is no viewport, so this only suits
/// listings rendered on the server. Only the profile's user agent is applied.
#[derive(Debug, Default)]
pub struct HttpRenderer;

#[async_trait::async_trait]
impl Renderer for HttpRenderer {
    async fn open(&self, profile: &SessionProfile) -> Result<Box<dyn RenderSession>, RenderError> {
        let client = reqwest::Client::builder()
            .user_agent(profile.user_agent.as_str())
            .build()?;
        debug!("Opened HTTP session as {}", profile.user_agent);

        Ok(Box::new(HttpSession { client, body: None }))
    }
}

struct HttpSession {
    client: reqwest::Client,
    body: Option<String>,
}

#[async_trait::async_trait]
impl RenderSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(RenderError::Navigation(format!(
                "{} returned {}",
                url,
                res.status()
            )));
        }
        self.body = Some(res.text().await?);
        Ok(())
    }

    async fn wait_ready(&mut self) -> Result<(), RenderError> {
        match &self.body {
            Some(body) if body.to_ascii_lowercase().contains("<body") => Ok(()),
            _ => Err(RenderError::NotReady),
        }
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        Ok(self.body.take().unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        Ok(())
    }
}
