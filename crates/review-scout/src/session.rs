//! Browser session lifecycle for one scrape request.
//!
//! `Uninitialized → Launched → PageOpen → Navigated → (Closed | Failed)`.
//! [`BrowserSession::close`] consumes the session, so it runs at most once;
//! the orchestrator calls it on every exit path.

use crate::error::{ScrapeError, ScrapeResult};
use crate::renderer::{LaunchProfile, NavigationResult, RenderContext, RenderError, Renderer};
use std::sync::Arc;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Launched,
    PageOpen,
    Navigated,
    Failed,
    Closed,
}

/// One browser process and one page, owned by a single request.
pub struct BrowserSession {
    renderer: Arc<dyn Renderer>,
    context: Option<Box<dyn RenderContext>>,
    state: SessionState,
}

impl BrowserSession {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            renderer,
            context: None,
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Start the browser and open a page with the profile's user-agent.
    pub async fn launch(&mut self, profile: &LaunchProfile) -> ScrapeResult<()> {
        if self.state != SessionState::Uninitialized {
            return Err(ScrapeError::Session(format!(
                "cannot launch from {:?}",
                self.state
            )));
        }

        let context = match self.renderer.launch(profile).await {
            Ok(context) => context,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(e.into());
            }
        };
        tracing::debug!(renderer = self.renderer.name(), "browser launched");
        self.state = SessionState::Launched;
        let context = self.context.insert(context);

        if let Err(e) = context.open_page(&profile.user_agent).await {
            self.state = SessionState::Failed;
            return Err(ScrapeError::Launch(format!("failed to open page: {e}")));
        }
        self.state = SessionState::PageOpen;
        Ok(())
    }

    /// Navigate the open page, waiting for network quiescence.
    pub async fn navigate(&mut self, url: &str, timeout_ms: u64) -> ScrapeResult<NavigationResult> {
        let ready = matches!(self.state, SessionState::PageOpen | SessionState::Navigated);
        let (true, Some(context)) = (ready, self.context.as_mut()) else {
            return Err(ScrapeError::Session(format!(
                "cannot navigate from {:?}",
                self.state
            )));
        };

        match context.navigate(url, timeout_ms).await {
            Ok(result) => {
                self.state = SessionState::Navigated;
                tracing::debug!(url, load_time_ms = result.load_time_ms, "navigation settled");
                Ok(result)
            }
            Err(RenderError::NavigationTimeout { timeout_ms }) => {
                self.state = SessionState::Failed;
                Err(ScrapeError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms,
                })
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(ScrapeError::Navigation(e.to_string()))
            }
        }
    }

    /// The navigated page.
    pub fn page(&self) -> ScrapeResult<&dyn RenderContext> {
        match (&self.context, self.state) {
            (Some(context), SessionState::Navigated) => Ok(context.as_ref()),
            _ => Err(ScrapeError::Session(format!(
                "no navigated page in {:?}",
                self.state
            ))),
        }
    }

    /// Tear down the page and browser. Close failures are logged only.
    pub async fn close(mut self) {
        if let Some(context) = self.context.take() {
            if let Err(e) = context.close().await {
                tracing::warn!("failed to close browser session: {e}");
            }
        }
        self.state = SessionState::Closed;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.context.is_some() {
            tracing::warn!(state = ?self.state, "browser session dropped without close");
        }
    }
}
