//! Chromium-based renderer using chromiumoxide.

use super::{LaunchProfile, NavigationResult, RenderContext, RenderError, RenderResult, Renderer};
use crate::scripts;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const NETWORK_POLL_MS: u64 = 250;
/// Consecutive polls with an unchanged resource count before the network
/// counts as idle.
const QUIET_POLLS: u32 = 2;

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. SCOUT_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("SCOUT_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.review-scout/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = [
            home.join(".review-scout/chromium/chrome-linux64/chrome"),
            home.join(".review-scout/chromium/chrome"),
        ];
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches one headless Chromium process per context.
pub struct ChromiumRenderer {
    executable: PathBuf,
}

impl ChromiumRenderer {
    /// Resolve the Chromium binary, preferring `explicit` when given.
    pub fn new(explicit: Option<PathBuf>) -> RenderResult<Self> {
        let executable = explicit
            .filter(|p| p.exists())
            .or_else(find_chromium)
            .ok_or_else(|| {
                RenderError::Unavailable("Chromium not found; set SCOUT_CHROMIUM_PATH".to_string())
            })?;
        Ok(Self { executable })
    }

    pub fn executable(&self) -> &PathBuf {
        &self.executable
    }

    fn browser_config(&self, profile: &LaunchProfile) -> RenderResult<BrowserConfig> {
        let executable = profile.chromium_path.clone().unwrap_or_else(|| self.executable.clone());
        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .viewport(Viewport {
                width: profile.viewport_width,
                height: profile.viewport_height,
                device_scale_factor: Some(1.0),
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .window_size(profile.viewport_width, profile.viewport_height)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run");
        if profile.ignore_certificate_errors {
            builder = builder.arg("--ignore-certificate-errors");
        }
        builder
            .build()
            .map_err(|e| RenderError::Launch(format!("failed to build browser config: {e}")))
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn launch(&self, profile: &LaunchProfile) -> RenderResult<Box<dyn RenderContext>> {
        let config = self.browser_config(profile)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(format!("failed to launch Chromium: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("browser handler event error: {e}");
                }
            }
        });

        tracing::debug!(executable = %self.executable.display(), "launched Chromium");
        Ok(Box::new(ChromiumContext {
            browser,
            handler,
            page: None,
        }))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

#[derive(Deserialize)]
struct NetworkState {
    ready: bool,
    resources: u64,
}

/// A launched Chromium process with one page.
pub struct ChromiumContext {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
}

impl ChromiumContext {
    fn page(&self) -> RenderResult<&Page> {
        self.page.as_ref().ok_or(RenderError::NoPage)
    }

    async fn evaluate(page: &Page, script: &str) -> RenderResult<serde_json::Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(RenderError::Script)?;
        let result = page
            .evaluate_expression(params)
            .await
            .map_err(|e| RenderError::Script(format!("JS execution failed: {e}")))?;
        result
            .into_value()
            .map_err(|e| RenderError::Script(format!("failed to convert JS result: {e:?}")))
    }

    /// Poll until the document is complete and no new resources appear.
    async fn wait_for_network_idle(page: &Page) {
        let probe = scripts::network_state();
        let mut last = None;
        let mut quiet = 0;
        loop {
            let state = Self::evaluate(page, probe.source())
                .await
                .ok()
                .and_then(|v| serde_json::from_value::<NetworkState>(v).ok());
            match state {
                Some(s) if s.ready && last == Some(s.resources) => {
                    quiet += 1;
                    if quiet >= QUIET_POLLS {
                        return;
                    }
                }
                Some(s) => {
                    quiet = 0;
                    last = Some(s.resources);
                }
                None => {
                    quiet = 0;
                    last = None;
                }
            }
            tokio::time::sleep(Duration::from_millis(NETWORK_POLL_MS)).await;
        }
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn open_page(&mut self, user_agent: &str) -> RenderResult<()> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Launch(format!("failed to create new page: {e}")))?;
        page.set_user_agent(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(|e| RenderError::Launch(format!("failed to set user agent: {e}")))?;
        self.page = Some(page);
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> RenderResult<NavigationResult> {
        let page = self.page()?;
        let start = Instant::now();

        let load = async {
            page.goto(url)
                .await
                .map_err(|e| RenderError::Navigation(format!("navigation failed: {e}")))?;
            Self::wait_for_network_idle(page).await;
            Ok::<_, RenderError>(())
        };
        match tokio::time::timeout(Duration::from_millis(timeout_ms), load).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(RenderError::NavigationTimeout { timeout_ms }),
        }

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(NavigationResult {
            final_url,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn execute_js(&self, script: &str) -> RenderResult<serde_json::Value> {
        Self::evaluate(self.page()?, script).await
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        let ChromiumContext {
            mut browser,
            handler,
            page,
        } = *self;
        if let Some(page) = page {
            let _ = page.close().await;
        }
        let result = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| RenderError::Launch(format!("failed to close browser: {e}")));
        let _ = browser.wait().await;
        handler.abort();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_path_falls_back_to_discovery() {
        let missing = PathBuf::from("/nonexistent/review-scout/chrome");
        match ChromiumRenderer::new(Some(missing.clone())) {
            Ok(renderer) => assert_ne!(renderer.executable(), &missing),
            Err(e) => assert!(matches!(e, RenderError::Unavailable(_))),
        }
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_navigate_and_execute_js() {
        let renderer = ChromiumRenderer::new(None).expect("Chromium not found");
        let mut ctx = renderer
            .launch(&LaunchProfile::default())
            .await
            .expect("failed to launch");
        ctx.open_page(super::super::DEFAULT_USER_AGENT)
            .await
            .expect("failed to open page");

        let nav = ctx
            .navigate("data:text/html,<h1>Hello</h1><p>World</p>", 10_000)
            .await
            .expect("navigation failed");
        assert!(nav.final_url.starts_with("data:"));

        let title = ctx
            .execute_js("document.querySelector('h1').textContent")
            .await
            .expect("JS failed");
        assert_eq!(title, serde_json::json!("Hello"));

        ctx.close().await.expect("close failed");
    }
}
