use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tracing::{info, warn};

use crate::config::{PanelConfig, SelectorsConfig};

const LOGIN_FIELD_TIMEOUT: Duration = Duration::from_secs(30);
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Browser-driven view of the panel. The monitor loop is written
/// against this trait; the production implementation drives a headless
/// Chrome page.
#[async_trait]
pub trait Panel {
    /// Navigate to the panel and submit the login form.
    async fn login(&mut self) -> Result<()>;
    /// Read the text of every currently rendered message row. Failures
    /// reading a single row are logged and that row is skipped; an
    /// error here means the row query itself failed.
    async fn poll_messages(&mut self) -> Result<Vec<String>>;
    /// Reload the panel view.
    async fn reload(&mut self) -> Result<()>;
}

pub struct PanelSession {
    _browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    page: Page,
    panel: PanelConfig,
    selectors: SelectorsConfig,
}

impl Drop for PanelSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

impl PanelSession {
    /// Launch a fresh headless browser and open a blank page.
    pub async fn launch(panel: PanelConfig, selectors: SelectorsConfig) -> Result<Self> {
        info!("Launching headless browser...");

        let config = BrowserConfig::builder()
            .window_size(1280, 800)
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to configure browser: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;

        info!("Browser initialized");

        Ok(Self {
            _browser: browser,
            handler_task,
            page,
            panel,
            selectors,
        })
    }

    /// Poll for a selector until it appears or the timeout elapses.
    /// Chromiumoxide has no built-in waitForSelector equivalent.
    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(e) => {
                    if Instant::now() >= deadline {
                        return Err(e).with_context(|| {
                            format!("Timed out waiting for selector: {selector}")
                        });
                    }
                }
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl Panel for PanelSession {
    async fn login(&mut self) -> Result<()> {
        info!("Logging into panel...");

        self.page
            .goto(&self.panel.base_url)
            .await
            .with_context(|| format!("Failed to open panel at {}", self.panel.base_url))?;

        let username_field = self
            .wait_for_element(&self.selectors.login_username, LOGIN_FIELD_TIMEOUT)
            .await?;
        username_field
            .click()
            .await
            .context("Failed to focus username field")?;
        username_field
            .type_str(&self.panel.username)
            .await
            .context("Failed to type username")?;

        let password_field = self
            .page
            .find_element(&self.selectors.login_password)
            .await
            .context("Password field not found")?;
        password_field
            .click()
            .await
            .context("Failed to focus password field")?;
        password_field
            .type_str(&self.panel.password)
            .await
            .context("Failed to type password")?;

        self.page
            .find_element(&self.selectors.login_submit)
            .await
            .context("Login button not found")?
            .click()
            .await
            .context("Failed to click login button")?;

        self.page
            .wait_for_navigation()
            .await
            .context("Navigation after login did not complete")?;

        info!("Login successful");
        Ok(())
    }

    async fn poll_messages(&mut self) -> Result<Vec<String>> {
        let rows = self
            .page
            .find_elements(&self.selectors.message_rows)
            .await
            .context("Failed to query message rows")?;

        let mut texts = Vec::with_capacity(rows.len());
        for row in rows {
            // Rows without a text sub-element are skipped outright.
            let text_element = match row.find_element(&self.selectors.message_text).await {
                Ok(element) => element,
                Err(_) => continue,
            };
            match text_element.inner_text().await {
                Ok(Some(text)) => {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        texts.push(text);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to read message text: {e:#}"),
            }
        }
        Ok(texts)
    }

    async fn reload(&mut self) -> Result<()> {
        self.page
            .reload()
            .await
            .context("Failed to reload panel page")?;
        Ok(())
    }
}
