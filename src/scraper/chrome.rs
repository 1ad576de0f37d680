use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::app::{Result, TrackerError};
use crate::scraper::config::ScraperConfig;
use crate::scraper::session::{Session, SessionFactory};

/// Launches a fresh Chrome process per session
pub struct ChromeLauncher {
    config: ScraperConfig,
}

impl ChromeLauncher {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for ChromeLauncher {
    async fn open(&self) -> Result<Box<dyn Session>> {
        let session = ChromeSession::launch(&self.config).await?;
        Ok(Box::new(session))
    }
}

/// Chrome-backed session using chromiumoxide
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
    user_agent: Option<String>,
}

impl ChromeSession {
    /// Launch a browser process with the given configuration
    pub async fn launch(config: &ScraperConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .window_size(config.window_width, config.window_height);

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(|e| TrackerError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            TrackerError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Drive the CDP connection until the browser goes away
        let handler = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        info!("Chrome session started");

        Ok(Self {
            browser,
            handler,
            page: None,
            user_agent: config.user_agent.clone(),
        })
    }

    async fn page(&mut self) -> Result<&Page> {
        if self.page.is_none() {
            let page = self
                .browser
                .new_page("about:blank")
                .await
                .map_err(|e| TrackerError::Browser(format!("Failed to create page: {}", e)))?;

            if let Some(ref ua) = self.user_agent {
                page.set_user_agent(ua)
                    .await
                    .map_err(|e| TrackerError::Browser(format!("Failed to set user agent: {}", e)))?;
            }

            self.page = Some(page);
        }

        self.page
            .as_ref()
            .ok_or_else(|| TrackerError::Browser("Page unavailable".to_string()))
    }

    fn current(&self) -> Option<&Page> {
        self.page.as_ref()
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        let page = self.page().await?;
        page.goto(url).await.map_err(|e| TrackerError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn ready_state(&self) -> Result<String> {
        let page = self
            .current()
            .ok_or_else(|| TrackerError::Browser("No page loaded".to_string()))?;

        page.evaluate("document.readyState")
            .await
            .map_err(|e| TrackerError::Browser(format!("Script execution failed: {}", e)))?
            .into_value::<String>()
            .map_err(|e| TrackerError::Browser(format!("Failed to parse result: {:?}", e)))
    }

    async fn text(&self, selector: &str) -> Option<String> {
        let element = self.current()?.find_element(selector).await.ok()?;
        element.inner_text().await.ok().flatten()
    }

    async fn texts(&self, selector: &str) -> Vec<String> {
        let Some(page) = self.current() else {
            return Vec::new();
        };
        let Ok(elements) = page.find_elements(selector).await else {
            return Vec::new();
        };

        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            if let Ok(Some(text)) = element.inner_text().await {
                texts.push(text);
            }
        }
        texts
    }

    async fn attribute(&self, selector: &str, name: &str) -> Option<String> {
        let element = self.current()?.find_element(selector).await.ok()?;
        element.attribute(name).await.ok().flatten()
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut this = *self;

        if let Some(page) = this.page.take() {
            let _ = page.close().await;
        }

        this.browser
            .close()
            .await
            .map_err(|e| TrackerError::Browser(format!("Failed to close browser: {}", e)))?;
        let _ = this.browser.wait().await;
        this.handler.abort();

        debug!("Chrome session closed");
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // The Browser's own Drop kills a still-running child process
        self.handler.abort();
    }
}
