use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::cdp::browser_protocol::target::CreateTargetParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserSection;

use super::driver::{DriverFactory, PageDriver, PageElement};
use super::error::{BrowserError, BrowserResult};
use super::selector::Selector;

const CLICKABLE_SCRIPT: &str = r#"function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    const visible = style.visibility !== 'hidden' && style.display !== 'none'
        && rect.width > 0 && rect.height > 0;
    return visible && !this.disabled;
}"#;

const SELECTED_SCRIPT: &str = "function() { return this.checked === true || this.selected === true; }";

#[derive(Debug, Clone)]
pub struct BrowserLauncher {
    config: Arc<BrowserSection>,
}

impl BrowserLauncher {
    pub fn new(config: BrowserSection) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub async fn launch(&self) -> BrowserResult<ChromiumDriver> {
        let headless = self.config.headless;
        let chromium_config = self.build_chromium_config(headless)?;
        info!(headless, "Launching Chromium instance");

        let (mut browser, mut handler) = Browser::launch(chromium_config)
            .await
            .map_err(|err| BrowserError::Launch(err.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "Chromium handler reported error");
                }
            }
        });

        let page = match browser.new_page(CreateTargetParams::new("about:blank")).await {
            Ok(page) => page,
            Err(err) => {
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "Failed to close browser after page error");
                }
                handler_task.abort();
                return Err(BrowserError::Launch(err.to_string()));
            }
        };

        Ok(ChromiumDriver {
            browser,
            page,
            handler_task: Some(handler_task),
        })
    }

    fn build_chromium_config(&self, headless: bool) -> BrowserResult<ChromiumConfig> {
        let mut builder = ChromiumConfig::builder();
        if let Some(path) = &self.config.executable_path {
            builder = builder.chrome_executable(path);
        }
        if !headless {
            builder = builder.with_head();
        }
        if !self.config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(timeout) = self.config.request_timeout_seconds {
            builder = builder.request_timeout(Duration::from_secs(timeout));
        }

        let mut args = vec!["--disable-dev-shm-usage".to_string()];
        if self.config.disable_gpu {
            args.push("--disable-gpu".into());
        }
        args.push("--no-first-run".into());
        builder = builder.args(args);

        builder.build().map_err(BrowserError::Configuration)
    }
}

#[async_trait(?Send)]
impl DriverFactory for BrowserLauncher {
    async fn create(&self) -> BrowserResult<Box<dyn PageDriver>> {
        let driver = self.launch().await?;
        Ok(Box::new(driver))
    }
}

#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler_task: Option<JoinHandle<()>>,
}

#[async_trait(?Send)]
impl PageDriver for ChromiumDriver {
    async fn open(&mut self, url: &str) -> BrowserResult<()> {
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(BrowserError::Configuration)?;
        self.page
            .goto(params)
            .await
            .map_err(|err| BrowserError::Navigation {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn current_url(&self) -> BrowserResult<Option<String>> {
        Ok(self.page.url().await?)
    }

    async fn find(&self, selector: &Selector) -> BrowserResult<Option<Box<dyn PageElement>>> {
        let mut elements = self.page.find_elements(selector.to_css()).await?;
        if elements.is_empty() {
            return Ok(None);
        }
        let element: Box<dyn PageElement> = Box::new(ChromiumElement {
            inner: elements.swap_remove(0),
        });
        Ok(Some(element))
    }

    async fn find_all(&self, selector: &Selector) -> BrowserResult<Vec<Box<dyn PageElement>>> {
        let elements = self.page.find_elements(selector.to_css()).await?;
        Ok(wrap_elements(elements))
    }

    async fn quit(&mut self) -> BrowserResult<()> {
        info!("Shutting down Chromium instance");
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "Failed to close browser gracefully");
        }
        if let Some(handle) = self.handler_task.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "Browser handler join error");
            }
        }
        Ok(())
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        if let Some(handle) = &self.handler_task {
            if !handle.is_finished() {
                warn!("ChromiumDriver dropped without explicit quit");
            }
        }
    }
}

struct ChromiumElement {
    inner: Element,
}

impl ChromiumElement {
    async fn eval_bool(&self, function: &str) -> BrowserResult<bool> {
        let returns = self.inner.call_js_fn(function, false).await?;
        Ok(returns
            .result
            .value
            .and_then(|value| value.as_bool())
            .unwrap_or(false))
    }
}

fn wrap_elements(elements: Vec<Element>) -> Vec<Box<dyn PageElement>> {
    elements
        .into_iter()
        .map(|inner| Box::new(ChromiumElement { inner }) as Box<dyn PageElement>)
        .collect()
}

#[async_trait(?Send)]
impl PageElement for ChromiumElement {
    async fn text(&self) -> BrowserResult<String> {
        Ok(self.inner.inner_text().await?.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> BrowserResult<Option<String>> {
        Ok(self.inner.attribute(name).await?)
    }

    async fn click(&self) -> BrowserResult<()> {
        self.inner.click().await?;
        Ok(())
    }

    async fn send_text(&self, value: &str) -> BrowserResult<()> {
        self.inner.focus().await?.type_str(value).await?;
        Ok(())
    }

    async fn is_selected(&self) -> BrowserResult<bool> {
        self.eval_bool(SELECTED_SCRIPT).await
    }

    async fn is_interactable(&self) -> BrowserResult<bool> {
        self.eval_bool(CLICKABLE_SCRIPT).await
    }

    async fn find_all(&self, selector: &Selector) -> BrowserResult<Vec<Box<dyn PageElement>>> {
        let elements = self.inner.find_elements(selector.to_css()).await?;
        Ok(wrap_elements(elements))
    }
}
