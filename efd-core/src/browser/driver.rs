use async_trait::async_trait;

use super::error::BrowserResult;
use super::selector::Selector;

/// A handle to one element on the currently loaded page.
#[async_trait(?Send)]
pub trait PageElement {
    async fn text(&self) -> BrowserResult<String>;
    async fn attribute(&self, name: &str) -> BrowserResult<Option<String>>;
    async fn click(&self) -> BrowserResult<()>;
    async fn send_text(&self, value: &str) -> BrowserResult<()>;
    async fn is_selected(&self) -> BrowserResult<bool>;
    /// Visible and enabled, so a click would land on it.
    async fn is_interactable(&self) -> BrowserResult<bool>;
    async fn find_all(&self, selector: &Selector) -> BrowserResult<Vec<Box<dyn PageElement>>>;
}

/// The low-level page capability the session is built on.
#[async_trait(?Send)]
pub trait PageDriver {
    async fn open(&mut self, url: &str) -> BrowserResult<()>;
    async fn current_url(&self) -> BrowserResult<Option<String>>;
    async fn find(&self, selector: &Selector) -> BrowserResult<Option<Box<dyn PageElement>>>;
    async fn find_all(&self, selector: &Selector) -> BrowserResult<Vec<Box<dyn PageElement>>>;
    async fn quit(&mut self) -> BrowserResult<()>;
}

#[async_trait(?Send)]
pub trait DriverFactory: Send + Sync {
    async fn create(&self) -> BrowserResult<Box<dyn PageDriver>>;
}
