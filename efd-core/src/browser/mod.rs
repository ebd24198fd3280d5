mod automation;
mod driver;
mod error;
mod metrics;
mod selector;
mod session;

pub use automation::{BrowserLauncher, ChromiumDriver};
pub use driver::{DriverFactory, PageDriver, PageElement};
pub use error::{BrowserError, BrowserResult};
pub use metrics::SessionMetrics;
pub use selector::Selector;
pub use session::{BrowserSession, WaitCondition};
