#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use efd_core::browser::{
    BrowserError, BrowserResult, DriverFactory, PageDriver, PageElement, Selector,
};
use efd_core::notify::{Notifier, NotifierError, NotifyResult};
use efd_core::scraper::{PipelineSettings, ReportRecord, ScrapePipeline};
use efd_core::store::{PersistResult, PersistenceError, ReportSink};
use efd_core::ScraperConfig;

pub const ENTRY_URL: &str = "https://efd.test/search/";
pub const CONSENT: &str = "#agree_statement";
pub const REPORT_TYPE: &str = "input.report_types[value=\"11\"]";
pub const DATE_INPUT: &str = "#fromDate";
pub const SUBMIT: &str = "button[type='submit']";
pub const RESULTS_BODY: &str = "#filedReports tbody";
pub const EMPTY_MARKER: &str = "#filedReports td.dataTables_empty";
pub const DETAIL_TABLE: &str = "table.table";

#[derive(Clone, Default)]
pub struct FakeNode {
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub interactable: bool,
    pub selected: Arc<AtomicBool>,
    pub clicks: Arc<AtomicUsize>,
    pub typed: Arc<Mutex<Vec<String>>>,
    pub children: HashMap<String, Vec<FakeNode>>,
}

impl FakeNode {
    pub fn control() -> Self {
        Self {
            interactable: true,
            ..Self::default()
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn link(href: &str) -> Self {
        let mut node = Self::default();
        node.attrs.insert("href".to_string(), href.to_string());
        node
    }

    pub fn with_children(mut self, selector: &str, children: Vec<FakeNode>) -> Self {
        self.children.insert(selector.to_string(), children);
        self
    }

    pub fn click_count(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }
}

#[async_trait(?Send)]
impl PageElement for FakeNode {
    async fn text(&self) -> BrowserResult<String> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> BrowserResult<Option<String>> {
        Ok(self.attrs.get(name).cloned())
    }

    async fn click(&self) -> BrowserResult<()> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        self.selected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_text(&self, value: &str) -> BrowserResult<()> {
        self.typed.lock().unwrap().push(value.to_string());
        Ok(())
    }

    async fn is_selected(&self) -> BrowserResult<bool> {
        Ok(self.selected.load(Ordering::SeqCst))
    }

    async fn is_interactable(&self) -> BrowserResult<bool> {
        Ok(self.interactable)
    }

    async fn find_all(&self, selector: &Selector) -> BrowserResult<Vec<Box<dyn PageElement>>> {
        Ok(self
            .children
            .get(&selector.to_css())
            .map(|nodes| boxed(nodes))
            .unwrap_or_default())
    }
}

fn boxed(nodes: &[FakeNode]) -> Vec<Box<dyn PageElement>> {
    nodes
        .iter()
        .cloned()
        .map(|node| Box::new(node) as Box<dyn PageElement>)
        .collect()
}

pub type FakePage = HashMap<String, Vec<FakeNode>>;

/// A scripted portal: every URL maps to the elements rendered there.
#[derive(Clone, Default)]
pub struct FakePortal {
    pub pages: HashMap<String, FakePage>,
    pub unreachable: HashSet<String>,
    pub opened: Arc<Mutex<Vec<String>>>,
    pub closes: Arc<AtomicUsize>,
    pub fail_launch: bool,
}

impl FakePortal {
    pub fn page(&mut self, url: &str) -> &mut FakePage {
        self.pages.entry(url.to_string()).or_default()
    }

    pub fn put(&mut self, url: &str, selector: &str, node: FakeNode) -> FakeNode {
        self.page(url)
            .entry(selector.to_string())
            .or_default()
            .push(node.clone());
        node
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct FakeDriver {
    portal: FakePortal,
    current: Option<String>,
}

impl FakeDriver {
    fn nodes(&self, selector: &Selector) -> Vec<FakeNode> {
        self.current
            .as_ref()
            .and_then(|url| self.portal.pages.get(url))
            .and_then(|page| page.get(&selector.to_css()))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait(?Send)]
impl PageDriver for FakeDriver {
    async fn open(&mut self, url: &str) -> BrowserResult<()> {
        self.portal.opened.lock().unwrap().push(url.to_string());
        if self.portal.unreachable.contains(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_REFUSED".to_string(),
            });
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> BrowserResult<Option<String>> {
        Ok(self.current.clone())
    }

    async fn find(&self, selector: &Selector) -> BrowserResult<Option<Box<dyn PageElement>>> {
        Ok(self
            .nodes(selector)
            .into_iter()
            .next()
            .map(|node| Box::new(node) as Box<dyn PageElement>))
    }

    async fn find_all(&self, selector: &Selector) -> BrowserResult<Vec<Box<dyn PageElement>>> {
        Ok(boxed(&self.nodes(selector)))
    }

    async fn quit(&mut self) -> BrowserResult<()> {
        self.portal.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeFactory {
    pub portal: FakePortal,
}

#[async_trait(?Send)]
impl DriverFactory for FakeFactory {
    async fn create(&self) -> BrowserResult<Box<dyn PageDriver>> {
        if self.portal.fail_launch {
            return Err(BrowserError::Launch("chrome not found".to_string()));
        }
        Ok(Box::new(FakeDriver {
            portal: self.portal.clone(),
            current: None,
        }))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub writes: Mutex<Vec<Vec<ReportRecord>>>,
    pub fail: bool,
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn write(
        &self,
        records: &[ReportRecord],
        suggested_name: Option<&str>,
    ) -> PersistResult<PathBuf> {
        if self.fail {
            return Err(PersistenceError::Io {
                path: PathBuf::from("reports"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.writes.lock().unwrap().push(records.to_vec());
        Ok(PathBuf::from(
            suggested_name.unwrap_or("reports/senate_reports_2026-10-16.json"),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentMessage>>,
    pub fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, body: &str, attachments: &[PathBuf]) -> NotifyResult<()> {
        self.sent.lock().unwrap().push(SentMessage {
            subject: subject.to_string(),
            body: body.to_string(),
            attachments: attachments.to_vec(),
        });
        if self.fail {
            return Err(NotifierError::Configuration("smtp unreachable".to_string()));
        }
        Ok(())
    }
}

/// Entry page with every search control ready and a results table whose
/// body holds `links`.
pub fn portal_with_results(links: &[&str]) -> FakePortal {
    let mut portal = FakePortal::default();
    portal.put(ENTRY_URL, CONSENT, FakeNode::control());
    portal.put(ENTRY_URL, REPORT_TYPE, FakeNode::control());
    portal.put(ENTRY_URL, DATE_INPUT, FakeNode::control());
    portal.put(ENTRY_URL, SUBMIT, FakeNode::control());
    let anchors = links.iter().map(|href| FakeNode::link(href)).collect();
    portal.put(
        ENTRY_URL,
        RESULTS_BODY,
        FakeNode::default().with_children("a", anchors),
    );
    portal
}

pub fn empty_portal() -> FakePortal {
    let mut portal = portal_with_results(&[]);
    portal.put(ENTRY_URL, EMPTY_MARKER, FakeNode::text("No data available in table"));
    portal
}

pub fn transaction_row(number: usize) -> FakeNode {
    let cells = [
        format!(" {number} "),
        "10/14/2026".to_string(),
        "Spouse".to_string(),
        "AAPL".to_string(),
        "Apple Inc.  ".to_string(),
        "Stock".to_string(),
        "Purchase".to_string(),
        "$1,001 - $15,000".to_string(),
        "--".to_string(),
    ]
    .iter()
    .map(|text| FakeNode::text(text))
    .collect();
    FakeNode::default().with_children("td", cells)
}

pub fn short_row(columns: usize) -> FakeNode {
    let cells = (0..columns).map(|_| FakeNode::text("x")).collect();
    FakeNode::default().with_children("td", cells)
}

/// Detail table: a header row followed by `rows`.
pub fn detail_table(rows: Vec<FakeNode>) -> FakeNode {
    let mut all = vec![FakeNode::default()];
    all.extend(rows);
    FakeNode::default().with_children("tr", all)
}

pub fn detail_url(path: &str) -> String {
    format!("https://efd.test{path}")
}

pub fn settings() -> PipelineSettings {
    let mut config = ScraperConfig::default();
    config.portal.base_url = ENTRY_URL.to_string();
    PipelineSettings::from_config(&config).unwrap()
}

pub struct Harness {
    pub portal: FakePortal,
    pub sink: Arc<RecordingSink>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(portal: FakePortal) -> Self {
        Self {
            portal,
            sink: Arc::new(RecordingSink::default()),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn pipeline(&self) -> ScrapePipeline {
        ScrapePipeline::new(
            settings(),
            Arc::new(FakeFactory {
                portal: self.portal.clone(),
            }),
            self.sink.clone() as Arc<dyn ReportSink>,
            Some(self.notifier.clone() as Arc<dyn Notifier>),
        )
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.notifier.sent.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.sink.writes.lock().unwrap().len()
    }
}
