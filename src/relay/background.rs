// src/relay/background.rs
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use url::Url;

use super::messages::{ContentEvent, ContentRequest, TabEvent, TabId};
use super::tab::Tab;
use crate::error::RelayError;
use crate::types::job::JobRecord;
use crate::types::response::ContentResponse;

const JOB_PATH_PREFIXES: [&str; 2] = ["/jobs/", "/job/"];

/// How often the watcher re-checks the active tab.
pub const WATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Whether `url` is a LinkedIn job page (a single posting or a job search
/// with a detail pane).
pub fn is_job_page(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let host_matches = parsed
        .host_str()
        .is_some_and(|host| host == "linkedin.com" || host.ends_with(".linkedin.com"));

    parsed.scheme() == "https"
        && host_matches
        && JOB_PATH_PREFIXES
            .iter()
            .any(|prefix| parsed.path().starts_with(prefix))
}

/// Tabs whose agent announced itself, shared with the tab watcher.
#[derive(Debug, Clone, Default)]
pub struct ReadyTabs(Arc<Mutex<HashSet<TabId>>>);

impl ReadyTabs {
    pub fn contains(&self, tab: TabId) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&tab)
    }

    fn insert(&self, tab: TabId) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tab);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabCheck {
    NotJobPage,
    AlreadyInjected,
    Injected,
}

/// One watcher pass: inject the agent into a job page that has not
/// reported ready yet.
pub fn check_tab(tab: &Tab, ready: &ReadyTabs) -> TabCheck {
    if !is_job_page(tab.url()) {
        debug!("Not on a LinkedIn job page, skipping check");
        return TabCheck::NotJobPage;
    }
    debug!("Checking content agent on job page: {}", tab.url());
    if ready.contains(tab.id()) {
        debug!("Content agent already injected in tab {}", tab.id());
        return TabCheck::AlreadyInjected;
    }
    tab.inject();
    TabCheck::Injected
}

/// Re-checks `tab` every `period` for as long as the task lives.
pub async fn watch(tab: Arc<Tab>, ready: ReadyTabs, period: Duration) {
    let mut ticks = interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        check_tab(&tab, &ready);
    }
}

/// Asks the tab's agent for a scrape and logs the outcome, as a toolbar
/// click does.
pub async fn trigger_scrape(tab: &Tab) -> Result<ContentResponse, RelayError> {
    info!("Scrape triggered for tab {}", tab.id());
    match tab.send(ContentRequest::ScrapeJob).await {
        Ok(response) => {
            match (&response.data, &response.error) {
                (Some(job), _) if response.success => info!("Job data received: {}", job.title),
                (_, error_message) => error!(
                    "Error scraping job data: {}",
                    error_message.as_deref().unwrap_or("Unknown error")
                ),
            }
            Ok(response)
        }
        Err(e) => {
            error!("Error sending message to content agent: {}", e);
            Err(e)
        }
    }
}

/// Log sink and readiness tracker for every tab's content agent.
#[derive(Debug, Default)]
pub struct BackgroundService {
    ready_tabs: ReadyTabs,
    last_update: Option<JobRecord>,
    updates_received: usize,
}

impl BackgroundService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes events until every sender is dropped, then hands the final
    /// state back.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<TabEvent>) -> Self {
        info!("Background service loaded and ready");
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        debug!("Background service stopped");
        self
    }

    pub fn handle_event(&mut self, TabEvent { tab, event }: TabEvent) {
        match event {
            ContentEvent::ContentReady => {
                self.ready_tabs.insert(tab);
                info!("[Tab {}] Content script ready", tab);
            }
            ContentEvent::ContentLog { message } => {
                info!("[Tab {}] {}", tab, message);
            }
            ContentEvent::JobDataUpdate { job_data } => {
                info!("[Tab {}] Job data update received: {}", tab, job_data.title);
                match serde_json::to_string_pretty(&job_data) {
                    Ok(pretty) => debug!("{}", pretty),
                    Err(e) => warn!("Could not render job data: {}", e),
                }
                info!("Data ready to be sent to app");
                self.updates_received += 1;
                self.last_update = Some(job_data);
            }
        }
    }

    pub fn is_ready(&self, tab: TabId) -> bool {
        self.ready_tabs.contains(tab)
    }

    /// Readiness view for a [`watch`] task; stays live while `run` consumes
    /// the service.
    pub fn ready_tabs(&self) -> ReadyTabs {
        self.ready_tabs.clone()
    }

    pub fn updates_received(&self) -> usize {
        self.updates_received
    }

    pub fn last_update(&self) -> Option<&JobRecord> {
        self.last_update.as_ref()
    }

    /// Answers a message from the companion web application.
    pub fn handle_external(&self, message: &Value) -> ContentResponse {
        debug!("Received external message: {}", message);
        match message.get("action").and_then(Value::as_str) {
            Some("ping") => ContentResponse::with_message("Extension is active"),
            other => {
                warn!("Unknown action received: {:?}", other);
                ContentResponse::failure("Unknown action")
            }
        }
    }
}
