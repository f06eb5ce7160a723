// src/popup/controller.rs
use std::time::Duration;

use chrono::Utc;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use super::view::PopupView;
use crate::core::config_manager::RelayConfig;
use crate::core::job_store::JobStore;
use crate::core::service_client::DeliveryClient;
use crate::error::{PopupError, RelayError, ScrapeError};
use crate::relay::background::is_job_page;
use crate::relay::content::AgentHandle;
use crate::relay::messages::ContentRequest;
use crate::relay::tab::Tab;
use crate::types::job::JobRecord;
use crate::types::response::DeliveryReceipt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupSettings {
    pub min_description_len: usize,
    pub scrape_timeout: Duration,
    /// Wait after injecting the agent before talking to it.
    pub inject_settle: Duration,
    pub ping_timeout: Duration,
}

impl PopupSettings {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            min_description_len: config.min_description_len,
            scrape_timeout: config.timings.scrape_timeout(),
            inject_settle: config.timings.inject_settle(),
            ping_timeout: config.timings.ping_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Delivered(DeliveryReceipt),
    Scraped(JobRecord),
}

/// Owns the persisted job slot and drives scrape and delivery.
pub struct PopupController {
    store: JobStore,
    delivery: DeliveryClient,
    settings: PopupSettings,
    view: PopupView,
}

impl PopupController {
    pub fn new(store: JobStore, delivery: DeliveryClient, settings: PopupSettings) -> Self {
        Self {
            store,
            delivery,
            settings,
            view: PopupView::default(),
        }
    }

    pub fn view(&self) -> &PopupView {
        &self.view
    }

    /// Renders the view from whatever is persisted.
    pub async fn open(&mut self) -> Result<&PopupView, PopupError> {
        let saved = self.store.load().await?;
        self.view = PopupView::from_saved(saved.as_ref());
        Ok(&self.view)
    }

    pub fn toggle_details(&mut self) -> bool {
        self.view.toggle_details()
    }

    /// The popup button: deliver the saved job if there is one, scrape otherwise.
    pub async fn activate(&mut self, tab: &Tab) -> Result<Activation, PopupError> {
        self.view.begin("Preparing to scrape...");

        let saved = match self.store.load().await {
            Ok(saved) => saved,
            Err(e) => {
                self.view.fail(format!("Error: {}", e));
                return Err(e.into());
            }
        };

        match saved {
            Some(job) => self
                .deliver(&job, Some(tab))
                .await
                .map(Activation::Delivered),
            None => self.scrape(tab).await.map(Activation::Scraped),
        }
    }

    /// Sends the saved job without touching any page.
    pub async fn deliver_saved(&mut self) -> Result<DeliveryReceipt, PopupError> {
        self.view.begin("Sending saved job...");
        let saved = match self.store.load().await {
            Ok(saved) => saved,
            Err(e) => {
                self.view.fail(format!("Error: {}", e));
                return Err(e.into());
            }
        };

        match saved {
            Some(job) => self.deliver(&job, None).await,
            None => {
                self.view.fail("No saved job to send");
                Err(PopupError::NothingSaved)
            }
        }
    }

    async fn deliver(
        &mut self,
        job: &JobRecord,
        tab: Option<&Tab>,
    ) -> Result<DeliveryReceipt, PopupError> {
        info!("Sending saved job data: {}", job.title);
        match self.delivery.deliver(job).await {
            Ok(receipt) => {
                if let Err(e) = self.clear(tab).await {
                    warn!("Delivered to {} but could not clear saved job: {}", receipt.endpoint, e);
                }
                self.view.succeed(format!(
                    "Data sent successfully to {}! You can close this popup.",
                    receipt.endpoint
                ));
                Ok(receipt)
            }
            Err(e) => {
                error!("Error sending data: {}", e);
                self.view.fail(format!("Error sending data: {}", e));
                Err(e.into())
            }
        }
    }

    /// Scrapes the tab, validates and persists the record. Any failure
    /// empties the slot and leaves the popup ready to retry.
    pub async fn scrape(&mut self, tab: &Tab) -> Result<JobRecord, PopupError> {
        self.view.begin("Preparing to scrape...");
        match self.scrape_and_save(tab).await {
            Ok(job) => {
                self.view = PopupView::from_saved(Some(&job));
                self.view.succeed("Job details scraped successfully!");
                Ok(job)
            }
            Err(e) => {
                error!("Scraping error: {}", e);
                if let Err(clear_err) = self.clear(Some(tab)).await {
                    warn!("Could not clear saved job after failure: {}", clear_err);
                }
                self.view.fail(format!("Error: {}", e));
                Err(e)
            }
        }
    }

    async fn scrape_and_save(&mut self, tab: &Tab) -> Result<JobRecord, PopupError> {
        if !is_job_page(tab.url()) {
            return Err(PopupError::NavigationMismatch(tab.url().to_string()));
        }

        self.store.clear().await?;

        let agent = self.ensure_injected(tab).await;

        self.view.progress("Scraping job details...");
        info!("Sending scrape request");
        let response = timeout(
            self.settings.scrape_timeout,
            agent.request(ContentRequest::ScrapeJob),
        )
        .await
        .map_err(|_| ScrapeError::Timeout)??;

        let job = response.into_job()?;
        job.validate(self.settings.min_description_len)?;

        let job = job.captured_at(Utc::now());
        self.store.save(&job).await?;
        Ok(job)
    }

    /// Reuses a live agent, injecting one when the ping goes unanswered.
    async fn ensure_injected(&self, tab: &Tab) -> AgentHandle {
        if let Some(agent) = tab.agent() {
            if agent.ping(self.settings.ping_timeout).await {
                return agent.clone();
            }
        }

        let agent = tab.inject();
        sleep(self.settings.inject_settle).await;
        agent
    }

    /// Forgets the saved job and tells the page to drop its cached state.
    pub async fn clear(&mut self, tab: Option<&Tab>) -> Result<(), PopupError> {
        self.store.clear().await?;
        self.view = PopupView::from_saved(None);

        if let Some(agent) = tab.and_then(Tab::agent) {
            let notified = timeout(
                self.settings.ping_timeout,
                agent.request(ContentRequest::ClearJobData),
            )
            .await
            .unwrap_or(Err(RelayError::Timeout));
            if let Err(e) = notified {
                warn!("Error clearing content script data: {}", e);
            }
        }
        Ok(())
    }
}
