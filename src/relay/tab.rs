// src/relay/tab.rs
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use super::content::{AgentHandle, ContentAgent, InstallSlot};
use super::messages::{ContentRequest, TabEvent, TabId};
use crate::error::RelayError;
use crate::scraping::orchestrator::ScrapeOrchestrator;
use crate::types::response::ContentResponse;

/// One open page the popup can target, with at most one injected agent.
pub struct Tab {
    id: TabId,
    orchestrator: Arc<ScrapeOrchestrator>,
    slot: InstallSlot,
    events: mpsc::UnboundedSender<TabEvent>,
}

impl Tab {
    pub fn new(orchestrator: ScrapeOrchestrator, events: mpsc::UnboundedSender<TabEvent>) -> Self {
        Self {
            id: TabId::new(),
            orchestrator: Arc::new(orchestrator),
            slot: InstallSlot::default(),
            events,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn url(&self) -> &str {
        self.orchestrator.page().url()
    }

    pub fn agent(&self) -> Option<&AgentHandle> {
        self.slot.get()
    }

    /// Injects the content agent. Safe to call repeatedly.
    pub fn inject(&self) -> AgentHandle {
        info!("Injecting content agent into tab {}", self.id);
        ContentAgent::install(
            &self.slot,
            self.id,
            Arc::clone(&self.orchestrator),
            self.events.clone(),
        )
    }

    pub async fn send(&self, request: ContentRequest) -> Result<ContentResponse, RelayError> {
        self.agent()
            .ok_or(RelayError::NotInjected)?
            .request(request)
            .await
    }
}
