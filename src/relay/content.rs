// src/relay/content.rs
//! The page-side agent: answers requests, forwards logs and publishes scraped records.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info};

use super::messages::{ContentEvent, ContentRequest, Envelope, ReplyMode, TabEvent, TabId};
use crate::error::RelayError;
use crate::scraping::orchestrator::ScrapeOrchestrator;
use crate::types::job::JobRecord;
use crate::types::response::ContentResponse;

const REQUEST_QUEUE: usize = 16;

/// Sender side of an installed agent.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    tab: TabId,
    requests: mpsc::Sender<Envelope>,
}

impl AgentHandle {
    pub fn tab(&self) -> TabId {
        self.tab
    }

    pub async fn request(&self, request: ContentRequest) -> Result<ContentResponse, RelayError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Envelope { request, reply })
            .await
            .map_err(|_| RelayError::ChannelClosed)?;
        response.await.map_err(|_| RelayError::ChannelClosed)
    }

    /// Liveness probe bounded by `wait`.
    pub async fn ping(&self, wait: Duration) -> bool {
        match timeout(wait, self.request(ContentRequest::Ping)).await {
            Ok(Ok(response)) => response.success,
            Ok(Err(e)) => {
                debug!("Ping failed: {}", e);
                false
            }
            Err(_) => false,
        }
    }
}

/// Per-page guard that makes installation idempotent.
#[derive(Debug, Default)]
pub struct InstallSlot(OnceLock<AgentHandle>);

impl InstallSlot {
    pub fn get(&self) -> Option<&AgentHandle> {
        self.0.get()
    }
}

pub struct ContentAgent {
    tab: TabId,
    orchestrator: Arc<ScrapeOrchestrator>,
    events: mpsc::UnboundedSender<TabEvent>,
    last_sent: Mutex<Option<JobRecord>>,
}

impl ContentAgent {
    /// Installs the agent for a page unless one is already installed, and
    /// returns its handle. Only the first installation registers a listener
    /// and announces readiness. Must be called inside a Tokio runtime.
    pub fn install(
        slot: &InstallSlot,
        tab: TabId,
        orchestrator: Arc<ScrapeOrchestrator>,
        events: mpsc::UnboundedSender<TabEvent>,
    ) -> AgentHandle {
        if let Some(handle) = slot.get() {
            debug!("Content agent already installed in tab {}", tab);
            return handle.clone();
        }

        slot.0
            .get_or_init(|| {
                let agent = Arc::new(Self {
                    tab,
                    orchestrator,
                    events,
                    last_sent: Mutex::new(None),
                });
                let (requests, inbox) = mpsc::channel(REQUEST_QUEUE);

                tokio::spawn(Arc::clone(&agent).listen(inbox));
                agent.emit(ContentEvent::ContentReady);
                info!("Content agent loaded and ready in tab {}", tab);

                AgentHandle { tab, requests }
            })
            .clone()
    }

    async fn listen(self: Arc<Self>, mut inbox: mpsc::Receiver<Envelope>) {
        while let Some(Envelope { request, reply }) = inbox.recv().await {
            debug!("Received message: {:?}", request);
            match request.reply_mode() {
                ReplyMode::Immediate => {
                    let response = self.respond(request).await;
                    if reply.send(response).is_err() {
                        debug!("Requester went away before the reply");
                    }
                }
                ReplyMode::Deferred => {
                    let agent = Arc::clone(&self);
                    tokio::spawn(async move {
                        let response = agent.respond(request).await;
                        if reply.send(response).is_err() {
                            debug!("Requester went away before the scrape finished");
                        }
                    });
                }
            }
        }
        debug!("Content agent in tab {} stopped", self.tab);
    }

    async fn respond(&self, request: ContentRequest) -> ContentResponse {
        match request {
            ContentRequest::Ping => ContentResponse::with_message("Content script is loaded"),
            ContentRequest::ClearJobData => {
                self.reset();
                ContentResponse::with_message("Job data cleared")
            }
            ContentRequest::ScrapeJob => match self.orchestrator.scrape().await {
                Ok(job) => {
                    self.log(format!("Job info scraped successfully: {}", job.title));
                    self.publish(&job);
                    ContentResponse::with_data(job)
                }
                Err(e) => {
                    error!("Error scraping job info: {}", e);
                    self.log(format!("Error scraping job info: {}", e));
                    ContentResponse::failure(e.to_string())
                }
            },
        }
    }

    /// Sends a `JobDataUpdate` unless `job` equals the previous one sent.
    /// Returns whether an event went out.
    pub fn publish(&self, job: &JobRecord) -> bool {
        let mut last = self.last_sent.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_ref() == Some(job) {
            debug!("Suppressing duplicate job data update");
            return false;
        }
        *last = Some(job.clone());
        drop(last);

        self.emit(ContentEvent::JobDataUpdate {
            job_data: job.clone(),
        });
        true
    }

    /// Forgets the last published record.
    pub fn reset(&self) {
        *self.last_sent.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Forwards a log line to the background service as is.
    pub fn log(&self, message: impl Into<String>) {
        self.emit(ContentEvent::ContentLog {
            message: message.into(),
        });
    }

    fn emit(&self, event: ContentEvent) {
        if self
            .events
            .send(TabEvent {
                tab: self.tab,
                event,
            })
            .is_err()
        {
            debug!("Background service gone, dropping event");
        }
    }
}
