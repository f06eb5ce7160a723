// src/relay/messages.rs
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::types::job::JobRecord;
use crate::types::response::ContentResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(Uuid);

impl TabId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.0.simple().to_string();
        f.write_str(&id[..8])
    }
}

/// Requests the page side answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContentRequest {
    ScrapeJob,
    Ping,
    ClearJobData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Answered before the listener reads the next request.
    Immediate,
    /// Answered from a spawned task; the listener keeps serving meanwhile.
    Deferred,
}

impl ContentRequest {
    pub fn reply_mode(&self) -> ReplyMode {
        match self {
            ContentRequest::ScrapeJob => ReplyMode::Deferred,
            ContentRequest::Ping | ContentRequest::ClearJobData => ReplyMode::Immediate,
        }
    }
}

/// A request paired with its reply slot.
#[derive(Debug)]
pub struct Envelope {
    pub request: ContentRequest,
    pub reply: oneshot::Sender<ContentResponse>,
}

/// Events the page side pushes to the background service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentEvent {
    ContentReady,
    ContentLog {
        message: String,
    },
    JobDataUpdate {
        #[serde(rename = "jobData")]
        job_data: JobRecord,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabEvent {
    pub tab: TabId,
    pub event: ContentEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_use_action_tags() {
        let request: ContentRequest =
            serde_json::from_value(serde_json::json!({ "action": "scrapeJob" })).unwrap();
        assert_eq!(request, ContentRequest::ScrapeJob);
        assert_eq!(
            serde_json::to_value(ContentRequest::ClearJobData).unwrap(),
            serde_json::json!({ "action": "clearJobData" })
        );
    }

    #[test]
    fn only_scrape_is_deferred() {
        assert_eq!(ContentRequest::ScrapeJob.reply_mode(), ReplyMode::Deferred);
        assert_eq!(ContentRequest::Ping.reply_mode(), ReplyMode::Immediate);
        assert_eq!(ContentRequest::ClearJobData.reply_mode(), ReplyMode::Immediate);
    }

    #[test]
    fn events_use_type_tags() {
        let event = ContentEvent::ContentLog {
            message: "hello".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({ "type": "CONTENT_LOG", "message": "hello" })
        );

        let update = ContentEvent::JobDataUpdate {
            job_data: JobRecord::new("t", "c", "d", "l"),
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["type"], "JOB_DATA_UPDATE");
        assert_eq!(value["jobData"]["title"], "t");
    }

    #[test]
    fn tab_id_displays_short_form() {
        assert_eq!(TabId::new().to_string().len(), 8);
    }
}
