use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::types::job::JobRecord;

// ===== Content agent replies =====

/// Reply shape shared by every request the page side answers:
/// `{success:true, data}` / `{success:true, message}` / `{success:false, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JobRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContentResponse {
    pub fn with_data(job: JobRecord) -> Self {
        Self {
            success: true,
            data: Some(job),
            message: None,
            error: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }

    /// Unwraps a scrape reply into its record.
    pub fn into_job(self) -> Result<JobRecord, RelayError> {
        if !self.success {
            return Err(RelayError::Remote(
                self.error
                    .unwrap_or_else(|| "Failed to scrape job details".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| RelayError::Remote("Failed to scrape job details".to_string()))
    }
}

// ===== Delivery =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Endpoint that accepted the record.
    pub endpoint: String,
    /// Every endpoint tried, in order, the accepting one last.
    pub attempts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_reply_serializes_without_data() {
        let value = serde_json::to_value(ContentResponse::failure("boom")).unwrap();
        assert_eq!(value, serde_json::json!({ "success": false, "error": "boom" }));
    }

    #[test]
    fn failed_reply_surfaces_remote_error() {
        let err = ContentResponse::failure("no description").into_job().unwrap_err();
        assert_eq!(err, RelayError::Remote("no description".to_string()));
    }

    #[test]
    fn successful_reply_without_data_is_an_error() {
        assert!(ContentResponse::with_message("pong").into_job().is_err());
    }
}
