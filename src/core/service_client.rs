// src/core/service_client.rs
//! Delivery of a scraped job to the job platform's HTTP endpoints.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::DeliveryError;
use crate::types::job::{DeliveryPayload, JobRecord};
use crate::types::response::DeliveryReceipt;

pub const DEFAULT_ENDPOINTS: [&str; 3] = [
    "http://localhost:3000/api/job-data",
    "https://ai-job-platform-frontend-189284322477.europe-west2.run.app/api/job-data",
    "https://job-ai-platform.vercel.app/api/job-data",
];

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct DeliveryClient {
    client: reqwest::Client,
    endpoints: Vec<String>,
}

impl DeliveryClient {
    /// Endpoints are tried in the given order.
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DeliveryError::Client)?;

        Ok(Self { client, endpoints })
    }

    pub fn with_defaults() -> Result<Self, DeliveryError> {
        Self::new(
            DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Posts `job` to each endpoint in turn and stops at the first 2xx.
    pub async fn deliver(&self, job: &JobRecord) -> Result<DeliveryReceipt, DeliveryError> {
        if self.endpoints.is_empty() {
            return Err(DeliveryError::NoEndpoints);
        }

        let payload = job.payload();
        let mut attempts = Vec::with_capacity(self.endpoints.len());
        let mut last_error = String::new();

        for endpoint in &self.endpoints {
            attempts.push(endpoint.clone());
            match self.post_job(endpoint, &payload).await {
                Ok(()) => {
                    info!("Successfully sent data to {}", endpoint);
                    return Ok(DeliveryReceipt {
                        endpoint: endpoint.clone(),
                        attempts,
                    });
                }
                Err(e) => {
                    warn!("Error with endpoint {}: {}", endpoint, e);
                    last_error = e.to_string();
                }
            }
        }

        error!("All {} endpoints failed", attempts.len());
        Err(DeliveryError::AllEndpointsFailed {
            last_error,
            attempts,
        })
    }

    async fn post_job(
        &self,
        endpoint: &str,
        payload: &DeliveryPayload<'_>,
    ) -> Result<(), DeliveryError> {
        info!("Sending job data to {}", endpoint);

        let response = self
            .client
            .post(endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|source| DeliveryError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            if !body.is_empty() {
                warn!("{} answered {}: {}", endpoint, status, body);
            }
            Err(DeliveryError::Status {
                endpoint: endpoint.to_string(),
                status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job() -> JobRecord {
        JobRecord::new(
            "Engineer",
            "Acme",
            "Build the delivery pipeline.",
            "https://www.linkedin.com/jobs/view/1",
        )
        .captured_at(chrono::Utc::now())
    }

    fn client(endpoints: Vec<String>) -> DeliveryClient {
        DeliveryClient::new(endpoints, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn stops_at_first_successful_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/b"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "title": "Engineer",
                "company": "Acme",
                "description": "Build the delivery pipeline.",
                "link": "https://www.linkedin.com/jobs/view/1",
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/c"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let a = format!("{}/a", server.uri());
        let b = format!("{}/b", server.uri());
        let c = format!("{}/c", server.uri());
        let receipt = client(vec![a.clone(), b.clone(), c]).deliver(&job()).await.unwrap();

        assert_eq!(receipt.endpoint, b);
        assert_eq!(receipt.attempts, vec![a, b]);
    }

    #[tokio::test]
    async fn exhausted_list_reports_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let first = format!("{}/first", server.uri());
        let second = format!("{}/second", server.uri());
        let err = client(vec![first, second.clone()])
            .deliver(&job())
            .await
            .unwrap_err();

        match err {
            DeliveryError::AllEndpointsFailed {
                last_error,
                attempts,
            } => {
                assert_eq!(attempts.len(), 2);
                assert!(last_error.contains(&second));
                assert!(last_error.contains("503"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_falls_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let reachable = format!("{}/ok", server.uri());
        let receipt = client(vec!["http://127.0.0.1:9/closed".to_string(), reachable.clone()])
            .deliver(&job())
            .await
            .unwrap();

        assert_eq!(receipt.endpoint, reachable);
    }

    #[tokio::test]
    async fn empty_endpoint_list_is_rejected() {
        let err = client(Vec::new()).deliver(&job()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::NoEndpoints));
    }
}
