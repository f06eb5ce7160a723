// src/core/job_store.rs
//! The single persisted job slot.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fs_ops::FsOps;
use crate::error::StoreError;
use crate::types::job::JobRecord;

/// Storage key of the record; stable across releases.
pub const SAVED_JOB_KEY: &str = "savedJob";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(rename = "savedJob", default, skip_serializing_if = "Option::is_none")]
    saved_job: Option<JobRecord>,
}

#[derive(Debug, Clone)]
pub struct JobStore {
    path: PathBuf,
}

impl JobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved record; `None` means no job is ready to deliver.
    pub async fn load(&self) -> Result<Option<JobRecord>, StoreError> {
        let Some(content) = FsOps::read_if_exists(&self.path).await? else {
            return Ok(None);
        };
        let document: StoreDocument = serde_json::from_str(&content)?;
        Ok(document.saved_job)
    }

    /// Replaces whatever was saved before.
    pub async fn save(&self, job: &JobRecord) -> Result<(), StoreError> {
        let document = StoreDocument {
            saved_job: Some(job.clone()),
        };
        let content = serde_json::to_string_pretty(&document)?;
        FsOps::write_atomic(&self.path, &content).await?;
        debug!("Saved job '{}' under {}", job.title, SAVED_JOB_KEY);
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        FsOps::remove_if_exists(&self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job(title: &str) -> JobRecord {
        JobRecord::new(title, "Acme", "A description", "https://www.linkedin.com/jobs/view/1")
            .captured_at(Utc::now())
    }

    #[tokio::test]
    async fn empty_store_has_no_job() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path().join("storage.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_replaces_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path().join("storage.json"));

        store.save(&job("First")).await.unwrap();
        let second = job("Second");
        store.save(&second).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn record_lives_under_stable_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path().join("storage.json"));
        store.save(&job("Keyed")).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[SAVED_JOB_KEY]["title"], "Keyed");
        assert!(value[SAVED_JOB_KEY]["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn clear_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path().join("storage.json"));
        store.save(&job("Gone")).await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JobStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
