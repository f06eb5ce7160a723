// src/popup/view.rs
use std::fmt;

use crate::types::job::JobRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Neutral,
    Success,
    Error,
}

/// Everything the popup shows, as plain state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub button_label: String,
    pub button_enabled: bool,
    pub status: String,
    pub status_kind: StatusKind,
    pub saved: Option<JobRecord>,
    pub details_visible: bool,
}

impl Default for PopupView {
    fn default() -> Self {
        Self::from_saved(None)
    }
}

impl PopupView {
    pub fn from_saved(saved: Option<&JobRecord>) -> Self {
        match saved {
            Some(job) => Self {
                button_label: "Paste Job".to_string(),
                button_enabled: true,
                status: "Job details ready to paste! Click \"Paste Job\" in the Jobs AI app to continue."
                    .to_string(),
                status_kind: StatusKind::Success,
                saved: Some(job.clone()),
                details_visible: false,
            },
            None => Self {
                button_label: "Get Job Details".to_string(),
                button_enabled: true,
                status: "Ready to scrape job details".to_string(),
                status_kind: StatusKind::Neutral,
                saved: None,
                details_visible: false,
            },
        }
    }

    /// Disables the button while work is in progress.
    pub fn begin(&mut self, status: impl Into<String>) {
        self.button_enabled = false;
        self.progress(status);
    }

    pub fn progress(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.status_kind = StatusKind::Neutral;
    }

    pub fn succeed(&mut self, status: impl Into<String>) {
        self.button_enabled = true;
        self.status = status.into();
        self.status_kind = StatusKind::Success;
    }

    /// Shows the error and leaves the controls ready for a retry.
    pub fn fail(&mut self, status: impl Into<String>) {
        self.button_enabled = true;
        self.status = status.into();
        self.status_kind = StatusKind::Error;
    }

    pub fn toggle_details(&mut self) -> bool {
        if self.saved.is_some() {
            self.details_visible = !self.details_visible;
        }
        self.details_visible
    }
}

impl fmt::Display for PopupView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.status_kind {
            StatusKind::Neutral => "",
            StatusKind::Success => "✓ ",
            StatusKind::Error => "✗ ",
        };
        writeln!(f, "{}{}", marker, self.status)?;

        if let Some(job) = &self.saved {
            writeln!(f)?;
            writeln!(f, "Currently Saved Job:")?;
            writeln!(f, "  {}", job.title)?;
            writeln!(f, "  {}", job.company)?;
            if self.details_visible {
                writeln!(f)?;
                writeln!(f, "Job Description:")?;
                writeln!(f, "{}", job.description)?;
                writeln!(f)?;
                writeln!(f, "Link: {}", job.link)?;
            }
        }

        write!(f, "[{}]", self.button_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobRecord {
        JobRecord::new("Engineer", "Acme", "The description", "https://www.linkedin.com/jobs/view/1")
    }

    #[test]
    fn saved_job_offers_paste() {
        let view = PopupView::from_saved(Some(&job()));
        assert_eq!(view.button_label, "Paste Job");
        assert_eq!(view.status_kind, StatusKind::Success);
    }

    #[test]
    fn empty_store_offers_scrape() {
        let view = PopupView::default();
        assert_eq!(view.button_label, "Get Job Details");
        assert_eq!(view.status, "Ready to scrape job details");
    }

    #[test]
    fn failure_reenables_button() {
        let mut view = PopupView::default();
        view.begin("Preparing to scrape...");
        assert!(!view.button_enabled);

        view.fail("Error: boom");
        assert!(view.button_enabled);
        assert_eq!(view.status_kind, StatusKind::Error);
    }

    #[test]
    fn details_toggle_only_with_saved_job() {
        let mut empty = PopupView::default();
        assert!(!empty.toggle_details());

        let mut view = PopupView::from_saved(Some(&job()));
        assert!(view.toggle_details());
        assert!(view.to_string().contains("The description"));
        assert!(!view.toggle_details());
        assert!(!view.to_string().contains("The description"));
    }
}
