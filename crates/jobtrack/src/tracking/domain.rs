use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::ApplicationStatusConfig;

/// Identifier wrapper for tracked applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Reference to a job posting owned by the listing service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Reference to the hiring company owned by the listing service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a job application, from submission to a terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    UnderReview,
    Shortlisted,
    InterviewScheduled,
    OfferExtended,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Submitted,
            Self::UnderReview,
            Self::Shortlisted,
            Self::InterviewScheduled,
            Self::OfferExtended,
            Self::Hired,
            Self::Rejected,
            Self::Withdrawn,
        ]
    }

    /// Wire name, as carried by transport payloads and query strings.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Shortlisted => "shortlisted",
            Self::InterviewScheduled => "interview_scheduled",
            Self::OfferExtended => "offer_extended",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub fn config(self) -> &'static ApplicationStatusConfig {
        ApplicationStatusConfig::for_status(self)
    }

    pub fn label(self) -> &'static str {
        self.config().label
    }

    pub fn is_terminal(self) -> bool {
        self.config().is_terminal
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a payload carries a status outside the configured enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status '{value}'")]
pub struct StatusParseError {
    pub value: String,
}

impl FromStr for ApplicationStatus {
    type Err = StatusParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| StatusParseError {
                value: value.to_string(),
            })
    }
}

/// A timestamped record of an application's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub status: ApplicationStatus,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TimelineEvent {
    pub fn new(status: ApplicationStatus, occurred_at: DateTime<Utc>) -> Self {
        Self {
            status,
            occurred_at,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A user's submission for one job and its ordered status history.
///
/// `timeline` is non-decreasing in `occurred_at` and its last event always
/// carries the current `status`. Only the tracker appends events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub company_id: CompanyId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub timeline: Vec<TimelineEvent>,
}

/// Why an event could not be appended to a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimelineRejection {
    Terminal(ApplicationStatus),
    OutOfOrder {
        occurred_at: DateTime<Utc>,
        last_occurred_at: DateTime<Utc>,
    },
}

impl Application {
    /// A freshly submitted application with a single `submitted` event.
    pub fn submitted(
        id: ApplicationId,
        job_id: JobId,
        company_id: CompanyId,
        applied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            job_id,
            company_id,
            status: ApplicationStatus::Submitted,
            applied_at,
            updated_at: applied_at,
            timeline: vec![TimelineEvent::new(ApplicationStatus::Submitted, applied_at)],
        }
    }

    pub fn last_event(&self) -> Option<&TimelineEvent> {
        self.timeline.last()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_withdrawn(&self) -> bool {
        self.status == ApplicationStatus::Withdrawn
    }

    /// Appends an event verbatim. Equal timestamps are accepted in arrival order.
    pub(crate) fn append(&mut self, event: TimelineEvent) -> Result<(), TimelineRejection> {
        if self.status.is_terminal() {
            return Err(TimelineRejection::Terminal(self.status));
        }
        if let Some(last) = self.timeline.last() {
            if event.occurred_at < last.occurred_at {
                return Err(TimelineRejection::OutOfOrder {
                    occurred_at: event.occurred_at,
                    last_occurred_at: last.occurred_at,
                });
            }
        }

        self.status = event.status;
        self.updated_at = event.occurred_at;
        self.timeline.push(event);
        Ok(())
    }
}

/// Optional narrowing applied to snapshot queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub statuses: Vec<ApplicationStatus>,
    pub applied_from: Option<DateTime<Utc>>,
    pub applied_to: Option<DateTime<Utc>>,
}

impl ApplicationFilter {
    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    pub fn applied_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.applied_from = from;
        self.applied_to = to;
        self
    }

    /// Date bounds are inclusive and compared against `applied_at`.
    pub fn matches(&self, application: &Application) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&application.status) {
            return false;
        }
        if let Some(from) = self.applied_from {
            if application.applied_at < from {
                return false;
            }
        }
        if let Some(to) = self.applied_to {
            if application.applied_at > to {
                return false;
            }
        }
        true
    }
}
