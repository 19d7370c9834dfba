use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, CompanyId, JobId, StatusParseError,
    TimelineEvent,
};
use crate::session::UserId;

/// Timeline event as carried on the wire. `status` is validated on adaptation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRecord {
    pub status: String,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Application as returned by the backing application service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: String,
    pub job_id: String,
    pub company_id: String,
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub timeline: Vec<TimelineRecord>,
}

/// Status-update feed entry addressed to one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEvent {
    pub application_id: String,
    #[serde(flatten)]
    pub event: TimelineRecord,
}

impl TryFrom<TimelineRecord> for TimelineEvent {
    type Error = StatusParseError;

    fn try_from(record: TimelineRecord) -> Result<Self, Self::Error> {
        Ok(TimelineEvent {
            status: record.status.parse()?,
            occurred_at: record.occurred_at,
            note: record.note,
        })
    }
}

impl From<&TimelineEvent> for TimelineRecord {
    fn from(event: &TimelineEvent) -> Self {
        TimelineRecord {
            status: event.status.as_str().to_string(),
            occurred_at: event.occurred_at,
            note: event.note.clone(),
        }
    }
}

impl TryFrom<ApplicationRecord> for Application {
    type Error = StatusParseError;

    /// Restores the timeline invariants on remote data: events are stable-sorted
    /// by time, an empty timeline is seeded from `applied_at`, and a closing
    /// event is added when the last event disagrees with the record status.
    fn try_from(record: ApplicationRecord) -> Result<Self, Self::Error> {
        let status: ApplicationStatus = record.status.parse()?;
        let mut timeline = record
            .timeline
            .into_iter()
            .map(TimelineEvent::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        timeline.sort_by_key(|event| event.occurred_at);

        if timeline.is_empty() {
            timeline.push(TimelineEvent::new(status, record.applied_at));
        }
        if let Some(last) = timeline.last() {
            if last.status != status {
                let closing_at = record.updated_at.max(last.occurred_at);
                timeline.push(TimelineEvent::new(status, closing_at));
            }
        }
        let updated_at = timeline
            .last()
            .map_or(record.updated_at, |last| last.occurred_at.max(record.updated_at));

        Ok(Application {
            id: ApplicationId(record.id),
            job_id: JobId(record.job_id),
            company_id: CompanyId(record.company_id),
            status,
            applied_at: record.applied_at,
            updated_at,
            timeline,
        })
    }
}

impl From<&Application> for ApplicationRecord {
    fn from(application: &Application) -> Self {
        ApplicationRecord {
            id: application.id.0.clone(),
            job_id: application.job_id.0.clone(),
            company_id: application.company_id.0.clone(),
            status: application.status.as_str().to_string(),
            applied_at: application.applied_at,
            updated_at: application.updated_at,
            timeline: application
                .timeline
                .iter()
                .map(TimelineRecord::from)
                .collect(),
        }
    }
}

/// Network boundary to the application service. Wire format is the adapter's concern.
#[async_trait]
pub trait ApplicationTransport: Send + Sync {
    async fn submit_application(
        &self,
        user: &UserId,
        job_id: &JobId,
    ) -> Result<ApplicationRecord, TransportError>;

    async fn list_applications(
        &self,
        user: &UserId,
    ) -> Result<Vec<ApplicationRecord>, TransportError>;

    async fn fetch_timeline(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<TimelineRecord>, TransportError>;

    async fn withdraw(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, TransportError>;
}

/// Transport failures. Retries are the caller's policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("application service unavailable: {0}")]
    Unavailable(String),
    #[error("application service rejected the request: {0}")]
    Rejected(String),
}
