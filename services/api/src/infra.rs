use async_trait::async_trait;
use jobtrack::clock::Clock;
use jobtrack::error::AppError;
use jobtrack::profile::{cv_from_value, CvData, ProfileError, ProfileSource};
use jobtrack::session::UserId;
use jobtrack::tracking::{
    Application, ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationTransport,
    CompanyId, JobId, NotificationError, NotificationKind, NotificationSink, TimelineEvent,
    TimelineRecord, TransportError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local stand-in for the remote application service.
pub(crate) struct InMemoryApplicationTransport {
    clock: Arc<dyn Clock>,
    sequence: AtomicU64,
    records: Mutex<HashMap<String, (UserId, ApplicationRecord)>>,
}

impl InMemoryApplicationTransport {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            sequence: AtomicU64::new(0),
            records: Mutex::new(HashMap::new()),
        }
    }

    fn records(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<String, (UserId, ApplicationRecord)>>, TransportError> {
        self.records
            .lock()
            .map_err(|_| {
                TransportError::Unavailable("application store lock poisoned".to_string())
            })
    }

    /// Mirrors a status change made on the employer side so later fetches see it.
    pub(crate) fn push_event(
        &self,
        application_id: &ApplicationId,
        event: &TimelineEvent,
    ) -> Result<(), TransportError> {
        let mut records = self.records()?;
        let (_, record) = records
            .get_mut(&application_id.0)
            .ok_or_else(|| unknown_application(application_id))?;
        record.status = event.status.as_str().to_string();
        record.updated_at = event.occurred_at;
        record.timeline.push(TimelineRecord::from(event));
        Ok(())
    }
}

fn unknown_application(application_id: &ApplicationId) -> TransportError {
    TransportError::Rejected(format!("unknown application {application_id}"))
}

#[async_trait]
impl ApplicationTransport for InMemoryApplicationTransport {
    async fn submit_application(
        &self,
        user: &UserId,
        job_id: &JobId,
    ) -> Result<ApplicationRecord, TransportError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let application = Application::submitted(
            ApplicationId(format!("app-{sequence:06}")),
            job_id.clone(),
            CompanyId(format!("company-{job_id}")),
            self.clock.now(),
        );
        let record = ApplicationRecord::from(&application);
        self.records()?
            .insert(record.id.clone(), (user.clone(), record.clone()));
        Ok(record)
    }

    async fn list_applications(
        &self,
        user: &UserId,
    ) -> Result<Vec<ApplicationRecord>, TransportError> {
        Ok(self
            .records()?
            .values()
            .filter(|(owner, _)| owner == user)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn fetch_timeline(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<TimelineRecord>, TransportError> {
        self.records()?
            .get(&application_id.0)
            .map(|(_, record)| record.timeline.clone())
            .ok_or_else(|| unknown_application(application_id))
    }

    async fn withdraw(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, TransportError> {
        let now = self.clock.now();
        let mut records = self.records()?;
        let (_, record) = records
            .get_mut(&application_id.0)
            .ok_or_else(|| unknown_application(application_id))?;
        let occurred_at = record
            .timeline
            .last()
            .map_or(now, |last| last.occurred_at.max(now));
        record.status = ApplicationStatus::Withdrawn.as_str().to_string();
        record.updated_at = occurred_at;
        record
            .timeline
            .push(TimelineRecord::from(&TimelineEvent::new(
                ApplicationStatus::Withdrawn,
                occurred_at,
            )));
        Ok(record.clone())
    }
}

/// Routes user-facing notifications into the service log.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogNotifications;

impl NotificationSink for LogNotifications {
    fn notify(&self, kind: NotificationKind, message: &str) -> Result<(), NotificationError> {
        match kind {
            NotificationKind::Success => info!(notification = message, "user notified"),
            NotificationKind::Error => warn!(notification = message, "user notified of failure"),
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryProfileStore {
    profiles: RwLock<HashMap<UserId, CvData>>,
}

impl InMemoryProfileStore {
    pub(crate) fn insert(&self, user: UserId, cv: CvData) {
        let mut profiles = self
            .profiles
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        profiles.insert(user, cv);
    }
}

#[async_trait]
impl ProfileSource for InMemoryProfileStore {
    async fn fetch_cv(&self, user: &UserId) -> Result<Option<CvData>, ProfileError> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| ProfileError::Unavailable("profile store lock poisoned".to_string()))?;
        Ok(profiles.get(user).cloned())
    }
}

/// Reads a CV JSON document. Invalid JSON is an error; valid JSON that is not
/// CV-shaped is treated as no CV.
pub(crate) fn read_cv_file(path: &Path) -> Result<Option<CvData>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw).map_err(ProfileError::from)?;
    Ok(cv_from_value(&value))
}
