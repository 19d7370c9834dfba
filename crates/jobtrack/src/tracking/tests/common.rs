use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::Notify;

use crate::clock::{Clock, FixedClock};
use crate::session::{LocalSession, UserId};
use crate::tracking::domain::{Application, ApplicationId, ApplicationStatus, CompanyId, JobId};
use crate::tracking::notify::{NotificationError, NotificationKind, NotificationSink};
use crate::tracking::transport::{
    ApplicationRecord, ApplicationTransport, TimelineRecord, TransportError,
};
use crate::tracking::ApplicationTracker;

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap()
}

pub(super) fn seeker() -> UserId {
    UserId("seeker-1".to_string())
}

pub(super) fn job(id: &str) -> JobId {
    JobId(id.to_string())
}

pub(super) fn wire_event(status: &str, occurred_at: DateTime<Utc>) -> TimelineRecord {
    TimelineRecord {
        status: status.to_string(),
        occurred_at,
        note: None,
    }
}

/// Record with a timeline walking through `statuses`, one hour apart from `start()`.
pub(super) fn record_through(id: &str, job_id: &str, statuses: &[&str]) -> ApplicationRecord {
    let timeline: Vec<TimelineRecord> = statuses
        .iter()
        .enumerate()
        .map(|(index, status)| wire_event(status, start() + Duration::hours(index as i64)))
        .collect();
    let updated_at = timeline.last().map_or(start(), |event| event.occurred_at);
    ApplicationRecord {
        id: id.to_string(),
        job_id: job_id.to_string(),
        company_id: "acme".to_string(),
        status: statuses.last().copied().unwrap_or("submitted").to_string(),
        applied_at: start(),
        updated_at,
        timeline,
    }
}

#[derive(Default)]
pub(super) struct MemoryTransport {
    records: Mutex<BTreeMap<String, (UserId, ApplicationRecord)>>,
    sequence: AtomicU64,
    offline: AtomicBool,
    clock: Mutex<Option<Arc<FixedClock>>>,
    remote_timelines: Mutex<BTreeMap<String, Vec<TimelineRecord>>>,
    withdraw_status: Mutex<Option<String>>,
}

impl MemoryTransport {
    pub(super) fn with_clock(clock: Arc<FixedClock>) -> Self {
        let transport = Self::default();
        *transport.clock.lock().expect("clock mutex poisoned") = Some(clock);
        transport
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock
            .lock()
            .expect("clock mutex poisoned")
            .as_ref()
            .map_or_else(start, |clock| clock.now())
    }

    pub(super) fn seed(&self, owner: UserId, record: ApplicationRecord) {
        self.records
            .lock()
            .expect("records mutex poisoned")
            .insert(record.id.clone(), (owner, record));
    }

    pub(super) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(super) fn set_remote_timeline(&self, id: &str, timeline: Vec<TimelineRecord>) {
        self.remote_timelines
            .lock()
            .expect("timeline mutex poisoned")
            .insert(id.to_string(), timeline);
    }

    /// Status string reported back by later withdraw calls.
    pub(super) fn answer_withdraw_with(&self, status: &str) {
        *self
            .withdraw_status
            .lock()
            .expect("withdraw status mutex poisoned") = Some(status.to_string());
    }

    pub(super) fn remove(&self, id: &str) {
        self.records
            .lock()
            .expect("records mutex poisoned")
            .remove(id);
    }

    pub(super) fn stored(&self) -> usize {
        self.records.lock().expect("records mutex poisoned").len()
    }

    fn ensure_online(&self) -> Result<(), TransportError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(TransportError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ApplicationTransport for MemoryTransport {
    async fn submit_application(
        &self,
        user: &UserId,
        job_id: &JobId,
    ) -> Result<ApplicationRecord, TransportError> {
        self.ensure_online()?;
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let application = Application::submitted(
            ApplicationId(format!("app-{sequence:03}")),
            job_id.clone(),
            CompanyId(format!("company-{job_id}")),
            self.now(),
        );
        let record = ApplicationRecord::from(&application);
        self.seed(user.clone(), record.clone());
        Ok(record)
    }

    async fn list_applications(
        &self,
        user: &UserId,
    ) -> Result<Vec<ApplicationRecord>, TransportError> {
        self.ensure_online()?;
        Ok(self
            .records
            .lock()
            .expect("records mutex poisoned")
            .values()
            .filter(|(owner, _)| owner == user)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn fetch_timeline(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<TimelineRecord>, TransportError> {
        self.ensure_online()?;
        if let Some(timeline) = self
            .remote_timelines
            .lock()
            .expect("timeline mutex poisoned")
            .get(&application_id.0)
        {
            return Ok(timeline.clone());
        }
        self.records
            .lock()
            .expect("records mutex poisoned")
            .get(&application_id.0)
            .map(|(_, record)| record.timeline.clone())
            .ok_or_else(|| TransportError::Rejected("unknown application".to_string()))
    }

    async fn withdraw(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, TransportError> {
        self.ensure_online()?;
        let now = self.now();
        let mut records = self.records.lock().expect("records mutex poisoned");
        let (_, record) = records
            .get_mut(&application_id.0)
            .ok_or_else(|| TransportError::Rejected("unknown application".to_string()))?;
        record.status = ApplicationStatus::Withdrawn.as_str().to_string();
        record.updated_at = now;
        record.timeline.push(wire_event("withdrawn", now));
        let mut reply = record.clone();
        if let Some(status) = self
            .withdraw_status
            .lock()
            .expect("withdraw status mutex poisoned")
            .clone()
        {
            reply.status = status;
        }
        Ok(reply)
    }
}

/// Lets submit, withdraw and timeline calls reach the store but holds each response
/// until `release`, so tests can change the session while a reply is in flight.
pub(super) struct GatedTransport {
    pub(super) inner: MemoryTransport,
    pub(super) gate: Notify,
}

impl GatedTransport {
    pub(super) fn new(inner: MemoryTransport) -> Self {
        Self {
            inner,
            gate: Notify::new(),
        }
    }

    pub(super) fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl ApplicationTransport for GatedTransport {
    async fn submit_application(
        &self,
        user: &UserId,
        job_id: &JobId,
    ) -> Result<ApplicationRecord, TransportError> {
        let response = self.inner.submit_application(user, job_id).await;
        self.gate.notified().await;
        response
    }

    async fn list_applications(
        &self,
        user: &UserId,
    ) -> Result<Vec<ApplicationRecord>, TransportError> {
        self.inner.list_applications(user).await
    }

    async fn fetch_timeline(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<TimelineRecord>, TransportError> {
        let response = self.inner.fetch_timeline(application_id).await;
        self.gate.notified().await;
        response
    }

    async fn withdraw(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, TransportError> {
        let response = self.inner.withdraw(application_id).await;
        self.gate.notified().await;
        response
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<(NotificationKind, String)>>,
    broken: AtomicBool,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<(NotificationKind, String)> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }

    pub(super) fn break_channel(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

impl NotificationSink for MemoryNotifications {
    fn notify(&self, kind: NotificationKind, message: &str) -> Result<(), NotificationError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(NotificationError::Unavailable("toast host gone".to_string()));
        }
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push((kind, message.to_string()));
        Ok(())
    }
}

pub(super) struct Harness {
    pub(super) tracker: ApplicationTracker<MemoryTransport, MemoryNotifications>,
    pub(super) transport: Arc<MemoryTransport>,
    pub(super) notifications: Arc<MemoryNotifications>,
    pub(super) session: Arc<LocalSession>,
    pub(super) clock: Arc<FixedClock>,
}

pub(super) fn harness() -> Harness {
    let clock = Arc::new(FixedClock::new(start()));
    let transport = Arc::new(MemoryTransport::with_clock(clock.clone()));
    let notifications = Arc::new(MemoryNotifications::default());
    let session = Arc::new(LocalSession::signed_in(seeker()));
    let tracker = ApplicationTracker::new(transport.clone(), session.clone(), notifications.clone())
        .with_clock(clock.clone());
    Harness {
        tracker,
        transport,
        notifications,
        session,
        clock,
    }
}

/// Harness whose transport already holds `records` for the seeker, loaded into the tracker.
pub(super) async fn loaded_harness(records: Vec<ApplicationRecord>) -> Harness {
    let harness = harness();
    for record in records {
        harness.transport.seed(seeker(), record);
    }
    harness
        .tracker
        .start_session()
        .await
        .expect("session starts");
    harness
}

pub(super) struct GatedHarness {
    pub(super) tracker: Arc<ApplicationTracker<GatedTransport, MemoryNotifications>>,
    pub(super) transport: Arc<GatedTransport>,
    pub(super) notifications: Arc<MemoryNotifications>,
    pub(super) session: Arc<LocalSession>,
}

/// Like [`loaded_harness`], but every reply waits for `transport.release()`.
pub(super) async fn gated_harness(records: Vec<ApplicationRecord>) -> GatedHarness {
    let clock = Arc::new(FixedClock::new(start()));
    let transport = Arc::new(GatedTransport::new(MemoryTransport::with_clock(
        clock.clone(),
    )));
    for record in records {
        transport.inner.seed(seeker(), record);
    }
    let notifications = Arc::new(MemoryNotifications::default());
    let session = Arc::new(LocalSession::signed_in(seeker()));
    let tracker = Arc::new(
        ApplicationTracker::new(transport.clone(), session.clone(), notifications.clone())
            .with_clock(clock),
    );
    tracker.start_session().await.expect("session starts");
    GatedHarness {
        tracker,
        transport,
        notifications,
        session,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
