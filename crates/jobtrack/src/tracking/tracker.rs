use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, JobId, StatusParseError,
    TimelineEvent, TimelineRejection,
};
use super::notify::{NotificationKind, NotificationSink};
use super::stats::{compute_stats, ApplicationStats};
use super::transport::{ApplicationTransport, FeedEvent, TimelineRecord, TransportError};
use crate::clock::{Clock, SystemClock};
use crate::session::{AuthSession, UserId};

const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Change notifications published to tracker subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerUpdate {
    Applied(ApplicationId),
    Progressed {
        application_id: ApplicationId,
        status: ApplicationStatus,
    },
    Withdrawn(ApplicationId),
    Synced {
        applications: usize,
    },
    SessionEnded,
}

/// Counts from one batch of status-feed events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub applied: usize,
    pub out_of_order: usize,
    pub rejected: usize,
}

#[derive(Debug, Default)]
struct TrackerState {
    epoch: u64,
    /// User the snapshot was loaded for.
    owner: Option<UserId>,
    applications: BTreeMap<ApplicationId, Application>,
}

impl TrackerState {
    fn reset(&mut self) {
        self.epoch += 1;
        self.owner = None;
        self.applications.clear();
    }
}

/// Owns the signed-in user's applications and their timelines.
///
/// Readers get cloned snapshots; every mutation publishes a [`TrackerUpdate`].
/// Responses that arrive after [`ApplicationTracker::end_session`] are discarded.
/// The snapshot belongs to the user it was loaded for; once the auth session
/// reports a different user (or none) it is dropped as if the session had ended.
pub struct ApplicationTracker<T, N> {
    transport: Arc<T>,
    notifier: Arc<N>,
    auth: Arc<dyn AuthSession>,
    clock: Arc<dyn Clock>,
    state: Mutex<TrackerState>,
    updates: broadcast::Sender<TrackerUpdate>,
}

impl<T, N> ApplicationTracker<T, N>
where
    T: ApplicationTransport + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(transport: Arc<T>, auth: Arc<dyn AuthSession>, notifier: Arc<N>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            transport,
            notifier,
            auth,
            clock: Arc::new(SystemClock),
            state: Mutex::new(TrackerState::default()),
            updates,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerUpdate> {
        self.updates.subscribe()
    }

    /// Load the signed-in user's applications, replacing the current snapshot.
    pub async fn start_session(&self) -> Result<usize, TrackerError> {
        let user = self.require_user()?;
        let epoch = self.state().epoch;

        let records = self.transport.list_applications(&user).await?;
        let applications = records
            .into_iter()
            .map(Application::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let count = applications.len();
        {
            let Some(mut state) = self.current_state(&user, epoch) else {
                debug!(%user, "discarding application list that arrived after session end");
                return Ok(0);
            };
            state.owner = Some(user.clone());
            state.applications = applications
                .into_iter()
                .map(|application| (application.id.clone(), application))
                .collect();
        }

        info!(%user, applications = count, "application snapshot loaded");
        self.publish(TrackerUpdate::Synced {
            applications: count,
        });
        Ok(count)
    }

    /// Drop the snapshot at logout. In-flight responses from the old session are ignored.
    pub fn end_session(&self) {
        self.state().reset();
        self.publish(TrackerUpdate::SessionEnded);
    }

    pub async fn apply(&self, job_id: &JobId) -> Result<Application, TrackerError> {
        let user = self.require_user()?;
        let epoch = {
            let state = self.state();
            if let Some(existing) = state
                .applications
                .values()
                .find(|application| &application.job_id == job_id && !application.is_withdrawn())
            {
                return Err(TrackerError::AlreadyApplied {
                    job_id: job_id.clone(),
                    application_id: existing.id.clone(),
                });
            }
            state.epoch
        };

        let record = match self.transport.submit_application(&user, job_id).await {
            Ok(record) => record,
            Err(err) => {
                self.notify(
                    NotificationKind::Error,
                    &format!("Could not submit your application: {err}"),
                );
                return Err(err.into());
            }
        };
        let application = match Application::try_from(record) {
            Ok(application) => application,
            Err(err) => {
                self.notify(
                    NotificationKind::Error,
                    "Your application was sent but could not be read back",
                );
                return Err(err.into());
            }
        };

        {
            let Some(mut state) = self.current_state(&user, epoch) else {
                debug!(
                    application_id = %application.id,
                    "discarding apply response from an ended session"
                );
                return Ok(application);
            };
            state.owner.get_or_insert_with(|| user.clone());
            state
                .applications
                .insert(application.id.clone(), application.clone());
        }

        info!(%user, %job_id, application_id = %application.id, "application submitted");
        self.notify(NotificationKind::Success, "Application submitted");
        self.publish(TrackerUpdate::Applied(application.id.clone()));
        Ok(application)
    }

    pub async fn withdraw(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, TrackerError> {
        let user = self.require_user()?;
        let epoch = {
            let state = self.state();
            let application = state
                .applications
                .get(application_id)
                .ok_or_else(|| TrackerError::NotFound(application_id.clone()))?;
            if application.is_terminal() {
                return Err(TrackerError::AlreadyTerminal {
                    application_id: application_id.clone(),
                    status: application.status,
                });
            }
            state.epoch
        };

        let remote = match self.transport.withdraw(application_id).await {
            Ok(record) => record,
            Err(err) => {
                self.notify(
                    NotificationKind::Error,
                    &format!("Could not withdraw your application: {err}"),
                );
                return Err(err.into());
            }
        };
        let remote = match Application::try_from(remote) {
            Ok(application) => application,
            Err(err) => {
                self.notify(
                    NotificationKind::Error,
                    "Your withdrawal was sent but could not be read back",
                );
                return Err(err.into());
            }
        };
        if remote.status != ApplicationStatus::Withdrawn {
            warn!(
                %application_id,
                status = %remote.status,
                "withdraw acknowledged with unexpected status"
            );
        }

        let now = self.clock.now();
        let withdrawn = {
            let Some(mut state) = self.current_state(&user, epoch) else {
                debug!(%application_id, "discarding withdraw response from an ended session");
                return Ok(remote);
            };
            let Some(application) = state.applications.get_mut(application_id) else {
                debug!(%application_id, "discarding withdraw response for a dropped application");
                return Ok(remote);
            };

            // A skewed clock must not break timeline ordering.
            let occurred_at = application
                .last_event()
                .map_or(now, |last| last.occurred_at.max(now));
            application
                .append(TimelineEvent::new(ApplicationStatus::Withdrawn, occurred_at))
                .map_err(|rejection| rejection_error(application_id, rejection))?;
            application.clone()
        };

        info!(%application_id, "application withdrawn");
        self.notify(NotificationKind::Success, "Application withdrawn");
        self.publish(TrackerUpdate::Withdrawn(application_id.clone()));
        Ok(withdrawn)
    }

    /// Apply one externally sourced status event, verbatim.
    pub fn record_event(
        &self,
        application_id: &ApplicationId,
        event: TimelineEvent,
    ) -> Result<Application, TrackerError> {
        let status = event.status;
        let updated = {
            let mut state = self.state();
            let application = state
                .applications
                .get_mut(application_id)
                .ok_or_else(|| TrackerError::NotFound(application_id.clone()))?;
            if let Err(rejection) = application.append(event) {
                let err = rejection_error(application_id, rejection);
                if let TrackerError::OutOfOrderEvent {
                    occurred_at,
                    last_occurred_at,
                    ..
                } = &err
                {
                    warn!(
                        %application_id,
                        %status,
                        %occurred_at,
                        %last_occurred_at,
                        "dropping out-of-order timeline event"
                    );
                }
                return Err(err);
            }
            application.clone()
        };

        self.publish(TrackerUpdate::Progressed {
            application_id: application_id.clone(),
            status,
        });
        Ok(updated)
    }

    /// Validate a wire event and apply it.
    pub fn record_feed_event(
        &self,
        application_id: &ApplicationId,
        record: TimelineRecord,
    ) -> Result<Application, TrackerError> {
        let event = TimelineEvent::try_from(record)?;
        self.record_event(application_id, event)
    }

    /// Apply a batch from the status feed. Out-of-order events are dropped and counted.
    pub fn ingest_feed<I>(&self, events: I) -> FeedSummary
    where
        I: IntoIterator<Item = FeedEvent>,
    {
        let mut summary = FeedSummary::default();
        for FeedEvent {
            application_id,
            event,
        } in events
        {
            let application_id = ApplicationId(application_id);
            match self.record_feed_event(&application_id, event) {
                Ok(_) => summary.applied += 1,
                Err(TrackerError::OutOfOrderEvent { .. }) => summary.out_of_order += 1,
                Err(err) => {
                    warn!(%application_id, error = %err, "status feed event rejected");
                    summary.rejected += 1;
                }
            }
        }
        summary
    }

    /// Fetch the remote timeline and append events not yet known locally.
    pub async fn sync_timeline(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<TimelineEvent>, TrackerError> {
        let user = self.require_user()?;
        let epoch = {
            let state = self.state();
            if !state.applications.contains_key(application_id) {
                return Err(TrackerError::NotFound(application_id.clone()));
            }
            state.epoch
        };

        let remote = self
            .transport
            .fetch_timeline(application_id)
            .await?
            .into_iter()
            .map(TimelineEvent::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut progressed = Vec::new();
        let timeline = {
            let Some(mut state) = self.current_state(&user, epoch) else {
                debug!(%application_id, "discarding timeline from an ended session");
                return Ok(remote);
            };
            let Some(application) = state.applications.get_mut(application_id) else {
                debug!(%application_id, "discarding timeline for a dropped application");
                return Ok(remote);
            };

            for event in remote {
                if application.timeline.contains(&event) {
                    continue;
                }
                let status = event.status;
                let occurred_at = event.occurred_at;
                match application.append(event) {
                    Ok(()) => progressed.push(status),
                    Err(rejection) => {
                        warn!(
                            %application_id,
                            %status,
                            %occurred_at,
                            ?rejection,
                            "skipping remote timeline event"
                        );
                    }
                }
            }
            application.timeline.clone()
        };

        for status in progressed {
            self.publish(TrackerUpdate::Progressed {
                application_id: application_id.clone(),
                status,
            });
        }
        Ok(timeline)
    }

    /// Snapshot ordered most-recently-updated first.
    pub fn applications(&self, filter: &ApplicationFilter) -> Vec<Application> {
        let mut applications: Vec<Application> = self
            .state()
            .applications
            .values()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect();
        applications.sort_by(|left, right| {
            right
                .updated_at
                .cmp(&left.updated_at)
                .then_with(|| right.applied_at.cmp(&left.applied_at))
                .then_with(|| left.id.cmp(&right.id))
        });
        applications
    }

    pub fn application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, TrackerError> {
        self.state()
            .applications
            .get(application_id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(application_id.clone()))
    }

    pub fn timeline(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<TimelineEvent>, TrackerError> {
        self.application(application_id)
            .map(|application| application.timeline)
    }

    /// Recomputed from the current snapshot on every call.
    pub fn stats(&self) -> ApplicationStats {
        let applications: Vec<Application> =
            self.state().applications.values().cloned().collect();
        compute_stats(&applications)
    }

    fn require_user(&self) -> Result<UserId, TrackerError> {
        self.auth
            .current_user()
            .ok_or(TrackerError::NotAuthenticated)
    }

    /// Locks the snapshot, first dropping it if the auth session no longer
    /// reports the user it was loaded for.
    fn state(&self) -> MutexGuard<'_, TrackerState> {
        let current = self.auth.current_user();
        let mut state = self.lock_state();
        if state.owner.is_some() && state.owner != current {
            info!(
                owner = ?state.owner,
                current = ?current,
                "session user changed, dropping application snapshot"
            );
            state.reset();
            drop(state);
            self.publish(TrackerUpdate::SessionEnded);
            state = self.lock_state();
        }
        state
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The snapshot, unless the session that started a request has since ended
    /// or changed hands.
    fn current_state(&self, user: &UserId, epoch: u64) -> Option<MutexGuard<'_, TrackerState>> {
        let still_signed_in = self.auth.current_user().as_ref() == Some(user);
        let state = self.state();
        (still_signed_in && state.epoch == epoch).then_some(state)
    }

    fn publish(&self, update: TrackerUpdate) {
        // No subscribers is not an error.
        let _ = self.updates.send(update);
    }

    fn notify(&self, kind: NotificationKind, message: &str) {
        if let Err(err) = self.notifier.notify(kind, message) {
            warn!(error = %err, ?kind, "failed to deliver notification");
        }
    }
}

fn rejection_error(application_id: &ApplicationId, rejection: TimelineRejection) -> TrackerError {
    match rejection {
        TimelineRejection::Terminal(status) => TrackerError::AlreadyTerminal {
            application_id: application_id.clone(),
            status,
        },
        TimelineRejection::OutOfOrder {
            occurred_at,
            last_occurred_at,
        } => TrackerError::OutOfOrderEvent {
            application_id: application_id.clone(),
            occurred_at,
            last_occurred_at,
        },
    }
}

/// Typed failures returned by tracker operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("no signed-in user")]
    NotAuthenticated,
    #[error("already applied to job {job_id} (application {application_id})")]
    AlreadyApplied {
        job_id: JobId,
        application_id: ApplicationId,
    },
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("application {application_id} is already {status}")]
    AlreadyTerminal {
        application_id: ApplicationId,
        status: ApplicationStatus,
    },
    #[error(
        "event at {occurred_at} for application {application_id} precedes its last event at {last_occurred_at}"
    )]
    OutOfOrderEvent {
        application_id: ApplicationId,
        occurred_at: DateTime<Utc>,
        last_occurred_at: DateTime<Utc>,
    },
    #[error(transparent)]
    UnknownStatus(#[from] StatusParseError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
