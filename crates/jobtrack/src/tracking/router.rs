use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationFilter, ApplicationId, ApplicationStatus, JobId};
use super::notify::NotificationSink;
use super::tracker::{ApplicationTracker, TrackerError};
use super::transport::{ApplicationTransport, TimelineRecord};
use super::views::timeline_views;
use crate::config::DisplayConfig;

/// Shared handler state: the tracker plus display settings for timeline dates.
pub struct TrackerRouterState<T, N> {
    pub tracker: Arc<ApplicationTracker<T, N>>,
    pub display: DisplayConfig,
}

impl<T, N> Clone for TrackerRouterState<T, N> {
    fn clone(&self) -> Self {
        Self {
            tracker: Arc::clone(&self.tracker),
            display: self.display,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyRequest {
    pub(crate) job_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApplicationQuery {
    /// Comma separated wire names, e.g. `submitted,under_review`.
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) to: Option<DateTime<Utc>>,
}

impl ApplicationQuery {
    fn into_filter(self) -> Result<ApplicationFilter, TrackerError> {
        let mut filter = ApplicationFilter::default().applied_between(self.from, self.to);
        if let Some(raw) = self.status {
            for value in raw.split(',').filter(|value| !value.trim().is_empty()) {
                filter = filter.with_status(value.parse::<ApplicationStatus>()?);
            }
        }
        Ok(filter)
    }
}

/// Router builder exposing application tracking endpoints.
pub fn application_router<T, N>(
    tracker: Arc<ApplicationTracker<T, N>>,
    display: DisplayConfig,
) -> Router
where
    T: ApplicationTransport + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            get(list_handler::<T, N>).post(apply_handler::<T, N>),
        )
        .route("/api/v1/applications/stats", get(stats_handler::<T, N>))
        .route(
            "/api/v1/applications/:application_id",
            get(detail_handler::<T, N>),
        )
        .route(
            "/api/v1/applications/:application_id/timeline",
            get(timeline_handler::<T, N>),
        )
        .route(
            "/api/v1/applications/:application_id/withdraw",
            post(withdraw_handler::<T, N>),
        )
        .route(
            "/api/v1/applications/:application_id/events",
            post(event_handler::<T, N>),
        )
        .with_state(TrackerRouterState { tracker, display })
}

pub(crate) async fn apply_handler<T, N>(
    State(state): State<TrackerRouterState<T, N>>,
    axum::Json(request): axum::Json<ApplyRequest>,
) -> Response
where
    T: ApplicationTransport + 'static,
    N: NotificationSink + 'static,
{
    let job_id = JobId(request.job_id);
    match state.tracker.apply(&job_id).await {
        Ok(application) => {
            let view = application.view(state.tracker.clock().now());
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<T, N>(
    State(state): State<TrackerRouterState<T, N>>,
    Query(query): Query<ApplicationQuery>,
) -> Response
where
    T: ApplicationTransport + 'static,
    N: NotificationSink + 'static,
{
    let filter = match query.into_filter() {
        Ok(filter) => filter,
        Err(err) => return error_response(err),
    };
    let now = state.tracker.clock().now();
    let views: Vec<_> = state
        .tracker
        .applications(&filter)
        .iter()
        .map(|application| application.view(now))
        .collect();
    (StatusCode::OK, axum::Json(views)).into_response()
}

pub(crate) async fn stats_handler<T, N>(State(state): State<TrackerRouterState<T, N>>) -> Response
where
    T: ApplicationTransport + 'static,
    N: NotificationSink + 'static,
{
    (StatusCode::OK, axum::Json(state.tracker.stats())).into_response()
}

pub(crate) async fn detail_handler<T, N>(
    State(state): State<TrackerRouterState<T, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    T: ApplicationTransport + 'static,
    N: NotificationSink + 'static,
{
    match state.tracker.application(&ApplicationId(application_id)) {
        Ok(application) => {
            let view = application.view(state.tracker.clock().now());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn timeline_handler<T, N>(
    State(state): State<TrackerRouterState<T, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    T: ApplicationTransport + 'static,
    N: NotificationSink + 'static,
{
    match state.tracker.timeline(&ApplicationId(application_id)) {
        Ok(timeline) => {
            let now = state.tracker.clock().now();
            let views = timeline_views(&timeline, now, state.display.utc_offset);
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn withdraw_handler<T, N>(
    State(state): State<TrackerRouterState<T, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    T: ApplicationTransport + 'static,
    N: NotificationSink + 'static,
{
    match state.tracker.withdraw(&ApplicationId(application_id)).await {
        Ok(application) => {
            let view = application.view(state.tracker.clock().now());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn event_handler<T, N>(
    State(state): State<TrackerRouterState<T, N>>,
    Path(application_id): Path<String>,
    axum::Json(record): axum::Json<TimelineRecord>,
) -> Response
where
    T: ApplicationTransport + 'static,
    N: NotificationSink + 'static,
{
    match state
        .tracker
        .record_feed_event(&ApplicationId(application_id), record)
    {
        Ok(application) => {
            let view = application.view(state.tracker.clock().now());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: TrackerError) -> Response {
    let status = match &err {
        TrackerError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        TrackerError::AlreadyApplied { .. } | TrackerError::AlreadyTerminal { .. } => {
            StatusCode::CONFLICT
        }
        TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
        TrackerError::UnknownStatus(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TrackerError::Transport(_) => StatusCode::BAD_GATEWAY,
        TrackerError::OutOfOrderEvent { .. } => {
            // Dropped locally; the request itself did not fail.
            let payload = json!({
                "applied": false,
                "reason": err.to_string(),
            });
            return (StatusCode::ACCEPTED, axum::Json(payload)).into_response();
        }
    };

    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
