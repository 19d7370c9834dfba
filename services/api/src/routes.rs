use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use jobtrack::config::DisplayConfig;
use jobtrack::profile::{profile_router, ProfileSource};
use jobtrack::session::AuthSession;
use jobtrack::tracking::{
    application_router, ApplicationTracker, ApplicationTransport, NotificationSink,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes<T, N>(
    tracker: Arc<ApplicationTracker<T, N>>,
    profiles: Arc<dyn ProfileSource>,
    auth: Arc<dyn AuthSession>,
    display: DisplayConfig,
) -> axum::Router
where
    T: ApplicationTransport + 'static,
    N: NotificationSink + 'static,
{
    application_router(tracker, display)
        .merge(profile_router(profiles, auth))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryApplicationTransport, InMemoryProfileStore, LogNotifications};
    use axum::body::Body;
    use axum::http::Request;
    use jobtrack::clock::SystemClock;
    use jobtrack::session::{LocalSession, UserId};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn service_router(ready: bool) -> axum::Router {
        let session = Arc::new(LocalSession::signed_in(UserId("seeker".to_string())));
        let tracker = Arc::new(ApplicationTracker::new(
            Arc::new(InMemoryApplicationTransport::new(Arc::new(SystemClock))),
            session.clone(),
            Arc::new(LogNotifications),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_service_routes(
            tracker,
            Arc::new(InMemoryProfileStore::default()),
            session,
            DisplayConfig::default(),
        )
        .layer(Extension(state))
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        let response = service_router(false)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = service_router(true)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn application_and_profile_routes_are_mounted() {
        let router = service_router(true);

        let response = router
            .clone()
            .oneshot(
                Request::get("/api/v1/applications")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::get("/api/v1/profile/completeness")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
