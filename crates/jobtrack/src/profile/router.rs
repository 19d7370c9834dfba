use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};

use super::completeness::{completeness_report, cv_from_value};
use super::source::{assess_profile, ProfileSource};
use crate::session::AuthSession;

#[derive(Clone)]
pub struct ProfileRouterState {
    pub source: Arc<dyn ProfileSource>,
    pub auth: Arc<dyn AuthSession>,
}

/// Router builder exposing CV completeness endpoints.
pub fn profile_router(source: Arc<dyn ProfileSource>, auth: Arc<dyn AuthSession>) -> Router {
    Router::new()
        .route(
            "/api/v1/profile/completeness",
            get(stored_report_handler).post(report_handler),
        )
        .with_state(ProfileRouterState { source, auth })
}

pub(crate) async fn report_handler(axum::Json(payload): axum::Json<Value>) -> Response {
    let cv = cv_from_value(&payload);
    (StatusCode::OK, axum::Json(completeness_report(cv.as_ref()))).into_response()
}

pub(crate) async fn stored_report_handler(State(state): State<ProfileRouterState>) -> Response {
    let Some(user) = state.auth.current_user() else {
        let payload = json!({ "error": "no signed-in user" });
        return (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response();
    };
    let report = assess_profile(state.source.as_ref(), &user).await;
    (StatusCode::OK, axum::Json(report)).into_response()
}
