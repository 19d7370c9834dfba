use crate::cli::ServeArgs;
use crate::infra::{
    read_cv_file, AppState, InMemoryApplicationTransport, InMemoryProfileStore, LogNotifications,
};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use jobtrack::clock::SystemClock;
use jobtrack::config::AppConfig;
use jobtrack::error::AppError;
use jobtrack::session::{LocalSession, UserId};
use jobtrack::telemetry;
use jobtrack::tracking::ApplicationTracker;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(user) = args.user.take() {
        config.session.user_id = Some(user);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let clock = Arc::new(SystemClock);
    let session = Arc::new(LocalSession::default());
    let profiles = Arc::new(InMemoryProfileStore::default());
    let tracker = Arc::new(
        ApplicationTracker::new(
            Arc::new(InMemoryApplicationTransport::new(clock.clone())),
            session.clone(),
            Arc::new(LogNotifications),
        )
        .with_clock(clock),
    );

    if let Some(user) = config.session.user_id.clone().map(UserId) {
        session.sign_in(user.clone());
        let loaded = tracker.start_session().await?;
        info!(%user, applications = loaded, "session started");

        if let Some(path) = args.profile.take() {
            match read_cv_file(&path)? {
                Some(cv) => profiles.insert(user, cv),
                None => warn!(path = %path.display(), "profile document is not a CV, ignoring"),
            }
        }
    } else if args.profile.is_some() {
        warn!("--profile given without a session user, ignoring");
    }

    let app = with_service_routes(tracker, profiles, session, config.display)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job application tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}
