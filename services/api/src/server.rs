use crate::cli::ServeArgs;
use crate::infra::{seed_demo_users, AppState};
use crate::routes::with_housing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hdb_housing::config::AppConfig;
use hdb_housing::error::AppError;
use hdb_housing::telemetry;
use hdb_housing::workflows::housing::{EligibilityPolicy, HousingPortal, HousingStores};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let policy = EligibilityPolicy::from(&config.eligibility);
    let portal = HousingPortal::new(HousingStores::in_memory(), policy);
    if args.seed_demo_users {
        let enrolled = seed_demo_users(&portal)?;
        info!(enrolled, "demo users enrolled");
    }

    let app = with_housing_routes(Arc::new(portal))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        single_min_age = config.eligibility.single_min_age,
        married_min_age = config.eligibility.married_min_age,
        "housing portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
