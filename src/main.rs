use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod jobs;
mod model;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::jobs::{JobFrequency, JobScheduler, SprintPlanningJob, YearOpeningJob};
use crate::service::clock::{Clock, SystemClock};
use crate::service::entitlement::EntitlementLedger;
use crate::service::leave_request::LeaveRequestService;
use crate::service::notifier::{Notifier, TracingNotifier};
use crate::service::report::ReportService;
use crate::service::sprint_planner::SprintPlanner;
use crate::store::LeaveStore;
use crate::store::mysql::MySqlLeaveStore;
use crate::utils::leave_type_cache::LeaveTypeCache;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Leave management service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_new(&config.log_level)
                .with_context(|| format!("invalid LOG_LEVEL {:?}", config.log_level))?,
        )
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;

    let store: Arc<dyn LeaveStore> = Arc::new(MySqlLeaveStore::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let types = Arc::new(LeaveTypeCache::new(
        store.clone(),
        Duration::from_secs(config.leave_type_cache_ttl_secs),
    ));
    let ledger = EntitlementLedger::new(store.clone(), types.clone(), clock.clone());
    let planner = SprintPlanner::new(store.clone(), clock.clone(), config.sprint_horizon_months);

    let leaves = Data::new(LeaveRequestService::new(
        store.clone(),
        types.clone(),
        ledger.clone(),
        notifier,
        clock.clone(),
    ));
    let reports = Data::new(ReportService::new(store, types));
    let ledger_data = Data::new(ledger.clone());
    let planner_data = Data::new(planner.clone());

    let frequency = JobFrequency::Seconds(config.job_interval_secs);
    let mut scheduler = JobScheduler::new();
    scheduler.register(YearOpeningJob::new(ledger, clock, frequency));
    scheduler.register(SprintPlanningJob::new(planner, frequency));
    scheduler.start();

    let limiter = routes::build_limiter(config.rate_protected_per_min)?;
    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(leaves.clone())
            .app_data(ledger_data.clone())
            .app_data(planner_data.clone())
            .app_data(reports.clone())
            .service(index)
            // Protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &config_data, &limiter))
    })
    .bind(&server_addr)
    .with_context(|| format!("could not bind {server_addr}"))?
    .run()
    .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");
    Ok(())
}
