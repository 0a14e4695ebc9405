use crate::{
    api::{balance, leave_request, report, sprint},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::anyhow;

pub type Limiter = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter settings. Every worker wraps the same config, so they all
/// count against one quota store.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min} requests per minute"))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, protected_limiter: &Limiter) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(protected_limiter)) // rate limiting
            .configure(api_routes),
    );
}

/// Leave, balance, sprint and report resources, relative to the API prefix.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave")
            // /leave
            .service(web::resource("").route(web::post().to(leave_request::create_leave)))
            .service(web::resource("/mine").route(web::get().to(leave_request::my_leaves)))
            .service(web::resource("/pending").route(web::get().to(leave_request::pending_leaves)))
            // /leave/{id}/...
            .service(
                web::resource("/{id}/history").route(web::get().to(leave_request::leave_history)),
            )
            .service(
                web::resource("/{id}/approve").route(web::put().to(leave_request::approve_leave)),
            )
            .service(
                web::resource("/{id}/reject").route(web::put().to(leave_request::reject_leave)),
            )
            .service(
                web::resource("/{id}/cancel").route(web::put().to(leave_request::cancel_leave)),
            ),
    )
    .service(
        web::scope("/balance")
            .service(web::resource("").route(web::get().to(balance::my_balances)))
            .service(web::resource("/{leave_type_id}").route(web::get().to(balance::balance_for_type))),
    )
    .service(
        web::scope("/sprint")
            .service(web::resource("").route(web::post().to(sprint::create_sprint)))
            .service(web::resource("/plan").route(web::post().to(sprint::plan_sprints)))
            .service(web::resource("/{id}/capacity").route(web::get().to(sprint::sprint_capacity))),
    )
    .service(
        web::scope("/report")
            .service(web::resource("/accounting").route(web::post().to(report::accounting_report))),
    );
}
