use actix_web::{HttpResponse, Responder, web};

use crate::auth::auth::AuthUser;
use crate::model::sprint::Sprint;
use crate::service::report::{ReportService, SprintCapacityReport};
use crate::service::sprint_planner::{CreateSprint, PlanSummary, SprintPlanner};

#[utoipa::path(
    post,
    path = "/api/sprint",
    request_body(
        content = CreateSprint,
        description = "First sprint of a department; later ones are planned automatically",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Sprint created", body = Sprint),
        (status = 400, description = "Invalid dates or name"),
        (status = 403, description = "HR, CEO or Admin only"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Name already used in the department")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Sprint"
)]
pub async fn create_sprint(
    auth: AuthUser,
    planner: web::Data<SprintPlanner>,
    payload: web::Json<CreateSprint>,
) -> actix_web::Result<impl Responder> {
    auth.require_planner()?;
    let sprint = planner.create_sprint(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(sprint))
}

/// Runs the planner now instead of waiting for the daily job.
#[utoipa::path(
    post,
    path = "/api/sprint/plan",
    responses(
        (status = 200, description = "Planning summary", body = PlanSummary),
        (status = 403, description = "HR, CEO or Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Sprint"
)]
pub async fn plan_sprints(
    auth: AuthUser,
    planner: web::Data<SprintPlanner>,
) -> actix_web::Result<impl Responder> {
    auth.require_planner()?;
    let summary = planner.plan_all().await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    get,
    path = "/api/sprint/{sprint_id}/capacity",
    params(
        ("sprint_id" = u64, Path, description = "Sprint to analyse")
    ),
    responses(
        (status = 200, description = "Working hours lost to approved leave", body = SprintCapacityReport),
        (status = 403, description = "HR, CEO or Admin only"),
        (status = 404, description = "Sprint not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Sprint"
)]
pub async fn sprint_capacity(
    auth: AuthUser,
    reports: web::Data<ReportService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_planner()?;
    let report = reports.sprint_capacity(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}
