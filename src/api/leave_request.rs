use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::leave_request::{ApprovalHistory, LeaveRequest};
use crate::service::leave_request::{LeaveApplication, LeaveRequestService};

#[derive(Deserialize, ToSchema, Default)]
pub struct DecisionPayload {
    /// Note stored in the approval history
    #[schema(example = "Covered by Ali during the release")]
    pub comments: Option<String>,
}

fn comments(payload: Option<web::Json<DecisionPayload>>) -> Option<String> {
    payload.and_then(|p| p.into_inner().comments)
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = LeaveApplication,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Missing or invalid dates"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Overlap, insufficient balance or another leave rule"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    payload: web::Json<LeaveApplication>,
) -> actix_web::Result<impl Responder> {
    let request = service.create(auth.actor()?, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(request))
}

/* =========================
Approve / reject / cancel
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body(content = Option<DecisionPayload>, content_type = "application/json"),
    responses(
        (status = 200, description = "Step approved; the request moved on or was finally approved", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your turn, or your own request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already decided or balance exceeded")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    path: web::Path<u64>,
    payload: Option<web::Json<DecisionPayload>>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let request = service
        .approve(auth.actor()?, leave_id, comments(payload))
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(content = Option<DecisionPayload>, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your turn, or your own request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    path: web::Path<u64>,
    payload: Option<web::Json<DecisionPayload>>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let request = service
        .reject(auth.actor()?, leave_id, comments(payload))
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of your own leave request")
    ),
    request_body(content = Option<DecisionPayload>, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave cancelled; approved annual hours are credited back", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your request"),
        (status = 409, description = "Already rejected or cancelled")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    path: web::Path<u64>,
    payload: Option<web::Json<DecisionPayload>>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let request = service
        .cancel(auth.actor()?, leave_id, comments(payload))
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Listings
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/mine",
    responses(
        (status = 200, description = "Your leave requests, latest first", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
) -> actix_web::Result<impl Responder> {
    let requests = service.my_requests(auth.actor()?).await?;
    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    get,
    path = "/api/leave/pending",
    responses(
        (status = 200, description = "Requests waiting for your role", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn pending_leaves(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
) -> actix_web::Result<impl Responder> {
    let requests = service.pending_for(auth.actor()?).await?;
    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}/history",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    responses(
        (status = 200, description = "Approval history, oldest first", body = [ApprovalHistory]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your request"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_history(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let history = service.history(auth.actor()?, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(history))
}
