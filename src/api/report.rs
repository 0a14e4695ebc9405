use actix_web::{HttpResponse, Responder, web};

use crate::auth::auth::AuthUser;
use crate::service::report::{AccountingQuery, AccountingRow, ReportService};

#[utoipa::path(
    post,
    path = "/api/report/accounting",
    request_body(
        content = AccountingQuery,
        description = "Window and filters of the report",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Approved leave in the window", body = [AccountingRow]),
        (status = 400, description = "Invalid window"),
        (status = 403, description = "HR, CEO or Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn accounting_report(
    auth: AuthUser,
    reports: web::Data<ReportService>,
    payload: web::Json<AccountingQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_planner()?;
    let rows = reports.accounting(payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(rows))
}
