use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::service::entitlement::{EntitlementLedger, LeaveBalance};

#[derive(Serialize, ToSchema)]
pub struct BalanceOverview {
    /// Annual entitlement of the current year
    pub annual: LeaveBalance,
    /// One entry per active leave type
    pub leave_types: Vec<LeaveBalance>,
}

#[utoipa::path(
    get,
    path = "/api/balance",
    responses(
        (status = 200, description = "Annual balance and usage of every leave type", body = BalanceOverview),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn my_balances(
    auth: AuthUser,
    ledger: web::Data<EntitlementLedger>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor()?;
    let overview = BalanceOverview {
        annual: ledger.annual_balance(actor.employee_id).await?,
        leave_types: ledger.all_balances(actor.employee_id).await?,
    };
    Ok(HttpResponse::Ok().json(overview))
}

#[utoipa::path(
    get,
    path = "/api/balance/{leave_type_id}",
    params(
        ("leave_type_id" = u64, Path, description = "Leave type to report")
    ),
    responses(
        (status = 200, description = "Balance of one leave type", body = LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave type not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn balance_for_type(
    auth: AuthUser,
    ledger: web::Data<EntitlementLedger>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let balance = ledger
        .balance_for_type(auth.actor()?.employee_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{TestApp, bearer};
    use crate::model::role::Role;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::Value;

    #[actix_web::test]
    async fn reports_the_annual_ledger() {
        let state = TestApp::new();
        let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

        let req = test::TestRequest::get()
            .uri("/api/balance")
            .insert_header(("Authorization", bearer(Role::Employee, 1)))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["annual"]["year"], 2024);
        assert_eq!(body["annual"]["total_hours"], "160");
        assert_eq!(body["annual"]["remaining_days"], 20);

        let req = test::TestRequest::get()
            .uri("/api/balance/99")
            .insert_header(("Authorization", bearer(Role::Employee, 1)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
