use crate::api::balance::BalanceOverview;
use crate::api::leave_request::DecisionPayload;
use crate::model::leave_request::{ApprovalHistory, LeaveRequest, LeaveStatus};
use crate::model::role::Role;
use crate::model::sprint::Sprint;
use crate::service::entitlement::LeaveBalance;
use crate::service::leave_request::LeaveApplication;
use crate::service::report::{
    AccountingQuery, AccountingRow, CapacityLoss, ReportType, SprintCapacityReport,
};
use crate::service::sprint_planner::{CreateSprint, PlanSummary};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management

Employees apply for leave; each leave type routes the request through its own
chain of approver roles (for example `MANAGER,HR`). Final approval of annual
leave is debited from the employee's yearly entitlement.

### 🔹 Key Features
- **Leave requests**
  - Apply, approve or reject step by step, cancel, and read the approval history
- **Balances**
  - Annual entitlement with carry-forward, monthly caps of hourly leave types
- **Sprints**
  - Automatic sprint planning per department and capacity lost to leave
- **Reports**
  - Approved leave for accounting, filtered by type, department or employee

### 🔐 Security
Every endpoint expects a **JWT Bearer** access token issued by the identity service.
Reports and sprint administration are limited to **HR**, **CEO** and **Admin**.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::pending_leaves,
        crate::api::leave_request::leave_history,

        crate::api::balance::my_balances,
        crate::api::balance::balance_for_type,

        crate::api::sprint::create_sprint,
        crate::api::sprint::plan_sprints,
        crate::api::sprint::sprint_capacity,

        crate::api::report::accounting_report
    ),
    components(
        schemas(
            LeaveApplication,
            LeaveRequest,
            LeaveStatus,
            Role,
            ApprovalHistory,
            DecisionPayload,
            LeaveBalance,
            BalanceOverview,
            CreateSprint,
            Sprint,
            PlanSummary,
            SprintCapacityReport,
            CapacityLoss,
            AccountingQuery,
            AccountingRow,
            ReportType
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave requests and their approval workflow"),
        (name = "Balance", description = "Leave balances"),
        (name = "Sprint", description = "Sprint planning and capacity"),
        (name = "Report", description = "Accounting reports"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
