use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::{instrument, warn};
use utoipa::ToSchema;

use super::duration::DurationCalculator;
use crate::error::{LeaveError, LeaveResult};
use crate::model::{
    employee::Employee,
    leave_request::{LeaveRequest, LeaveStatus},
    leave_type::LeaveType,
};
use crate::store::{ApprovedFilter, LeaveStore};
use crate::utils::leave_type_cache::LeaveTypeCache;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Display, EnumString, Deserialize, ToSchema)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    #[default]
    All,
    Unpaid,
    DocumentRequired,
}

impl ReportType {
    fn admits(&self, leave_type: &LeaveType) -> bool {
        match self {
            ReportType::All => true,
            ReportType::Unpaid => !leave_type.paid,
            ReportType::DocumentRequired => leave_type.document_required,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AccountingQuery {
    #[schema(value_type = String, format = "date", example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date", example = "2026-01-31")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub report_type: ReportType,
    pub department_id: Option<u64>,
    pub employee_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountingRow {
    pub request_id: u64,
    pub employee_id: u64,
    pub employee_name: String,
    pub department_name: String,
    pub leave_type_name: String,
    pub paid: bool,
    pub document_required: bool,
    #[schema(value_type = String, format = "date-time")]
    pub start: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub end: NaiveDateTime,
    #[schema(value_type = String)]
    pub duration_hours: Decimal,
    pub status: LeaveStatus,
    pub document_ref: Option<String>,
}

/// Working hours one approved leave takes out of a sprint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CapacityLoss {
    pub request_id: u64,
    pub employee_id: u64,
    pub employee_name: String,
    pub leave_type_name: String,
    #[schema(value_type = String, format = "date")]
    pub from: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to: NaiveDate,
    #[schema(value_type = String)]
    pub hours: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SprintCapacityReport {
    pub sprint_id: u64,
    pub sprint_name: String,
    pub department_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(value_type = String)]
    pub total_hours_lost: Decimal,
    pub losses: Vec<CapacityLoss>,
}

fn day_window(from: NaiveDate, to: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (from.and_time(NaiveTime::MIN), to.and_hms_opt(23, 59, 59).unwrap_or(to.and_time(NaiveTime::MIN)))
}

/// Read-only reporting over approved leave.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn LeaveStore>,
    types: Arc<LeaveTypeCache>,
    durations: DurationCalculator,
}

impl ReportService {
    pub fn new(store: Arc<dyn LeaveStore>, types: Arc<LeaveTypeCache>) -> Self {
        Self {
            durations: DurationCalculator::new(store.clone()),
            store,
            types,
        }
    }

    /// Employees of the given requests, looked up once each. Inactive
    /// employees are left out.
    async fn employees_of(&self, requests: &[LeaveRequest]) -> LeaveResult<HashMap<u64, Employee>> {
        let mut employees = HashMap::new();
        for request in requests {
            if employees.contains_key(&request.employee_id) {
                continue;
            }
            match self.store.find_employee(request.employee_id).await? {
                Some(employee) => {
                    employees.insert(employee.id, employee);
                }
                None => warn!(
                    employee_id = request.employee_id,
                    leave_id = request.id,
                    "Approved leave of an inactive employee left out of the report"
                ),
            }
        }
        Ok(employees)
    }

    /// Approved leave overlapping the window, for payroll and accounting.
    #[instrument(skip(self))]
    pub async fn accounting(&self, query: AccountingQuery) -> LeaveResult<Vec<AccountingRow>> {
        if query.end_date < query.start_date {
            return Err(LeaveError::validation("report end date cannot be before its start date"));
        }
        let (from, to) = day_window(query.start_date, query.end_date);
        let requests = self
            .store
            .approved_between(
                from,
                to,
                ApprovedFilter {
                    department_id: query.department_id,
                    employee_id: query.employee_id,
                },
            )
            .await?;
        let employees = self.employees_of(&requests).await?;

        let mut rows = Vec::with_capacity(requests.len());
        for request in requests {
            let Some(employee) = employees.get(&request.employee_id) else {
                continue;
            };
            let leave_type = self.types.get_any(request.leave_type_id).await?;
            if !query.report_type.admits(&leave_type) {
                continue;
            }
            rows.push(AccountingRow {
                request_id: request.id,
                employee_id: employee.id,
                employee_name: employee.full_name(),
                department_name: employee.department_name.clone(),
                leave_type_name: leave_type.name.clone(),
                paid: leave_type.paid,
                document_required: leave_type.document_required,
                start: request.start,
                end: request.end,
                duration_hours: request.duration_hours,
                status: request.status,
                document_ref: request.document_ref,
            });
        }
        rows.sort_by(|a, b| a.start.cmp(&b.start).then(a.employee_id.cmp(&b.employee_id)));
        Ok(rows)
    }

    /// Hours the sprint's department loses to approved leave inside the
    /// sprint.
    #[instrument(skip(self))]
    pub async fn sprint_capacity(&self, sprint_id: u64) -> LeaveResult<SprintCapacityReport> {
        let sprint = self
            .store
            .find_sprint(sprint_id)
            .await?
            .ok_or_else(|| LeaveError::not_found(format!("sprint {sprint_id}")))?;
        let (from, to) = day_window(sprint.start_date, sprint.end_date);
        let requests = self
            .store
            .approved_between(
                from,
                to,
                ApprovedFilter {
                    department_id: Some(sprint.department_id),
                    employee_id: None,
                },
            )
            .await?;
        let employees = self.employees_of(&requests).await?;

        let mut losses = Vec::new();
        for request in requests {
            let Some(employee) = employees.get(&request.employee_id) else {
                continue;
            };
            let leave_type = self.types.get_any(request.leave_type_id).await?;
            let clipped_from = request.start.date().max(sprint.start_date);
            let clipped_to = request.end.date().min(sprint.end_date);
            let daily = employee.working_hours_per_day().unwrap_or(Decimal::ZERO);
            let hours = self
                .durations
                .working_hours(clipped_from, clipped_to, daily)
                .await?;
            losses.push(CapacityLoss {
                request_id: request.id,
                employee_id: employee.id,
                employee_name: employee.full_name(),
                leave_type_name: leave_type.name.clone(),
                from: clipped_from,
                to: clipped_to,
                hours,
            });
        }

        Ok(SprintCapacityReport {
            sprint_id: sprint.id,
            sprint_name: sprint.name,
            department_id: sprint.department_id,
            start_date: sprint.start_date,
            end_date: sprint.end_date,
            total_hours_lost: losses.iter().map(|l| l.hours).sum(),
            losses,
        })
    }
}
