use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

use super::{ApprovedFilter, LeaveStore, TypeUsage};
use crate::error::{LeaveError, LeaveResult};
use crate::model::{
    department::Department,
    employee::Employee,
    entitlement::{LeaveEntitlement, NewLeaveEntitlement},
    holiday::PublicHoliday,
    leave_request::{
        ApprovalHistory, LeaveRequest, LeaveStatus, NewLeaveRequest, NextApprover,
    },
    leave_type::{LeaveType, RequestPolicy, RequestUnit, WorkflowChain},
    record_status::RecordStatus,
    role::Role,
    sprint::{NewSprint, Sprint},
    transition::{LedgerChange, Transition},
};

const EMPLOYEE_COLUMNS: &str = r#"
    e.id, e.first_name, e.last_name, e.email, e.department_id,
    d.name AS department_name, e.hire_date, e.daily_work_hours, e.is_active
"#;

const REQUEST_COLUMNS: &str = r#"
    r.id, r.employee_id, r.leave_type_id, r.request_status,
    r.workflow_next_approver_role, r.start_date_time, r.end_date_time,
    r.duration_hours, r.reason, r.document_ref, r.is_active, r.created_at, r.updated_at
"#;

/// Next-approver column normalised for comparison. Terminal rows may hold
/// `''` or NULL instead of `NONE`.
const NEXT_APPROVER_KEY: &str =
    "COALESCE(NULLIF(UPPER(workflow_next_approver_role), ''), 'NONE')";

const SPRINT_COLUMNS: &str =
    "id, name, start_date, end_date, duration_weeks, department_id, is_active";

fn record_status(active: bool) -> RecordStatus {
    if active {
        RecordStatus::Active
    } else {
        RecordStatus::Deleted
    }
}

fn corrupt(what: &str, value: &str) -> LeaveError {
    tracing::error!(column = what, value, "Unreadable value in database row");
    LeaveError::Internal(format!("unreadable {what}: {value}"))
}

/// `?, ?, ?` for an `IN (...)` list.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Counts active requests of one employee intersecting `(start, end)`, binds
/// `employee_id, start, end` then one status per excluded entry.
fn overlap_sql(excluded: &[LeaveStatus]) -> String {
    let mut sql = String::from(
        r#"
        SELECT COUNT(*) FROM leave_requests
        WHERE employee_id = ? AND is_active = 1
        AND ? < end_date_time AND ? > start_date_time
        "#,
    );
    if !excluded.is_empty() {
        sql.push_str(&format!(
            " AND request_status NOT IN ({})",
            placeholders(excluded.len())
        ));
    }
    sql
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    first_name: String,
    last_name: String,
    email: String,
    department_id: u64,
    department_name: String,
    hire_date: NaiveDate,
    daily_work_hours: Option<Decimal>,
    is_active: bool,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            department_id: row.department_id,
            department_name: row.department_name,
            hire_date: row.hire_date,
            daily_work_hours: row.daily_work_hours,
            status: record_status(row.is_active),
        }
    }
}

#[derive(FromRow)]
struct DepartmentRow {
    id: u64,
    name: String,
    is_active: bool,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        Department {
            id: row.id,
            name: row.name,
            status: record_status(row.is_active),
        }
    }
}

#[derive(FromRow)]
struct LeaveTypeRow {
    id: u64,
    name: String,
    is_paid: bool,
    deducts_from_annual: bool,
    document_required: bool,
    request_unit: String,
    workflow_definition: Option<String>,
    monthly_hour_cap: Option<Decimal>,
    fixed_request_hours: Option<Decimal>,
    monthly_request_limit: Option<i32>,
    is_active: bool,
}

impl TryFrom<LeaveTypeRow> for LeaveType {
    type Error = LeaveError;

    fn try_from(row: LeaveTypeRow) -> LeaveResult<Self> {
        let request_unit = RequestUnit::from_str(&row.request_unit)
            .map_err(|_| corrupt("request_unit", &row.request_unit))?;
        let workflow = WorkflowChain::parse(row.workflow_definition.as_deref().unwrap_or(""))?;
        Ok(LeaveType {
            id: row.id,
            name: row.name,
            paid: row.is_paid,
            deducts_from_annual: row.deducts_from_annual,
            document_required: row.document_required,
            request_unit,
            workflow,
            policy: RequestPolicy {
                monthly_hour_cap: row.monthly_hour_cap,
                fixed_request_hours: row.fixed_request_hours,
                monthly_request_limit: row.monthly_request_limit.map(|n| n.max(0) as u32),
            },
            status: record_status(row.is_active),
        })
    }
}

#[derive(FromRow)]
struct LeaveRequestRow {
    id: u64,
    employee_id: u64,
    leave_type_id: u64,
    request_status: String,
    workflow_next_approver_role: Option<String>,
    start_date_time: NaiveDateTime,
    end_date_time: NaiveDateTime,
    duration_hours: Decimal,
    reason: Option<String>,
    document_ref: Option<String>,
    is_active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = LeaveError;

    fn try_from(row: LeaveRequestRow) -> LeaveResult<Self> {
        let status = LeaveStatus::from_str(&row.request_status)
            .map_err(|_| corrupt("request_status", &row.request_status))?;
        let next = row.workflow_next_approver_role.unwrap_or_default();
        let next_approver =
            NextApprover::from_str(&next).map_err(|_| corrupt("workflow_next_approver_role", &next))?;
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type_id: row.leave_type_id,
            status,
            next_approver,
            start: row.start_date_time,
            end: row.end_date_time,
            duration_hours: row.duration_hours,
            reason: row.reason.unwrap_or_default(),
            document_ref: row.document_ref,
            record_status: record_status(row.is_active),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_requests(rows: Vec<LeaveRequestRow>) -> LeaveResult<Vec<LeaveRequest>> {
    rows.into_iter().map(LeaveRequest::try_from).collect()
}

#[derive(FromRow)]
struct HistoryRow {
    id: u64,
    leave_request_id: u64,
    approver_id: u64,
    action: String,
    comments: Option<String>,
    created_at: NaiveDateTime,
}

#[derive(FromRow)]
struct EntitlementRow {
    id: u64,
    employee_id: u64,
    year: i32,
    total_hours_entitled: Decimal,
    hours_used: Decimal,
    carried_forward_hours: Decimal,
}

impl From<EntitlementRow> for LeaveEntitlement {
    fn from(row: EntitlementRow) -> Self {
        LeaveEntitlement {
            id: row.id,
            employee_id: row.employee_id,
            year: row.year,
            total_hours_entitled: row.total_hours_entitled,
            hours_used: row.hours_used,
            carried_forward_hours: row.carried_forward_hours,
        }
    }
}

#[derive(FromRow)]
struct HolidayRow {
    id: u64,
    holiday_date: NaiveDate,
    name: String,
    is_half_day: bool,
    is_active: bool,
}

#[derive(FromRow)]
struct SprintRow {
    id: u64,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration_weeks: Option<i32>,
    department_id: u64,
    is_active: bool,
}

impl From<SprintRow> for Sprint {
    fn from(row: SprintRow) -> Self {
        Sprint {
            id: row.id,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            duration_weeks: row.duration_weeks.and_then(|w| u32::try_from(w).ok()),
            department_id: row.department_id,
            status: record_status(row.is_active),
        }
    }
}

/// `LeaveStore` over MySQL. Multi-statement writes run in one transaction and
/// take row locks on the employee or entitlement they guard.
#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn lock_entitlement(
        tx: &mut Transaction<'_, MySql>,
        employee_id: u64,
        year: i32,
    ) -> LeaveResult<LeaveEntitlement> {
        let row = sqlx::query_as::<_, EntitlementRow>(
            r#"
            SELECT id, employee_id, year, total_hours_entitled, hours_used, carried_forward_hours
            FROM leave_entitlements
            WHERE employee_id = ? AND year = ?
            FOR UPDATE
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| LeaveError::rule(format!("no leave entitlement exists for {year}")))?;
        Ok(row.into())
    }

    async fn adjust_locked(
        tx: &mut Transaction<'_, MySql>,
        change: &LedgerChange,
    ) -> LeaveResult<LeaveEntitlement> {
        let mut entitlement = Self::lock_entitlement(tx, change.employee_id, change.year).await?;
        let hours_used = change.adjustment.apply_to(&entitlement)?;
        sqlx::query("UPDATE leave_entitlements SET hours_used = ? WHERE id = ?")
            .bind(hours_used)
            .bind(entitlement.id)
            .execute(&mut **tx)
            .await?;
        entitlement.hours_used = hours_used;
        Ok(entitlement)
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn find_employee(&self, id: u64) -> LeaveResult<Option<Employee>> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees e \
             JOIN departments d ON d.id = e.department_id \
             WHERE e.id = ? AND e.is_active = 1"
        );
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Employee::from))
    }

    async fn active_employees(&self) -> LeaveResult<Vec<Employee>> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees e \
             JOIN departments d ON d.id = e.department_id \
             WHERE e.is_active = 1 ORDER BY e.id"
        );
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn find_department(&self, id: u64) -> LeaveResult<Option<Department>> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, name, is_active FROM departments WHERE id = ? AND is_active = 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Department::from))
    }

    async fn active_departments(&self) -> LeaveResult<Vec<Department>> {
        let rows = sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, name, is_active FROM departments WHERE is_active = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Department::from).collect())
    }

    async fn find_leave_type(&self, id: u64) -> LeaveResult<Option<LeaveType>> {
        let row = sqlx::query_as::<_, LeaveTypeRow>(
            r#"
            SELECT id, name, is_paid, deducts_from_annual, document_required, request_unit,
                   workflow_definition, monthly_hour_cap, fixed_request_hours,
                   monthly_request_limit, is_active
            FROM leave_types
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(LeaveType::try_from).transpose()
    }

    async fn active_leave_types(&self) -> LeaveResult<Vec<LeaveType>> {
        let rows = sqlx::query_as::<_, LeaveTypeRow>(
            r#"
            SELECT id, name, is_paid, deducts_from_annual, document_required, request_unit,
                   workflow_definition, monthly_hour_cap, fixed_request_hours,
                   monthly_request_limit, is_active
            FROM leave_types
            WHERE is_active = 1
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LeaveType::try_from).collect()
    }

    async fn find_request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests r WHERE r.id = ? AND r.is_active = 1"
        );
        let row = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn requests_for_employee(&self, employee_id: u64) -> LeaveResult<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests r \
             WHERE r.employee_id = ? AND r.is_active = 1 \
             ORDER BY r.start_date_time DESC"
        );
        let rows = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        into_requests(rows)
    }

    async fn has_overlapping_request(
        &self,
        employee_id: u64,
        start: NaiveDateTime,
        end: NaiveDateTime,
        excluded: &[LeaveStatus],
    ) -> LeaveResult<bool> {
        let sql = overlap_sql(excluded);
        let mut query = sqlx::query_scalar::<_, i64>(&sql)
            .bind(employee_id)
            .bind(start)
            .bind(end);
        for status in excluded {
            query = query.bind(status.to_string());
        }
        Ok(query.fetch_one(&self.pool).await? > 0)
    }

    async fn usage_for_type(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        from: NaiveDate,
        until: NaiveDate,
        statuses: &[LeaveStatus],
    ) -> LeaveResult<TypeUsage> {
        if statuses.is_empty() {
            return Ok(TypeUsage::default());
        }
        let sql = format!(
            r#"
            SELECT COALESCE(SUM(duration_hours), 0), COUNT(*)
            FROM leave_requests
            WHERE employee_id = ? AND leave_type_id = ? AND is_active = 1
            AND start_date_time >= ? AND start_date_time < ?
            AND request_status IN ({})
            "#,
            placeholders(statuses.len())
        );
        let mut query = sqlx::query_as::<_, (Decimal, i64)>(&sql)
            .bind(employee_id)
            .bind(leave_type_id)
            .bind(from)
            .bind(until);
        for status in statuses {
            query = query.bind(status.to_string());
        }
        let (hours, requests) = query.fetch_one(&self.pool).await?;
        Ok(TypeUsage {
            hours,
            requests: u32::try_from(requests).unwrap_or(u32::MAX),
        })
    }

    async fn holidays_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LeaveResult<Vec<PublicHoliday>> {
        let rows = sqlx::query_as::<_, HolidayRow>(
            r#"
            SELECT id, holiday_date, name, is_half_day, is_active
            FROM public_holidays
            WHERE holiday_date BETWEEN ? AND ? AND is_active = 1
            ORDER BY holiday_date, id
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| PublicHoliday {
                id: row.id,
                date: row.holiday_date,
                name: row.name,
                half_day: row.is_half_day,
                status: record_status(row.is_active),
            })
            .collect())
    }

    async fn find_entitlement(
        &self,
        employee_id: u64,
        year: i32,
    ) -> LeaveResult<Option<LeaveEntitlement>> {
        let row = sqlx::query_as::<_, EntitlementRow>(
            r#"
            SELECT id, employee_id, year, total_hours_entitled, hours_used, carried_forward_hours
            FROM leave_entitlements
            WHERE employee_id = ? AND year = ?
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LeaveEntitlement::from))
    }

    async fn insert_entitlement_if_absent(
        &self,
        new: NewLeaveEntitlement,
    ) -> LeaveResult<LeaveEntitlement> {
        // unique (employee_id, year): a concurrent creator wins, we read its row
        sqlx::query(
            r#"
            INSERT INTO leave_entitlements
                (employee_id, year, total_hours_entitled, hours_used, carried_forward_hours)
            VALUES (?, ?, ?, 0, ?)
            ON DUPLICATE KEY UPDATE id = id
            "#,
        )
        .bind(new.employee_id)
        .bind(new.year)
        .bind(new.total_hours_entitled)
        .bind(new.carried_forward_hours)
        .execute(&self.pool)
        .await?;

        self.find_entitlement(new.employee_id, new.year)
            .await?
            .ok_or_else(|| LeaveError::Internal("entitlement vanished after insert".into()))
    }

    async fn adjust_entitlement(&self, change: LedgerChange) -> LeaveResult<LeaveEntitlement> {
        let mut tx = self.pool.begin().await?;
        let entitlement = Self::adjust_locked(&mut tx, &change).await?;
        tx.commit().await?;
        Ok(entitlement)
    }

    async fn insert_request(
        &self,
        new: NewLeaveRequest,
        excluded: &[LeaveStatus],
    ) -> LeaveResult<LeaveRequest> {
        let mut tx = self.pool.begin().await?;

        // serialises concurrent creates of the same employee
        sqlx::query("SELECT id FROM employees WHERE id = ? FOR UPDATE")
            .bind(new.employee_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| LeaveError::not_found(format!("employee {}", new.employee_id)))?;

        let sql = overlap_sql(excluded);
        let mut overlap = sqlx::query_scalar::<_, i64>(&sql)
            .bind(new.employee_id)
            .bind(new.start)
            .bind(new.end);
        for status in excluded {
            overlap = overlap.bind(status.to_string());
        }
        if overlap.fetch_one(&mut *tx).await? > 0 {
            return Err(LeaveError::Overlap);
        }

        let status = LeaveStatus::PendingApproval;
        let next_approver = NextApprover::Role(new.first_approver);
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type_id, request_status, workflow_next_approver_role,
                 start_date_time, end_date_time, duration_hours, reason, document_ref,
                 is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.leave_type_id)
        .bind(status.to_string())
        .bind(next_approver.to_string())
        .bind(new.start)
        .bind(new.end)
        .bind(new.duration_hours)
        .bind(&new.reason)
        .bind(&new.document_ref)
        .bind(new.created_at)
        .bind(new.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(LeaveRequest {
            id: result.last_insert_id(),
            employee_id: new.employee_id,
            leave_type_id: new.leave_type_id,
            status,
            next_approver,
            start: new.start,
            end: new.end,
            duration_hours: new.duration_hours,
            reason: new.reason,
            document_ref: new.document_ref,
            record_status: RecordStatus::Active,
            created_at: new.created_at,
            updated_at: new.created_at,
        })
    }

    async fn apply_transition(&self, transition: Transition) -> LeaveResult<LeaveRequest> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE leave_requests
            SET request_status = ?, workflow_next_approver_role = ?, updated_at = ?
            WHERE id = ? AND is_active = 1
            AND request_status = ? AND {NEXT_APPROVER_KEY} = ?
            "#
        );
        let updated = sqlx::query(&sql)
            .bind(transition.status.to_string())
            .bind(transition.next_approver.to_string())
            .bind(transition.at)
            .bind(transition.request_id)
            .bind(transition.expected_status.to_string())
            .bind(transition.expected_next.to_string())
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            // dropping `tx` rolls back
            return match self.find_request(transition.request_id).await? {
                Some(current) => Err(LeaveError::AlreadyDecided {
                    id: current.id,
                    status: current.status.to_string(),
                }),
                None => Err(LeaveError::not_found(format!(
                    "leave request {}",
                    transition.request_id
                ))),
            };
        }

        if let Some(change) = &transition.ledger {
            Self::adjust_locked(&mut tx, change).await?;
        }

        if let Some(entry) = &transition.history {
            sqlx::query(
                r#"
                INSERT INTO leave_approval_history
                    (leave_request_id, approver_id, action, comments, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(transition.request_id)
            .bind(entry.approver_id)
            .bind(entry.action.to_string())
            .bind(&entry.comments)
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.find_request(transition.request_id)
            .await?
            .ok_or_else(|| LeaveError::not_found(format!("leave request {}", transition.request_id)))
    }

    async fn history_for_request(&self, request_id: u64) -> LeaveResult<Vec<ApprovalHistory>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, leave_request_id, approver_id, action, comments, created_at
            FROM leave_approval_history
            WHERE leave_request_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                Ok(ApprovalHistory {
                    id: row.id,
                    leave_request_id: row.leave_request_id,
                    approver_id: row.approver_id,
                    action: LeaveStatus::from_str(&row.action)
                        .map_err(|_| corrupt("action", &row.action))?,
                    comments: row.comments.unwrap_or_default(),
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn requests_awaiting(
        &self,
        role: Role,
        department_id: Option<u64>,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM leave_requests r
            JOIN employees e ON e.id = r.employee_id
            WHERE r.is_active = 1 AND r.request_status = ?
            AND UPPER(r.workflow_next_approver_role) = ?
            AND (? IS NULL OR e.department_id = ?)
            ORDER BY r.created_at
            "#
        );
        let rows = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(LeaveStatus::PendingApproval.to_string())
            .bind(role.to_string())
            .bind(department_id)
            .bind(department_id)
            .fetch_all(&self.pool)
            .await?;
        into_requests(rows)
    }

    async fn approved_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        filter: ApprovedFilter,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM leave_requests r
            JOIN employees e ON e.id = r.employee_id
            WHERE r.is_active = 1 AND r.request_status = ?
            AND r.start_date_time <= ? AND r.end_date_time >= ?
            AND (? IS NULL OR e.department_id = ?)
            AND (? IS NULL OR r.employee_id = ?)
            ORDER BY r.start_date_time
            "#
        );
        let rows = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(LeaveStatus::Approved.to_string())
            .bind(to)
            .bind(from)
            .bind(filter.department_id)
            .bind(filter.department_id)
            .bind(filter.employee_id)
            .bind(filter.employee_id)
            .fetch_all(&self.pool)
            .await?;
        into_requests(rows)
    }

    async fn find_sprint(&self, id: u64) -> LeaveResult<Option<Sprint>> {
        let sql = format!("SELECT {SPRINT_COLUMNS} FROM sprints WHERE id = ? AND is_active = 1");
        let row = sqlx::query_as::<_, SprintRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Sprint::from))
    }

    async fn latest_sprint(&self, department_id: u64) -> LeaveResult<Option<Sprint>> {
        let sql = format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints \
             WHERE department_id = ? AND is_active = 1 \
             ORDER BY end_date DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, SprintRow>(&sql)
            .bind(department_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Sprint::from))
    }

    async fn insert_sprint(&self, new: NewSprint) -> LeaveResult<Sprint> {
        let result = sqlx::query(
            r#"
            INSERT INTO sprints (name, start_date, end_date, duration_weeks, department_id, is_active)
            VALUES (?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(&new.name)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.duration_weeks)
        .bind(new.department_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Sprint {
                id: done.last_insert_id(),
                name: new.name,
                start_date: new.start_date,
                end_date: new.end_date,
                duration_weeks: new.duration_weeks,
                department_id: new.department_id,
                status: RecordStatus::Active,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
                Err(LeaveError::rule(format!(
                    "a sprint named '{}' already exists",
                    new.name
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}
