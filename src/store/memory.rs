//! In-process store backing the service tests. One mutex guards the whole
//! state, so every method is trivially atomic.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

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
    leave_type::LeaveType,
    record_status::RecordStatus,
    role::Role,
    sprint::{NewSprint, Sprint},
    transition::{LedgerChange, Transition},
};

#[derive(Default)]
struct State {
    employees: Vec<Employee>,
    departments: Vec<Department>,
    leave_types: Vec<LeaveType>,
    requests: Vec<LeaveRequest>,
    history: Vec<ApprovalHistory>,
    entitlements: Vec<LeaveEntitlement>,
    holidays: Vec<PublicHoliday>,
    sprints: Vec<Sprint>,
    /// Employees whose entitlement writes fail, to exercise error isolation.
    failing_entitlements: Vec<u64>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }

    pub fn add_employee(&self, employee: Employee) {
        self.state().employees.push(employee);
    }

    pub fn add_department(&self, id: u64, name: &str) {
        self.state().departments.push(Department {
            id,
            name: name.to_string(),
            status: RecordStatus::Active,
        });
    }

    pub fn deactivate_department(&self, id: u64) {
        if let Some(d) = self.state().departments.iter_mut().find(|d| d.id == id) {
            d.status = RecordStatus::Deleted;
        }
    }

    pub fn add_leave_type(&self, leave_type: LeaveType) {
        self.state().leave_types.push(leave_type);
    }

    pub fn add_holiday(&self, date: NaiveDate, name: &str, half_day: bool) {
        let mut state = self.state();
        let id = state.holidays.len() as u64 + 1;
        state.holidays.push(PublicHoliday {
            id,
            date,
            name: name.to_string(),
            half_day,
            status: RecordStatus::Active,
        });
    }

    pub fn add_entitlement(&self, employee_id: u64, year: i32, total: Decimal, used: Decimal, carried: Decimal) {
        let mut state = self.state();
        let id = state.entitlements.len() as u64 + 1;
        state.entitlements.push(LeaveEntitlement {
            id,
            employee_id,
            year,
            total_hours_entitled: total,
            hours_used: used,
            carried_forward_hours: carried,
        });
    }

    pub fn add_sprint(&self, name: &str, start: NaiveDate, end: NaiveDate, weeks: Option<u32>, department_id: u64) {
        let mut state = self.state();
        let id = state.sprints.len() as u64 + 1;
        state.sprints.push(Sprint {
            id,
            name: name.to_string(),
            start_date: start,
            end_date: end,
            duration_weeks: weeks,
            department_id,
            status: RecordStatus::Active,
        });
    }

    /// Inserts a request directly, bypassing every business rule.
    pub fn add_request(&self, mut request: LeaveRequest) -> u64 {
        let mut state = self.state();
        request.id = state.requests.len() as u64 + 1;
        let id = request.id;
        state.requests.push(request);
        id
    }

    pub fn fail_entitlement_writes_for(&self, employee_id: u64) {
        self.state().failing_entitlements.push(employee_id);
    }

    pub fn entitlement(&self, employee_id: u64, year: i32) -> Option<LeaveEntitlement> {
        self.state()
            .entitlements
            .iter()
            .find(|e| e.employee_id == employee_id && e.year == year)
            .cloned()
    }

    pub fn sprints_of(&self, department_id: u64) -> Vec<Sprint> {
        let mut sprints: Vec<_> = self
            .state()
            .sprints
            .iter()
            .filter(|s| s.department_id == department_id)
            .cloned()
            .collect();
        sprints.sort_by_key(|s| s.start_date);
        sprints
    }

    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }
}

fn overlapping(
    requests: &[LeaveRequest],
    employee_id: u64,
    start: NaiveDateTime,
    end: NaiveDateTime,
    excluded: &[LeaveStatus],
) -> bool {
    requests.iter().any(|r| {
        r.employee_id == employee_id
            && r.record_status.is_active()
            && !excluded.contains(&r.status)
            && r.overlaps(start, end)
    })
}

fn entitlement_position(entitlements: &[LeaveEntitlement], change: &LedgerChange) -> LeaveResult<usize> {
    entitlements
        .iter()
        .position(|e| e.employee_id == change.employee_id && e.year == change.year)
        .ok_or_else(|| LeaveError::rule(format!("no leave entitlement exists for {}", change.year)))
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn find_employee(&self, id: u64) -> LeaveResult<Option<Employee>> {
        Ok(self
            .state()
            .employees
            .iter()
            .find(|e| e.id == id && e.status.is_active())
            .cloned())
    }

    async fn active_employees(&self) -> LeaveResult<Vec<Employee>> {
        Ok(self
            .state()
            .employees
            .iter()
            .filter(|e| e.status.is_active())
            .cloned()
            .collect())
    }

    async fn find_department(&self, id: u64) -> LeaveResult<Option<Department>> {
        Ok(self
            .state()
            .departments
            .iter()
            .find(|d| d.id == id && d.status.is_active())
            .cloned())
    }

    async fn active_departments(&self) -> LeaveResult<Vec<Department>> {
        Ok(self
            .state()
            .departments
            .iter()
            .filter(|d| d.status.is_active())
            .cloned()
            .collect())
    }

    async fn find_leave_type(&self, id: u64) -> LeaveResult<Option<LeaveType>> {
        Ok(self
            .state()
            .leave_types
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn active_leave_types(&self) -> LeaveResult<Vec<LeaveType>> {
        Ok(self
            .state()
            .leave_types
            .iter()
            .filter(|t| t.status.is_active())
            .cloned()
            .collect())
    }

    async fn find_request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        Ok(self
            .state()
            .requests
            .iter()
            .find(|r| r.id == id && r.record_status.is_active())
            .cloned())
    }

    async fn requests_for_employee(&self, employee_id: u64) -> LeaveResult<Vec<LeaveRequest>> {
        Ok(self
            .state()
            .requests
            .iter()
            .filter(|r| r.employee_id == employee_id && r.record_status.is_active())
            .cloned()
            .collect())
    }

    async fn has_overlapping_request(
        &self,
        employee_id: u64,
        start: NaiveDateTime,
        end: NaiveDateTime,
        excluded: &[LeaveStatus],
    ) -> LeaveResult<bool> {
        Ok(overlapping(&self.state().requests, employee_id, start, end, excluded))
    }

    async fn usage_for_type(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        from: NaiveDate,
        until: NaiveDate,
        statuses: &[LeaveStatus],
    ) -> LeaveResult<TypeUsage> {
        let state = self.state();
        let usage = state
            .requests
            .iter()
            .filter(|r| {
                r.employee_id == employee_id
                    && r.leave_type_id == leave_type_id
                    && r.record_status.is_active()
                    && statuses.contains(&r.status)
                    && r.start.date() >= from
                    && r.start.date() < until
            })
            .fold(TypeUsage::default(), |acc, r| TypeUsage {
                hours: acc.hours + r.duration_hours,
                requests: acc.requests + 1,
            });
        Ok(usage)
    }

    async fn holidays_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LeaveResult<Vec<PublicHoliday>> {
        Ok(self
            .state()
            .holidays
            .iter()
            .filter(|h| h.status.is_active() && h.date >= from && h.date <= to)
            .cloned()
            .collect())
    }

    async fn find_entitlement(
        &self,
        employee_id: u64,
        year: i32,
    ) -> LeaveResult<Option<LeaveEntitlement>> {
        Ok(self.entitlement(employee_id, year))
    }

    async fn insert_entitlement_if_absent(
        &self,
        new: NewLeaveEntitlement,
    ) -> LeaveResult<LeaveEntitlement> {
        let mut state = self.state();
        if state.failing_entitlements.contains(&new.employee_id) {
            return Err(LeaveError::Internal("entitlement write failed".into()));
        }
        if let Some(existing) = state
            .entitlements
            .iter()
            .find(|e| e.employee_id == new.employee_id && e.year == new.year)
        {
            return Ok(existing.clone());
        }
        let entitlement = LeaveEntitlement {
            id: state.entitlements.len() as u64 + 1,
            employee_id: new.employee_id,
            year: new.year,
            total_hours_entitled: new.total_hours_entitled,
            hours_used: Decimal::ZERO,
            carried_forward_hours: new.carried_forward_hours,
        };
        state.entitlements.push(entitlement.clone());
        Ok(entitlement)
    }

    async fn adjust_entitlement(&self, change: LedgerChange) -> LeaveResult<LeaveEntitlement> {
        let mut state = self.state();
        let position = entitlement_position(&state.entitlements, &change)?;
        let used = change.adjustment.apply_to(&state.entitlements[position])?;
        state.entitlements[position].hours_used = used;
        Ok(state.entitlements[position].clone())
    }

    async fn insert_request(
        &self,
        new: NewLeaveRequest,
        excluded: &[LeaveStatus],
    ) -> LeaveResult<LeaveRequest> {
        let mut state = self.state();
        if overlapping(&state.requests, new.employee_id, new.start, new.end, excluded) {
            return Err(LeaveError::Overlap);
        }
        let request = LeaveRequest {
            id: state.requests.len() as u64 + 1,
            employee_id: new.employee_id,
            leave_type_id: new.leave_type_id,
            status: LeaveStatus::PendingApproval,
            next_approver: NextApprover::Role(new.first_approver),
            start: new.start,
            end: new.end,
            duration_hours: new.duration_hours,
            reason: new.reason,
            document_ref: new.document_ref,
            record_status: RecordStatus::Active,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        state.requests.push(request.clone());
        Ok(request)
    }

    async fn apply_transition(&self, transition: Transition) -> LeaveResult<LeaveRequest> {
        let mut state = self.state();
        let state = &mut *state;

        let index = state
            .requests
            .iter()
            .position(|r| r.id == transition.request_id && r.record_status.is_active())
            .ok_or_else(|| {
                LeaveError::not_found(format!("leave request {}", transition.request_id))
            })?;
        let current = &state.requests[index];
        if current.status != transition.expected_status
            || current.next_approver != transition.expected_next
        {
            return Err(LeaveError::AlreadyDecided {
                id: current.id,
                status: current.status.to_string(),
            });
        }

        // validate the ledger change before touching anything
        let mut ledger_update = None;
        if let Some(change) = &transition.ledger {
            let position = entitlement_position(&state.entitlements, change)?;
            let used = change.adjustment.apply_to(&state.entitlements[position])?;
            ledger_update = Some((position, used));
        }

        if let Some((position, used)) = ledger_update {
            state.entitlements[position].hours_used = used;
        }
        if let Some(entry) = transition.history {
            let id = state.history.len() as u64 + 1;
            state.history.push(ApprovalHistory {
                id,
                leave_request_id: transition.request_id,
                approver_id: entry.approver_id,
                action: entry.action,
                comments: entry.comments,
                created_at: entry.created_at,
            });
        }
        let request = &mut state.requests[index];
        request.status = transition.status;
        request.next_approver = transition.next_approver;
        request.updated_at = transition.at;
        Ok(request.clone())
    }

    async fn history_for_request(&self, request_id: u64) -> LeaveResult<Vec<ApprovalHistory>> {
        let mut history: Vec<_> = self
            .state()
            .history
            .iter()
            .filter(|h| h.leave_request_id == request_id)
            .cloned()
            .collect();
        history.sort_by_key(|h| (h.created_at, h.id));
        Ok(history)
    }

    async fn requests_awaiting(
        &self,
        role: Role,
        department_id: Option<u64>,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let state = self.state();
        let mut requests: Vec<_> = state
            .requests
            .iter()
            .filter(|r| {
                r.record_status.is_active()
                    && r.status == LeaveStatus::PendingApproval
                    && r.next_approver == NextApprover::Role(role)
            })
            .filter(|r| match department_id {
                Some(dept) => state
                    .employees
                    .iter()
                    .any(|e| e.id == r.employee_id && e.department_id == dept),
                None => true,
            })
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    async fn approved_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        filter: ApprovedFilter,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let state = self.state();
        Ok(state
            .requests
            .iter()
            .filter(|r| {
                r.record_status.is_active()
                    && r.status == LeaveStatus::Approved
                    && r.start <= to
                    && r.end >= from
                    && filter.employee_id.is_none_or(|id| r.employee_id == id)
                    && filter.department_id.is_none_or(|dept| {
                        state
                            .employees
                            .iter()
                            .any(|e| e.id == r.employee_id && e.department_id == dept)
                    })
            })
            .cloned()
            .collect())
    }

    async fn find_sprint(&self, id: u64) -> LeaveResult<Option<Sprint>> {
        Ok(self
            .state()
            .sprints
            .iter()
            .find(|s| s.id == id && s.status.is_active())
            .cloned())
    }

    async fn latest_sprint(&self, department_id: u64) -> LeaveResult<Option<Sprint>> {
        Ok(self
            .state()
            .sprints
            .iter()
            .filter(|s| s.department_id == department_id && s.status.is_active())
            .max_by_key(|s| s.end_date)
            .cloned())
    }

    async fn insert_sprint(&self, new: NewSprint) -> LeaveResult<Sprint> {
        let mut state = self.state();
        if state
            .sprints
            .iter()
            .any(|s| s.department_id == new.department_id && s.name == new.name)
        {
            return Err(LeaveError::rule(format!(
                "a sprint named '{}' already exists",
                new.name
            )));
        }
        let sprint = Sprint {
            id: state.sprints.len() as u64 + 1,
            name: new.name,
            start_date: new.start_date,
            end_date: new.end_date,
            duration_weeks: new.duration_weeks,
            department_id: new.department_id,
            status: RecordStatus::Active,
        };
        state.sprints.push(sprint.clone());
        Ok(sprint)
    }
}
