//! Persistence seam. Every method is its own unit of work: the multi-step
//! writes (`insert_request`, `apply_transition`) commit entirely or not at all.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::LeaveResult;
use crate::model::{
    department::Department,
    employee::Employee,
    entitlement::{LeaveEntitlement, NewLeaveEntitlement},
    holiday::PublicHoliday,
    leave_request::{ApprovalHistory, LeaveRequest, LeaveStatus, NewLeaveRequest},
    leave_type::LeaveType,
    role::Role,
    sprint::{NewSprint, Sprint},
    transition::{LedgerChange, Transition},
};

pub mod mysql;

#[cfg(test)]
pub mod memory;

/// Hours and number of requests of one type inside a window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TypeUsage {
    pub hours: Decimal,
    pub requests: u32,
}

/// Filters for approved requests overlapping a window.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApprovedFilter {
    pub department_id: Option<u64>,
    pub employee_id: Option<u64>,
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn find_employee(&self, id: u64) -> LeaveResult<Option<Employee>>;

    async fn active_employees(&self) -> LeaveResult<Vec<Employee>>;

    async fn find_department(&self, id: u64) -> LeaveResult<Option<Department>>;

    async fn active_departments(&self) -> LeaveResult<Vec<Department>>;

    /// Looks a type up by id whatever its record status, so requests of a
    /// retired type stay readable.
    async fn find_leave_type(&self, id: u64) -> LeaveResult<Option<LeaveType>>;

    async fn active_leave_types(&self) -> LeaveResult<Vec<LeaveType>>;

    async fn find_request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>>;

    async fn requests_for_employee(&self, employee_id: u64) -> LeaveResult<Vec<LeaveRequest>>;

    /// True when a request of the employee, in none of `excluded`, intersects
    /// `[start, end)`.
    async fn has_overlapping_request(
        &self,
        employee_id: u64,
        start: NaiveDateTime,
        end: NaiveDateTime,
        excluded: &[LeaveStatus],
    ) -> LeaveResult<bool>;

    /// Usage of one type by requests starting in `[from, until)` with one of
    /// `statuses`.
    async fn usage_for_type(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        from: NaiveDate,
        until: NaiveDate,
        statuses: &[LeaveStatus],
    ) -> LeaveResult<TypeUsage>;

    /// Active holidays dated within `[from, to]`.
    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate)
    -> LeaveResult<Vec<PublicHoliday>>;

    async fn find_entitlement(
        &self,
        employee_id: u64,
        year: i32,
    ) -> LeaveResult<Option<LeaveEntitlement>>;

    /// Stores `new` unless a record for the same employee and year exists, and
    /// returns whichever record is stored afterwards.
    async fn insert_entitlement_if_absent(
        &self,
        new: NewLeaveEntitlement,
    ) -> LeaveResult<LeaveEntitlement>;

    /// Applies one ledger change on the locked entitlement row. A failed debit
    /// leaves the record unchanged.
    async fn adjust_entitlement(&self, change: LedgerChange) -> LeaveResult<LeaveEntitlement>;

    /// Inserts the request unless an overlapping request (outside `excluded`)
    /// exists at commit time, in which case `LeaveError::Overlap` is returned.
    async fn insert_request(
        &self,
        new: NewLeaveRequest,
        excluded: &[LeaveStatus],
    ) -> LeaveResult<LeaveRequest>;

    /// Applies status change, ledger adjustment and history entry atomically.
    async fn apply_transition(&self, transition: Transition) -> LeaveResult<LeaveRequest>;

    async fn history_for_request(&self, request_id: u64) -> LeaveResult<Vec<ApprovalHistory>>;

    /// Pending requests whose next approver is `role`, oldest first.
    async fn requests_awaiting(
        &self,
        role: Role,
        department_id: Option<u64>,
    ) -> LeaveResult<Vec<LeaveRequest>>;

    /// Approved requests intersecting `[from, to]`.
    async fn approved_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        filter: ApprovedFilter,
    ) -> LeaveResult<Vec<LeaveRequest>>;

    async fn find_sprint(&self, id: u64) -> LeaveResult<Option<Sprint>>;

    /// Active sprint of the department with the latest end date.
    async fn latest_sprint(&self, department_id: u64) -> LeaveResult<Option<Sprint>>;

    /// Fails with a business-rule error when the name is taken in the department.
    async fn insert_sprint(&self, new: NewSprint) -> LeaveResult<Sprint>;
}
