use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use super::entitlement::LeaveEntitlement;
use super::leave_request::{LeaveStatus, NewApprovalHistory, NextApprover};
use crate::error::{LeaveError, LeaveResult};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LedgerAdjustment {
    /// Must keep `hours_used <= total_hours_entitled`.
    Debit(Decimal),
    /// Floors `hours_used` at zero.
    Credit(Decimal),
}

impl LedgerAdjustment {
    /// New `hours_used` for `entitlement`, or `BalanceExceeded` when a debit
    /// would overdraw it. Never mutates.
    pub fn apply_to(&self, entitlement: &LeaveEntitlement) -> LeaveResult<Decimal> {
        match *self {
            LedgerAdjustment::Debit(hours) => {
                let used = entitlement.hours_used + hours;
                if used > entitlement.total_hours_entitled {
                    return Err(LeaveError::BalanceExceeded {
                        requested: hours,
                        available: entitlement.remaining_hours(),
                    });
                }
                Ok(used)
            }
            LedgerAdjustment::Credit(hours) => {
                Ok((entitlement.hours_used - hours).max(Decimal::ZERO))
            }
        }
    }
}

/// Entitlement change committed together with a workflow transition.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerChange {
    pub employee_id: u64,
    pub year: i32,
    pub adjustment: LedgerAdjustment,
}

/// A state change of one leave request. Applied as a compare-and-set on
/// `(expected_status, expected_next)`, so a stale decision never lands.
#[derive(Debug, Clone)]
pub struct Transition {
    pub request_id: u64,
    pub expected_status: LeaveStatus,
    pub expected_next: NextApprover,
    pub status: LeaveStatus,
    pub next_approver: NextApprover,
    pub ledger: Option<LedgerChange>,
    pub history: Option<NewApprovalHistory>,
    pub at: NaiveDateTime,
}
