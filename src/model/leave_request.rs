use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use super::record_status::RecordStatus;
use super::role::Role;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    PendingApproval,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Statuses ignored by the overlap check.
    pub const INACTIVE: [LeaveStatus; 2] = [LeaveStatus::Rejected, LeaveStatus::Cancelled];

    /// No workflow step can follow.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::PendingApproval)
    }
}

/// Who has to act next. Persisted as the role identifier or `"NONE"`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NextApprover {
    Role(Role),
    None,
}

impl NextApprover {
    pub const SENTINEL: &'static str = "NONE";

    pub fn role(&self) -> Option<Role> {
        match self {
            NextApprover::Role(role) => Some(*role),
            NextApprover::None => None,
        }
    }
}

impl fmt::Display for NextApprover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextApprover::Role(role) => write!(f, "{role}"),
            NextApprover::None => f.write_str(Self::SENTINEL),
        }
    }
}

impl FromStr for NextApprover {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(Self::SENTINEL) {
            return Ok(NextApprover::None);
        }
        Role::from_str(s).map(NextApprover::Role)
    }
}

impl Serialize for NextApprover {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub status: LeaveStatus,
    #[schema(value_type = String, example = "MANAGER")]
    pub next_approver: NextApprover,
    #[schema(value_type = String, format = "date-time")]
    pub start: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub end: NaiveDateTime,
    #[schema(value_type = String, example = "16")]
    pub duration_hours: Decimal,
    pub reason: String,
    pub document_ref: Option<String>,
    #[serde(skip)]
    pub record_status: RecordStatus,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

impl LeaveRequest {
    /// Half-open interval overlap against `[start, end)`.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start < self.end && end > self.start
    }
}

/// Validated request ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub first_approver: Role,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_hours: Decimal,
    pub reason: String,
    pub document_ref: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Append-only audit entry, one per workflow transition.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApprovalHistory {
    pub id: u64,
    pub leave_request_id: u64,
    pub approver_id: u64,
    pub action: LeaveStatus,
    pub comments: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewApprovalHistory {
    pub approver_id: u64,
    pub action: LeaveStatus,
    pub comments: String,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn next_approver_round_trips_through_text() {
        assert_eq!("NONE".parse::<NextApprover>().unwrap(), NextApprover::None);
        assert_eq!("".parse::<NextApprover>().unwrap(), NextApprover::None);
        assert_eq!(
            "hr".parse::<NextApprover>().unwrap(),
            NextApprover::Role(Role::Hr)
        );
        assert_eq!(NextApprover::Role(Role::Manager).to_string(), "MANAGER");
        assert_eq!(NextApprover::None.to_string(), "NONE");
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!LeaveStatus::PendingApproval.is_terminal());
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
        assert!(LeaveStatus::Cancelled.is_terminal());
    }

    #[test]
    fn overlap_is_half_open() {
        let existing = LeaveRequest {
            id: 1,
            employee_id: 1,
            leave_type_id: 1,
            status: LeaveStatus::PendingApproval,
            next_approver: NextApprover::Role(Role::Manager),
            start: at(4, 9),
            end: at(6, 9),
            duration_hours: Decimal::ZERO,
            reason: String::new(),
            document_ref: None,
            record_status: RecordStatus::Active,
            created_at: at(1, 9),
            updated_at: at(1, 9),
        };
        assert!(existing.overlaps(at(5, 9), at(8, 9)));
        assert!(existing.overlaps(at(1, 9), at(4, 10)));
        assert!(!existing.overlaps(at(6, 9), at(8, 9)));
        assert!(!existing.overlaps(at(1, 9), at(4, 9)));
    }
}
