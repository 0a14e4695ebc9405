use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use super::record_status::RecordStatus;
use super::role::Role;
use crate::error::{LeaveError, LeaveResult};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestUnit {
    Day,
    Hour,
}

/// Ordered approver roles. Step N must approve before step N+1 is eligible.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct WorkflowChain(Vec<Role>);

impl WorkflowChain {
    pub fn new(steps: Vec<Role>) -> LeaveResult<Self> {
        if steps.is_empty() {
            return Err(LeaveError::rule(
                "no approval workflow is defined for this leave type",
            ));
        }
        Ok(Self(steps))
    }

    /// Parses the stored comma separated form, e.g. `"MANAGER,HR"`.
    pub fn parse(definition: &str) -> LeaveResult<Self> {
        let steps = definition
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Role::from_str(s).map_err(|_| {
                    LeaveError::validation(format!("unknown approver role '{s}' in workflow"))
                })
            })
            .collect::<LeaveResult<Vec<_>>>()?;
        Self::new(steps)
    }

    pub fn first(&self) -> Role {
        self.0[0]
    }

    /// Role following the first occurrence of `current`. `None` when `current`
    /// is the last step or not part of the chain.
    pub fn next_after(&self, current: Role) -> Option<Role> {
        let position = self.0.iter().position(|r| *r == current)?;
        self.0.get(position + 1).copied()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn steps(&self) -> &[Role] {
        &self.0
    }

    pub fn definition(&self) -> String {
        self.0.iter().map(Role::to_string).collect::<Vec<_>>().join(",")
    }
}

/// Optional per-type limits applied when a request is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestPolicy {
    /// Hours allowed per calendar month (e.g. excuse leave: 8h).
    pub monthly_hour_cap: Option<Decimal>,
    /// Every request must be exactly this long (e.g. excuse leave: 2h).
    pub fixed_request_hours: Option<Decimal>,
    /// Maximum number of requests per calendar month.
    pub monthly_request_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveType {
    pub id: u64,
    pub name: String,
    pub paid: bool,
    pub deducts_from_annual: bool,
    pub document_required: bool,
    pub request_unit: RequestUnit,
    pub workflow: WorkflowChain,
    pub policy: RequestPolicy,
    #[serde(skip)]
    pub status: RecordStatus,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use rust_decimal_macros::dec;

    pub fn annual(id: u64, chain: &str) -> LeaveType {
        LeaveType {
            id,
            name: "Annual Leave".to_string(),
            paid: true,
            deducts_from_annual: true,
            document_required: false,
            request_unit: RequestUnit::Day,
            workflow: WorkflowChain::parse(chain).unwrap(),
            policy: RequestPolicy::default(),
            status: RecordStatus::Active,
        }
    }

    pub fn excuse(id: u64) -> LeaveType {
        LeaveType {
            id,
            name: "Mazeret İzni (Saatlik)".to_string(),
            paid: true,
            deducts_from_annual: false,
            document_required: false,
            request_unit: RequestUnit::Hour,
            workflow: WorkflowChain::parse("MANAGER").unwrap(),
            policy: RequestPolicy {
                monthly_hour_cap: Some(dec!(8)),
                fixed_request_hours: Some(dec!(2)),
                monthly_request_limit: Some(4),
            },
            status: RecordStatus::Active,
        }
    }

    pub fn unpaid(id: u64) -> LeaveType {
        LeaveType {
            id,
            name: "Unpaid Leave".to_string(),
            paid: false,
            deducts_from_annual: false,
            document_required: false,
            request_unit: RequestUnit::Day,
            workflow: WorkflowChain::parse("MANAGER,HR").unwrap(),
            policy: RequestPolicy::default(),
            status: RecordStatus::Active,
        }
    }
}
