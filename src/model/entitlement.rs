use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// One record per employee and calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveEntitlement {
    pub id: u64,
    pub employee_id: u64,
    pub year: i32,
    #[schema(value_type = String)]
    pub total_hours_entitled: Decimal,
    #[schema(value_type = String)]
    pub hours_used: Decimal,
    /// Part of `total_hours_entitled` rolled over from the previous year.
    #[schema(value_type = String)]
    pub carried_forward_hours: Decimal,
}

impl LeaveEntitlement {
    pub fn remaining_hours(&self) -> Decimal {
        self.total_hours_entitled - self.hours_used
    }

    /// The year's own grant, without the rolled over part.
    pub fn annual_grant_hours(&self) -> Decimal {
        self.total_hours_entitled - self.carried_forward_hours
    }
}

#[derive(Debug, Clone)]
pub struct NewLeaveEntitlement {
    pub employee_id: u64,
    pub year: i32,
    pub total_hours_entitled: Decimal,
    pub carried_forward_hours: Decimal,
}
