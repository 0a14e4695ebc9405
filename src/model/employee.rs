use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::record_status::RecordStatus;

/// Employee as resolved at the service boundary. Department name is fetched
/// eagerly so the core never walks relations.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "department_id": 10,
        "department_name": "Sales",
        "hire_date": "2019-01-01",
        "daily_work_hours": "8"
    })
)]
pub struct Employee {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: u64,
    pub department_name: String,
    pub hire_date: NaiveDate,
    /// Unset or non-positive values mean no annual grant can be computed.
    pub daily_work_hours: Option<Decimal>,
    #[serde(skip)]
    pub status: RecordStatus,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Positive daily hours, if any.
    pub fn working_hours_per_day(&self) -> Option<Decimal> {
        self.daily_work_hours.filter(|h| *h > Decimal::ZERO)
    }

    /// Completed years of service on `reference`. Negative when hired later.
    pub fn years_of_service_on(&self, reference: NaiveDate) -> i32 {
        let mut years = reference.year() - self.hire_date.year();
        if (reference.month(), reference.day()) < (self.hire_date.month(), self.hire_date.day()) {
            years -= 1;
        }
        years
    }
}
