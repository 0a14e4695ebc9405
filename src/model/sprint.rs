use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::record_status::RecordStatus;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Sprint {
    pub id: u64,
    pub name: String,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    /// Length the planner reuses for the following sprints.
    pub duration_weeks: Option<u32>,
    pub department_id: u64,
    #[serde(skip)]
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSprint {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_weeks: Option<u32>,
    pub department_id: u64,
}
