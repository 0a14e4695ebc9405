use chrono::NaiveDate;
use serde::Serialize;

use super::record_status::RecordStatus;

#[derive(Debug, Clone, Serialize)]
pub struct PublicHoliday {
    pub id: u64,
    pub date: NaiveDate,
    pub name: String,
    /// Eve of a holiday: counts as half a working day.
    pub half_day: bool,
    #[serde(skip)]
    pub status: RecordStatus,
}
