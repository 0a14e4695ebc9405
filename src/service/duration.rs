use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::error::{LeaveError, LeaveResult};
use crate::model::holiday::PublicHoliday;
use crate::store::LeaveStore;

pub const ZERO: Decimal = Decimal::ZERO;
pub const HALF_DAY: Decimal = dec!(0.5);
pub const ONE_DAY: Decimal = Decimal::ONE;

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Holidays of a date range keyed by day. A second row for the same day is
/// ignored.
#[derive(Debug, Default)]
pub struct HolidayCalendar {
    days: HashMap<NaiveDate, bool>,
}

impl HolidayCalendar {
    pub fn new(holidays: impl IntoIterator<Item = PublicHoliday>) -> Self {
        let mut days = HashMap::new();
        for holiday in holidays.into_iter().filter(|h| h.status.is_active()) {
            days.entry(holiday.date).or_insert(holiday.half_day);
        }
        Self { days }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Working-day weight of one date.
    pub fn weight(&self, date: NaiveDate) -> Decimal {
        if is_weekend(date) {
            return ZERO;
        }
        match self.days.get(&date) {
            Some(true) => HALF_DAY,
            Some(false) => ZERO,
            None => ONE_DAY,
        }
    }

    /// Working days in `[start, end]`, both inclusive.
    pub fn working_days(&self, start: NaiveDate, end: NaiveDate) -> Decimal {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| self.weight(d))
            .sum()
    }
}

/// Whole hours between two instants, truncated.
pub fn whole_hours(start: NaiveDateTime, end: NaiveDateTime) -> Decimal {
    Decimal::from((end - start).num_hours().max(0))
}

/// Working-duration calculation against the stored holiday calendar.
#[derive(Clone)]
pub struct DurationCalculator {
    store: Arc<dyn LeaveStore>,
}

impl DurationCalculator {
    pub fn new(store: Arc<dyn LeaveStore>) -> Self {
        Self { store }
    }

    async fn calendar(&self, start: NaiveDate, end: NaiveDate) -> LeaveResult<HolidayCalendar> {
        Ok(HolidayCalendar::new(
            self.store.holidays_between(start, end).await?,
        ))
    }

    /// Working days in the inclusive range. Weekends count 0, full holidays 0,
    /// half-day holidays 0.5. A missing bound yields zero.
    pub async fn working_days(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> LeaveResult<Decimal> {
        let (Some(start), Some(end)) = (start, end) else {
            warn!(?start, ?end, "Duration requested without both dates, counting zero");
            return Ok(ZERO);
        };
        if end < start {
            return Err(LeaveError::validation("end date cannot be before start date"));
        }

        let days = self.calendar(start, end).await?.working_days(start, end);
        debug!(%start, %end, %days, "Working days calculated");
        Ok(days)
    }

    /// Working days converted with the employee's daily hours.
    pub async fn working_hours(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        daily_hours: Decimal,
    ) -> LeaveResult<Decimal> {
        Ok(self.working_days(Some(start), Some(end)).await? * daily_hours)
    }

    /// Duration of an hour-unit request. Neither end may fall on a weekend or
    /// a public holiday.
    pub async fn request_hours(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> LeaveResult<Decimal> {
        if end < start {
            return Err(LeaveError::validation("end date cannot be before start date"));
        }
        let (first, last) = (start.date(), end.date());
        if is_weekend(first) || is_weekend(last) {
            return Err(LeaveError::rule("hourly leave cannot be taken on a weekend"));
        }
        let calendar = self.calendar(first, last).await?;
        if calendar.is_holiday(first) || calendar.is_holiday(last) {
            return Err(LeaveError::rule("hourly leave cannot be taken on a public holiday"));
        }
        Ok(whole_hours(start, end))
    }
}
