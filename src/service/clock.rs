use chrono::{NaiveDate, NaiveDateTime};

/// Source of "now". Injected everywhere tenure, monthly caps or past dates
/// are evaluated.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock in the server's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

#[cfg(test)]
pub(crate) use fixed::FixedClock;
