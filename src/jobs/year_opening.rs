use std::sync::Arc;

use async_trait::async_trait;
use chrono::Datelike;

use super::scheduler::{Job, JobFrequency};
use crate::service::clock::Clock;
use crate::service::entitlement::EntitlementLedger;

/// Makes sure every active employee has an entitlement for the current year.
pub struct YearOpeningJob {
    ledger: EntitlementLedger,
    clock: Arc<dyn Clock>,
    frequency: JobFrequency,
}

impl YearOpeningJob {
    pub fn new(ledger: EntitlementLedger, clock: Arc<dyn Clock>, frequency: JobFrequency) -> Self {
        Self {
            ledger,
            clock,
            frequency,
        }
    }
}

#[async_trait]
impl Job for YearOpeningJob {
    fn name(&self) -> &'static str {
        "year_opening"
    }

    fn frequency(&self) -> JobFrequency {
        self.frequency
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let opening = self.ledger.open_year(self.clock.today().year()).await?;
        if !opening.failed_employees.is_empty() {
            anyhow::bail!(
                "leave year {} could not be opened for employees {:?}",
                opening.year,
                opening.failed_employees
            );
        }
        Ok(())
    }
}
