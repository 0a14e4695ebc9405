use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::{LeaveError, LeaveResult};
use crate::model::leave_request::LeaveStatus;
use crate::store::LeaveStore;

#[derive(Clone)]
pub struct OverlapValidator {
    store: Arc<dyn LeaveStore>,
}

impl OverlapValidator {
    pub fn new(store: Arc<dyn LeaveStore>) -> Self {
        Self { store }
    }

    /// True when a request of the employee outside `excluded` intersects the
    /// half-open range `[start, end)`.
    pub async fn overlaps(
        &self,
        employee_id: u64,
        start: NaiveDateTime,
        end: NaiveDateTime,
        excluded: &[LeaveStatus],
    ) -> LeaveResult<bool> {
        self.store
            .has_overlapping_request(employee_id, start, end, excluded)
            .await
    }

    /// Fails with `Overlap` when the range collides with a live request.
    pub async fn ensure_free(
        &self,
        employee_id: u64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> LeaveResult<()> {
        if self
            .overlaps(employee_id, start, end, &LeaveStatus::INACTIVE)
            .await?
        {
            return Err(LeaveError::Overlap);
        }
        Ok(())
    }
}
