use std::sync::Arc;

use chrono::{Datelike, Days, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use super::clock::Clock;
use crate::error::{LeaveError, LeaveResult};
use crate::model::department::Department;
use crate::model::sprint::{NewSprint, Sprint};
use crate::store::LeaveStore;

static SPRINT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Sprint\s+(\d+)").unwrap());

/// Sequence number in a sprint name, 0 when the name carries none.
pub fn sprint_number(name: &str) -> u32 {
    SPRINT_NUMBER
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

pub fn sprint_name(number: u32, department: &str, start: NaiveDate) -> String {
    format!("Sprint {number} - {department} - {}", start.year())
}

/// Sprints following `latest` back to back, up to the first one starting
/// after `horizon`. Empty when the latest sprint has no usable length.
pub fn plan_after(latest: &Sprint, department: &Department, horizon: NaiveDate) -> Vec<NewSprint> {
    let Some(weeks) = latest.duration_weeks.filter(|w| *w > 0) else {
        return Vec::new();
    };
    let length = Days::new(u64::from(weeks) * 7);

    let mut planned = Vec::new();
    let mut number = sprint_number(&latest.name);
    let mut start = latest.end_date + Days::new(1);
    while start <= horizon {
        let Some(end) = (start + length).pred_opt() else {
            break;
        };
        number += 1;
        planned.push(NewSprint {
            name: sprint_name(number, &department.name, start),
            start_date: start,
            end_date: end,
            duration_weeks: Some(weeks),
            department_id: department.id,
        });
        start = end + Days::new(1);
    }
    planned
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateSprint {
    #[schema(example = "Sprint 1 - Sales - 2026")]
    pub name: String,
    #[schema(value_type = String, format = "date", example = "2026-01-05")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date", example = "2026-01-18")]
    pub end_date: NaiveDate,
    #[schema(example = 2)]
    pub duration_weeks: Option<u32>,
    pub department_id: u64,
}

#[derive(Debug, Default, Clone, Serialize, ToSchema)]
pub struct PlanSummary {
    pub created: usize,
    pub failed_departments: Vec<u64>,
}

/// Keeps every department's sprint calendar filled up to the horizon.
#[derive(Clone)]
pub struct SprintPlanner {
    store: Arc<dyn LeaveStore>,
    clock: Arc<dyn Clock>,
    horizon_months: u32,
}

impl SprintPlanner {
    pub fn new(store: Arc<dyn LeaveStore>, clock: Arc<dyn Clock>, horizon_months: u32) -> Self {
        Self {
            store,
            clock,
            horizon_months,
        }
    }

    fn horizon(&self) -> NaiveDate {
        let today = self.clock.today();
        today
            .checked_add_months(Months::new(self.horizon_months))
            .unwrap_or(today)
    }

    /// Plans every active department. A failing department is logged and
    /// skipped.
    #[instrument(skip(self))]
    pub async fn plan_all(&self) -> LeaveResult<PlanSummary> {
        let mut summary = PlanSummary::default();
        for department in self.store.active_departments().await? {
            match self.plan(&department).await {
                Ok(created) => summary.created += created.len(),
                Err(e) => {
                    error!(department_id = department.id, error = %e, "Sprint planning failed");
                    summary.failed_departments.push(department.id);
                }
            }
        }
        info!(
            created = summary.created,
            failed = summary.failed_departments.len(),
            "Sprint planning finished"
        );
        Ok(summary)
    }

    pub async fn plan_department(&self, department_id: u64) -> LeaveResult<Vec<Sprint>> {
        let department = self.department(department_id).await?;
        self.plan(&department).await
    }

    async fn plan(&self, department: &Department) -> LeaveResult<Vec<Sprint>> {
        let Some(latest) = self.store.latest_sprint(department.id).await? else {
            debug!(department_id = department.id, "No sprint yet, skipping");
            return Ok(Vec::new());
        };
        if latest.duration_weeks.is_none_or(|w| w == 0) {
            warn!(
                department_id = department.id,
                sprint = %latest.name,
                "Latest sprint has no duration, skipping"
            );
            return Ok(Vec::new());
        }

        let mut created = Vec::new();
        for new in plan_after(&latest, department, self.horizon()) {
            let sprint = self.store.insert_sprint(new).await?;
            debug!(department_id = department.id, sprint = %sprint.name, "Sprint created");
            created.push(sprint);
        }
        Ok(created)
    }

    async fn department(&self, department_id: u64) -> LeaveResult<Department> {
        self.store
            .find_department(department_id)
            .await?
            .filter(|d| d.status.is_active())
            .ok_or_else(|| LeaveError::not_found(format!("department {department_id}")))
    }

    /// Manual creation, used for a department's first sprint.
    #[instrument(skip(self), fields(department_id = input.department_id))]
    pub async fn create_sprint(&self, input: CreateSprint) -> LeaveResult<Sprint> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(LeaveError::validation("sprint name is required"));
        }
        if input.end_date < input.start_date {
            return Err(LeaveError::validation("sprint end date cannot be before its start date"));
        }
        if input.duration_weeks == Some(0) {
            return Err(LeaveError::validation("sprint duration must be at least one week"));
        }
        let department = self.department(input.department_id).await?;

        let sprint = self
            .store
            .insert_sprint(NewSprint {
                name: name.to_string(),
                start_date: input.start_date,
                end_date: input.end_date,
                duration_weeks: input.duration_weeks,
                department_id: department.id,
            })
            .await?;
        info!(sprint_id = sprint.id, sprint = %sprint.name, "Sprint created");
        Ok(sprint)
    }
}
