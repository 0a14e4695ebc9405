use async_trait::async_trait;

use super::scheduler::{Job, JobFrequency};
use crate::service::sprint_planner::SprintPlanner;

/// Extends every department's sprint calendar up to the planning horizon.
pub struct SprintPlanningJob {
    planner: SprintPlanner,
    frequency: JobFrequency,
}

impl SprintPlanningJob {
    pub fn new(planner: SprintPlanner, frequency: JobFrequency) -> Self {
        Self { planner, frequency }
    }
}

#[async_trait]
impl Job for SprintPlanningJob {
    fn name(&self) -> &'static str {
        "sprint_planning"
    }

    fn frequency(&self) -> JobFrequency {
        self.frequency
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let summary = self.planner.plan_all().await?;
        if !summary.failed_departments.is_empty() {
            anyhow::bail!(
                "{} sprints created, planning failed for departments {:?}",
                summary.created,
                summary.failed_departments
            );
        }
        Ok(())
    }
}
