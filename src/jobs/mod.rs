//! Recurring background work: sprint planning and opening the leave year.

mod scheduler;
mod sprint_planning;
mod year_opening;

pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use sprint_planning::SprintPlanningJob;
pub use year_opening::YearOpeningJob;
