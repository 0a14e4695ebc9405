pub mod clock;
pub mod duration;
pub mod entitlement;
pub mod leave_request;
pub mod notifier;
pub mod overlap;
pub mod report;
pub mod sprint_planner;
pub mod workflow;
