pub mod balance;
pub mod leave_request;
pub mod report;
pub mod sprint;
