pub mod actor;
pub mod department;
pub mod employee;
pub mod entitlement;
pub mod holiday;
pub mod leave_request;
pub mod leave_type;
pub mod record_status;
pub mod role;
pub mod sprint;
pub mod transition;
