use super::role::Role;

/// Identity acting on a request, resolved by the caller from its own context.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Actor {
    pub employee_id: u64,
    pub role: Role,
}

impl Actor {
    pub fn new(employee_id: u64, role: Role) -> Self {
        Self { employee_id, role }
    }
}
