use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Roles carried in access tokens. The same identifiers name the steps of a
/// leave type's approval chain.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    Manager = 4,
    Ceo = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::Manager),
            5 => Some(Role::Ceo),
            _ => None,
        }
    }

    /// Roles that may look at other people's requests.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Manager | Role::Hr | Role::Ceo | Role::Admin)
    }

    /// Roles whose view is company wide rather than limited to a department.
    pub fn sees_all_departments(&self) -> bool {
        matches!(self, Role::Hr | Role::Ceo | Role::Admin)
    }
}
