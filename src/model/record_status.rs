use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Soft-delete lifecycle carried by every persisted entity. Queries filter on
/// `Active` explicitly.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Deleted,
}

impl RecordStatus {
    pub fn is_active(&self) -> bool {
        *self == RecordStatus::Active
    }
}
