use serde::{Deserialize, Serialize};

use super::record_status::RecordStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: u64,
    pub name: String,
    #[serde(skip)]
    pub status: RecordStatus,
}
