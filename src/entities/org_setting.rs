//! OrgSetting entity - single row of organisation-wide settings

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct OrgSetting {
    pub id: i64,
    pub org_name: String,
    pub current_wip_window_id: Option<i64>,
}
