//! OrgSettingRepository - single-row org_settings table

use crate::entities::OrgSetting;
use sqlx::{Error, SqlitePool};

pub struct OrgSettingRepository {
    connection_pool: SqlitePool,
}

impl OrgSettingRepository {
    pub fn new(connection_pool: SqlitePool) -> OrgSettingRepository {
        Self { connection_pool }
    }

    /// The row is created by the initial migration
    pub async fn get(&self) -> Result<OrgSetting, Error> {
        sqlx::query_as::<_, OrgSetting>(
            "SELECT id, org_name, current_wip_window_id FROM org_settings WHERE id = 1",
        )
        .fetch_one(&self.connection_pool)
        .await
    }
}
