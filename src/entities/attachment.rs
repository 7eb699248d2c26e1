//! Attachment entity - a receipt file attached to a bill

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Attachment {
    pub attachment_id: i64,
    pub bill_id: i64,
    pub file_name: String,
    // either a remote reference or an inline `data:` URL
    pub url: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub uploaded_by_id: String,
    pub created_at: DateTime<Utc>,
}
