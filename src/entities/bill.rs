//! Bill entity - an uploaded expense for an event, amounts in minor currency units

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Bill {
    pub bill_id: i64,
    pub event_id: i64,
    pub payer_id: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub tip_cents: i64,
    pub total_cents: i64,
    pub currency: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct BillItem {
    pub bill_item_id: i64,
    pub bill_id: i64,
    pub label: String,
    pub amount_cents: i64,
    pub quantity: i64,
}
