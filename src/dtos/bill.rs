//! Bill DTOs

use super::UserDTO;
use crate::entities::{Attachment, Bill, BillItem};
use crate::receipt::MAX_RECEIPT_BYTES;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Upper bound for any single amount and for a bill total, in minor units
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;
pub const MAX_ITEM_QUANTITY: i64 = 10_000;

/// One uploaded receipt file; `url` is usually an inline `data:` URL
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct BillFileDTO {
    #[validate(length(min = 1, max = 255, message = "File name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "File content is required"))]
    pub url: String,
    #[validate(range(min = 0, max = MAX_RECEIPT_BYTES, message = "File is too large (max 10MB)"))]
    pub size: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct BillItemRequestDTO {
    #[validate(length(min = 1, max = 200, message = "Item label must be between 1 and 200 characters"))]
    pub label: String,
    #[validate(range(min = 0, max = MAX_AMOUNT_CENTS, message = "Amounts must be between 0 and 10,000,000,000.00"))]
    pub amount_cents: i64,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = MAX_ITEM_QUANTITY, message = "Quantity must be between 1 and 10000"))]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// Body of `POST /events/{id}/bills`
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[validate(schema(function = "validate_totals"))]
pub struct CreateBillRequestDTO {
    pub notes: Option<String>,
    #[validate(length(min = 3, max = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,
    #[validate(range(min = 0, max = MAX_AMOUNT_CENTS, message = "Amounts must be between 0 and 10,000,000,000.00"))]
    pub subtotal_cents: Option<i64>,
    #[validate(range(min = 0, max = MAX_AMOUNT_CENTS, message = "Amounts must be between 0 and 10,000,000,000.00"))]
    pub tax_cents: Option<i64>,
    #[validate(range(min = 0, max = MAX_AMOUNT_CENTS, message = "Amounts must be between 0 and 10,000,000,000.00"))]
    pub tip_cents: Option<i64>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<BillItemRequestDTO>,
    #[validate(length(min = 1, message = "At least one receipt file is required"), nested)]
    pub files: Vec<BillFileDTO>,
}

fn validate_totals(dto: &CreateBillRequestDTO) -> Result<(), ValidationError> {
    match dto.total() {
        Some(total) if total <= MAX_AMOUNT_CENTS => Ok(()),
        _ => {
            let mut err = ValidationError::new("total");
            err.message = Some("Bill total must not exceed 10,000,000,000.00".into());
            Err(err)
        }
    }
}

impl CreateBillRequestDTO {
    /// Explicit subtotal, or the sum of the line items when omitted.
    /// `None` on overflow.
    pub fn subtotal(&self) -> Option<i64> {
        match self.subtotal_cents {
            Some(subtotal) => Some(subtotal),
            None => self.items.iter().try_fold(0i64, |sum, item| {
                item.amount_cents
                    .checked_mul(item.quantity)
                    .and_then(|line| sum.checked_add(line))
            }),
        }
    }

    pub fn total(&self) -> Option<i64> {
        self.subtotal()?
            .checked_add(self.tax_cents.unwrap_or(0))?
            .checked_add(self.tip_cents.unwrap_or(0))
    }
}

#[derive(Debug, Clone)]
pub struct CreateBillItemDTO {
    pub label: String,
    pub amount_cents: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone)]
pub struct CreateAttachmentDTO {
    pub file_name: String,
    pub url: String,
    pub size_bytes: i64,
    pub mime_type: String,
}

/// Insert payload for a bill together with its items and attachments,
/// written in one transaction
#[derive(Debug, Clone)]
pub struct CreateBillDTO {
    pub event_id: i64,
    pub payer_id: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub tip_cents: i64,
    pub total_cents: i64,
    pub currency: String,
    pub notes: Option<String>,
    pub items: Vec<CreateBillItemDTO>,
    pub attachments: Vec<CreateAttachmentDTO>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BillDTO {
    #[serde(flatten)]
    pub bill: Bill,
    pub payer: Option<UserDTO>,
    pub attachments: Vec<Attachment>,
    pub items: Vec<BillItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subtotal_defaults_to_item_sum() {
        let dto: CreateBillRequestDTO = serde_json::from_value(json!({
            "tax_cents": 50,
            "items": [
                { "label": "Dosa", "amount_cents": 120, "quantity": 2 },
                { "label": "Coffee", "amount_cents": 60 }
            ],
            "files": [{ "name": "r.jpg", "url": "data:image/jpeg;base64,AA==", "size": 1 }]
        }))
        .unwrap();
        assert_eq!(dto.subtotal(), Some(300));
        assert_eq!(dto.total(), Some(350));
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_amounts_beyond_limit_are_rejected() {
        let dto: CreateBillRequestDTO = serde_json::from_value(json!({
            "subtotal_cents": i64::MAX,
            "tax_cents": 1,
            "files": [{ "name": "r.jpg", "url": "data:image/jpeg;base64,AA==", "size": 1 }]
        }))
        .unwrap();
        assert_eq!(dto.total(), None);
        let errors = dto.validate().unwrap_err();
        assert!(errors.errors().contains_key("subtotal_cents"));
    }

    #[test]
    fn test_item_sum_overflow_is_rejected() {
        let items: Vec<_> = (0..1000)
            .map(|_| json!({ "label": "Gold", "amount_cents": MAX_AMOUNT_CENTS, "quantity": MAX_ITEM_QUANTITY }))
            .collect();
        let dto: CreateBillRequestDTO = serde_json::from_value(json!({
            "items": items,
            "files": [{ "name": "r.jpg", "url": "data:image/jpeg;base64,AA==", "size": 1 }]
        }))
        .unwrap();
        assert_eq!(dto.subtotal(), None);
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_total_above_limit_is_rejected() {
        let dto: CreateBillRequestDTO = serde_json::from_value(json!({
            "subtotal_cents": MAX_AMOUNT_CENTS,
            "tip_cents": 1,
            "files": [{ "name": "r.jpg", "url": "data:image/jpeg;base64,AA==", "size": 1 }]
        }))
        .unwrap();
        assert_eq!(dto.total(), Some(MAX_AMOUNT_CENTS + 1));
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_files_are_required() {
        let dto: CreateBillRequestDTO =
            serde_json::from_value(json!({ "notes": "x", "files": [] })).unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.errors().contains_key("files"));
    }

    #[test]
    fn test_oversized_file_is_rejected() {
        let dto: CreateBillRequestDTO = serde_json::from_value(json!({
            "files": [{ "name": "big.pdf", "url": "https://x/big.pdf", "size": MAX_RECEIPT_BYTES + 1 }]
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }
}
