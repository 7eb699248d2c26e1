//! WipWindow DTOs

use super::validate_not_blank;
use crate::entities::{OrgSetting, WipWindow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Body of `POST /wip-windows`, also used as insert payload
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[validate(schema(function = "validate_create_range"))]
pub struct CreateWipWindowDTO {
    #[validate(
        length(min = 1, max = 100, message = "Name is required (max 100 characters)"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub is_active: bool,
}

fn validate_create_range(dto: &CreateWipWindowDTO) -> Result<(), ValidationError> {
    check_range(&dto.start_date, &dto.end_date)
}

/// Rejects windows that end before they start.
pub fn check_range(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<(), ValidationError> {
    if end < start {
        let mut err = ValidationError::new("date_range");
        err.message = Some("end_date must not be before start_date".into());
        return Err(err);
    }
    Ok(())
}

/// Body of `PATCH /wip-windows/{id}`; only `Some(_)` fields change
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateWipWindowDTO {
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

/// Window with its derived counters
#[derive(Serialize, Deserialize, Debug, sqlx::FromRow)]
pub struct WipWindowDTO {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub window: WipWindow,
    pub event_count: i64,
    pub participant_count: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SettingsDTO {
    #[serde(flatten)]
    pub settings: OrgSetting,
    pub current_wip_window: Option<WipWindow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reversed_range_is_rejected() {
        let dto = CreateWipWindowDTO {
            name: "Spring".to_string(),
            start_date: Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            is_active: false,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let dto = CreateWipWindowDTO {
            name: String::new(),
            start_date: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap(),
            is_active: true,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_blank_names_are_rejected() {
        let dto = CreateWipWindowDTO {
            name: "   ".to_string(),
            start_date: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap(),
            is_active: false,
        };
        assert!(dto.validate().unwrap_err().field_errors().contains_key("name"));

        let patch = UpdateWipWindowDTO {
            name: Some("\t ".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        assert!(UpdateWipWindowDTO::default().validate().is_ok());
    }
}
