//! Bill services - receipt upload, removal and the bills archive

use super::event::{find_event, load_event_detail};
use crate::archive::{archive_file_name, build_bills_archive};
use crate::core::{AppError, AppJson, AppState};
use crate::dtos::{
    BillDTO, CreateAttachmentDTO, CreateBillDTO, CreateBillItemDTO, CreateBillRequestDTO, UserDTO,
};
use crate::entities::User;
use crate::receipt::{MAX_RECEIPT_BYTES, decode_data_url, detect_mime, parse_data_url};
use crate::repositories::{Create, Delete, Read};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_macros::debug_handler;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

const DEFAULT_BILL_NOTES: &str = "Receipt uploaded";
const DEFAULT_CURRENCY: &str = "INR";

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, files = body.files.len()))]
pub async fn create_bill(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
    AppJson(body): AppJson<CreateBillRequestDTO>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Uploading bill for event {}", event_id);
    // 1. The event must exist; the caller must be its creator or one of its invitees
    // 2. Validate amounts and files, every file must be a JPEG, PNG or PDF
    // 3. Store bill, items and attachments together
    // 4. Return the bill with payer, attachments and items
    let event = find_event(&state, event_id).await?;

    let is_creator = event.creator_id == current_user.user_id;
    if !is_creator {
        let is_invitee = state
            .attendance
            .find_by_event(event_id)
            .await?
            .iter()
            .any(|a| a.belongs_to(&current_user.user_id, &current_user.email));
        if !is_invitee {
            warn!("User is not part of event {}", event_id);
            return Err(AppError::forbidden(
                "Only event participants can upload receipts",
            ));
        }
    }

    body.validate()?;

    let mut attachments = Vec::with_capacity(body.files.len());
    for file in &body.files {
        let mime_type = detect_mime(&file.name, &file.url).ok_or_else(|| {
            warn!("Rejected receipt {} with unsupported type", file.name);
            AppError::bad_request("Unsupported file type")
                .with_details(format!("{}: only JPEG, PNG and PDF receipts are accepted", file.name))
        })?;
        // inline receipts are measured by their decoded payload, not the declared size
        let size_bytes = match parse_data_url(&file.url) {
            Some(_) => decode_data_url(&file.url)
                .map(|bytes| bytes.len() as i64)
                .ok_or_else(|| {
                    warn!("Rejected receipt {} with malformed data", file.name);
                    AppError::bad_request("Invalid file content")
                        .with_details(format!("{}: the inline data could not be decoded", file.name))
                })?,
            None => file.size,
        };
        if size_bytes > MAX_RECEIPT_BYTES {
            warn!("Rejected receipt {} of {} bytes", file.name, size_bytes);
            return Err(AppError::bad_request("File is too large (max 10MB)")
                .with_details(format!("{}: {} bytes", file.name, size_bytes)));
        }

        attachments.push(CreateAttachmentDTO {
            file_name: file.name.clone(),
            url: file.url.clone(),
            size_bytes,
            mime_type: mime_type.to_string(),
        });
    }

    let (Some(subtotal_cents), Some(total_cents)) = (body.subtotal(), body.total()) else {
        warn!("Bill amounts overflow");
        return Err(AppError::bad_request("Validation error")
            .with_details("Bill total must not exceed 10,000,000,000.00"));
    };

    let data = CreateBillDTO {
        event_id,
        payer_id: current_user.user_id.clone(),
        subtotal_cents,
        tax_cents: body.tax_cents.unwrap_or(0),
        tip_cents: body.tip_cents.unwrap_or(0),
        total_cents,
        currency: body
            .currency
            .as_deref()
            .map(str::to_uppercase)
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        notes: Some(
            body.notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_BILL_NOTES)
                .to_string(),
        ),
        items: body
            .items
            .iter()
            .map(|item| CreateBillItemDTO {
                label: item.label.clone(),
                amount_cents: item.amount_cents,
                quantity: item.quantity,
            })
            .collect(),
        attachments,
    };

    let bill = state.bill.create(&data).await?;
    let bill_ids = [bill.bill_id];
    let (items, attachments) = futures::try_join!(
        state.bill.items_for_bills(&bill_ids),
        state.attachment.find_by_bills(&bill_ids),
    )?;

    info!("Bill {} created for event {}", bill.bill_id, event_id);
    Ok((
        StatusCode::CREATED,
        Json(BillDTO {
            bill,
            payer: Some(UserDTO::from(&current_user)),
            attachments,
            items,
        }),
    ))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_bill(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path((event_id, bill_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting bill {} of event {}", bill_id, event_id);
    let bill = state.bill.read(&bill_id).await?.ok_or_else(|| {
        warn!("Bill {} not found", bill_id);
        AppError::not_found("Receipt not found")
    })?;
    if bill.event_id != event_id {
        warn!("Bill {} belongs to event {}", bill_id, bill.event_id);
        return Err(AppError::not_found("Receipt not found in this event"));
    }

    let event = find_event(&state, event_id).await?;
    if bill.payer_id != current_user.user_id && event.creator_id != current_user.user_id {
        warn!("User may not delete bill {}", bill_id);
        return Err(AppError::forbidden(
            "Only the uploader or the event creator can delete this receipt",
        ));
    }

    state.bill.delete(&bill_id).await?;
    info!("Bill {} deleted", bill_id);
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn download_bills(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Building bills archive for event {}", event_id);
    let event = find_event(&state, event_id).await?;
    let detail = load_event_detail(&state, event).await?;

    let is_creator = detail.event.creator_id == current_user.user_id;
    let is_confirmed = detail.attendances.iter().any(|a| {
        a.attendance.is_confirmed()
            && a.attendance
                .belongs_to(&current_user.user_id, &current_user.email)
    });
    if !is_creator && !is_confirmed {
        warn!("User may not download bills of event {}", event_id);
        return Err(AppError::forbidden(
            "Only the event creator or confirmed attendees can download bills",
        ));
    }

    let bytes = build_bills_archive(&detail).map_err(|e| {
        error!("Failed to build bills archive: {:?}", e);
        AppError::internal_server_error("Failed to build bills archive")
    })?;

    info!("Bills archive for event {} is {} bytes", event_id, bytes.len());
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    archive_file_name(&detail.event.title)
                ),
            ),
        ],
        bytes,
    ))
}
