//! Request extractors

use crate::core::AppError;
use axum_macros::FromRequest;

/// `Json` whose rejections (malformed JSON, unknown enum values, missing fields)
/// become a 400 `AppError` instead of axum's plain-text 422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
