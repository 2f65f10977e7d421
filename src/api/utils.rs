//! API utility functions
//!
//! Shared router state, caller-identity extraction and request validation
//! used by the session handlers.

use crate::assistant::Assistant;
use crate::chat::ChatDb;
use crate::error::AppError;
use axum::http::HeaderMap;
use std::sync::Arc;

/// Shared state handed to every handler
pub type RouterState = (Arc<ChatDb>, Arc<Assistant>);

/// Maximum message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Header carrying the authenticated caller's user id
///
/// Token verification lives in front of this service; what arrives here is
/// the already-resolved identity. A missing or malformed header is an
/// explicit authentication failure, never a silent fallback user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolve the caller's user id from request headers
pub fn extract_user_id(headers: &HeaderMap) -> Result<i64, AppError> {
    let value = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".to_string()))?;

    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::Unauthorized("Invalid X-User-Id header".to_string()))
}

/// Validate an inbound chat message
///
/// # Returns
/// * `Ok(())` - Message is valid
/// * `Err(AppError)` - Message is empty or too long
pub fn validate_message(message: &str) -> Result<(), AppError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest(
            "Message content required".to_string(),
        ));
    }
    if trimmed.len() > MAX_MESSAGE_LENGTH {
        return Err(AppError::InvalidRequest(format!(
            "Message exceeds maximum length of {} characters",
            MAX_MESSAGE_LENGTH
        )));
    }
    Ok(())
}
