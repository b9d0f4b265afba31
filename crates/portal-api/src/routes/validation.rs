//! Input validation shared by the routes

use portal_db::{ActivityField, FieldType, MAX_USERNAME_LENGTH, NewActivity};
use std::collections::HashSet;

use crate::error::ApiError;

use super::types::ActivityRequest;

/// Maximum allowed password length (prevent DoS with very large passwords)
pub const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum length for newly chosen passwords
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum allowed activity name length
pub const MAX_ACTIVITY_NAME_LENGTH: usize = 128;

/// Validate an identifier presented for lookup.
///
/// Only emptiness and length are checked; whether the account exists is
/// the store's answer.
pub fn validate_identifier(identifier: &str) -> Result<(), ApiError> {
    if identifier.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if identifier.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    Ok(())
}

/// Validate a password presented for verification
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::BadRequest("Password cannot be empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Validate a password about to be stored
pub fn validate_new_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    validate_password(password)
}

/// Check an activity request and turn it into storable contents.
///
/// Field order is kept as submitted. Fields without an id get a fresh one.
pub fn validate_activity(request: ActivityRequest) -> Result<NewActivity, ApiError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Activity name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_ACTIVITY_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Activity name exceeds maximum length of {} characters",
            MAX_ACTIVITY_NAME_LENGTH
        )));
    }

    let mut seen = HashSet::new();
    let mut custom_fields = Vec::with_capacity(request.custom_fields.len());

    for (index, field) in request.custom_fields.into_iter().enumerate() {
        let field_name = field.name.trim().to_string();
        if field_name.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Field {} has an empty name",
                index + 1
            )));
        }

        let id = field
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if !seen.insert(id.clone()) {
            return Err(ApiError::BadRequest(format!("Duplicate field id: {}", id)));
        }

        if field.field_type == FieldType::Number
            && !field.content.trim().is_empty()
            && field.content.trim().parse::<f64>().is_err()
        {
            return Err(ApiError::BadRequest(format!(
                "Field '{}' must contain a number",
                field_name
            )));
        }

        custom_fields.push(ActivityField {
            id,
            name: field_name,
            field_type: field.field_type,
            content: field.content,
        });
    }

    Ok(NewActivity { name, custom_fields })
}
