//! Request/Response DTOs

use portal_db::{Activity, ActivityField, FieldType, UserRole};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub identifier: String,
    #[serde(alias = "password")]
    pub secret: String,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub role: UserRole,
    pub redirect: String,
}

/// Plain message response
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Admin password change request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSecretRequest {
    /// Admin account to update; the first admin account when omitted
    #[serde(default)]
    pub identifier: Option<String>,
    pub old_secret: String,
    pub new_secret: String,
}

// ==================== Activity Types ====================

/// Custom field as submitted by the admin console
#[derive(Deserialize)]
pub struct ActivityFieldInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub content: String,
}

/// Create or replace activity request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    pub name: String,
    #[serde(default, alias = "activityFields")]
    pub custom_fields: Vec<ActivityFieldInput>,
}

/// Activity response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: i64,
    pub name: String,
    pub custom_fields: Vec<ActivityField>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Activity> for ActivityResponse {
    fn from(activity: Activity) -> Self {
        Self {
            id: activity.id,
            name: activity.name,
            custom_fields: activity.custom_fields,
            created_at: activity.created_at.to_rfc3339(),
            updated_at: activity.updated_at.to_rfc3339(),
        }
    }
}
