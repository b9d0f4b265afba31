//! Activity operations

use chrono::Utc;
use sqlx::Row;
use tracing::debug;

use crate::error::DbError;
use crate::models::{Activity, NewActivity};
use crate::repository::Database;

impl Database {
    /// Insert a new activity
    pub async fn insert_activity(&self, activity: NewActivity) -> Result<Activity, DbError> {
        let now = Utc::now();
        let fields_json = serde_json::to_string(&activity.custom_fields)?;

        let result = sqlx::query(
            r#"
            INSERT INTO activities (name, custom_fields, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&activity.name)
        .bind(&fields_json)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");
        debug!("Inserted activity {} ({})", id, activity.name);

        Ok(Activity {
            id,
            name: activity.name,
            custom_fields: activity.custom_fields,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get an activity by ID
    pub async fn get_activity(&self, id: i64) -> Result<Option<Activity>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, custom_fields, created_at, updated_at
            FROM activities
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Activity::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all activities, newest first
    pub async fn list_activities(&self) -> Result<Vec<Activity>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, custom_fields, created_at, updated_at
            FROM activities
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Activity::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Replace the name and fields of an activity
    pub async fn update_activity(&self, id: i64, activity: NewActivity) -> Result<Activity, DbError> {
        let now = Utc::now();
        let fields_json = serde_json::to_string(&activity.custom_fields)?;

        let row = sqlx::query(
            r#"
            UPDATE activities
            SET name = ?, custom_fields = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, name, custom_fields, created_at, updated_at
            "#,
        )
        .bind(&activity.name)
        .bind(&fields_json)
        .bind(now.to_rfc3339())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("Activity: {}", id)))?;

        Activity::try_from(&row).map_err(DbError::from)
    }

    /// Delete an activity
    pub async fn delete_activity(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM activities WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
