//! SQLite projection of the care-tracking tables
//!
//! Queries the tables owned by the surrounding account/calendar/tracker
//! features. Strictly read-only.

use crate::care::{CalendarEvent, CareData, HealthMetrics, UserProfile};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Local;
use sqlx::SqlitePool;

/// [`CareData`] implementation over the shared SQLite pool
#[derive(Clone)]
pub struct SqliteCareData {
    pool: SqlitePool,
}

impl SqliteCareData {
    /// Wrap an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn today() -> String {
        Local::now().date_naive().to_string()
    }
}

#[async_trait]
impl CareData for SqliteCareData {
    async fn get_user_profile(&self, user_id: i64) -> Result<Option<UserProfile>, AppError> {
        let row: Option<(Option<String>, Option<String>)> =
            sqlx::query_as("SELECT user_name, user_birthday FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(name, birthday)| UserProfile { name, birthday }))
    }

    async fn get_today_events(&self, user_id: i64) -> Result<Vec<CalendarEvent>, AppError> {
        let events = sqlx::query_as::<_, CalendarEvent>(
            "SELECT title, event_time, description FROM calendar_events \
             WHERE user_id = ? AND event_date = ? ORDER BY event_time ASC",
        )
        .bind(user_id)
        .bind(Self::today())
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn get_today_health_metrics(
        &self,
        user_id: i64,
    ) -> Result<Option<HealthMetrics>, AppError> {
        let metrics = sqlx::query_as::<_, HealthMetrics>(
            "SELECT sleep_hours, water_intake, steps FROM health_tracking \
             WHERE user_id = ? AND track_date = ?",
        )
        .bind(user_id)
        .bind(Self::today())
        .fetch_optional(&self.pool)
        .await?;

        // An all-zero row means nothing was actually tracked today
        Ok(metrics.filter(|m| !m.is_empty()))
    }
}
