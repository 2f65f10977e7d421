//! Collaborator contracts for the surrounding care-tracking system
//!
//! The assistant pipeline does not own user accounts, calendars or health
//! trackers; it reads narrow projections of them through the [`CareData`]
//! trait. The production implementation is a set of read-only SQLite queries
//! ([`db::SqliteCareData`]); tests substitute fixed-value stubs.

pub mod db;

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use db::SqliteCareData;

/// Read-only projection of a user profile used for personalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name, if the user has set one
    pub name: Option<String>,
    /// Birthday as an ISO date string, if set
    pub birthday: Option<String>,
}

/// A calendar event scheduled for today
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CalendarEvent {
    /// Event title
    pub title: String,
    /// Event time as "HH:MM"
    pub event_time: String,
    /// Optional free-text description
    pub description: Option<String>,
}

/// One day's tracked health metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::FromRow)]
pub struct HealthMetrics {
    /// Hours slept
    pub sleep_hours: f64,
    /// Glasses of water
    pub water_intake: f64,
    /// Step count
    pub steps: i64,
}

impl HealthMetrics {
    /// A row where nothing was tracked carries no signal
    pub fn is_empty(&self) -> bool {
        self.sleep_hours == 0.0 && self.water_intake == 0.0 && self.steps == 0
    }
}

/// Read-only access to the care-tracking data the assistant consumes
#[async_trait]
pub trait CareData: Send + Sync {
    /// Fetch the profile projection for a user, if the user exists
    async fn get_user_profile(&self, user_id: i64) -> Result<Option<UserProfile>, AppError>;

    /// Fetch today's calendar events for a user, time-ascending
    async fn get_today_events(&self, user_id: i64) -> Result<Vec<CalendarEvent>, AppError>;

    /// Fetch today's tracked health metrics for a user, if a row exists
    async fn get_today_health_metrics(
        &self,
        user_id: i64,
    ) -> Result<Option<HealthMetrics>, AppError>;
}
