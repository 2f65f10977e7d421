//! Chat database operations
//!
//! Handles all database interactions for chat sessions and messages.

use crate::chat::models::{ChatSession, Message};
use crate::chat::MAX_TOPIC_LEN;
use crate::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// Database connection pool for chat operations
pub struct ChatDb {
    pool: SqlitePool,
}

impl ChatDb {
    /// Initialize database connection pool and run migrations
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        // Ensure parent directory exists
        if let Some(parent) = PathBuf::from(db_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to create db directory: {}", e))
            })?;
        }

        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid database path: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to connect to database: {}", e))
            })?;

        info!("Connected to SQLite database at: {}", db_path);

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_chat.sql");

        // sqlx executes one statement per query; strip comments and split
        let cleaned: String = migration_sql
            .lines()
            .map(|line| match line.find("--") {
                Some(pos) => &line[..pos],
                None => line,
            })
            .collect::<Vec<_>>()
            .join("\n");

        for statement in cleaned.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&self.pool).await.map_err(|e| {
                AppError::Internal(anyhow::anyhow!(
                    "Migration failed: {} - Statement: {}",
                    e,
                    statement.chars().take(100).collect::<String>()
                ))
            })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Create a new chat session
    pub async fn create_session(&self, session: &ChatSession) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO chat_sessions (id, user_id, topic, summary, start_time, end_time) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(&session.topic)
        .bind(&session.summary)
        .bind(session.start_time)
        .bind(session.end_time)
        .execute(&self.pool)
        .await?;

        debug!("Created chat session: {}", session.id);
        Ok(())
    }

    /// Get a session by token, scoped to its owner
    pub async fn get_session(
        &self,
        user_id: i64,
        session_id: &str,
    ) -> Result<Option<ChatSession>, AppError> {
        let session = sqlx::query_as::<_, ChatSession>(
            "SELECT id, user_id, topic, summary, start_time, end_time \
             FROM chat_sessions WHERE user_id = ? AND id = ?",
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Get all sessions for a user, most recently started first
    pub async fn list_sessions(&self, user_id: i64) -> Result<Vec<ChatSession>, AppError> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            "SELECT id, user_id, topic, summary, start_time, end_time \
             FROM chat_sessions WHERE user_id = ? ORDER BY start_time DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Delete a session (cascades to its messages)
    pub async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM chat_sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        debug!("Deleted chat session: {}", session_id);
        Ok(())
    }

    /// Clear the end timestamp, reactivating an ended session
    pub async fn reactivate_session(&self, session_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE chat_sessions SET end_time = NULL WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        debug!("Reactivated chat session: {}", session_id);
        Ok(())
    }

    /// Close a session: set the end timestamp, summary and topic
    ///
    /// The topic is truncated to 100 characters before persistence.
    pub async fn end_session(
        &self,
        session_id: &str,
        summary: &str,
        topic: &str,
    ) -> Result<(), AppError> {
        let topic: String = topic.chars().take(MAX_TOPIC_LEN).collect();
        let end_time = chrono::Utc::now().timestamp();

        sqlx::query(
            "UPDATE chat_sessions SET end_time = ?, summary = ?, topic = ? WHERE id = ?",
        )
        .bind(end_time)
        .bind(summary)
        .bind(&topic)
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        debug!("Ended chat session: {}", session_id);
        Ok(())
    }

    /// Update the topic label of a session
    pub async fn update_topic(&self, session_id: &str, topic: &str) -> Result<(), AppError> {
        let topic: String = topic.chars().take(MAX_TOPIC_LEN).collect();

        sqlx::query("UPDATE chat_sessions SET topic = ? WHERE id = ?")
            .bind(&topic)
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Count messages in a session
    pub async fn count_messages(&self, session_id: &str) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE session_id = ?")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Get one page of a session's messages, ordered by creation time
    pub async fn get_messages_page(
        &self,
        session_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, session_id, sender, content, created_at FROM messages \
             WHERE session_id = ? ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?",
        )
        .bind(session_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Get all messages of a session, ordered by creation time
    pub async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, session_id, sender, content, created_at FROM messages \
             WHERE session_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Add a message to a session
    pub async fn add_message(&self, message: &Message) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO messages (id, session_id, sender, content, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.session_id)
        .bind(&message.sender)
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        debug!(
            "Added {} message {} to session {}",
            message.sender, message.id, message.session_id
        );
        Ok(())
    }

    /// Get the database pool (shared with the read-only care projections)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
