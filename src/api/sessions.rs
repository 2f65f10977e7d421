//! Chat session API endpoints
//!
//! Handles HTTP requests for chat sessions and their messages. The send
//! endpoint is where the surrounding persistence glue meets the assistant
//! pipeline: persist the user message, run `process_query`, persist the
//! reply.

use crate::api::utils::{extract_user_id, validate_message, RouterState};
use crate::assistant::naive_topic;
use crate::chat::{ChatSession, Message, MessageRole, DEFAULT_TOPIC, MAX_TOPIC_LEN};
use crate::error::AppError;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to send a message in a session
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Message content
    pub message: String,
}

/// Request to update a session topic
#[derive(Debug, Deserialize)]
pub struct UpdateTopicRequest {
    /// New topic label
    pub topic: String,
}

/// Pagination query parameters for the message log
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: i64,
    /// Messages per page
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    50
}

/// Session response payload
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Session token
    pub id: String,
    /// Topic label
    pub topic: String,
    /// Conversation summary, present after session end
    pub summary: Option<String>,
    /// Unix timestamp when the session was started
    pub start_time: i64,
    /// Unix timestamp when the session was ended; None while active
    pub end_time: Option<i64>,
}

impl From<ChatSession> for SessionResponse {
    fn from(s: ChatSession) -> Self {
        Self {
            id: s.id,
            topic: s.topic,
            summary: s.summary,
            start_time: s.start_time,
            end_time: s.end_time,
        }
    }
}

/// Message response payload
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Message identifier
    pub id: String,
    /// Sender role ("user" or "assistant")
    pub sender: String,
    /// Message content
    pub content: String,
    /// Unix timestamp when the message was created
    pub created_at: i64,
}

/// Paginated message log response
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    /// One page of messages, creation-time ascending
    pub messages: Vec<MessageResponse>,
    /// Pagination envelope
    pub pagination: Pagination,
}

/// Pagination envelope
#[derive(Debug, Serialize)]
pub struct Pagination {
    /// 1-based page number
    pub page: i64,
    /// Messages per page
    pub per_page: i64,
    /// Total message count
    pub total: i64,
    /// Total page count
    pub pages: i64,
}

/// Reply returned by the send endpoint
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    /// The assistant's reply
    pub response: String,
    /// The session the exchange belongs to
    pub session_id: String,
}

/// Result of ending a session
#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    /// Conversation summary (or its fixed fallback)
    pub summary: String,
    /// Final topic label
    pub topic: String,
}

/// POST /api/chat/sessions - Create a new session
pub async fn create_session(
    State((chat_db, _)): State<RouterState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AppError> {
    let user_id = extract_user_id(&headers)?;

    let session = ChatSession::new(Uuid::new_v4().to_string(), user_id);
    chat_db.create_session(&session).await?;

    Ok(Json(session.into()))
}

/// GET /api/chat/sessions - List the caller's sessions, newest first
pub async fn list_sessions(
    State((chat_db, _)): State<RouterState>,
    headers: HeaderMap,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    let user_id = extract_user_id(&headers)?;

    let sessions = chat_db.list_sessions(user_id).await?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

/// DELETE /api/chat/sessions/:id - Delete a session and its messages
pub async fn delete_session(
    State((chat_db, _)): State<RouterState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = extract_user_id(&headers)?;

    chat_db
        .get_session(user_id, &session_id)
        .await?
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    chat_db.delete_session(&session_id).await?;

    Ok(Json(serde_json::json!({
        "message": "Chat session deleted successfully",
        "id": session_id
    })))
}

/// GET /api/chat/sessions/:id/messages - Paginated message log
pub async fn get_messages(
    State((chat_db, _)): State<RouterState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<MessagesResponse>, AppError> {
    let user_id = extract_user_id(&headers)?;

    chat_db
        .get_session(user_id, &session_id)
        .await?
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    let page = params.page.max(1);
    let per_page = params.per_page.clamp(1, 200);
    let offset = (page - 1) * per_page;

    let total = chat_db.count_messages(&session_id).await?;
    let messages = chat_db
        .get_messages_page(&session_id, per_page, offset)
        .await?;

    Ok(Json(MessagesResponse {
        messages: messages
            .into_iter()
            .map(|m| MessageResponse {
                id: m.id,
                sender: m.sender,
                content: m.content,
                created_at: m.created_at,
            })
            .collect(),
        pagination: Pagination {
            page,
            per_page,
            total,
            pages: (total + per_page - 1) / per_page,
        },
    }))
}

/// POST /api/chat/sessions/:id/send - Send a message, get the assistant reply
///
/// Reactivates an ended session, persists both sides of the exchange and
/// returns the reply. `process_query` itself never fails; a pipeline error
/// comes back as its textual error reply.
pub async fn send_message(
    State((chat_db, assistant)): State<RouterState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let user_id = extract_user_id(&headers)?;
    validate_message(&request.message)?;

    let session = chat_db
        .get_session(user_id, &session_id)
        .await?
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    if session.is_ended() {
        chat_db.reactivate_session(&session_id).await?;
    }

    let user_message = Message::new(
        Uuid::new_v4().to_string(),
        session_id.clone(),
        MessageRole::User,
        request.message.clone(),
    );
    chat_db.add_message(&user_message).await?;

    let reply = assistant
        .process_query(&request.message, &session_id, user_id)
        .await;

    let assistant_message = Message::new(
        Uuid::new_v4().to_string(),
        session_id.clone(),
        MessageRole::Assistant,
        reply.clone(),
    );
    chat_db.add_message(&assistant_message).await?;

    Ok(Json(SendMessageResponse {
        response: reply,
        session_id,
    }))
}

/// POST /api/chat/sessions/:id/end - Close a session
///
/// Builds the transcript, asks the assistant for a summary (with its fixed
/// fallback), derives a topic when the session is still untitled and sets
/// the end timestamp.
pub async fn end_session(
    State((chat_db, assistant)): State<RouterState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<Json<EndSessionResponse>, AppError> {
    let user_id = extract_user_id(&headers)?;

    let session = chat_db
        .get_session(user_id, &session_id)
        .await?
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    let messages = chat_db.get_messages(&session_id).await?;
    let conversation = messages
        .iter()
        .map(|m| format!("{}: {}", m.sender, m.content))
        .collect::<Vec<_>>()
        .join("\n");

    let summary = assistant.summarize_conversation(&conversation).await;

    // Only sessions still carrying the placeholder get a derived topic, and
    // only when the derivation produced something better than the fallback.
    let mut topic = session.topic;
    if topic == DEFAULT_TOPIC {
        let generated = naive_topic(&conversation);
        if !generated.eq_ignore_ascii_case(DEFAULT_TOPIC) {
            topic = generated;
        }
    }
    let topic: String = topic.chars().take(MAX_TOPIC_LEN).collect();

    chat_db.end_session(&session_id, &summary, &topic).await?;

    Ok(Json(EndSessionResponse { summary, topic }))
}

/// PUT /api/chat/sessions/:id/topic - Rename a session
pub async fn update_topic(
    State((chat_db, _)): State<RouterState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Json(request): Json<UpdateTopicRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = extract_user_id(&headers)?;

    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(AppError::InvalidRequest("Topic required".to_string()));
    }
    if topic.chars().count() > MAX_TOPIC_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Topic too long (max {})",
            MAX_TOPIC_LEN
        )));
    }

    chat_db
        .get_session(user_id, &session_id)
        .await?
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    chat_db.update_topic(&session_id, topic).await?;

    Ok(Json(serde_json::json!({
        "message": "Topic updated",
        "topic": topic
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::utils::USER_ID_HEADER;
    use crate::assistant::{
        Assistant, Composer, InMemoryKnowledgeStore, KnowledgeRetriever, SafetyPolicy,
        SessionMemory, WebSearcher,
    };
    use crate::care::SqliteCareData;
    use crate::chat::ChatDb;
    use crate::embedding::EmbeddingClient;
    use crate::llm::GroqClient;
    use axum::http::HeaderValue;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Assistant wired with unconfigured clients: every model call fails
    /// fast, so handlers exercise the offline fallback paths.
    fn offline_assistant(chat_db: &ChatDb) -> Arc<Assistant> {
        let llm = Arc::new(GroqClient::new(String::new(), "test".to_string(), 1));
        let composer = Composer::new(llm.clone());
        let embedder = EmbeddingClient::new(
            "http://localhost:1".to_string(),
            String::new(),
            "test".to_string(),
        );
        let retriever = KnowledgeRetriever::new(
            Arc::new(InMemoryKnowledgeStore::new()),
            embedder,
            llm.clone(),
            composer.clone(),
        );
        let searcher = WebSearcher::new(String::new(), String::new(), composer.clone());
        let care = Arc::new(SqliteCareData::new(chat_db.pool().clone()));

        Arc::new(Assistant::new(
            llm,
            composer,
            retriever,
            searcher,
            SafetyPolicy::default(),
            care,
            SessionMemory::new(),
        ))
    }

    async fn test_state() -> (RouterState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let chat_db = ChatDb::new(db_path.to_str().unwrap())
            .await
            .expect("Failed to create test database");
        let assistant = offline_assistant(&chat_db);
        ((Arc::new(chat_db), assistant), temp_dir)
    }

    fn auth_headers(user_id: i64) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_str(&user_id.to_string()).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_create_session_defaults() {
        let (state, _tmp) = test_state().await;
        let result = create_session(State(state), auth_headers(1)).await.unwrap();
        assert_eq!(result.0.topic, DEFAULT_TOPIC);
        assert!(result.0.end_time.is_none());
        assert!(!result.0.id.is_empty());
    }

    #[tokio::test]
    async fn test_create_session_requires_identity() {
        let (state, _tmp) = test_state().await;
        let result = create_session(State(state), HeaderMap::new()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_list_sessions_scoped_to_caller() {
        let (state, _tmp) = test_state().await;
        create_session(State(state.clone()), auth_headers(1))
            .await
            .unwrap();
        create_session(State(state.clone()), auth_headers(2))
            .await
            .unwrap();

        let sessions = list_sessions(State(state), auth_headers(1)).await.unwrap();
        assert_eq!(sessions.0.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_session_is_not_found() {
        let (state, _tmp) = test_state().await;
        let result = delete_session(
            State(state),
            auth_headers(1),
            Path("nonexistent".to_string()),
        )
        .await;
        assert!(matches!(result, Err(AppError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_other_users_session_is_not_found() {
        let (state, _tmp) = test_state().await;
        let session = create_session(State(state.clone()), auth_headers(1))
            .await
            .unwrap();
        let result = delete_session(State(state), auth_headers(2), Path(session.0.id)).await;
        assert!(matches!(result, Err(AppError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_send_message_persists_both_turns() {
        let (state, _tmp) = test_state().await;
        let session = create_session(State(state.clone()), auth_headers(1))
            .await
            .unwrap();

        let result = send_message(
            State(state.clone()),
            auth_headers(1),
            Path(session.0.id.clone()),
            Json(SendMessageRequest {
                message: "What should I eat this week?".to_string(),
            }),
        )
        .await
        .unwrap();

        assert!(!result.0.response.is_empty());

        let (chat_db, _) = &state;
        let messages = chat_db.get_messages(&session.0.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, "user");
        assert_eq!(messages[1].sender, "assistant");
        assert_eq!(messages[1].content, result.0.response);
    }

    #[tokio::test]
    async fn test_send_message_empty_rejected() {
        let (state, _tmp) = test_state().await;
        let session = create_session(State(state.clone()), auth_headers(1))
            .await
            .unwrap();

        let result = send_message(
            State(state),
            auth_headers(1),
            Path(session.0.id),
            Json(SendMessageRequest {
                message: "  ".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_send_message_reactivates_ended_session() {
        let (state, _tmp) = test_state().await;
        let session = create_session(State(state.clone()), auth_headers(1))
            .await
            .unwrap();
        let (chat_db, _) = &state;
        chat_db
            .end_session(&session.0.id, "summary", "Topic")
            .await
            .unwrap();

        send_message(
            State(state.clone()),
            auth_headers(1),
            Path(session.0.id.clone()),
            Json(SendMessageRequest {
                message: "Back again".to_string(),
            }),
        )
        .await
        .unwrap();

        let refreshed = chat_db.get_session(1, &session.0.id).await.unwrap().unwrap();
        assert!(!refreshed.is_ended());
    }

    #[tokio::test]
    async fn test_end_session_derives_topic_from_conversation() {
        let (state, _tmp) = test_state().await;
        let session = create_session(State(state.clone()), auth_headers(1))
            .await
            .unwrap();

        send_message(
            State(state.clone()),
            auth_headers(1),
            Path(session.0.id.clone()),
            Json(SendMessageRequest {
                message: "newborn feeding newborn sleeping newborn burping".to_string(),
            }),
        )
        .await
        .unwrap();

        let result = end_session(
            State(state.clone()),
            auth_headers(1),
            Path(session.0.id.clone()),
        )
        .await
        .unwrap();

        // Offline summarizer degrades to its fixed fallback
        assert_eq!(result.0.summary, "Conversation summary unavailable");
        assert_ne!(result.0.topic, DEFAULT_TOPIC);
        assert!(result.0.topic.to_lowercase().contains("newborn"));

        let (chat_db, _) = &state;
        let ended = chat_db.get_session(1, &session.0.id).await.unwrap().unwrap();
        assert!(ended.is_ended());
        assert_eq!(ended.topic, result.0.topic);
    }

    #[tokio::test]
    async fn test_end_session_keeps_custom_topic() {
        let (state, _tmp) = test_state().await;
        let session = create_session(State(state.clone()), auth_headers(1))
            .await
            .unwrap();

        update_topic(
            State(state.clone()),
            auth_headers(1),
            Path(session.0.id.clone()),
            Json(UpdateTopicRequest {
                topic: "Week 12 questions".to_string(),
            }),
        )
        .await
        .unwrap();

        let result = end_session(State(state), auth_headers(1), Path(session.0.id))
            .await
            .unwrap();
        assert_eq!(result.0.topic, "Week 12 questions");
    }

    #[tokio::test]
    async fn test_end_empty_session_keeps_placeholder_topic() {
        let (state, _tmp) = test_state().await;
        let session = create_session(State(state.clone()), auth_headers(1))
            .await
            .unwrap();

        // No messages: naive_topic yields its fallback, placeholder stays
        let result = end_session(State(state), auth_headers(1), Path(session.0.id))
            .await
            .unwrap();
        assert_eq!(result.0.topic, DEFAULT_TOPIC);
    }

    #[tokio::test]
    async fn test_update_topic_validation() {
        let (state, _tmp) = test_state().await;
        let session = create_session(State(state.clone()), auth_headers(1))
            .await
            .unwrap();

        let empty = update_topic(
            State(state.clone()),
            auth_headers(1),
            Path(session.0.id.clone()),
            Json(UpdateTopicRequest {
                topic: "  ".to_string(),
            }),
        )
        .await;
        assert!(matches!(empty, Err(AppError::InvalidRequest(_))));

        let too_long = update_topic(
            State(state),
            auth_headers(1),
            Path(session.0.id),
            Json(UpdateTopicRequest {
                topic: "x".repeat(101),
            }),
        )
        .await;
        assert!(matches!(too_long, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_get_messages_pagination_envelope() {
        let (state, _tmp) = test_state().await;
        let session = create_session(State(state.clone()), auth_headers(1))
            .await
            .unwrap();
        let (chat_db, _) = &state;

        for i in 0..3 {
            let msg = Message::new(
                format!("m{}", i),
                session.0.id.clone(),
                MessageRole::User,
                format!("message {}", i),
            );
            chat_db.add_message(&msg).await.unwrap();
        }

        let result = get_messages(
            State(state.clone()),
            auth_headers(1),
            Path(session.0.id),
            Query(PaginationParams {
                page: 1,
                per_page: 2,
            }),
        )
        .await
        .unwrap();

        assert_eq!(result.0.messages.len(), 2);
        assert_eq!(result.0.pagination.total, 3);
        assert_eq!(result.0.pagination.pages, 2);
    }
}
