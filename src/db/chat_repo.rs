// src/db/chat_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::chat::{ChatMessage, ChatSender, ChatSessionSummary},
};

#[derive(Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        user_id: Uuid,
        session_id: &str,
        sender: ChatSender,
        text: &str,
    ) -> Result<ChatMessage, AppError> {
        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages (user_id, session_id, sender, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, session_id, sender, text, timestamp
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(sender)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    /// As últimas `limit` mensagens da sessão, em ordem cronológica.
    pub async fn recent_in_session(
        &self,
        user_id: Uuid,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT * FROM (
                SELECT id, user_id, session_id, sender, text, timestamp
                FROM chat_messages
                WHERE user_id = $1 AND session_id = $2
                ORDER BY timestamp DESC
                LIMIT $3
            ) recent
            ORDER BY timestamp ASC
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    pub async fn list_session(
        &self,
        user_id: Uuid,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, user_id, session_id, sender, text, timestamp
            FROM chat_messages
            WHERE user_id = $1 AND session_id = $2
            ORDER BY timestamp ASC
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    pub async fn list_sessions(&self, user_id: Uuid) -> Result<Vec<ChatSessionSummary>, AppError> {
        let sessions = sqlx::query_as::<_, ChatSessionSummary>(
            r#"
            SELECT session_id, COUNT(*) AS message_count, MAX(timestamp) AS last_activity
            FROM chat_messages
            WHERE user_id = $1
            GROUP BY session_id
            ORDER BY last_activity DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }
}
