// src/services/chat_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::ChatRepository,
    models::{
        auth::User,
        chat::{ChatExchange, ChatMessage, ChatSender, ChatSessionSummary, SendMessagePayload},
        validation::blank_field_error,
    },
    services::ai::{resolve_model, AiAdvisor, ChatTurn},
};

// Quantas mensagens anteriores acompanham a pergunta
pub const HISTORY_WINDOW: i64 = 20;

#[derive(Clone)]
pub struct ChatService {
    repo: ChatRepository,
    advisor: Arc<dyn AiAdvisor>,
}

/// Converte o histórico gravado na conversa enviada ao modelo.
pub fn to_turns(history: &[ChatMessage]) -> Vec<ChatTurn> {
    history
        .iter()
        .map(|m| ChatTurn { sender: m.sender, text: m.text.clone() })
        .collect()
}

impl ChatService {
    pub fn new(repo: ChatRepository, advisor: Arc<dyn AiAdvisor>) -> Self {
        Self { repo, advisor }
    }

    pub async fn send_message(&self, user: &User, payload: &SendMessagePayload) -> Result<ChatExchange, AppError> {
        let model = resolve_model(payload.model.as_deref(), self.advisor.default_model())?;
        let session_id = payload.session_id.trim();
        let text = payload.text.trim();

        if session_id.is_empty() || text.is_empty() {
            return Err(blank_field_error(if text.is_empty() { "text" } else { "sessionId" }));
        }

        let user_message = self.repo.insert(user.id, session_id, ChatSender::User, text).await?;

        // Já inclui a mensagem recém-gravada
        let history = self
            .repo
            .recent_in_session(user.id, session_id, HISTORY_WINDOW)
            .await?;

        let answer = self.advisor.chat(&model, &to_turns(&history)).await?;
        let bot_message = self.repo.insert(user.id, session_id, ChatSender::Bot, &answer).await?;

        tracing::debug!("💬 Sessão {} de {}: +2 mensagens", session_id, user.id);

        Ok(ChatExchange { user_message, bot_message })
    }

    pub async fn list_session(&self, user: &User, session_id: &str) -> Result<Vec<ChatMessage>, AppError> {
        self.repo.list_session(user.id, session_id).await
    }

    pub async fn list_sessions(&self, user: &User) -> Result<Vec<ChatSessionSummary>, AppError> {
        self.repo.list_sessions(user.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn message(sender: ChatSender, text: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            session_id: "s1".into(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn history_keeps_order_and_senders() {
        let history = vec![
            message(ChatSender::User, "Best time to sow wheat?"),
            message(ChatSender::Bot, "Early November."),
            message(ChatSender::User, "And mustard?"),
        ];

        let turns = to_turns(&history);

        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].sender, ChatSender::Bot);
        assert_eq!(turns[2], ChatTurn { sender: ChatSender::User, text: "And mustard?".into() });
    }
}
