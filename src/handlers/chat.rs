// src/handlers/chat.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::chat::{ChatExchange, ChatMessage, ChatSessionSummary, SendMessagePayload},
};

#[utoipa::path(
    post,
    path = "/api/chat/messages",
    tag = "Chat",
    request_body = SendMessagePayload,
    responses(
        (status = 201, description = "Pergunta e resposta do AgriBot", body = ChatExchange),
        (status = 502, description = "Serviço de IA indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_message(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<SendMessagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let exchange = app_state
        .chat_service
        .send_message(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(exchange)))
}

#[utoipa::path(
    get,
    path = "/api/chat/sessions",
    tag = "Chat",
    responses(
        (status = 200, description = "Sessões do usuário, mais recentes primeiro", body = Vec<ChatSessionSummary>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sessions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = app_state
        .chat_service
        .list_sessions(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sessions)))
}

#[utoipa::path(
    get,
    path = "/api/chat/sessions/{session_id}",
    tag = "Chat",
    params(("session_id" = String, Path, description = "ID da sessão")),
    responses(
        (status = 200, description = "Mensagens da sessão em ordem cronológica", body = Vec<ChatMessage>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_session(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = app_state
        .chat_service
        .list_session(&user, &session_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(messages)))
}
