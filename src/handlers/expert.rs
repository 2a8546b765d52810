// src/handlers/expert.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{ExpertOrAdmin, RequireRole},
    },
    models::diagnosis::{DiagnosisHistoryEntry, ExpertReviewPayload},
};

// GET /api/expert/queries
#[utoipa::path(
    get,
    path = "/api/expert/queries",
    tag = "Expert",
    responses(
        (status = 200, description = "Consultas aguardando especialista, mais antigas primeiro", body = Vec<DiagnosisHistoryEntry>),
        (status = 403, description = "Apenas especialistas e administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending_queries(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<ExpertOrAdmin>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .diagnosis_service
        .list_pending_queries()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entries)))
}

// POST /api/expert/queries/{id}/review
#[utoipa::path(
    post,
    path = "/api/expert/queries/{id}/review",
    tag = "Expert",
    params(("id" = Uuid, Path, description = "ID do diagnóstico")),
    request_body = ExpertReviewPayload,
    responses(
        (status = 200, description = "Revisão registrada", body = DiagnosisHistoryEntry),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "A consulta não está aguardando revisão")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_review(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<ExpertOrAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpertReviewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let entry = app_state
        .diagnosis_service
        .submit_expert_review(
            &guard.user,
            id,
            &payload.expert_diagnosis,
            payload.expert_comments.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entry)))
}

// POST /api/expert/queries/{id}/close
#[utoipa::path(
    post,
    path = "/api/expert/queries/{id}/close",
    tag = "Expert",
    params(("id" = Uuid, Path, description = "ID do diagnóstico")),
    responses(
        (status = 200, description = "Consulta encerrada", body = DiagnosisHistoryEntry),
        (status = 409, description = "Status não permite encerrar")
    ),
    security(("api_jwt" = []))
)]
pub async fn close_query(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<ExpertOrAdmin>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = app_state
        .diagnosis_service
        .close_query(&guard.user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entry)))
}
