// src/handlers/diagnosis.rs

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
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::diagnosis::{
        DiagnosePayload, DiagnoseResponse, DiagnosisHistoryEntry, FarmingTipsPayload,
        FarmingTipsResponse, PreventativeMeasuresPayload, PreventativeMeasuresResponse,
    },
};

// POST /api/diagnoses
#[utoipa::path(
    post,
    path = "/api/diagnoses",
    tag = "Diagnosis",
    request_body = DiagnosePayload,
    responses(
        (status = 200, description = "Diagnóstico da IA (e entrada do histórico, se salva)", body = DiagnoseResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 422, description = "Imagem inválida"),
        (status = 502, description = "Serviço de IA indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn diagnose(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<DiagnosePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .diagnosis_service
        .diagnose(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}

// GET /api/diagnoses
#[utoipa::path(
    get,
    path = "/api/diagnoses",
    tag = "Diagnosis",
    responses(
        (status = 200, description = "Histórico do usuário, mais recente primeiro", body = Vec<DiagnosisHistoryEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_history(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .diagnosis_service
        .list_history(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entries)))
}

// GET /api/diagnoses/{id}
#[utoipa::path(
    get,
    path = "/api/diagnoses/{id}",
    tag = "Diagnosis",
    params(("id" = Uuid, Path, description = "ID do diagnóstico")),
    responses(
        (status = 200, description = "Entrada do histórico", body = DiagnosisHistoryEntry),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = app_state
        .diagnosis_service
        .get_entry(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entry)))
}

// POST /api/diagnoses/{id}/expert-review
#[utoipa::path(
    post,
    path = "/api/diagnoses/{id}/expert-review",
    tag = "Diagnosis",
    params(("id" = Uuid, Path, description = "ID do diagnóstico")),
    responses(
        (status = 200, description = "Revisão solicitada", body = DiagnosisHistoryEntry),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Status não permite a revisão")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_expert_review(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = app_state
        .diagnosis_service
        .request_expert_review(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entry)))
}

// POST /api/advice/preventative-measures
#[utoipa::path(
    post,
    path = "/api/advice/preventative-measures",
    tag = "Advice",
    request_body = PreventativeMeasuresPayload,
    responses(
        (status = 200, description = "Medidas preventivas", body = PreventativeMeasuresResponse),
        (status = 502, description = "Serviço de IA indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn preventative_measures(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<PreventativeMeasuresPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let preventative_measures = app_state
        .diagnosis_service
        .preventative_measures(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(PreventativeMeasuresResponse { preventative_measures })))
}

// POST /api/advice/farming-tips
#[utoipa::path(
    post,
    path = "/api/advice/farming-tips",
    tag = "Advice",
    request_body = FarmingTipsPayload,
    responses(
        (status = 200, description = "Dicas localizadas", body = FarmingTipsResponse),
        (status = 502, description = "Serviço de IA indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn farming_tips(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<FarmingTipsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tips = app_state
        .diagnosis_service
        .farming_tips(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(tips)))
}
