// src/models/diagnosis.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    models::validation::{validate_description, validate_not_blank},
};

// Ciclo de vida de um diagnóstico:
// pending_ai -> ai_diagnosed -> pending_expert -> expert_reviewed -> closed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "diagnosis_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisStatus {
    PendingAi,
    AiDiagnosed,
    PendingExpert,
    ExpertReviewed,
    Closed,
}

impl DiagnosisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosisStatus::PendingAi => "pending_ai",
            DiagnosisStatus::AiDiagnosed => "ai_diagnosed",
            DiagnosisStatus::PendingExpert => "pending_expert",
            DiagnosisStatus::ExpertReviewed => "expert_reviewed",
            DiagnosisStatus::Closed => "closed",
        }
    }

    pub fn can_transition_to(&self, next: DiagnosisStatus) -> bool {
        use DiagnosisStatus::*;
        matches!(
            (self, next),
            (PendingAi, AiDiagnosed)
                | (AiDiagnosed, PendingExpert)
                | (AiDiagnosed, Closed)
                | (PendingExpert, ExpertReviewed)
                | (ExpertReviewed, Closed)
        )
    }

    /// Igual a `can_transition_to`, mas já devolve o erro de conflito.
    pub fn ensure_transition(&self, next: DiagnosisStatus) -> Result<(), AppError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

// Resultado estruturado devolvido pela IA
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub disease: String,
    /// Entre 0 e 1
    pub confidence: f64,
    pub treatment_recommendations: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub photo_url: Option<String>,
    pub description: String,
    #[sqlx(flatten)]
    pub diagnosis: DiagnosisResult,
    pub model: String,
    pub status: DiagnosisStatus,
    pub expert_review_requested: bool,
    pub expert_diagnosis: Option<String>,
    pub expert_comments: Option<String>,
    pub expert_reviewed_by: Option<Uuid>,
    pub expert_reviewed_at: Option<DateTime<Utc>>,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

// Dados da nova entrada, antes do INSERT
#[derive(Debug, Clone)]
pub struct NewDiagnosisEntry {
    pub user_id: Uuid,
    pub photo_url: Option<String>,
    pub description: String,
    pub diagnosis: DiagnosisResult,
    pub model: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosePayload {
    /// `data:<mimetype>;base64,<dados>`
    #[validate(length(min = 1, message = "A crop photo is required."))]
    pub photo_data_uri: String,

    #[validate(custom(function = "validate_description"))]
    pub description: String,

    pub model: Option<String>,

    #[serde(default = "default_true")]
    pub save_to_history: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseResponse {
    pub diagnosis: DiagnosisResult,
    pub photo_url: Option<String>,
    pub entry: Option<DiagnosisHistoryEntry>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreventativeMeasuresPayload {
    #[validate(length(max = 100))]
    pub crop_type: Option<String>,
    #[validate(length(max = 100))]
    pub season: Option<String>,
    #[validate(length(max = 150))]
    pub location: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreventativeMeasuresResponse {
    pub preventative_measures: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FarmingTipsPayload {
    #[validate(
        length(min = 2, max = 150, message = "A location is required."),
        custom(function = "validate_not_blank")
    )]
    pub location: String,
    #[validate(length(max = 100))]
    pub season: Option<String>,
    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 crops per request."))]
    pub crops: Vec<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FarmingTip {
    pub title: String,
    pub content: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FarmingTipsResponse {
    pub tips: Vec<FarmingTip>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_advice: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpertReviewPayload {
    #[validate(
        length(min = 1, max = 2000, message = "The expert diagnosis is required."),
        custom(function = "validate_not_blank")
    )]
    pub expert_diagnosis: String,
    #[validate(length(max = 2000))]
    pub expert_comments: Option<String>,
}
