// src/db/diagnosis_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::diagnosis::{DiagnosisHistoryEntry, DiagnosisStatus, NewDiagnosisEntry},
};

const ENTRY_COLUMNS: &str = r#"
    id, user_id, photo_url, description,
    disease, confidence, treatment_recommendations, model,
    status, expert_review_requested, expert_diagnosis, expert_comments,
    expert_reviewed_by, expert_reviewed_at, created_at
"#;

#[derive(Clone)]
pub struct DiagnosisRepository {
    pool: PgPool,
}

impl DiagnosisRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        entry: &NewDiagnosisEntry,
        status: DiagnosisStatus,
    ) -> Result<DiagnosisHistoryEntry, AppError> {
        let saved = sqlx::query_as::<_, DiagnosisHistoryEntry>(&format!(
            r#"
            INSERT INTO diagnosis_history (
                user_id, photo_url, description,
                disease, confidence, treatment_recommendations, model, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(entry.user_id)
        .bind(entry.photo_url.as_deref())
        .bind(&entry.description)
        .bind(&entry.diagnosis.disease)
        .bind(entry.diagnosis.confidence)
        .bind(&entry.diagnosis.treatment_recommendations)
        .bind(&entry.model)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DiagnosisHistoryEntry>, AppError> {
        let entry = sqlx::query_as::<_, DiagnosisHistoryEntry>(&format!(
            "SELECT {} FROM diagnosis_history WHERE id = $1",
            ENTRY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    // Histórico do usuário, mais recente primeiro
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<DiagnosisHistoryEntry>, AppError> {
        let entries = sqlx::query_as::<_, DiagnosisHistoryEntry>(&format!(
            "SELECT {} FROM diagnosis_history WHERE user_id = $1 ORDER BY created_at DESC",
            ENTRY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    // Fila de consultas: mais antigas primeiro
    pub async fn list_by_status(
        &self,
        status: DiagnosisStatus,
    ) -> Result<Vec<DiagnosisHistoryEntry>, AppError> {
        let entries = sqlx::query_as::<_, DiagnosisHistoryEntry>(&format!(
            "SELECT {} FROM diagnosis_history WHERE status = $1 ORDER BY created_at ASC",
            ENTRY_COLUMNS
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Pede revisão de especialista. Só altera se o status ainda for `expected`;
    /// devolve `None` quando outra requisição mudou o registro antes.
    pub async fn mark_expert_review_requested(
        &self,
        id: Uuid,
        expected: DiagnosisStatus,
    ) -> Result<Option<DiagnosisHistoryEntry>, AppError> {
        let entry = sqlx::query_as::<_, DiagnosisHistoryEntry>(&format!(
            r#"
            UPDATE diagnosis_history
            SET expert_review_requested = TRUE, status = 'pending_expert'
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(id)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    pub async fn record_expert_review(
        &self,
        id: Uuid,
        expected: DiagnosisStatus,
        reviewer_id: Uuid,
        expert_diagnosis: &str,
        expert_comments: Option<&str>,
    ) -> Result<Option<DiagnosisHistoryEntry>, AppError> {
        let entry = sqlx::query_as::<_, DiagnosisHistoryEntry>(&format!(
            r#"
            UPDATE diagnosis_history
            SET status = 'expert_reviewed',
                expert_diagnosis = $3,
                expert_comments = $4,
                expert_reviewed_by = $5,
                expert_reviewed_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(id)
        .bind(expected)
        .bind(expert_diagnosis)
        .bind(expert_comments)
        .bind(reviewer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        expected: DiagnosisStatus,
        next: DiagnosisStatus,
    ) -> Result<Option<DiagnosisHistoryEntry>, AppError> {
        let entry = sqlx::query_as::<_, DiagnosisHistoryEntry>(&format!(
            "UPDATE diagnosis_history SET status = $3 WHERE id = $1 AND status = $2 RETURNING {}",
            ENTRY_COLUMNS
        ))
        .bind(id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    pub async fn count_all(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM diagnosis_history")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(&self, status: DiagnosisStatus) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM diagnosis_history WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::testing::insert_user,
        models::{auth::UserRole, diagnosis::DiagnosisResult},
    };

    #[sqlx::test(migrations = "./migrations")]
    async fn conditional_update_only_applies_once(pool: PgPool) {
        let farmer = insert_user(&pool, "farmer@example.in", UserRole::Farmer).await;
        let repo = DiagnosisRepository::new(pool);

        let entry = repo
            .insert(
                &NewDiagnosisEntry {
                    user_id: farmer.id,
                    photo_url: None,
                    description: "Brown spots on lower leaves".into(),
                    diagnosis: DiagnosisResult {
                        disease: "Brown spot".into(),
                        confidence: 0.7,
                        treatment_recommendations: "Balanced potash".into(),
                    },
                    model: "fake-model".into(),
                },
                DiagnosisStatus::AiDiagnosed,
            )
            .await
            .unwrap();

        let first = repo
            .mark_expert_review_requested(entry.id, DiagnosisStatus::AiDiagnosed)
            .await
            .unwrap();
        assert_eq!(first.map(|e| e.status), Some(DiagnosisStatus::PendingExpert));

        // O status já mudou: o WHERE não encontra mais a linha
        let second = repo
            .mark_expert_review_requested(entry.id, DiagnosisStatus::AiDiagnosed)
            .await
            .unwrap();
        assert!(second.is_none());

        let stale_close = repo
            .update_status(entry.id, DiagnosisStatus::AiDiagnosed, DiagnosisStatus::Closed)
            .await
            .unwrap();
        assert!(stale_close.is_none());
        assert_eq!(repo.count_by_status(DiagnosisStatus::PendingExpert).await.unwrap(), 1);
    }
}
