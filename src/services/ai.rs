// src/services/ai.rs
//
// Contrato com o provedor de IA generativa e os templates de prompt.
// O adaptador concreto (Gemini) fica em services/gemini.rs.

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    models::{
        chat::ChatSender,
        diagnosis::{DiagnosisResult, FarmingTipsResponse, PreventativeMeasuresPayload},
    },
    services::storage::ImageUpload,
};

/// Uma mensagem do histórico enviada ao modelo.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub sender: ChatSender,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreventativeRequest {
    pub crop_type: String,
    pub season: String,
    pub location: String,
}

impl PreventativeRequest {
    // Campos em branco recebem os mesmos padrões do formulário de diagnóstico
    pub fn from_payload(payload: &PreventativeMeasuresPayload) -> Self {
        fn or_default(value: &Option<String>, default: &str) -> String {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        }

        Self {
            crop_type: or_default(&payload.crop_type, "General Crop"),
            season: or_default(&payload.season, "Current Season"),
            location: or_default(&payload.location, "Local Area"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FarmingTipsRequest {
    pub location: String,
    pub season: Option<String>,
    pub crops: Vec<String>,
}

#[async_trait]
pub trait AiAdvisor: Send + Sync {
    /// Modelo usado quando o cliente não escolhe um.
    fn default_model(&self) -> &str;

    async fn diagnose(
        &self,
        model: &str,
        image: &ImageUpload,
        description: &str,
    ) -> Result<DiagnosisResult, AppError>;

    async fn preventative_measures(
        &self,
        model: &str,
        request: &PreventativeRequest,
    ) -> Result<String, AppError>;

    async fn farming_tips(
        &self,
        model: &str,
        request: &FarmingTipsRequest,
    ) -> Result<FarmingTipsResponse, AppError>;

    /// `history` termina com a pergunta atual do usuário.
    async fn chat(&self, model: &str, history: &[ChatTurn]) -> Result<String, AppError>;
}

/// Escolhe o modelo do pedido (ou o padrão) e valida o identificador,
/// que vai parar na URL do provedor.
pub fn resolve_model(requested: Option<&str>, default: &str) -> Result<String, AppError> {
    let model = requested.map(str::trim).filter(|m| !m.is_empty()).unwrap_or(default);

    let valid = !model.is_empty()
        && model.len() <= 64
        && model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(model.to_string())
    } else {
        Err(AppError::InvalidModel(model.to_string()))
    }
}

/// Normaliza a resposta do modelo: confiança em [0, 1] e textos sem espaços sobrando.
pub fn sanitize_diagnosis(mut result: DiagnosisResult) -> DiagnosisResult {
    let mut confidence = if result.confidence.is_finite() { result.confidence } else { 0.0 };
    // Alguns modelos respondem em porcentagem (ex.: 87)
    if confidence > 1.0 && confidence <= 100.0 {
        confidence /= 100.0;
    }
    result.confidence = confidence.clamp(0.0, 1.0);
    result.disease = result.disease.trim().to_string();
    result.treatment_recommendations = result.treatment_recommendations.trim().to_string();
    if result.disease.is_empty() {
        result.disease = "Unknown".to_string();
    }
    result
}

// ---
// Templates de prompt
// ---

pub const CHAT_SYSTEM_PROMPT: &str = "You are AgriBot, an AI farming assistant for Indian farmers. \
Answer questions about crops, soil, pests, irrigation, weather and government schemes in simple, \
practical language. Keep answers short. If a problem looks serious or you are unsure, recommend \
consulting a local agricultural expert or Krishi Vigyan Kendra.";

pub fn diagnosis_prompt(description: &str) -> String {
    format!(
        r#"You are an expert in plant pathology specializing in crops grown in India.
Analyze the attached crop photo together with the farmer's description and identify the most likely disease.

Description: {description}

Respond only with JSON in this exact shape:
{{"disease": "<disease name, or Healthy>", "confidence": <number between 0 and 1>, "treatmentRecommendations": "<practical treatment steps available to Indian farmers>"}}"#
    )
}

pub fn preventative_prompt(request: &PreventativeRequest) -> String {
    format!(
        r#"You are an expert agricultural advisor specializing in Indian farming practices. Based on the crop type, season, and location in India provided, generate preventative measures to protect the crops from common diseases and optimize their growth. Consider typical Indian agricultural cycles (Kharif, Rabi, Zaid if applicable) and climatic conditions.

Crop Type: {crop}
Season: {season}
Location: {location} (India)

Respond only with JSON in this exact shape:
{{"preventativeMeasures": "<the preventative measures>"}}"#,
        crop = request.crop_type,
        season = request.season,
        location = request.location,
    )
}

pub fn farming_tips_prompt(request: &FarmingTipsRequest) -> String {
    let season = request.season.as_deref().unwrap_or("the current season");
    let crops = if request.crops.is_empty() {
        "crops commonly grown in the region".to_string()
    } else {
        request.crops.join(", ")
    };

    format!(
        r#"You are an agricultural extension officer in India. Give localized farming tips for farmers in {location} during {season}, focusing on {crops}.
Cover water management, pest and disease watch, and planting or care as relevant.

Respond only with JSON in this exact shape:
{{"tips": [{{"title": "<short title>", "content": "<two or three sentences>", "category": "<e.g. Water Management>"}}], "generalAdvice": "<optional one-paragraph advice>"}}"#,
        location = request.location,
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_default_model_when_none_requested() {
        assert_eq!(resolve_model(None, "gemini-2.0-flash").unwrap(), "gemini-2.0-flash");
        assert_eq!(resolve_model(Some("  "), "gemini-2.0-flash").unwrap(), "gemini-2.0-flash");
        assert_eq!(resolve_model(Some("gemini-1.5-pro"), "x").unwrap(), "gemini-1.5-pro");
    }

    #[test]
    fn rejects_model_ids_that_could_escape_the_url() {
        let too_long = "a".repeat(65);
        for bad in ["../admin", "gemini pro", "model?key=1", too_long.as_str()] {
            assert!(matches!(resolve_model(Some(bad), "ok"), Err(AppError::InvalidModel(_))), "{}", bad);
        }
    }

    #[test]
    fn confidence_is_normalized() {
        let raw = |confidence| DiagnosisResult {
            disease: "  Rust ".into(),
            confidence,
            treatment_recommendations: " Fungicide ".into(),
        };

        assert_eq!(sanitize_diagnosis(raw(87.0)).confidence, 0.87);
        assert_eq!(sanitize_diagnosis(raw(-0.2)).confidence, 0.0);
        assert_eq!(sanitize_diagnosis(raw(500.0)).confidence, 1.0);
        assert_eq!(sanitize_diagnosis(raw(f64::NAN)).confidence, 0.0);

        let cleaned = sanitize_diagnosis(raw(0.5));
        assert_eq!(cleaned.disease, "Rust");
        assert_eq!(cleaned.treatment_recommendations, "Fungicide");
    }

    #[test]
    fn preventative_defaults_fill_blank_fields() {
        let request = PreventativeRequest::from_payload(&PreventativeMeasuresPayload {
            crop_type: Some("Cotton".into()),
            season: Some("   ".into()),
            location: None,
            model: None,
        });

        assert_eq!(request.crop_type, "Cotton");
        assert_eq!(request.season, "Current Season");
        assert_eq!(request.location, "Local Area");
    }

    #[test]
    fn prompts_embed_user_input() {
        let prompt = preventative_prompt(&PreventativeRequest {
            crop_type: "Wheat".into(),
            season: "Rabi".into(),
            location: "Punjab".into(),
        });
        assert!(prompt.contains("Crop Type: Wheat"));
        assert!(prompt.contains("Location: Punjab (India)"));

        assert!(diagnosis_prompt("white powder on leaves").contains("white powder on leaves"));

        let tips = farming_tips_prompt(&FarmingTipsRequest {
            location: "Wardha".into(),
            season: None,
            crops: vec!["cotton".into(), "soybean".into()],
        });
        assert!(tips.contains("Wardha"));
        assert!(tips.contains("cotton, soybean"));
    }
}
