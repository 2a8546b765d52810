// src/services/gemini.rs
//
// Adaptador do `AiAdvisor` para a API REST do Gemini (generateContent).

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    common::error::AppError,
    models::{
        chat::ChatSender,
        diagnosis::{DiagnosisResult, FarmingTipsResponse, PreventativeMeasuresResponse},
    },
    services::{
        ai::{
            diagnosis_prompt, farming_tips_prompt, preventative_prompt, sanitize_diagnosis,
            AiAdvisor, ChatTurn, FarmingTipsRequest, PreventativeRequest, CHAT_SYSTEM_PROMPT,
        },
        storage::ImageUpload,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ---
// Formato da API (só os campos que usamos)
// ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), inline_data: None }
    }

    fn image(image: &ImageUpload) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            }),
        }
    }
}

fn json_output() -> Option<GenerationConfig> {
    Some(GenerationConfig { response_mime_type: "application/json" })
}

fn single_prompt(parts: Vec<Part>, structured: bool) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: None,
        contents: vec![Content { role: Some("user"), parts }],
        generation_config: if structured { json_output() } else { None },
    }
}

fn chat_request(history: &[ChatTurn]) -> GenerateContentRequest {
    let contents = history
        .iter()
        .map(|turn| Content {
            role: Some(match turn.sender {
                ChatSender::User => "user",
                ChatSender::Bot => "model",
            }),
            parts: vec![Part::text(turn.text.clone())],
        })
        .collect();

    GenerateContentRequest {
        system_instruction: Some(Content { role: None, parts: vec![Part::text(CHAT_SYSTEM_PROMPT)] }),
        contents,
        generation_config: None,
    }
}

/// Junta o texto do primeiro candidato.
fn extract_text(response: GenerateContentResponse) -> Result<String, AppError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AppError::AiUnavailable("response has no candidates".into()))?;

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AppError::AiUnavailable(format!(
            "empty answer (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(text)
}

/// Lê o JSON da resposta, tolerando cercas de markdown (```json ... ```).
fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, AppError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body)
        .map_err(|e| AppError::AiUnavailable(format!("could not parse model output: {}", e)))
}

// ---
// O adaptador
// ---

#[derive(Clone)]
pub struct GeminiAdvisor {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl GeminiAdvisor {
    pub fn new(api_key: String, base_url: &str, default_model: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model,
        })
    }

    async fn generate(&self, model: &str, request: &GenerateContentRequest) -> Result<String, AppError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        tracing::debug!("🤖 Chamando {} ({} mensagens)", model, request.contents.len());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::AiUnavailable(format!("request to {} failed: {}", model, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AiUnavailable(format!(
                "{} answered {}: {}",
                model,
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiUnavailable(format!("invalid response body: {}", e)))?;

        extract_text(parsed)
    }
}

#[async_trait]
impl AiAdvisor for GeminiAdvisor {
    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn diagnose(
        &self,
        model: &str,
        image: &ImageUpload,
        description: &str,
    ) -> Result<DiagnosisResult, AppError> {
        let request = single_prompt(
            vec![Part::text(diagnosis_prompt(description)), Part::image(image)],
            true,
        );
        let text = self.generate(model, &request).await?;
        let result: DiagnosisResult = parse_structured(&text)?;
        Ok(sanitize_diagnosis(result))
    }

    async fn preventative_measures(
        &self,
        model: &str,
        request: &PreventativeRequest,
    ) -> Result<String, AppError> {
        let body = single_prompt(vec![Part::text(preventative_prompt(request))], true);
        let text = self.generate(model, &body).await?;
        let parsed: PreventativeMeasuresResponse = parse_structured(&text)?;
        Ok(parsed.preventative_measures)
    }

    async fn farming_tips(
        &self,
        model: &str,
        request: &FarmingTipsRequest,
    ) -> Result<FarmingTipsResponse, AppError> {
        let body = single_prompt(vec![Part::text(farming_tips_prompt(request))], true);
        let text = self.generate(model, &body).await?;
        parse_structured(&text)
    }

    async fn chat(&self, model: &str, history: &[ChatTurn]) -> Result<String, AppError> {
        let text = self.generate(model, &chat_request(history)).await?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diagnosis_request_carries_inline_image_and_json_mode() {
        let image = ImageUpload { mime_type: "image/png".into(), bytes: b"leaf".to_vec() };
        let request = single_prompt(vec![Part::text("describe"), Part::image(&image)], true);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "describe");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "bGVhZg==");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn chat_history_maps_bot_turns_to_model_role() {
        let history = vec![
            ChatTurn { sender: ChatSender::User, text: "When to sow wheat?".into() },
            ChatTurn { sender: ChatSender::Bot, text: "November.".into() },
            ChatTurn { sender: ChatSender::User, text: "And mustard?".into() },
        ];

        let body = serde_json::to_value(chat_request(&history)).unwrap();
        let roles: Vec<_> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(roles, ["user", "model", "user"]);
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("AgriBot"));
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn extracts_text_from_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Hello " }, { "text": "farmer" }] }, "finishReason": "STOP" },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();

        assert_eq!(extract_text(response).unwrap(), "Hello farmer");
    }

    #[test]
    fn blocked_or_empty_answers_are_errors() {
        let no_candidates: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap();
        assert!(matches!(extract_text(no_candidates), Err(AppError::AiUnavailable(_))));

        let empty: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] })).unwrap();
        match extract_text(empty) {
            Err(AppError::AiUnavailable(reason)) => assert!(reason.contains("SAFETY")),
            other => panic!("esperava erro, veio {:?}", other),
        }
    }

    #[test]
    fn parses_structured_output_with_or_without_fences() {
        let plain = r#"{"disease":"Leaf rust","confidence":0.7,"treatmentRecommendations":"Spray propiconazole"}"#;
        let fenced = format!("```json\n{}\n```", plain);

        for text in [plain.to_string(), fenced] {
            let result: DiagnosisResult = parse_structured(&text).unwrap();
            assert_eq!(result.disease, "Leaf rust");
            assert_eq!(result.confidence, 0.7);
        }

        assert!(parse_structured::<DiagnosisResult>("not json").is_err());
    }

    #[test]
    fn farming_tips_general_advice_is_optional() {
        let tips: FarmingTipsResponse = parse_structured(
            r#"{"tips":[{"title":"Drainage","content":"Clear channels.","category":"Water Management"}]}"#,
        )
        .unwrap();
        assert_eq!(tips.tips.len(), 1);
        assert!(tips.general_advice.is_none());
    }
}
