// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Nosso tipo de erro de domínio. Os handlers convertem para `ApiError` na borda.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta inativa")]
    AccountInactive,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Diagnóstico não encontrado")]
    DiagnosisNotFound,

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Categoria não encontrada")]
    CategoryNotFound,

    #[error("Pedido não encontrado")]
    OrderNotFound,

    #[error("Permissão negada")]
    PermissionDenied,

    #[error("Administrador tentou alterar a própria conta")]
    CannotChangeOwnAccount,

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Estoque insuficiente para {0}")]
    InsufficientStock(String),

    #[error("Categoria em uso")]
    CategoryInUse,

    #[error("Produto já consta em pedidos")]
    ProductInUse,

    #[error("Categoria já existe: {0}")]
    CategoryAlreadyExists(String),

    #[error("Imagem inválida: {0}")]
    InvalidImage(String),

    #[error("Modelo de IA inválido: {0}")]
    InvalidModel(String),

    #[error("Serviço de IA indisponível: {0}")]
    AiUnavailable(String),

    #[error("Falha no armazenamento de imagens: {0}")]
    StorageError(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Erro pronto para ir ao cliente: status + mensagem já traduzida.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidModel(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::AccountInactive
            | AppError::PermissionDenied
            | AppError::CannotChangeOwnAccount => StatusCode::FORBIDDEN,
            AppError::UserNotFound
            | AppError::DiagnosisNotFound
            | AppError::ProductNotFound
            | AppError::CategoryNotFound
            | AppError::OrderNotFound => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::InvalidStatusTransition { .. }
            | AppError::InsufficientStock(_)
            | AppError::CategoryInUse
            | AppError::ProductInUse
            | AppError::CategoryAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::InvalidImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AiUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::StorageError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro numa resposta localizada para o idioma do pedido.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status_code();
        let lang = locale.0.as_str();

        let error = match &self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                return ApiError {
                    status,
                    error: i18n.translate(lang, "errors.validation"),
                    details: Some(json!(details)),
                };
            }
            AppError::EmailAlreadyExists => i18n.translate(lang, "errors.email_exists"),
            AppError::InvalidCredentials => i18n.translate(lang, "errors.invalid_credentials"),
            AppError::InvalidToken => i18n.translate(lang, "errors.invalid_token"),
            AppError::AccountInactive => i18n.translate(lang, "errors.account_inactive"),
            AppError::UserNotFound => i18n.translate(lang, "errors.user_not_found"),
            AppError::DiagnosisNotFound => i18n.translate(lang, "errors.diagnosis_not_found"),
            AppError::ProductNotFound => i18n.translate(lang, "errors.product_not_found"),
            AppError::CategoryNotFound => i18n.translate(lang, "errors.category_not_found"),
            AppError::OrderNotFound => i18n.translate(lang, "errors.order_not_found"),
            AppError::PermissionDenied => i18n.translate(lang, "errors.permission_denied"),
            AppError::CannotChangeOwnAccount => i18n.translate(lang, "errors.own_account_change"),
            AppError::InvalidStatusTransition { from, .. } => {
                i18n.translate_with(lang, "errors.invalid_transition", &[("from", from)])
            }
            AppError::InsufficientStock(product) => {
                i18n.translate_with(lang, "errors.insufficient_stock", &[("product", product)])
            }
            AppError::CategoryInUse => i18n.translate(lang, "errors.category_in_use"),
            AppError::ProductInUse => i18n.translate(lang, "errors.product_in_use"),
            AppError::CategoryAlreadyExists(name) => {
                i18n.translate_with(lang, "errors.category_exists", &[("name", name)])
            }
            AppError::InvalidImage(reason) => {
                i18n.translate_with(lang, "errors.invalid_image", &[("reason", reason)])
            }
            AppError::InvalidModel(_) => i18n.translate(lang, "errors.invalid_model"),
            AppError::AiUnavailable(cause) => {
                tracing::warn!("Falha na chamada ao serviço de IA: {}", cause);
                i18n.translate(lang, "errors.ai_unavailable")
            }
            // Todos os outros erros viram 500; o detalhe fica só no log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                i18n.translate(lang, "errors.internal")
            }
        };

        ApiError {
            status,
            error,
            details: None,
        }
    }
}
