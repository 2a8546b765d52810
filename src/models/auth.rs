// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::validation::validate_not_blank;

// Nível de acesso gravado no perfil do usuário
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Farmer,
    Expert,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Farmer => "farmer",
            UserRole::Expert => "expert",
            UserRole::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "uid")]
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub display_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Nome exibido quando o cadastro não informa um: a parte local do e-mail.
pub fn default_display_name(email: &str) -> String {
    email
        .split('@')
        .next()
        .filter(|local| !local.trim().is_empty())
        .map(|local| local.trim().to_string())
        .unwrap_or_else(|| "User".to_string())
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(email(message = "The e-mail address is invalid."))]
    pub email: String,
    #[validate(length(min = 6, message = "The password must have at least 6 characters."))]
    pub password: String,
    #[validate(
        length(min = 1, max = 80, message = "The display name must have between 1 and 80 characters."),
        custom(function = "validate_not_blank")
    )]
    pub display_name: Option<String>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "The e-mail address is invalid."))]
    pub email: String,
    #[validate(length(min = 6, message = "The password must have at least 6 characters."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(
        length(min = 1, max = 80, message = "The display name must have between 1 and 80 characters."),
        custom(function = "validate_not_blank")
    )]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    #[validate(url(message = "The photo URL is invalid."))]
    pub photo_url: Option<String>,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_defaults_to_email_local_part() {
        assert_eq!(default_display_name("ravi.kumar@example.in"), "ravi.kumar");
        assert_eq!(default_display_name("@example.in"), "User");
    }

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Expert).unwrap(), "\"expert\"");
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
        assert!(serde_json::from_str::<UserRole>("\"superuser\"").is_err());
    }

    #[test]
    fn register_payload_rejects_short_password() {
        let payload = RegisterUserPayload {
            email: "farmer@example.in".into(),
            password: "123".into(),
            display_name: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn blank_display_name_is_rejected() {
        let update = UpdateProfilePayload {
            display_name: Some("    ".into()),
            photo_url: None,
        };
        assert!(update.validate().unwrap_err().field_errors().contains_key("display_name"));

        let register = RegisterUserPayload {
            email: "farmer@example.in".into(),
            password: "secret123".into(),
            display_name: Some(" ".into()),
        };
        assert!(register.validate().unwrap_err().field_errors().contains_key("display_name"));
    }

    #[test]
    fn profile_json_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "farmer@example.in".into(),
            password_hash: "$2b$12$secret".into(),
            display_name: "farmer".into(),
            photo_url: None,
            role: UserRole::Farmer,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["uid"], user.id.to_string());
        assert_eq!(json["role"], "farmer");
    }
}
