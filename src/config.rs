// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{CatalogRepository, ChatRepository, DiagnosisRepository, OrderRepository, UserRepository},
    services::{
        admin_service::AdminService,
        ai::{resolve_model, AiAdvisor},
        auth::AuthService,
        catalog_service::CatalogService,
        chat_service::ChatService,
        diagnosis_service::DiagnosisService,
        gemini::{GeminiAdvisor, DEFAULT_BASE_URL},
        order_service::OrderService,
        storage::{ImageStore, LocalImageStore},
    },
};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

// Configuração lida das variáveis de ambiente (ou do .env)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub db_max_connections: u32,
    pub seed_catalog: bool,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{} deve ser definida", name))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

// Mesma regra aplicada ao modelo escolhido por requisição
fn checked_model(model: &str) -> anyhow::Result<String> {
    resolve_model(None, model).map_err(|_| anyhow::anyhow!("GEMINI_MODEL inválido: '{}'", model))
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("valor booleano inválido: '{}'", other),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: checked_model(&optional("GEMINI_MODEL", DEFAULT_MODEL))?,
            gemini_base_url: optional("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            bind_addr: optional("BIND_ADDR", "0.0.0.0:3000")
                .parse()
                .context("BIND_ADDR inválido")?,
            upload_dir: PathBuf::from(optional("UPLOAD_DIR", "uploads")),
            public_base_url: optional("PUBLIC_BASE_URL", "http://localhost:3000"),
            db_max_connections: optional("DB_MAX_CONNECTIONS", "5")
                .parse()
                .context("DB_MAX_CONNECTIONS inválido")?,
            seed_catalog: parse_flag(&optional("SEED_CATALOG", "true"))
                .context("SEED_CATALOG inválido")?,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: I18nStore,

    pub user_repo: UserRepository,

    pub auth_service: AuthService,
    pub diagnosis_service: DiagnosisService,
    pub chat_service: ChatService,
    pub catalog_service: CatalogService,
    pub order_service: OrderService,
    pub admin_service: AdminService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let i18n_store = I18nStore::load()?;

        let advisor: Arc<dyn AiAdvisor> = Arc::new(GeminiAdvisor::new(
            config.gemini_api_key.clone(),
            &config.gemini_base_url,
            config.gemini_model.clone(),
        )?);

        let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(
            config.upload_dir.clone(),
            &config.public_base_url,
        ));

        Ok(Self::assemble(db_pool, config, i18n_store, advisor, images))
    }

    // --- Monta o gráfico de dependências ---
    pub fn assemble(
        db_pool: PgPool,
        config: Config,
        i18n_store: I18nStore,
        advisor: Arc<dyn AiAdvisor>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let diagnosis_repo = DiagnosisRepository::new(db_pool.clone());
        let chat_repo = ChatRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), config.jwt_secret.clone());
        let diagnosis_service = DiagnosisService::new(diagnosis_repo.clone(), advisor.clone(), images);
        let chat_service = ChatService::new(chat_repo, advisor);
        let catalog_service = CatalogService::new(catalog_repo.clone(), db_pool.clone());
        let order_service = OrderService::new(order_repo.clone(), catalog_repo.clone(), db_pool.clone());
        let admin_service = AdminService::new(user_repo.clone(), diagnosis_repo, catalog_repo, order_repo);

        Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            user_repo,
            auth_service,
            diagnosis_service,
            chat_service,
            catalog_service,
            order_service,
            admin_service,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_flags_accept_common_spellings() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn configured_model_must_be_a_plain_identifier() {
        assert_eq!(checked_model(DEFAULT_MODEL).unwrap(), DEFAULT_MODEL);
        assert!(checked_model("models/../gemini").is_err());
        assert!(checked_model("gemini 2").is_err());
    }
}
