//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG manda; sem ele, info geral e debug para o nosso crate
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,agricheck=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr;
    let seed_catalog = config.seed_catalog;

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if seed_catalog {
        app_state.catalog_service.seed_default_catalog().await?;
    }

    let app = build_router(app_state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Catálogo público
    let catalog_routes = Router::new()
        .route("/categories", get(handlers::catalog::list_categories))
        .route("/products", get(handlers::catalog::list_products))
        .route("/products/{id}", get(handlers::catalog::get_product));

    // Tudo abaixo exige um usuário autenticado
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me).patch(handlers::auth::update_me));

    let diagnosis_routes = Router::new()
        .route(
            "/",
            post(handlers::diagnosis::diagnose).get(handlers::diagnosis::list_history),
        )
        .route("/{id}", get(handlers::diagnosis::get_entry))
        .route("/{id}/expert-review", post(handlers::diagnosis::request_expert_review));

    let advice_routes = Router::new()
        .route("/preventative-measures", post(handlers::diagnosis::preventative_measures))
        .route("/farming-tips", post(handlers::diagnosis::farming_tips));

    let expert_routes = Router::new()
        .route("/queries", get(handlers::expert::list_pending_queries))
        .route("/queries/{id}/review", post(handlers::expert::submit_review))
        .route("/queries/{id}/close", post(handlers::expert::close_query));

    let chat_routes = Router::new()
        .route("/messages", post(handlers::chat::send_message))
        .route("/sessions", get(handlers::chat::list_sessions))
        .route("/sessions/{session_id}", get(handlers::chat::list_session));

    let order_routes = Router::new()
        .route(
            "/",
            post(handlers::orders::place_order).get(handlers::orders::list_my_orders),
        )
        .route("/{id}", get(handlers::orders::get_order));

    // O cargo é checado em cada handler pelo RequireRole
    let admin_routes = Router::new()
        .route("/users", get(handlers::admin::list_users))
        .route("/users/{id}/role", patch(handlers::admin::update_user_role))
        .route("/users/{id}/status", patch(handlers::admin::update_user_status))
        .route("/stats", get(handlers::admin::dashboard_stats))
        .route("/catalog/categories", post(handlers::catalog::create_category))
        .route("/catalog/categories/{id}", delete(handlers::catalog::delete_category))
        .route("/catalog/products", post(handlers::catalog::create_product))
        .route(
            "/catalog/products/{id}",
            put(handlers::catalog::update_product).delete(handlers::catalog::delete_product),
        )
        .route("/catalog/seed", post(handlers::catalog::seed_catalog))
        .route("/orders", get(handlers::orders::list_all_orders))
        .route("/orders/{id}/status", patch(handlers::orders::update_order_status));

    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/diagnoses", diagnosis_routes)
        .nest("/advice", advice_routes)
        .nest("/expert", expert_routes)
        .nest("/chat", chat_routes)
        .nest("/orders", order_routes)
        .nest("/admin", admin_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let api = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .nest("/catalog", catalog_routes)
        .merge(protected);

    let upload_dir = app_state.config.upload_dir.clone();

    // Combina tudo no router principal
    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::testing::test_state;
    use axum::{body::Body, extract::Request, http::StatusCode};
    use tower::ServiceExt;

    async fn status_of(uri: &str) -> StatusCode {
        build_router(test_state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn health_is_public() {
        assert_eq!(status_of("/api/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/users/me", "/api/diagnoses", "/api/admin/stats", "/api/expert/queries"] {
            assert_eq!(status_of(uri).await, StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        assert_eq!(status_of("/api-docs/openapi.json").await, StatusCode::OK);
    }
}
