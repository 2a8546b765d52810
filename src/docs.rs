// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::update_me,

        // --- Diagnosis ---
        handlers::diagnosis::diagnose,
        handlers::diagnosis::list_history,
        handlers::diagnosis::get_entry,
        handlers::diagnosis::request_expert_review,

        // --- Advice ---
        handlers::diagnosis::preventative_measures,
        handlers::diagnosis::farming_tips,

        // --- Expert ---
        handlers::expert::list_pending_queries,
        handlers::expert::submit_review,
        handlers::expert::close_query,

        // --- Chat ---
        handlers::chat::send_message,
        handlers::chat::list_sessions,
        handlers::chat::list_session,

        // --- Catalog ---
        handlers::catalog::list_categories,
        handlers::catalog::list_products,
        handlers::catalog::get_product,

        // --- Orders ---
        handlers::orders::place_order,
        handlers::orders::list_my_orders,
        handlers::orders::get_order,

        // --- Admin ---
        handlers::admin::list_users,
        handlers::admin::update_user_role,
        handlers::admin::update_user_status,
        handlers::admin::dashboard_stats,
        handlers::catalog::create_category,
        handlers::catalog::delete_category,
        handlers::catalog::create_product,
        handlers::catalog::update_product,
        handlers::catalog::delete_product,
        handlers::catalog::seed_catalog,
        handlers::orders::list_all_orders,
        handlers::orders::update_order_status,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::UserStatus,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::UpdateProfilePayload,
            models::auth::AuthResponse,

            // --- Diagnosis ---
            models::diagnosis::DiagnosisStatus,
            models::diagnosis::DiagnosisResult,
            models::diagnosis::DiagnosisHistoryEntry,
            models::diagnosis::DiagnosePayload,
            models::diagnosis::DiagnoseResponse,
            models::diagnosis::PreventativeMeasuresPayload,
            models::diagnosis::PreventativeMeasuresResponse,
            models::diagnosis::FarmingTipsPayload,
            models::diagnosis::FarmingTip,
            models::diagnosis::FarmingTipsResponse,
            models::diagnosis::ExpertReviewPayload,

            // --- Chat ---
            models::chat::ChatSender,
            models::chat::ChatMessage,
            models::chat::ChatSessionSummary,
            models::chat::SendMessagePayload,
            models::chat::ChatExchange,

            // --- Catalog ---
            models::catalog::ProductCategory,
            models::catalog::Product,
            models::catalog::CreateCategoryPayload,
            models::catalog::ProductPayload,

            // --- Orders ---
            models::orders::OrderStatus,
            models::orders::ShippingAddress,
            models::orders::OrderItem,
            models::orders::Order,
            models::orders::OrderLinePayload,
            models::orders::PlaceOrderPayload,
            models::orders::UpdateOrderStatusPayload,

            // --- Admin ---
            models::admin::UsersByRole,
            models::admin::AdminDashboardStats,
            models::admin::UpdateRolePayload,
            models::admin::UpdateStatusPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Diagnosis", description = "Diagnóstico de Doenças por IA e Histórico"),
        (name = "Advice", description = "Medidas Preventivas e Dicas de Cultivo"),
        (name = "Expert", description = "Fila de Revisão dos Especialistas"),
        (name = "Chat", description = "Conversa com o AgriBot"),
        (name = "Catalog", description = "Catálogo de Insumos"),
        (name = "Orders", description = "Pedidos da Loja"),
        (name = "Admin", description = "Usuários, Catálogo, Pedidos e Indicadores")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/diagnoses"));
        assert!(doc.paths.paths.contains_key("/api/admin/users/{id}/role"));
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("api_jwt")));
    }
}
