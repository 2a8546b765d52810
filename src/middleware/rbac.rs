// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{User, UserRole},
};

/// 1. O Trait que define quais cargos passam pelo guardião
pub trait RoleRequirement: Send + Sync + 'static {
    fn allowed() -> &'static [UserRole];
}

/// 2. O Extractor (Guardião). Carrega o usuário já verificado.
pub struct RequireRole<R> {
    pub user: User,
    _requirement: PhantomData<R>,
}

// 3. Implementação do FromRequestParts
impl<R, S> FromRequestParts<S> for RequireRole<R>
where
    R: RoleRequirement,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !R::allowed().contains(&user.role) {
            let app_state = AppState::from_ref(state);
            let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();

            tracing::warn!(
                "⛔ {} ({}) barrado em {}",
                user.id,
                user.role.as_str(),
                parts.uri.path()
            );
            return Err(AppError::PermissionDenied.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole { user, _requirement: PhantomData })
    }
}

// ---
// DEFINIÇÃO DOS REQUISITOS (TIPOS)
// ---

pub struct AdminOnly;
impl RoleRequirement for AdminOnly {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin] }
}

pub struct ExpertOrAdmin;
impl RoleRequirement for ExpertOrAdmin {
    fn allowed() -> &'static [UserRole] { &[UserRole::Expert, UserRole::Admin] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::testing::test_state, models::auth::UserStatus};
    use axum::{
        body::Body,
        extract::Request,
        http::StatusCode,
        routing::get,
        Router,
    };
    use chrono::Utc;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    fn user_with(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "guard@example.in".into(),
            password_hash: String::new(),
            display_name: "guard".into(),
            photo_url: None,
            role,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // Rota só de admin que registra se o handler chegou a rodar
    fn admin_route(ran: Arc<AtomicBool>) -> Router {
        Router::new()
            .route(
                "/admin/ping",
                get(move |_guard: RequireRole<AdminOnly>| async move {
                    ran.store(true, Ordering::SeqCst);
                    "pong"
                }),
            )
            .with_state(test_state())
    }

    fn request_as(role: UserRole) -> Request {
        let mut request = Request::builder().uri("/admin/ping").body(Body::empty()).unwrap();
        request.extensions_mut().insert(AuthenticatedUser(user_with(role)));
        request
    }

    #[tokio::test]
    async fn non_admin_is_rejected_before_handler_runs() {
        for role in [UserRole::Farmer, UserRole::Expert] {
            let ran = Arc::new(AtomicBool::new(false));
            let response = admin_route(ran.clone()).oneshot(request_as(role)).await.unwrap();

            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert!(!ran.load(Ordering::SeqCst));
        }
    }

    #[tokio::test]
    async fn admin_reaches_handler() {
        let ran = Arc::new(AtomicBool::new(false));
        let response = admin_route(ran.clone()).oneshot(request_as(UserRole::Admin)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unauthenticated_request_is_401() {
        let ran = Arc::new(AtomicBool::new(false));
        let request = Request::builder().uri("/admin/ping").body(Body::empty()).unwrap();
        let response = admin_route(ran.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn expert_requirement_includes_admins() {
        assert!(ExpertOrAdmin::allowed().contains(&UserRole::Admin));
        assert!(!ExpertOrAdmin::allowed().contains(&UserRole::Farmer));
    }
}
