//! services/api/src/web/router.rs
//!
//! Assembles the full axum application: public and protected routes, CORS,
//! request tracing and the Swagger UI.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    auth::{
        delete_me_handler, login_handler, logout_handler, me_handler, register_handler,
        update_me_handler,
    },
    chat::{
        create_session_handler, delete_session_handler, delete_summary_handler,
        get_session_handler, get_summary_handler, list_sessions_handler, meta_summarize_handler,
        rename_session_handler, summarize_handler, update_summary_handler,
    },
    middleware::require_auth,
    rest::{health_handler, ApiDoc},
    state::AppState,
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
}

/// Builds the application router around the shared state.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config.allowed_origins);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/auth/me",
            get(me_handler).patch(update_me_handler).delete(delete_me_handler),
        )
        .route(
            "/chat/sessions",
            post(create_session_handler).get(list_sessions_handler),
        )
        .route(
            "/chat/sessions/{session_id}",
            get(get_session_handler)
                .patch(rename_session_handler)
                .delete(delete_session_handler),
        )
        .route(
            "/chat/sessions/{session_id}/summaries/{summary_index}",
            get(get_summary_handler)
                .patch(update_summary_handler)
                .delete(delete_summary_handler),
        )
        .route("/chat/summarize", post(summarize_handler))
        .route("/chat/meta-summarize", post(meta_summarize_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
