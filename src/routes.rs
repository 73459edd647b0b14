// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, dashboard, meta, needs},
    session::auth_middleware,
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, needs, dashboard, meta).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store handle and config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    // Mutations read the session themselves so anonymous callers get the tagged error body.
    let need_routes = Router::new()
        .route("/", get(needs::list_needs).post(needs::create_need))
        .route("/{id}", get(needs::get_need).delete(needs::delete_need))
        .route(
            "/{id}/volunteer",
            post(needs::volunteer).delete(needs::unvolunteer),
        )
        .route("/{id}/resolve", post(needs::resolve_need));

    let dashboard_routes = Router::new()
        .route("/needs", get(dashboard::list_my_needs))
        .route("/volunteering", get(dashboard::list_my_volunteering))
        .route("/stats", get(dashboard::get_stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/needs", need_routes)
        .nest("/api/me", dashboard_routes)
        .route("/api/meta", get(meta::get_meta))
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
