// src/handlers/dashboard.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{error::AppError, services::queries, session::Session, store::Store};

/// List needs created by the current user, open and resolved.
pub async fn list_my_needs(
    State(store): State<Arc<dyn Store>>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let needs = queries::my_needs(store.as_ref(), Some(&session)).await?;
    Ok(Json(needs))
}

/// List needs the current user volunteered for.
pub async fn list_my_volunteering(
    State(store): State<Arc<dyn Store>>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let needs = queries::my_volunteering(store.as_ref(), Some(&session)).await?;
    Ok(Json(needs))
}

/// Dashboard counters: active requests, active commitments, completed.
pub async fn get_stats(
    State(store): State<Arc<dyn Store>>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let stats = queries::dashboard_stats(store.as_ref(), Some(&session)).await?;
    Ok(Json(stats))
}
