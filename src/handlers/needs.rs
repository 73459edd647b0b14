// src/handlers/needs.rs

//! HTTP adapter over the need services.
//!
//! Mutations answer with the tagged result `{"success": true, ...}`; failures
//! are rendered by `NeedError` as `{"success": false, "error", "code"}`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    config::Config,
    error::NeedError,
    models::need::{CreateNeedRequest, NeedListParams},
    services::{needs, queries},
    session::Session,
    store::Store,
};

/// List needs. Resolved needs are hidden unless `resolved=true`.
pub async fn list_needs(
    State(store): State<Arc<dyn Store>>,
    Query(params): Query<NeedListParams>,
) -> Result<impl IntoResponse, NeedError> {
    let filter = queries::filter_from_params(params)?;
    let needs = queries::list_needs(store.as_ref(), &filter).await?;
    Ok(Json(needs))
}

/// Get a single need with its author and volunteers.
pub async fn get_need(
    State(store): State<Arc<dyn Store>>,
    State(config): State<Config>,
    session: Option<Session>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, NeedError> {
    let detail =
        queries::get_need(store.as_ref(), session.as_ref(), &id, &config.public_base_url).await?;
    Ok(Json(detail))
}

/// Create a new need owned by the caller.
pub async fn create_need(
    State(store): State<Arc<dyn Store>>,
    session: Option<Session>,
    Json(payload): Json<CreateNeedRequest>,
) -> Result<impl IntoResponse, NeedError> {
    let need = needs::create_need(store.as_ref(), session.as_ref(), payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "need": need })),
    ))
}

/// Volunteer for a need.
pub async fn volunteer(
    State(store): State<Arc<dyn Store>>,
    session: Option<Session>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, NeedError> {
    let volunteer_count = needs::volunteer_for_need(store.as_ref(), session.as_ref(), &id).await?;
    Ok(Json(json!({ "success": true, "volunteerCount": volunteer_count })))
}

/// Withdraw from a need.
pub async fn unvolunteer(
    State(store): State<Arc<dyn Store>>,
    session: Option<Session>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, NeedError> {
    let volunteer_count =
        needs::unvolunteer_for_need(store.as_ref(), session.as_ref(), &id).await?;
    Ok(Json(json!({ "success": true, "volunteerCount": volunteer_count })))
}

/// Mark a need resolved. Owner only.
pub async fn resolve_need(
    State(store): State<Arc<dyn Store>>,
    session: Option<Session>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, NeedError> {
    needs::resolve_need(store.as_ref(), session.as_ref(), &id).await?;
    Ok(Json(json!({ "success": true })))
}

/// Delete a need and its volunteers. Owner only.
pub async fn delete_need(
    State(store): State<Arc<dyn Store>>,
    session: Option<Session>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, NeedError> {
    needs::delete_need(store.as_ref(), session.as_ref(), &id).await?;
    Ok(Json(json!({ "success": true })))
}
