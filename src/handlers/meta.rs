// src/handlers/meta.rs

use axum::{Json, response::IntoResponse};
use serde_json::json;

use crate::models::need::{CITIES, Category};

/// Reference data for need forms and filters.
pub async fn get_meta() -> impl IntoResponse {
    let categories: Vec<_> = Category::ALL
        .iter()
        .map(|c| json!({ "value": c.as_str(), "label": c.label() }))
        .collect();

    Json(json!({
        "categories": categories,
        "cities": CITIES,
    }))
}
