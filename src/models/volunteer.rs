// src/models/volunteer.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'need_volunteers' table: one user's commitment to one need.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedVolunteer {
    pub id: String,
    pub need_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// A volunteer row joined with the volunteer's public profile.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerInfo {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub volunteer: NeedVolunteer,
    pub name: String,
    pub username: String,
}
