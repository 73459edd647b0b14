// src/store/mod.rs

//! Relational store behind the need services.
//!
//! `Store` is the only way services reach the database. Two backends exist:
//! Postgres for deployments and SQLite for local runs and tests. Both keep
//! `needs.volunteer_count` in step with `need_volunteers` by changing the two
//! inside one transaction.

pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;

use crate::models::{
    need::{Need, NeedAuthorRow, NeedFilter, NewNeed},
    user::{NewUser, User},
    volunteer::VolunteerInfo,
};

pub use postgres::PgStore;
pub use sqlite::SqliteStore;

/// Columns selected for a need joined with its author (`n` = needs, `u` = users).
pub(crate) const NEED_AUTHOR_COLUMNS: &str = r#"
    n.id, n.user_id, n.title, n.description, n.category, n.city,
    n.phone_whatsapp, n.volunteer_count, n.is_resolved,
    n.created_at, n.updated_at,
    u.name AS author_name, u.username AS author_username
"#;

pub(crate) const USER_COLUMNS: &str = r#"
    id, name, username, email, password, email_verified, gender, role,
    created_at, updated_at
"#;

/// Result of trying to add a volunteer to a need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolunteerOutcome {
    /// Row inserted; carries the need's new volunteer count.
    Added { volunteer_count: i32 },
    NeedMissing,
    NeedResolved,
    AlreadyVolunteered,
}

/// Result of trying to remove a volunteer from a need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnvolunteerOutcome {
    /// Row deleted; carries the need's new volunteer count.
    Removed { volunteer_count: i32 },
    NotVolunteered,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<User, sqlx::Error>;

    /// Looks a user up by username or email (both stored lower-cased).
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error>;

    async fn find_user(&self, id: &str) -> Result<Option<User>, sqlx::Error>;

    async fn create_need(&self, need: &NewNeed) -> Result<Need, sqlx::Error>;

    async fn find_need(&self, id: &str) -> Result<Option<Need>, sqlx::Error>;

    async fn find_need_with_author(&self, id: &str) -> Result<Option<NeedAuthorRow>, sqlx::Error>;

    /// Needs matching the filter, newest first.
    async fn list_needs(&self, filter: &NeedFilter) -> Result<Vec<NeedAuthorRow>, sqlx::Error>;

    /// Needs owned by the user, open and resolved, newest first.
    async fn needs_by_owner(&self, user_id: &str) -> Result<Vec<NeedAuthorRow>, sqlx::Error>;

    /// Needs the user volunteered for, most recent commitment first.
    async fn needs_volunteered_by(&self, user_id: &str)
    -> Result<Vec<NeedAuthorRow>, sqlx::Error>;

    /// Volunteers of the given needs, oldest commitment first.
    async fn volunteers_for(&self, need_ids: &[String]) -> Result<Vec<VolunteerInfo>, sqlx::Error>;

    /// Inserts the volunteer row and increments the counter as one unit of work.
    async fn add_volunteer(&self, need_id: &str, user_id: &str)
    -> Result<VolunteerOutcome, sqlx::Error>;

    /// Deletes the volunteer row and decrements the counter (floored at 0) as one unit of work.
    async fn remove_volunteer(
        &self,
        need_id: &str,
        user_id: &str,
    ) -> Result<UnvolunteerOutcome, sqlx::Error>;

    /// Sets `is_resolved`. Returns false when the need does not exist.
    async fn mark_resolved(&self, need_id: &str) -> Result<bool, sqlx::Error>;

    /// Deletes the need; volunteers go with it. Returns false when nothing was deleted.
    async fn delete_need(&self, need_id: &str) -> Result<bool, sqlx::Error>;
}

/// True when the error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
