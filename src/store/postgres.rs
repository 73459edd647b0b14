// src/store/postgres.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder, migrate::MigrateError};

use super::{
    NEED_AUTHOR_COLUMNS, Store, USER_COLUMNS, UnvolunteerOutcome, VolunteerOutcome,
    is_unique_violation, new_id,
};
use crate::models::{
    need::{Need, NeedAuthorRow, NeedFilter, NewNeed},
    user::{DEFAULT_ROLE, NewUser, User},
    volunteer::VolunteerInfo,
};

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations/postgres").run(&self.pool).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, sqlx::Error> {
        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO users (id, name, username, email, password, email_verified, gender, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7, $8, $8)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(new_id())
            .bind(&user.name)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.gender)
            .bind(DEFAULT_ROLE)
            .bind(now)
            .fetch_one(&self.pool)
            .await
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1");

        sqlx::query_as::<_, User>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_need(&self, need: &NewNeed) -> Result<Need, sqlx::Error> {
        let now = Utc::now();
        let created = Need {
            id: new_id(),
            user_id: need.user_id.clone(),
            title: need.title.clone(),
            description: need.description.clone(),
            category: need.category,
            city: need.city.clone(),
            phone_whatsapp: need.phone_whatsapp.clone(),
            volunteer_count: 0,
            is_resolved: false,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO needs (
                id, user_id, title, description, category, city, phone_whatsapp,
                volunteer_count, is_resolved, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0, FALSE, $8, $8)
            "#,
        )
        .bind(&created.id)
        .bind(&created.user_id)
        .bind(&created.title)
        .bind(&created.description)
        .bind(created.category.as_str())
        .bind(&created.city)
        .bind(&created.phone_whatsapp)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_need(&self, id: &str) -> Result<Option<Need>, sqlx::Error> {
        sqlx::query_as::<_, Need>(
            r#"
            SELECT id, user_id, title, description, category, city, phone_whatsapp,
                   volunteer_count, is_resolved, created_at, updated_at
            FROM needs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_need_with_author(&self, id: &str) -> Result<Option<NeedAuthorRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {NEED_AUTHOR_COLUMNS} FROM needs n JOIN users u ON u.id = n.user_id WHERE n.id = $1"
        );

        sqlx::query_as::<_, NeedAuthorRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_needs(&self, filter: &NeedFilter) -> Result<Vec<NeedAuthorRow>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {NEED_AUTHOR_COLUMNS} FROM needs n JOIN users u ON u.id = n.user_id WHERE n.is_resolved = "
        ));
        builder.push_bind(filter.resolved.unwrap_or(false));

        if let Some(city) = &filter.city {
            builder.push(" AND LOWER(n.city) = LOWER(");
            builder.push_bind(city.clone());
            builder.push(")");
        }
        if let Some(category) = filter.category {
            builder.push(" AND n.category = ");
            builder.push_bind(category.as_str());
        }
        builder.push(" ORDER BY n.created_at DESC");

        builder
            .build_query_as::<NeedAuthorRow>()
            .fetch_all(&self.pool)
            .await
    }

    async fn needs_by_owner(&self, user_id: &str) -> Result<Vec<NeedAuthorRow>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {NEED_AUTHOR_COLUMNS}
            FROM needs n
            JOIN users u ON u.id = n.user_id
            WHERE n.user_id = $1
            ORDER BY n.created_at DESC
            "#
        );

        sqlx::query_as::<_, NeedAuthorRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn needs_volunteered_by(
        &self,
        user_id: &str,
    ) -> Result<Vec<NeedAuthorRow>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {NEED_AUTHOR_COLUMNS}
            FROM need_volunteers v
            JOIN needs n ON n.id = v.need_id
            JOIN users u ON u.id = n.user_id
            WHERE v.user_id = $1
            ORDER BY v.created_at DESC
            "#
        );

        sqlx::query_as::<_, NeedAuthorRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn volunteers_for(&self, need_ids: &[String]) -> Result<Vec<VolunteerInfo>, sqlx::Error> {
        if need_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, VolunteerInfo>(
            r#"
            SELECT v.id, v.need_id, v.user_id, u.name, u.username, v.created_at
            FROM need_volunteers v
            JOIN users u ON u.id = v.user_id
            WHERE v.need_id = ANY($1)
            ORDER BY v.created_at ASC
            "#,
        )
        .bind(need_ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn add_volunteer(
        &self,
        need_id: &str,
        user_id: &str,
    ) -> Result<VolunteerOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Lock the need so the resolved check and the counter update see the same row.
        let need: Option<(bool,)> =
            sqlx::query_as("SELECT is_resolved FROM needs WHERE id = $1 FOR UPDATE")
                .bind(need_id)
                .fetch_optional(&mut *tx)
                .await?;

        match need {
            None => return Ok(VolunteerOutcome::NeedMissing),
            Some((true,)) => return Ok(VolunteerOutcome::NeedResolved),
            Some((false,)) => {}
        }

        let existing = sqlx::query(
            "SELECT 1 FROM need_volunteers WHERE need_id = $1 AND user_id = $2",
        )
        .bind(need_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            return Ok(VolunteerOutcome::AlreadyVolunteered);
        }

        let inserted = sqlx::query(
            "INSERT INTO need_volunteers (id, need_id, user_id, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(new_id())
        .bind(need_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                // Concurrent request won the race
                return Ok(VolunteerOutcome::AlreadyVolunteered);
            }
            return Err(e);
        }

        let (volunteer_count,): (i32,) = sqlx::query_as(
            r#"
            UPDATE needs
            SET volunteer_count = volunteer_count + 1, updated_at = $2
            WHERE id = $1
            RETURNING volunteer_count
            "#,
        )
        .bind(need_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(VolunteerOutcome::Added { volunteer_count })
    }

    async fn remove_volunteer(
        &self,
        need_id: &str,
        user_id: &str,
    ) -> Result<UnvolunteerOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM need_volunteers WHERE need_id = $1 AND user_id = $2")
            .bind(need_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Ok(UnvolunteerOutcome::NotVolunteered);
        }

        let (volunteer_count,): (i32,) = sqlx::query_as(
            r#"
            UPDATE needs
            SET volunteer_count = GREATEST(0, volunteer_count - 1), updated_at = $2
            WHERE id = $1
            RETURNING volunteer_count
            "#,
        )
        .bind(need_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(UnvolunteerOutcome::Removed { volunteer_count })
    }

    async fn mark_resolved(&self, need_id: &str) -> Result<bool, sqlx::Error> {
        let updated = sqlx::query(
            "UPDATE needs SET is_resolved = TRUE, updated_at = $2 WHERE id = $1",
        )
        .bind(need_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(updated.rows_affected() > 0)
    }

    async fn delete_need(&self, need_id: &str) -> Result<bool, sqlx::Error> {
        let deleted = sqlx::query("DELETE FROM needs WHERE id = $1")
            .bind(need_id)
            .execute(&self.pool)
            .await?;

        Ok(deleted.rows_affected() > 0)
    }
}
