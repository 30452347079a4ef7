//! User repository

use async_trait::async_trait;
use chrono::Utc;
use pullreq_core::{Entity, StoreError, StoreResult, User, UserStore};
use sqlx::{FromRow, SqlitePool};

use crate::error::Error;

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User::new(row.user_id, row.username, row.team_name).with_active(row.is_active)
    }
}

pub(crate) const UPSERT_USER: &str = r#"
    INSERT INTO users (user_id, username, team_name, is_active, updated_at)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT(user_id) DO UPDATE SET
        username = excluded.username,
        team_name = excluded.team_name,
        is_active = excluded.is_active,
        updated_at = excluded.updated_at
"#;

/// Repository for users and team membership
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_or_update(&self, user: &User) -> StoreResult<()> {
        sqlx::query(UPSERT_USER)
            .bind(&user.user_id)
            .bind(&user.username)
            .bind(&user.team_name)
            .bind(user.is_active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn get_by_id(&self, user_id: &str) -> StoreResult<User> {
        sqlx::query_as::<_, UserRow>(
            "SELECT user_id, username, team_name, is_active FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::from)?
        .map(User::from)
        .ok_or_else(|| StoreError::not_found(Entity::User, user_id))
    }

    async fn set_active(&self, user_id: &str, is_active: bool) -> StoreResult<User> {
        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET is_active = ?, updated_at = ?
            WHERE user_id = ?
            RETURNING user_id, username, team_name, is_active
            "#,
        )
        .bind(is_active)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::from)?
        .map(User::from)
        .ok_or_else(|| StoreError::not_found(Entity::User, user_id))
    }

    async fn get_active_users_by_team(&self, team_name: &str) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, team_name, is_active FROM users
            WHERE team_name = ? AND is_active = 1
            ORDER BY user_id
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::from)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_by_team(&self, team_name: &str) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, team_name, is_active FROM users
            WHERE team_name = ?
            ORDER BY user_id
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::from)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn exists(&self, user_id: &str) -> StoreResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::from)?;
        Ok(found.is_some())
    }
}
