//! Team repository

use async_trait::async_trait;
use chrono::Utc;
use pullreq_core::{Entity, StoreError, StoreResult, Team, TeamStore, User};
use sqlx::{SqliteConnection, SqlitePool};

use super::users::{UserRow, UPSERT_USER};
use crate::error::{is_unique_violation, Error};

/// Repository for teams
#[derive(Clone)]
pub struct TeamRepository {
    pool: SqlitePool,
}

impl TeamRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn load_team(conn: &mut SqliteConnection, team_name: &str) -> Result<Option<Team>, Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM teams WHERE team_name = ?")
        .bind(team_name)
        .fetch_optional(&mut *conn)
        .await?;
    if found.is_none() {
        return Ok(None);
    }

    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT user_id, username, team_name, is_active FROM users
        WHERE team_name = ?
        ORDER BY user_id
        "#,
    )
    .bind(team_name)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(Team::from_users(
        team_name,
        rows.into_iter().map(User::from).collect(),
    )))
}

#[async_trait]
impl TeamStore for TeamRepository {
    async fn create(&self, team: &Team) -> StoreResult<Team> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::from)?;

        let inserted = sqlx::query("INSERT INTO teams (team_name, created_at) VALUES (?, ?)")
            .bind(&team.team_name)
            .bind(now)
            .execute(&mut *tx)
            .await;
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::already_exists(Entity::Team, &team.team_name))
            }
            Err(e) => return Err(Error::from(e).into()),
        }

        for user in team.users() {
            sqlx::query(UPSERT_USER)
                .bind(&user.user_id)
                .bind(&user.username)
                .bind(&user.team_name)
                .bind(user.is_active)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(Error::from)?;
        }

        let created = load_team(&mut tx, &team.team_name)
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Team, &team.team_name))?;
        tx.commit().await.map_err(Error::from)?;

        Ok(created)
    }

    async fn get_by_name(&self, team_name: &str) -> StoreResult<Team> {
        let mut conn = self.pool.acquire().await.map_err(Error::from)?;
        load_team(&mut conn, team_name)
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Team, team_name))
    }

    async fn exists(&self, team_name: &str) -> StoreResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM teams WHERE team_name = ?")
            .bind(team_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::from)?;
        Ok(found.is_some())
    }
}
