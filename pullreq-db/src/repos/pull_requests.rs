//! Pull request repository
//!
//! Reviewers live in `pr_reviewers` with an explicit position, so a
//! substitution keeps its slot across a round trip.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pullreq_core::{
    Entity, PullRequest, PullRequestStatus, PullRequestStore, StoreError, StoreResult,
};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::error::{is_unique_violation, Error};

#[derive(Debug, FromRow)]
struct PullRequestRow {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: String,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    version: i64,
}

impl PullRequestRow {
    fn into_pull_request(self, assigned_reviewers: Vec<String>) -> Result<PullRequest, Error> {
        let status: PullRequestStatus = self.status.parse().map_err(|e| {
            Error::InvalidData(format!("pull request {}: {}", self.pull_request_id, e))
        })?;

        Ok(PullRequest {
            pull_request_id: self.pull_request_id,
            pull_request_name: self.pull_request_name,
            author_id: self.author_id,
            status,
            assigned_reviewers,
            created_at: Some(self.created_at),
            merged_at: self.merged_at,
            version: self.version,
        })
    }
}

const SELECT_PULL_REQUEST: &str = r#"
    SELECT pull_request_id, pull_request_name, author_id, status,
           created_at, merged_at, version
    FROM pull_requests
"#;

async fn load_reviewers(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Vec<String>, Error> {
    let reviewers = sqlx::query_scalar(
        "SELECT reviewer_id FROM pr_reviewers WHERE pull_request_id = ? ORDER BY position",
    )
    .bind(pull_request_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(reviewers)
}

async fn insert_reviewers(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    reviewers: &[String],
) -> Result<(), Error> {
    for (position, reviewer_id) in reviewers.iter().enumerate() {
        sqlx::query(
            "INSERT INTO pr_reviewers (pull_request_id, reviewer_id, position) VALUES (?, ?, ?)",
        )
        .bind(pull_request_id)
        .bind(reviewer_id)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Repository for pull requests and reviewer assignments
#[derive(Clone)]
pub struct PullRequestRepository {
    pool: SqlitePool,
}

impl PullRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load(&self, pull_request_id: &str) -> Result<Option<PullRequest>, Error> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, PullRequestRow>(&format!(
            "{} WHERE pull_request_id = ?",
            SELECT_PULL_REQUEST
        ))
        .bind(pull_request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let pr = match row {
            Some(row) => {
                let reviewers = load_reviewers(&mut tx, pull_request_id).await?;
                Some(row.into_pull_request(reviewers)?)
            }
            None => None,
        };
        tx.commit().await?;
        Ok(pr)
    }
}

#[async_trait]
impl PullRequestStore for PullRequestRepository {
    async fn create(&self, pr: &PullRequest) -> StoreResult<PullRequest> {
        let created_at = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::from)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO pull_requests (
                pull_request_id, pull_request_name, author_id, status,
                created_at, merged_at, version
            )
            VALUES (?, ?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(&pr.pull_request_id)
        .bind(&pr.pull_request_name)
        .bind(&pr.author_id)
        .bind(pr.status.as_str())
        .bind(created_at)
        .bind(pr.merged_at)
        .execute(&mut *tx)
        .await;
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::already_exists(
                    Entity::PullRequest,
                    &pr.pull_request_id,
                ))
            }
            Err(e) => return Err(Error::from(e).into()),
        }

        insert_reviewers(&mut tx, &pr.pull_request_id, &pr.assigned_reviewers).await?;
        tx.commit().await.map_err(Error::from)?;

        Ok(PullRequest {
            created_at: Some(created_at),
            version: 1,
            ..pr.clone()
        })
    }

    async fn get_by_id(&self, pull_request_id: &str) -> StoreResult<PullRequest> {
        self.load(pull_request_id)
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::PullRequest, pull_request_id))
    }

    async fn update(&self, pr: &PullRequest) -> StoreResult<PullRequest> {
        let mut tx = self.pool.begin().await.map_err(Error::from)?;

        let updated: Option<(DateTime<Utc>, i64)> = sqlx::query_as(
            r#"
            UPDATE pull_requests
            SET pull_request_name = ?, status = ?, merged_at = ?, version = version + 1
            WHERE pull_request_id = ? AND version = ?
            RETURNING created_at, version
            "#,
        )
        .bind(&pr.pull_request_name)
        .bind(pr.status.as_str())
        .bind(pr.merged_at)
        .bind(&pr.pull_request_id)
        .bind(pr.version)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::from)?;

        let Some((created_at, version)) = updated else {
            let present: Option<i64> =
                sqlx::query_scalar("SELECT 1 FROM pull_requests WHERE pull_request_id = ?")
                    .bind(&pr.pull_request_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(Error::from)?;
            return Err(match present {
                Some(_) => StoreError::conflict(Entity::PullRequest, &pr.pull_request_id),
                None => StoreError::not_found(Entity::PullRequest, &pr.pull_request_id),
            });
        };

        sqlx::query("DELETE FROM pr_reviewers WHERE pull_request_id = ?")
            .bind(&pr.pull_request_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::from)?;
        insert_reviewers(&mut tx, &pr.pull_request_id, &pr.assigned_reviewers).await?;
        tx.commit().await.map_err(Error::from)?;

        Ok(PullRequest {
            created_at: Some(created_at),
            version,
            ..pr.clone()
        })
    }

    async fn get_by_reviewer(&self, user_id: &str) -> StoreResult<Vec<PullRequest>> {
        let mut tx = self.pool.begin().await.map_err(Error::from)?;
        let rows = sqlx::query_as::<_, PullRequestRow>(
            r#"
            SELECT p.pull_request_id, p.pull_request_name, p.author_id, p.status,
                   p.created_at, p.merged_at, p.version
            FROM pull_requests p
            JOIN pr_reviewers r ON r.pull_request_id = p.pull_request_id
            WHERE r.reviewer_id = ?
            ORDER BY p.created_at DESC, p.rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(Error::from)?;

        let mut prs = Vec::with_capacity(rows.len());
        for row in rows {
            let reviewers = load_reviewers(&mut tx, &row.pull_request_id).await?;
            prs.push(row.into_pull_request(reviewers)?);
        }
        tx.commit().await.map_err(Error::from)?;

        Ok(prs)
    }

    async fn exists(&self, pull_request_id: &str) -> StoreResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM pull_requests WHERE pull_request_id = ?")
                .bind(pull_request_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::from)?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::test_support::{seed_backend_team, setup_test_db};

    fn reviewers(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (db, _temp) = setup_test_db().await;
        seed_backend_team(&db).await;
        let repo = db.pull_requests();

        let pr = PullRequest::new("pr-1", "Add cache", "u1", reviewers(&["u3", "u2"]));
        let created = repo.create(&pr).await.unwrap();
        assert_eq!(created.version, 1);
        assert!(created.created_at.is_some());

        let fetched = repo.get_by_id("pr-1").await.unwrap();
        assert_eq!(fetched.assigned_reviewers, vec!["u3", "u2"]);
        assert_eq!(fetched.status, PullRequestStatus::Open);
        assert!(fetched.merged_at.is_none());
        assert_eq!(fetched.version, 1);
        assert!(repo.exists("pr-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_without_reviewers() {
        let (db, _temp) = setup_test_db().await;
        seed_backend_team(&db).await;
        let repo = db.pull_requests();

        repo.create(&PullRequest::new("pr-1", "Solo", "u1", Vec::new()))
            .await
            .unwrap();
        assert!(repo.get_by_id("pr-1").await.unwrap().assigned_reviewers.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_create() {
        let (db, _temp) = setup_test_db().await;
        seed_backend_team(&db).await;
        let repo = db.pull_requests();

        let pr = PullRequest::new("pr-1", "Add cache", "u1", reviewers(&["u2"]));
        repo.create(&pr).await.unwrap();

        let again = PullRequest::new("pr-1", "Other", "u2", reviewers(&["u3"]));
        let err = repo.create(&again).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::AlreadyExists {
                entity: Entity::PullRequest,
                ..
            }
        ));
        assert_eq!(repo.get_by_id("pr-1").await.unwrap().assigned_reviewers, vec!["u2"]);
    }

    #[tokio::test]
    async fn test_duplicate_reviewer_rolls_back_create() {
        let (db, _temp) = setup_test_db().await;
        seed_backend_team(&db).await;
        let repo = db.pull_requests();

        let pr = PullRequest::new("pr-1", "Broken", "u1", reviewers(&["u2", "u2"]));
        assert!(repo.create(&pr).await.is_err());
        assert!(!repo.exists("pr-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_unknown() {
        let (db, _temp) = setup_test_db().await;
        let err = db.pull_requests().get_by_id("pr-404").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_keeps_reviewer_position() {
        let (db, _temp) = setup_test_db().await;
        seed_backend_team(&db).await;
        let repo = db.pull_requests();

        repo.create(&PullRequest::new("pr-1", "Add cache", "u1", reviewers(&["u2", "u3"])))
            .await
            .unwrap();

        let mut pr = repo.get_by_id("pr-1").await.unwrap();
        assert!(pr.replace_reviewer("u2", "u4"));
        let saved = repo.update(&pr).await.unwrap();
        assert_eq!(saved.version, 2);
        assert_eq!(saved.created_at, pr.created_at);

        let fetched = repo.get_by_id("pr-1").await.unwrap();
        assert_eq!(fetched.assigned_reviewers, vec!["u4", "u3"]);
        assert_eq!(fetched.version, 2);
    }

    #[tokio::test]
    async fn test_update_stale_version_conflicts() {
        let (db, _temp) = setup_test_db().await;
        seed_backend_team(&db).await;
        let repo = db.pull_requests();

        repo.create(&PullRequest::new("pr-1", "Add cache", "u1", reviewers(&["u2", "u3"])))
            .await
            .unwrap();

        let mut first = repo.get_by_id("pr-1").await.unwrap();
        let mut second = first.clone();

        first.merge(Utc::now());
        repo.update(&first).await.unwrap();

        second.replace_reviewer("u2", "u4");
        let err = repo.update(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let fetched = repo.get_by_id("pr-1").await.unwrap();
        assert!(fetched.is_merged());
        assert_eq!(fetched.merged_at, first.merged_at);
        assert_eq!(fetched.assigned_reviewers, vec!["u2", "u3"]);
    }

    #[tokio::test]
    async fn test_update_missing() {
        let (db, _temp) = setup_test_db().await;
        let pr = PullRequest::new("pr-404", "Ghost", "u1", Vec::new());
        let err = db.pull_requests().update(&pr).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_by_reviewer_newest_first() {
        let (db, _temp) = setup_test_db().await;
        seed_backend_team(&db).await;
        let repo = db.pull_requests();

        repo.create(&PullRequest::new("pr-1", "One", "u1", reviewers(&["u2", "u3"])))
            .await
            .unwrap();
        repo.create(&PullRequest::new("pr-2", "Two", "u1", reviewers(&["u3"])))
            .await
            .unwrap();
        repo.create(&PullRequest::new("pr-3", "Three", "u3", reviewers(&["u2"])))
            .await
            .unwrap();

        let prs = repo.get_by_reviewer("u2").await.unwrap();
        let ids: Vec<_> = prs.iter().map(|p| p.pull_request_id.as_str()).collect();
        assert_eq!(ids, vec!["pr-3", "pr-1"]);
        assert_eq!(prs[1].assigned_reviewers, vec!["u2", "u3"]);

        assert!(repo.get_by_reviewer("u1").await.unwrap().is_empty());
    }
}
