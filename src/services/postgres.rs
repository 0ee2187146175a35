use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::future::Future;
use std::time::Duration;
use crate::core::ledger::{plan_transition, PairState};
use crate::models::{InterestEdge, InterestKind, LikeOutcome, Message, NewProfile, ProfileUpdate, User};
use super::store::{EdgeStore, MessageStore, ProfileStore, StoreError};

const USER_COLUMNS: &str = "id, external_id, display_name, age, city, gender, looking_for, \
                            bio, interests, photo, visible, created_at, last_active";

/// SQLSTATE codes worth retrying: serialization_failure, deadlock_detected
const RETRYABLE_CODES: [&str; 2] = ["40001", "40P01"];

/// PostgreSQL backend for profiles, interest edges and messages
///
/// Ledger writes run in one transaction per action, serialized per
/// unordered pair of users with a transaction-scoped advisory lock. A
/// dropped transaction rolls back, so an abandoned request can never leave
/// half of a match behind.
pub struct PostgresClient {
    pool: PgPool,
    max_retries: u32,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool, max_retries })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
        max_retries: u32,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
            max_retries,
        )
        .await
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    /// One attempt at an interest transition
    async fn try_apply_interest(
        &self,
        from_user: i64,
        to_user: i64,
        kind: InterestKind,
    ) -> Result<LikeOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(pair_lock_key(from_user, to_user))
            .execute(&mut *tx)
            .await?;

        let pair = PairState {
            forward: fetch_edge(&mut tx, from_user, to_user).await?,
            reverse: fetch_edge(&mut tx, to_user, from_user).await?,
        };
        let transition = plan_transition(from_user, to_user, kind, &pair, Utc::now());

        if let Some(edge) = &transition.write {
            let query = r#"
                INSERT INTO interest_edges (from_user, to_user, kind, matched, created_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (from_user, to_user)
                DO UPDATE SET
                    kind = EXCLUDED.kind,
                    matched = EXCLUDED.matched
            "#;

            sqlx::query(query)
                .bind(edge.from_user)
                .bind(edge.to_user)
                .bind(edge.kind)
                .bind(edge.matched)
                .bind(edge.created_at)
                .execute(&mut *tx)
                .await?;
        }

        if transition.match_reverse {
            sqlx::query("UPDATE interest_edges SET matched = TRUE WHERE from_user = $1 AND to_user = $2")
                .bind(to_user)
                .bind(from_user)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(transition.outcome)
    }
}

/// Advisory lock key shared by both directions of a pair
fn pair_lock_key(a: i64, b: i64) -> i64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    lo.wrapping_shl(32) ^ hi
}

fn is_retryable(err: &StoreError) -> bool {
    match err {
        StoreError::SqlxError(sqlx::Error::Database(db)) => db
            .code()
            .map(|code| RETRYABLE_CODES.contains(&&*code))
            .unwrap_or(false),
        _ => false,
    }
}

/// Run `attempt` until it succeeds, fails for good, or has been retried
/// `max_retries` times. Exhausting the retries yields `StoreError::Conflict`.
async fn retry_on_conflict<T, F, Fut, P>(
    max_retries: u32,
    retryable: P,
    mut attempt: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
    P: Fn(&StoreError) -> bool,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match attempt().await {
            Err(err) if retryable(&err) => {
                if attempts > max_retries {
                    return Err(StoreError::Conflict(attempts));
                }
                tracing::warn!("Write conflict (attempt {}), retrying: {}", attempts, err);
            }
            other => return other,
        }
    }
}

async fn fetch_edge(
    tx: &mut Transaction<'_, Postgres>,
    from_user: i64,
    to_user: i64,
) -> Result<Option<InterestEdge>, StoreError> {
    let row = sqlx::query(
        "SELECT from_user, to_user, kind, matched, created_at FROM interest_edges \
         WHERE from_user = $1 AND to_user = $2",
    )
    .bind(from_user)
    .bind(to_user)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.as_ref().map(edge_from_row))
}

fn edge_from_row(row: &PgRow) -> InterestEdge {
    InterestEdge {
        from_user: row.get("from_user"),
        to_user: row.get("to_user"),
        kind: row.get("kind"),
        matched: row.get("matched"),
        created_at: row.get("created_at"),
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        external_id: row.get("external_id"),
        display_name: row.get("display_name"),
        age: row.get("age"),
        city: row.get("city"),
        gender: row.get("gender"),
        looking_for: row.get("looking_for"),
        bio: row.get("bio"),
        interests: row.get("interests"),
        photo: row.get("photo"),
        visible: row.get("visible"),
        created_at: row.get("created_at"),
        last_active: row.get("last_active"),
    }
}

fn message_from_row(row: &PgRow) -> Message {
    Message {
        id: row.get("id"),
        from_user: row.get("from_user"),
        to_user: row.get("to_user"),
        body: row.get("body"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ProfileStore for PostgresClient {
    /// Uses INSERT ... ON CONFLICT so concurrent first logins converge on one row
    async fn resolve(&self, profile: NewProfile) -> Result<User, StoreError> {
        let query = format!(
            r#"
            INSERT INTO users (external_id, display_name, looking_for, visible, created_at, last_active)
            VALUES ($1, $2, 'all', $3, NOW(), NOW())
            ON CONFLICT (external_id)
            DO UPDATE SET last_active = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&profile.external_id)
            .bind(&profile.display_name)
            .bind(profile.visible)
            .fetch_one(&self.pool)
            .await?;

        Ok(user_from_row(&row))
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE external_id = $1", USER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        let rows = sqlx::query(&query).bind(ids).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn list_candidates(&self, exclude_id: i64) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id <> $1 ORDER BY id", USER_COLUMNS);
        let rows = sqlx::query(&query).bind(exclude_id).fetch_all(&self.pool).await?;

        tracing::debug!("Loaded {} candidate profiles", rows.len());

        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn update(&self, id: i64, update: ProfileUpdate) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {} FROM users WHERE id = $1 FOR UPDATE", USER_COLUMNS);
        let row = sqlx::query(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;

        let mut user = user_from_row(&row);
        update.apply_to(&mut user, Utc::now());

        let query = r#"
            UPDATE users SET
                display_name = $2, age = $3, city = $4, gender = $5, looking_for = $6,
                bio = $7, interests = $8, photo = $9, visible = $10, last_active = $11
            WHERE id = $1
        "#;

        sqlx::query(query)
            .bind(user.id)
            .bind(&user.display_name)
            .bind(user.age)
            .bind(&user.city)
            .bind(&user.gender)
            .bind(&user.looking_for)
            .bind(&user.bio)
            .bind(&user.interests)
            .bind(&user.photo)
            .bind(user.visible)
            .bind(user.last_active)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Updated profile {}", id);
        Ok(user)
    }
}

#[async_trait]
impl EdgeStore for PostgresClient {
    async fn apply_interest(
        &self,
        from_user: i64,
        to_user: i64,
        kind: InterestKind,
    ) -> Result<LikeOutcome, StoreError> {
        let outcome = retry_on_conflict(self.max_retries, is_retryable, move || {
            self.try_apply_interest(from_user, to_user, kind)
        })
        .await;

        if let Err(StoreError::Conflict(attempts)) = &outcome {
            tracing::error!(
                "Giving up on {:?} {} -> {} after {} attempts",
                kind, from_user, to_user, attempts
            );
        }
        outcome
    }

    async fn edges_between(&self, a: i64, b: i64) -> Result<Vec<InterestEdge>, StoreError> {
        let query = r#"
            SELECT from_user, to_user, kind, matched, created_at
            FROM interest_edges
            WHERE (from_user = $1 AND to_user = $2) OR (from_user = $2 AND to_user = $1)
        "#;

        let rows = sqlx::query(query).bind(a).bind(b).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(edge_from_row).collect())
    }

    async fn edges_involving(&self, user_id: i64) -> Result<Vec<InterestEdge>, StoreError> {
        let query = r#"
            SELECT from_user, to_user, kind, matched, created_at
            FROM interest_edges
            WHERE from_user = $1 OR to_user = $1
            ORDER BY created_at, from_user, to_user
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(edge_from_row).collect())
    }
}

#[async_trait]
impl MessageStore for PostgresClient {
    async fn append(&self, from_user: i64, to_user: i64, body: &str) -> Result<Message, StoreError> {
        let query = r#"
            INSERT INTO messages (from_user, to_user, body, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, from_user, to_user, body, created_at
        "#;

        let row = sqlx::query(query)
            .bind(from_user)
            .bind(to_user)
            .bind(body)
            .fetch_one(&self.pool)
            .await?;

        Ok(message_from_row(&row))
    }

    async fn list_between(&self, a: i64, b: i64) -> Result<Vec<Message>, StoreError> {
        let query = r#"
            SELECT id, from_user, to_user, body, created_at
            FROM messages
            WHERE (from_user = $1 AND to_user = $2) OR (from_user = $2 AND to_user = $1)
            ORDER BY created_at ASC, id ASC
        "#;

        let rows = sqlx::query(query).bind(a).bind(b).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(message_from_row).collect())
    }
}
