//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::account::User;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{InsertUserOutcome, TrialGrantOutcome, UserRepository};

/// PostgreSQL implementation of the UserRepository port.
///
/// Uses sqlx for type-safe database operations with connection pooling.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
    trial_used: bool,
    subscription_expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::new(row.id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
            })?,
            display_name: row.display_name,
            created_at: Timestamp::from_datetime(row.created_at),
            trial_used: row.trial_used,
            subscription_expires_at: row.subscription_expires_at.map(Timestamp::from_datetime),
        })
    }
}

const SELECT_USER: &str = r#"
    SELECT id, display_name, created_at, trial_used, subscription_expires_at
    FROM users
    WHERE id = $1
"#;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: &User) -> Result<InsertUserOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, display_name, created_at, trial_used, subscription_expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user.id.as_i64())
        .bind(&user.display_name)
        .bind(user.created_at.as_datetime())
        .bind(user.trial_used)
        .bind(user.subscription_expires_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to insert user: {}", e))
        })?;

        if result.rows_affected() == 0 {
            Ok(InsertUserOutcome::AlreadyExists)
        } else {
            Ok(InsertUserOutcome::Inserted)
        }
    }

    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(SELECT_USER)
            .bind(user_id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to find user: {}", e))
            })?;

        row.map(User::try_from).transpose()
    }

    async fn update_display_name(
        &self,
        user_id: &UserId,
        display_name: Option<String>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE users SET display_name = $2 WHERE id = $1")
            .bind(user_id.as_i64())
            .bind(&display_name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to update display name: {}", e),
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::UserNotFound, "User not found"));
        }
        Ok(())
    }

    async fn grant_trial(
        &self,
        user_id: &UserId,
        expires_at: Timestamp,
    ) -> Result<TrialGrantOutcome, DomainError> {
        // Compare-and-set: only an unconsumed flag can be taken, so two
        // concurrent grants resolve to exactly one winner.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET trial_used = TRUE, subscription_expires_at = $2
            WHERE id = $1 AND trial_used = FALSE
            "#,
        )
        .bind(user_id.as_i64())
        .bind(expires_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to grant trial: {}", e))
        })?;

        if result.rows_affected() > 0 {
            return Ok(TrialGrantOutcome::Granted);
        }

        // Distinguish "already used" from "no such user".
        let exists: Option<UserRow> = sqlx::query_as(SELECT_USER)
            .bind(user_id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to find user: {}", e))
            })?;

        match exists {
            Some(_) => Ok(TrialGrantOutcome::AlreadyUsed),
            None => Err(DomainError::new(ErrorCode::UserNotFound, "User not found")),
        }
    }
}
