//! PostgreSQL implementation of CredentialRepository.
//!
//! Both uniqueness invariants - one credential per (user, endpoint) pair and
//! globally unique secrets - live in the schema. This adapter maps the
//! constraint violations back to the typed outcomes the issuer retries on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::credential::{ProxyCredential, ProxySecret};
use crate::domain::foundation::{
    CredentialId, DomainError, EndpointId, ErrorCode, Timestamp, UserId,
};
use crate::ports::{
    CredentialInsertOutcome, CredentialRepository, CredentialRotateOutcome, SecretReplacement,
};

const PAIR_CONSTRAINT: &str = "proxy_credentials_user_endpoint_key";
const SECRET_CONSTRAINT: &str = "proxy_credentials_secret_key";

/// PostgreSQL implementation of the CredentialRepository port.
pub struct PostgresCredentialRepository {
    pool: PgPool,
}

impl PostgresCredentialRepository {
    /// Creates a new PostgresCredentialRepository with the given connection
    /// pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a credential.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    user_id: i64,
    endpoint_id: String,
    secret: String,
    issued_at: DateTime<Utc>,
    rotated_at: Option<DateTime<Utc>>,
}

impl TryFrom<CredentialRow> for ProxyCredential {
    type Error = DomainError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        Ok(ProxyCredential {
            id: CredentialId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
            })?,
            endpoint_id: EndpointId::new(row.endpoint_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid endpoint id: {}", e))
            })?,
            secret: ProxySecret::from_stored(row.secret).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid secret: {}", e))
            })?,
            issued_at: Timestamp::from_datetime(row.issued_at),
            rotated_at: row.rotated_at.map(Timestamp::from_datetime),
        })
    }
}

/// Extracts the violated constraint name, if the error is one.
fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

const SELECT_CREDENTIAL: &str = r#"
    SELECT id, user_id, endpoint_id, secret, issued_at, rotated_at
    FROM proxy_credentials
"#;

#[async_trait]
impl CredentialRepository for PostgresCredentialRepository {
    async fn find(
        &self,
        user_id: &UserId,
        endpoint_id: &EndpointId,
    ) -> Result<Option<ProxyCredential>, DomainError> {
        let row: Option<CredentialRow> =
            sqlx::query_as(&format!("{} WHERE user_id = $1 AND endpoint_id = $2", SELECT_CREDENTIAL))
                .bind(user_id.as_i64())
                .bind(endpoint_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to find credential: {}", e),
                    )
                })?;

        row.map(ProxyCredential::try_from).transpose()
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<ProxyCredential>, DomainError> {
        let rows: Vec<CredentialRow> =
            sqlx::query_as(&format!("{} WHERE user_id = $1 ORDER BY issued_at ASC, id ASC", SELECT_CREDENTIAL))
                .bind(user_id.as_i64())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to list credentials: {}", e),
                    )
                })?;

        rows.into_iter().map(ProxyCredential::try_from).collect()
    }

    async fn insert(
        &self,
        credential: &ProxyCredential,
    ) -> Result<CredentialInsertOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO proxy_credentials (
                id, user_id, endpoint_id, secret, issued_at, rotated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(credential.id.as_uuid())
        .bind(credential.user_id.as_i64())
        .bind(credential.endpoint_id.as_str())
        .bind(credential.secret.expose())
        .bind(credential.issued_at.as_datetime())
        .bind(credential.rotated_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(CredentialInsertOutcome::Inserted),
            Err(e) if violated_constraint(&e) == Some(PAIR_CONSTRAINT) => {
                let existing = self
                    .find(&credential.user_id, &credential.endpoint_id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::DatabaseError,
                            "Conflicting credential row disappeared",
                        )
                    })?;
                Ok(CredentialInsertOutcome::PairExists(existing))
            }
            Err(e) if violated_constraint(&e) == Some(SECRET_CONSTRAINT) => {
                Ok(CredentialInsertOutcome::SecretCollision)
            }
            Err(e) => Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert credential: {}", e),
            )),
        }
    }

    async fn rotate_all(
        &self,
        user_id: &UserId,
        replacements: &[SecretReplacement],
        rotated_at: Timestamp,
    ) -> Result<CredentialRotateOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to open transaction: {}", e))
        })?;

        let mut updated = Vec::with_capacity(replacements.len());
        for replacement in replacements {
            let result: Result<Option<CredentialRow>, sqlx::Error> = sqlx::query_as(
                r#"
                UPDATE proxy_credentials
                SET secret = $3, rotated_at = $4
                WHERE id = $1 AND user_id = $2
                RETURNING id, user_id, endpoint_id, secret, issued_at, rotated_at
                "#,
            )
            .bind(replacement.credential_id.as_uuid())
            .bind(user_id.as_i64())
            .bind(replacement.secret.expose())
            .bind(rotated_at.as_datetime())
            .fetch_optional(&mut *tx)
            .await;

            match result {
                Ok(Some(row)) => updated.push(ProxyCredential::try_from(row)?),
                Ok(None) => {
                    tx.rollback().await.ok();
                    return Err(DomainError::new(
                        ErrorCode::CredentialNotFound,
                        "Credential not found",
                    ));
                }
                Err(e) if violated_constraint(&e) == Some(SECRET_CONSTRAINT) => {
                    // One collision voids the whole batch.
                    tx.rollback().await.ok();
                    return Ok(CredentialRotateOutcome::SecretCollision);
                }
                Err(e) => {
                    tx.rollback().await.ok();
                    return Err(DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to rotate credential: {}", e),
                    ));
                }
            }
        }

        tx.commit().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to commit: {}", e))
        })?;

        Ok(CredentialRotateOutcome::Rotated(updated))
    }

    async fn find_by_secret(
        &self,
        secret: &ProxySecret,
    ) -> Result<Option<ProxyCredential>, DomainError> {
        let row: Option<CredentialRow> =
            sqlx::query_as(&format!("{} WHERE secret = $1", SELECT_CREDENTIAL))
                .bind(secret.expose())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to find credential: {}", e),
                    )
                })?;

        row.map(ProxyCredential::try_from).transpose()
    }
}
