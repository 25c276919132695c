//! PostgreSQL implementation of PaymentLedger.
//!
//! The unique constraint on `provider_payment_id` is the primary concurrency
//! mechanism for double-crediting: it holds across worker instances that
//! share no memory. `complete_and_extend` runs in one transaction holding a
//! row lock on the user, so same-user extensions serialize.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::account::User;
use crate::domain::foundation::{
    DomainError, ErrorCode, PaymentId, ProviderPaymentId, Timestamp, UserId,
};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::ports::{PaymentLedger, RecordOutcome, SettleOutcome};

/// PostgreSQL implementation of the PaymentLedger port.
pub struct PostgresPaymentLedger {
    pool: PgPool,
}

impl PostgresPaymentLedger {
    /// Creates a new PostgresPaymentLedger with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: i64,
    provider_payment_id: String,
    amount_minor: i64,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
            })?,
            provider_payment_id: ProviderPaymentId::new(row.provider_payment_id).map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid provider payment id: {}", e),
                )
            })?,
            amount_minor: row.amount_minor,
            currency: row.currency,
            status: parse_status(&row.status)?,
            created_at: Timestamp::from_datetime(row.created_at),
            completed_at: row.completed_at.map(Timestamp::from_datetime),
        })
    }
}

fn parse_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s {
        "pending" => Ok(PaymentStatus::Pending),
        "completed" => Ok(PaymentStatus::Completed),
        "failed" => Ok(PaymentStatus::Failed),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment status: {}", s),
        )),
    }
}

fn status_to_string(status: &PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Completed => "completed",
        PaymentStatus::Failed => "failed",
    }
}

/// User row loaded under `FOR UPDATE` inside the settlement transaction.
#[derive(Debug, sqlx::FromRow)]
struct LockedUserRow {
    id: i64,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
    trial_used: bool,
    subscription_expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<LockedUserRow> for User {
    type Error = DomainError;

    fn try_from(row: LockedUserRow) -> Result<Self, Self::Error> {
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

const SELECT_PAYMENT_BY_PROVIDER_ID: &str = r#"
    SELECT id, user_id, provider_payment_id, amount_minor, currency, status,
           created_at, completed_at
    FROM payments
    WHERE provider_payment_id = $1
"#;

#[async_trait]
impl PaymentLedger for PostgresPaymentLedger {
    async fn record_pending(&self, payment: &Payment) -> Result<RecordOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, provider_payment_id, amount_minor, currency,
                status, created_at, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (provider_payment_id) DO NOTHING
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_i64())
        .bind(payment.provider_payment_id.as_str())
        .bind(payment.amount_minor)
        .bind(&payment.currency)
        .bind(status_to_string(&payment.status))
        .bind(payment.created_at.as_datetime())
        .bind(payment.completed_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to record payment: {}", e))
        })?;

        if result.rows_affected() > 0 {
            return Ok(RecordOutcome::Recorded);
        }

        // Conflict: hand back the existing row so the caller can decide.
        let existing: Option<PaymentRow> = sqlx::query_as(SELECT_PAYMENT_BY_PROVIDER_ID)
            .bind(payment.provider_payment_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to find payment: {}", e))
            })?;

        match existing {
            Some(row) => Ok(RecordOutcome::Duplicate(Payment::try_from(row)?)),
            // The conflicting row vanished between statements; treat as
            // infrastructure noise and let the transport retry delivery.
            None => Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Conflicting payment row disappeared",
            )),
        }
    }

    async fn mark_failed(&self, payment_id: &PaymentId) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'failed' WHERE id = $1 AND status = 'pending'",
        )
        .bind(payment_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to mark payment: {}", e))
        })?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Settled rows are left untouched; only a missing row is an error.
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM payments WHERE id = $1")
            .bind(payment_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to find payment: {}", e))
            })?;

        match exists {
            Some(_) => Ok(()),
            None => Err(DomainError::new(ErrorCode::PaymentNotFound, "Payment not found")),
        }
    }

    async fn complete_and_extend(
        &self,
        payment_id: &PaymentId,
        user_id: &UserId,
        duration: Duration,
        now: Timestamp,
    ) -> Result<SettleOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to open transaction: {}", e))
        })?;

        // Conditional settlement: only a pending row can complete, so the
        // losing side of a duplicate-delivery race lands in the branch below.
        let settled = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'completed', completed_at = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(payment_id.as_uuid())
        .bind(now.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to settle payment: {}", e))
        })?;

        if settled.rows_affected() == 0 {
            let status: Option<(String,)> =
                sqlx::query_as("SELECT status FROM payments WHERE id = $1")
                    .bind(payment_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| {
                        DomainError::new(
                            ErrorCode::DatabaseError,
                            format!("Failed to find payment: {}", e),
                        )
                    })?;
            tx.rollback().await.ok();
            return match status {
                Some((status,)) => Ok(SettleOutcome::AlreadySettled {
                    status: parse_status(&status)?,
                }),
                None => Err(DomainError::new(ErrorCode::PaymentNotFound, "Payment not found")),
            };
        }

        // Row lock on the user serializes concurrent extensions; the
        // extension rule itself is the aggregate's, not SQL.
        let row: Option<LockedUserRow> = sqlx::query_as(
            r#"
            SELECT id, display_name, created_at, trial_used, subscription_expires_at
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to lock user: {}", e))
        })?;

        let mut user: User = match row {
            Some(row) => row.try_into()?,
            None => {
                tx.rollback().await.ok();
                return Err(DomainError::new(ErrorCode::UserNotFound, "User not found"));
            }
        };
        let new_expiry = user.extend(duration, now);

        sqlx::query("UPDATE users SET subscription_expires_at = $2 WHERE id = $1")
            .bind(user_id.as_i64())
            .bind(new_expiry.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to extend user: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to commit: {}", e))
        })?;

        Ok(SettleOutcome::Applied { new_expiry })
    }

    async fn find_by_provider_id(
        &self,
        provider_payment_id: &ProviderPaymentId,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(SELECT_PAYMENT_BY_PROVIDER_ID)
            .bind(provider_payment_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to find payment: {}", e))
            })?;

        row.map(Payment::try_from).transpose()
    }

    async fn has_completed_payment(&self, user_id: &UserId) -> Result<bool, DomainError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM payments WHERE user_id = $1 AND status = 'completed')",
        )
        .bind(user_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to query payments: {}", e))
        })?;

        Ok(exists)
    }
}
