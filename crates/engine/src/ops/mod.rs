use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    IsolationLevel, TransactionTrait,
};

use crate::{
    EngineError, ResultEngine, RetryPolicy, commission, commission::DEFAULT_COMMISSION_BPS,
    locks::ExpeditionLocks, password::DEFAULT_PASSWORD_COST,
};

mod access;
mod audit;
mod bookings;
mod dashboard;
mod expeditions;
mod media;
mod payments;
mod reviews;
mod trails;
mod users;

pub use trails::TrailState;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

/// Like `with_tx!`, but the transaction is opened with the strictest isolation
/// the backend supports.
macro_rules! with_serializable_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.begin_serializable().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

/// Re-evaluates `$attempt` while it fails with a serialization conflict, up to
/// the engine retry budget, sleeping with exponential backoff in between.
/// Any other outcome (success or domain error) is returned as is.
macro_rules! with_retry {
    ($self:expr, $what:expr, $attempt:expr) => {{
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match $attempt {
                Err(crate::EngineError::Database(err))
                    if crate::error::is_serialization_conflict(&err) =>
                {
                    if !$self.retry.should_retry(attempts) {
                        tracing::warn!(attempts, "{} gave up after repeated conflicts", $what);
                        break Err(crate::EngineError::Conflict(format!(
                            "{} conflicted with a concurrent update, retry later",
                            $what
                        )));
                    }
                    let delay = $self.retry.delay_for_retry(attempts - 1);
                    tracing::warn!(attempts, ?delay, "{} conflicted, retrying: {err}", $what);
                    tokio::time::sleep(delay).await;
                }
                other => break other,
            }
        }
    }};
}

pub(crate) use {with_retry, with_serializable_tx, with_tx};

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    locks: ExpeditionLocks,
    retry: RetryPolicy,
    commission_bps: u32,
    password_cost: u32,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Global commission rate, in basis points.
    #[must_use]
    pub fn commission_bps(&self) -> u32 {
        self.commission_bps
    }

    async fn begin_serializable(&self) -> ResultEngine<DatabaseTransaction> {
        // SQLite has a single writer and no per-transaction isolation knob.
        let isolation = match self.database.get_database_backend() {
            DbBackend::Sqlite => None,
            _ => Some(IsolationLevel::Serializable),
        };
        self.database
            .begin_with_config(isolation, Some(AccessMode::ReadWrite))
            .await
            .map_err(EngineError::from)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    retry: Option<RetryPolicy>,
    commission_bps: Option<u32>,
    password_cost: Option<u32>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Retry policy for reservation conflicts (default: 3 attempts).
    pub fn retry_policy(mut self, policy: RetryPolicy) -> EngineBuilder {
        self.retry = Some(policy);
        self
    }

    /// Global commission rate in basis points (default: 1500).
    pub fn commission_bps(mut self, bps: u32) -> EngineBuilder {
        self.commission_bps = Some(bps);
        self
    }

    /// bcrypt cost for new password hashes (default: 10).
    pub fn password_cost(mut self, cost: u32) -> EngineBuilder {
        self.password_cost = Some(cost);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let commission_bps =
            commission::validate_rate(self.commission_bps.unwrap_or(DEFAULT_COMMISSION_BPS))?;
        let password_cost = self.password_cost.unwrap_or(DEFAULT_PASSWORD_COST);
        if !(4..=31).contains(&password_cost) {
            return Err(EngineError::Validation(format!(
                "password cost must be between 4 and 31, got {password_cost}"
            )));
        }
        Ok(Engine {
            database: self.database,
            locks: ExpeditionLocks::default(),
            retry: self.retry.unwrap_or_default(),
            commission_bps,
            password_cost,
        })
    }
}
