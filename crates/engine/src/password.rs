//! Password hashing. Hashes are bcrypt strings; the work runs on the blocking
//! pool so a login does not stall the async workers.

use crate::{EngineError, ResultEngine};

/// bcrypt cost used when none is configured.
pub const DEFAULT_PASSWORD_COST: u32 = 10;

pub(crate) async fn hash(password: String, cost: u32) -> ResultEngine<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| EngineError::PasswordHash(err.to_string()))?
        .map_err(|err| EngineError::PasswordHash(err.to_string()))
}

/// `false` on mismatch and on hashes bcrypt cannot parse.
pub(crate) async fn verify(password: String, hash: String) -> ResultEngine<bool> {
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| EngineError::PasswordHash(err.to_string()))?;
    match outcome {
        Ok(matches) => Ok(matches),
        Err(err) => {
            tracing::warn!("stored password hash is unreadable: {err}");
            Ok(false)
        }
    }
}
