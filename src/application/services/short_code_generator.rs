//! Counter-backed short code generation.

use std::sync::Arc;

use serde_json::json;

use super::DistributedCounter;
use crate::error::AppError;
use crate::utils::base62;

/// Turns counter values into base62 short codes.
///
/// Codes are unique as long as the counter never repeats a value. The
/// generator does not retry; collision handling belongs to the caller.
pub struct ShortCodeGenerator {
    counter: Arc<DistributedCounter>,
}

impl ShortCodeGenerator {
    pub fn new(counter: Arc<DistributedCounter>) -> Self {
        Self { counter }
    }

    /// Allocates the next counter value and encodes it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the increment fails or the counter
    /// is negative.
    pub async fn generate(&self) -> Result<String, AppError> {
        let value = self.counter.get_next_counter().await?;
        let n = u64::try_from(value).map_err(|_| {
            AppError::internal("Counter value is negative", json!({ "counter": value }))
        })?;

        Ok(base62::encode(n))
    }
}
