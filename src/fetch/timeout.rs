//! Timeout utilities for fetch attempts
//!
//! Wraps a fetch future with its tier's time budget so a stalled attempt
//! fails with [`FetchError::Timeout`] instead of hanging the request.

use std::future::Future;
use std::time::Duration;

use super::FetchError;

/// Run `operation` under `budget`
///
/// # Arguments
/// * `operation` - The fetch future to run
/// * `budget` - Time allowed before the attempt is abandoned
/// * `operation_name` - Human-readable name for the log line
///
/// Dropping the inner future on timeout drops everything it owns, which is
/// how browser page leases get returned when an attempt is abandoned.
pub async fn with_budget<F, T>(
    operation: F,
    budget: Duration,
    operation_name: &str,
) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(budget, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{operation_name} timeout after {budget:?}");
            Err(FetchError::Timeout(budget))
        }
    }
}
