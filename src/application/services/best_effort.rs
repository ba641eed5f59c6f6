use std::fmt::Display;
use std::future::Future;

use tokio::task::JoinHandle;
use tracing::Instrument;

/// Runs a secondary-path side effect in the background. Its failure is logged
/// here and goes nowhere else.
pub fn spawn_best_effort<F, E>(operation: &'static str, future: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let span = tracing::debug_span!("best_effort", operation);
    tokio::spawn(
        async move {
            match future.await {
                Ok(()) => tracing::debug!(operation, "Best-effort operation completed"),
                Err(e) => tracing::warn!(operation, error = %e, "Best-effort operation failed"),
            }
        }
        .instrument(span),
    )
}
