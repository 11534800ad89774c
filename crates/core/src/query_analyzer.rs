use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hindsight_shared::AppError;

/// Query-time date-range inference, kept here only as the seam the recall
/// side depends on — its model and prompt internals are out of scope for
/// the retain pipeline and are not implemented in this crate.
#[async_trait]
pub trait QueryAnalyzer: Send + Sync {
  /// Infers an optional `[start, end]` date range implied by `query`,
  /// relative to `reference_date`. `None` means the query carries no
  /// temporal constraint.
  async fn analyze(
    &self,
    query: &str,
    reference_date: DateTime<Utc>,
  ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, AppError>;
}
