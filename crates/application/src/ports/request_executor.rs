//! Request executor port
//!
//! One outbound attempt, fully classified. No retry logic lives behind
//! this trait; replay decisions belong to the pipeline.

use async_trait::async_trait;
use tollgate_domain::{ExecuteOutcome, RequestDescriptor};

/// Issues a single outbound request attempt.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Executes the described request once.
    ///
    /// When `access_token` is present the implementation attaches
    /// `Authorization: Bearer <token>`. The result is a total
    /// classification: HTTP 401 maps to [`ExecuteOutcome::Unauthenticated`],
    /// success statuses to [`ExecuteOutcome::Success`], and everything else
    /// (error statuses and transport failures alike) to
    /// [`ExecuteOutcome::OtherError`].
    async fn execute(
        &self,
        request: &RequestDescriptor,
        access_token: Option<&str>,
    ) -> ExecuteOutcome;
}
