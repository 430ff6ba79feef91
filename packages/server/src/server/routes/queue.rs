//! Pull the next URL from the input queue.

use axum::{extract::Extension, Json};
use event_extraction::WorkflowRequest;
use tracing::info;

use super::workflow::{run_and_hold, RunResponse};
use crate::kernel::ServerDeps;
use crate::server::error::{ApiError, ApiResult};

/// `POST /queue/next`
///
/// Runs the workflow on the first queued URL no other caller has claimed.
/// The queue row is removed only when the resulting record is confirmed.
pub async fn queue_next_handler(
    Extension(deps): Extension<ServerDeps>,
) -> ApiResult<Json<RunResponse>> {
    let candidates = deps.store.queued_urls(&deps.queue_sheet).await?;
    if candidates.is_empty() {
        return Err(ApiError::NotFound("No URLs found in the queue".to_string()));
    }

    let queued = deps
        .pending
        .claim_first(&candidates)
        .await
        .cloned()
        .ok_or_else(|| {
            ApiError::NotFound("Every queued URL is already being processed".to_string())
        })?;

    info!(url = %queued.url, row = queued.row, "Processing queued URL");

    let request = WorkflowRequest::new().with_text(queued.url.clone());
    match run_and_hold(&deps, request, Some(queued.url.clone())).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            deps.pending.release(&queued.url).await;
            Err(e)
        }
    }
}
