//! Run a workflow and confirm its record into the ledger.

use axum::{extract::{Extension, Path}, Json};
use chrono::Local;
use event_extraction::{
    ledger_row, EventRecord, SourceKind, WorkflowRequest, WorkflowResponse, WorkflowResult,
    WorkflowSummary,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::common::{decode_image, decode_pdf, PendingRecord};
use crate::kernel::ServerDeps;
use crate::server::error::{ApiError, ApiResult};

/// `POST /run` body. Every field is optional but at least one is required.
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    pub text_input: Option<String>,
    /// Data URI, http(s) URL or bare base64
    pub image_data: Option<String>,
    /// Base64 or data URI
    pub pdf_data: Option<String>,
}

impl RunRequest {
    fn into_workflow_request(self) -> ApiResult<WorkflowRequest> {
        let mut request = WorkflowRequest::new();
        if let Some(text) = self.text_input.filter(|t| !t.trim().is_empty()) {
            request = request.with_text(text);
        }
        if let Some(image) = self.image_data.filter(|d| !d.trim().is_empty()) {
            request = request.with_image(decode_image(&image)?);
        }
        if let Some(pdf) = self.pdf_data.filter(|d| !d.trim().is_empty()) {
            request = request.with_pdf(decode_pdf(&pdf)?);
        }
        Ok(request)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunResponse {
    pub request_id: Uuid,
    pub merged_record: EventRecord,
    pub trace: Vec<WorkflowResult>,
    pub summary: WorkflowSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmResponse {
    pub status: String,
    pub request_id: Uuid,
    /// Set when the record was saved but follow-up cleanup failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Ledger source label: the first URL processed, else the first input kind.
pub(crate) fn source_label(response: &WorkflowResponse) -> String {
    response
        .trace
        .iter()
        .find(|r| r.source_kind == SourceKind::Url)
        .or_else(|| response.trace.first())
        .map(|r| match r.source_kind {
            SourceKind::Url => r.source_content.clone(),
            kind => kind.to_string(),
        })
        .unwrap_or_default()
}

/// Run the workflow and park the record until it is confirmed.
pub(crate) async fn run_and_hold(
    deps: &ServerDeps,
    request: WorkflowRequest,
    queue_url: Option<String>,
) -> ApiResult<RunResponse> {
    let response = deps.orchestrator.run(request).await?;

    let mut pending = PendingRecord::new(response.merged_record.clone(), source_label(&response));
    if let Some(url) = queue_url {
        pending = pending.from_queue(url);
    }
    let request_id = deps.pending.insert(pending).await;

    info!(
        request_id = %request_id,
        results = response.summary.count,
        discovered = response.summary.discovered_url_count,
        "Workflow finished"
    );

    Ok(RunResponse {
        request_id,
        merged_record: response.merged_record,
        trace: response.trace,
        summary: response.summary,
    })
}

/// `POST /run`
pub async fn run_handler(
    Extension(deps): Extension<ServerDeps>,
    Json(body): Json<RunRequest>,
) -> ApiResult<Json<RunResponse>> {
    let request = body.into_workflow_request()?;
    Ok(Json(run_and_hold(&deps, request, None).await?))
}

/// `POST /confirm/:request_id`
///
/// Appends the record to the ledger and, for queued records, removes the
/// queue row that still holds the record's URL. Returns 409 when that URL has
/// already left the queue.
pub async fn confirm_handler(
    Extension(deps): Extension<ServerDeps>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<Json<ConfirmResponse>> {
    let pending = deps
        .pending
        .take(&request_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No pending record with id {}", request_id)))?;

    let _queue_guard = deps.queue_lock.lock().await;

    let queue_url = pending.queue_url.clone();
    let queue_row = match &queue_url {
        Some(url) => match current_queue_row(&deps, url).await {
            Ok(Some(row)) => Some(row),
            Ok(None) => {
                deps.pending.release(url).await;
                warn!(request_id = %request_id, url = %url, "Queued URL already left the queue");
                return Err(ApiError::Conflict(format!(
                    "{} is no longer in the queue",
                    url
                )));
            }
            Err(e) => {
                deps.pending.restore(request_id, pending).await;
                return Err(e);
            }
        },
        None => None,
    };

    let row = ledger_row(&pending.record, &pending.source, Local::now().naive_local());
    if let Err(e) = deps.store.append_row(&deps.ledger_sheet, row).await {
        deps.pending.restore(request_id, pending).await;
        return Err(e.into());
    }

    let mut warning = None;
    if let Some(queue_row) = queue_row {
        if let Err(e) = deps.store.delete_row(&deps.queue_sheet, queue_row).await {
            warn!(request_id = %request_id, row = queue_row, error = %e, "Record saved but queue row was not removed");
            warning = Some(format!("Record saved but the queue row could not be removed: {}", e));
        }
    }
    if let Some(url) = &queue_url {
        deps.pending.release(url).await;
    }

    info!(request_id = %request_id, source = %pending.source, "Record confirmed");
    Ok(Json(ConfirmResponse {
        status: "success".to_string(),
        request_id,
        warning,
    }))
}

/// Row currently holding `url` in the queue sheet.
async fn current_queue_row(deps: &ServerDeps, url: &str) -> ApiResult<Option<usize>> {
    let queued = deps.store.queued_urls(&deps.queue_sheet).await?;
    Ok(queued.into_iter().find(|q| q.url == url).map(|q| q.row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_ignored() {
        let request = RunRequest {
            text_input: Some("  ".to_string()),
            image_data: Some(String::new()),
            pdf_data: None,
        }
        .into_workflow_request()
        .unwrap();

        assert!(request.is_empty());
    }

    #[test]
    fn test_bad_image_is_bad_request() {
        let err = RunRequest {
            image_data: Some("%%%".to_string()),
            ..RunRequest::default()
        }
        .into_workflow_request()
        .unwrap_err();

        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_source_label_prefers_url() {
        let response = WorkflowResponse {
            merged_record: EventRecord::default(),
            trace: vec![
                WorkflowResult::empty(SourceKind::Text, "text"),
                WorkflowResult::empty(SourceKind::Url, "https://events.example/x"),
            ],
            summary: WorkflowSummary {
                count: 2,
                discovered_url_count: 1,
            },
        };
        assert_eq!(source_label(&response), "https://events.example/x");
    }
}
