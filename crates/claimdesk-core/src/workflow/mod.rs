//! Upload → analyze → result workflow.
//!
//! `Workflow` is a plain state machine: callers drive it with `begin_*` and
//! `finish_*` around the actual API calls. Analyze and history refresh have
//! separate completion paths so a failed refresh never touches the analyze
//! outcome.
//!
//! A failed analyze keeps the previously displayed result but marks it stale,
//! so it can no longer be mistaken for the answer to the latest attempt.

mod upload;

pub use self::upload::{
    CompleteUpload, DocumentFile, DocumentRole, MISSING_DOCUMENTS_MESSAGE, PDF_MEDIA_TYPE,
    UploadError, UploadSet,
};
use crate::api::{ApiError, ApiResult};
use crate::models::{AnalysisResult, HistoryEntry};

/// Fallback when an analyze failure carries no server detail.
pub const ANALYZE_FAILED_MESSAGE: &str = "Error analyzing claim. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Analyzing,
}

/// Which panel the workflow view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Upload,
    History,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedResult {
    pub result: AnalysisResult,
    /// A later analyze attempt failed after this result was produced.
    pub stale: bool,
}

/// State of the history list, independent of analyze.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HistoryStatus {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    /// Last refresh failed; the list (if any) is from an earlier refresh.
    Failed(String),
}

/// Why `begin_analyze` refused to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeRejected {
    InProgress,
    Incomplete(UploadError),
}

#[derive(Debug, Clone, Default)]
pub struct Workflow {
    pub uploads: UploadSet,
    pub phase: WorkflowPhase,
    pub result: Option<DisplayedResult>,
    /// User-visible error line (validation or analyze failure).
    pub error: Option<String>,
    pub history: Vec<HistoryEntry>,
    pub history_status: HistoryStatus,
    pub panel: Panel,
}

impl Workflow {
    pub fn is_analyzing(&self) -> bool {
        self.phase == WorkflowPhase::Analyzing
    }

    /// Selects a file for a role. Rejections are shown and leave the slot as it was.
    ///
    /// # Errors
    /// Returns the `UploadError` that was recorded as the visible error.
    pub fn select_file(&mut self, role: DocumentRole, file: DocumentFile) -> Result<(), UploadError> {
        match self.uploads.select(role, file) {
            Ok(()) => {
                self.error = None;
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Records a file that could not even be read.
    pub fn reject_file(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Validates the upload set and enters `Analyzing`.
    ///
    /// Returns the payload to send; on rejection no request may be issued.
    ///
    /// # Errors
    /// Returns `AnalyzeRejected` while analyzing or when a document is missing.
    pub fn begin_analyze(&mut self) -> Result<CompleteUpload, AnalyzeRejected> {
        if self.is_analyzing() {
            return Err(AnalyzeRejected::InProgress);
        }
        match self.uploads.complete() {
            Ok(upload) => {
                self.phase = WorkflowPhase::Analyzing;
                self.error = None;
                Ok(upload)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(AnalyzeRejected::Incomplete(err))
            }
        }
    }

    /// Applies the analyze outcome. Returns true when history should be refreshed.
    pub fn finish_analyze(&mut self, outcome: ApiResult<AnalysisResult>) -> bool {
        self.phase = WorkflowPhase::Idle;
        match outcome {
            Ok(result) => {
                tracing::info!(decision = %result.decision, "analysis completed");
                self.result = Some(DisplayedResult {
                    result,
                    stale: false,
                });
                self.error = None;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "analysis failed");
                if let Some(previous) = self.result.as_mut() {
                    previous.stale = true;
                }
                self.error = Some(err.user_message(ANALYZE_FAILED_MESSAGE));
                false
            }
        }
    }

    pub fn begin_history_refresh(&mut self) {
        self.history_status = HistoryStatus::Loading;
    }

    /// Applies a history outcome. Failures are logged, never shown as `error`.
    pub fn finish_history(&mut self, outcome: ApiResult<Vec<HistoryEntry>>) {
        match outcome {
            Ok(entries) => {
                tracing::debug!(count = entries.len(), "history refreshed");
                self.history = entries;
                self.history_status = HistoryStatus::Loaded;
            }
            Err(err) => {
                log_history_failure(&err);
                self.history_status = HistoryStatus::Failed(err.to_string());
            }
        }
    }

    pub fn toggle_panel(&mut self) {
        self.panel = match self.panel {
            Panel::Upload => Panel::History,
            Panel::History => Panel::Upload,
        };
    }
}

fn log_history_failure(err: &ApiError) {
    tracing::warn!(error = %err, kind = %err.kind, "history refresh failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Decision;

    const PDF: &[u8] = b"%PDF-1.4\n";

    fn pdf(name: &str) -> DocumentFile {
        DocumentFile::from_bytes(name, PDF.to_vec())
    }

    fn filled() -> Workflow {
        let mut workflow = Workflow::default();
        for role in DocumentRole::ALL {
            workflow.select_file(role, pdf(role.field_name())).unwrap();
        }
        workflow
    }

    fn pass(score: Option<f64>) -> AnalysisResult {
        AnalysisResult {
            id: None,
            decision: Decision::Pass,
            reasoning: "ok".to_string(),
            confidence_score: score,
            analyzed_at: None,
        }
    }

    #[test]
    fn test_incomplete_set_is_rejected_locally() {
        let mut workflow = Workflow::default();
        workflow.select_file(DocumentRole::Policy, pdf("p.pdf")).unwrap();

        let rejected = workflow.begin_analyze().unwrap_err();
        assert!(matches!(rejected, AnalyzeRejected::Incomplete(_)));
        assert_eq!(workflow.phase, WorkflowPhase::Idle);
        assert_eq!(workflow.error.as_deref(), Some(MISSING_DOCUMENTS_MESSAGE));
    }

    #[test]
    fn test_second_analyze_while_running_is_rejected() {
        let mut workflow = filled();
        workflow.begin_analyze().unwrap();
        assert!(workflow.is_analyzing());
        assert_eq!(workflow.begin_analyze().unwrap_err(), AnalyzeRejected::InProgress);
    }

    #[test]
    fn test_success_stores_result_and_requests_refresh() {
        let mut workflow = filled();
        workflow.begin_analyze().unwrap();
        let refresh = workflow.finish_analyze(Ok(pass(Some(87.0))));

        assert!(refresh);
        assert_eq!(workflow.phase, WorkflowPhase::Idle);
        let shown = workflow.result.as_ref().unwrap();
        assert!(!shown.stale);
        assert_eq!(shown.result.confidence_percent(), Some(87));
    }

    #[test]
    fn test_failure_keeps_previous_result_marked_stale() {
        let mut workflow = filled();
        workflow.begin_analyze().unwrap();
        workflow.finish_analyze(Ok(pass(None)));

        workflow.begin_analyze().unwrap();
        let refresh = workflow.finish_analyze(Err(ApiError::from_status(
            500,
            r#"{"detail":"Error analyzing claim: quota"}"#,
        )));

        assert!(!refresh);
        let shown = workflow.result.as_ref().unwrap();
        assert!(shown.stale);
        assert_eq!(shown.result.reasoning, "ok");
        assert_eq!(workflow.error.as_deref(), Some("Error analyzing claim: quota"));
    }

    #[test]
    fn test_failure_without_detail_uses_generic_message() {
        let mut workflow = filled();
        workflow.begin_analyze().unwrap();
        workflow.finish_analyze(Err(ApiError::from_status(502, "")));
        assert_eq!(workflow.error.as_deref(), Some(ANALYZE_FAILED_MESSAGE));
        assert!(workflow.result.is_none());
    }

    #[test]
    fn test_history_failure_is_not_a_workflow_error() {
        let mut workflow = filled();
        workflow.begin_analyze().unwrap();
        workflow.finish_analyze(Ok(pass(Some(50.0))));

        workflow.begin_history_refresh();
        workflow.finish_history(Err(ApiError::from_status(500, "")));

        assert_eq!(workflow.error, None);
        assert!(matches!(workflow.history_status, HistoryStatus::Failed(_)));
        assert!(workflow.result.is_some());
    }

    #[test]
    fn test_toggle_panel_keeps_result_and_files() {
        let mut workflow = filled();
        workflow.begin_analyze().unwrap();
        workflow.finish_analyze(Ok(pass(Some(87.0))));

        workflow.toggle_panel();
        assert_eq!(workflow.panel, Panel::History);
        workflow.toggle_panel();
        assert_eq!(workflow.panel, Panel::Upload);

        assert!(workflow.result.is_some());
        assert!(workflow.uploads.is_complete());
    }

    #[test]
    fn test_non_pdf_selection_shows_error() {
        let mut workflow = Workflow::default();
        let err = workflow
            .select_file(
                DocumentRole::Claim,
                DocumentFile::from_bytes("claim.docx", b"PK\x03\x04".to_vec()),
            )
            .unwrap_err();
        assert!(matches!(err, UploadError::NotPdf { .. }));
        assert!(workflow.error.as_deref().unwrap().contains("PDF"));
        assert!(workflow.uploads.get(DocumentRole::Claim).is_none());
    }
}
