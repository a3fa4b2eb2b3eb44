//! Workflow feature: document selection, analysis result and history.

mod render;
mod state;
mod update;

pub use render::render_workflow;
pub use state::{PathPrompt, WorkflowViewState};
pub use update::{
    fetch_history, handle_analyze_finished, handle_document_loaded, handle_history_loaded,
    handle_key, handle_paste,
};
