use claimdesk_core::workflow::{DocumentRole, Workflow};

/// Inline path entry for one document role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrompt {
    pub role: DocumentRole,
    pub input: String,
}

#[derive(Debug, Default)]
pub struct WorkflowViewState {
    pub workflow: Workflow,
    /// Highlighted document row (index into `DocumentRole::ALL`).
    pub selected: usize,
    pub prompt: Option<PathPrompt>,
    /// First visible history row.
    pub history_offset: usize,
}

impl WorkflowViewState {
    pub fn selected_role(&self) -> DocumentRole {
        DocumentRole::ALL[self.selected.min(DocumentRole::ALL.len() - 1)]
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % DocumentRole::ALL.len();
    }

    pub fn select_prev(&mut self) {
        self.selected = (self.selected + DocumentRole::ALL.len() - 1) % DocumentRole::ALL.len();
    }

    pub fn scroll_history(&mut self, down: bool) {
        let max = self.workflow.history.len().saturating_sub(1);
        self.history_offset = if down {
            (self.history_offset + 1).min(max)
        } else {
            self.history_offset.saturating_sub(1)
        };
    }

    pub fn open_prompt(&mut self, initial: &str) {
        self.prompt = Some(PathPrompt {
            role: self.selected_role(),
            input: initial.to_string(),
        });
    }
}
