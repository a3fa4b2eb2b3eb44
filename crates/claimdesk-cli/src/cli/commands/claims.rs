//! Analyze, history and show command handlers.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use claimdesk_core::models::{AnalysisResult, HistoryEntry};
use claimdesk_core::session::SessionStore;
use claimdesk_core::workflow::{ANALYZE_FAILED_MESSAGE, DocumentFile, DocumentRole, UploadSet};
use comfy_table::{ContentArrangement, Table};

use super::require_session;

const HISTORY_FAILED_MESSAGE: &str = "Failed to load history.";
const CLAIM_FAILED_MESSAGE: &str = "Failed to load analysis.";

/// One path per required document.
pub struct DocumentPaths {
    pub policy: PathBuf,
    pub claim: PathBuf,
    pub bills: PathBuf,
    pub doctor_notes: PathBuf,
}

impl DocumentPaths {
    fn get(&self, role: DocumentRole) -> &PathBuf {
        match role {
            DocumentRole::Policy => &self.policy,
            DocumentRole::Claim => &self.claim,
            DocumentRole::Bills => &self.bills,
            DocumentRole::DoctorNotes => &self.doctor_notes,
        }
    }
}

pub async fn analyze(store: &SessionStore, paths: &DocumentPaths, json: bool) -> Result<()> {
    // Files are checked before the session so a bad path never costs a request.
    let mut uploads = UploadSet::default();
    for role in DocumentRole::ALL {
        let file = DocumentFile::read(paths.get(role))?;
        uploads.select(role, file)?;
    }
    let upload = uploads.complete()?;

    let session = require_session(store).await?;
    let client = store.client(&session)?;
    tracing::info!(files = ?upload.file_names(), bytes = upload.total_bytes(), "analyzing");
    let result = client
        .analyze(&upload)
        .await
        .map_err(|e| anyhow!(e.user_message(ANALYZE_FAILED_MESSAGE)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

pub async fn history(store: &SessionStore, json: bool) -> Result<()> {
    let session = require_session(store).await?;
    let entries = store
        .client(&session)?
        .history()
        .await
        .map_err(|e| anyhow!(e.user_message(HISTORY_FAILED_MESSAGE)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No analyses yet.");
    } else {
        println!("{}", history_table(&entries));
    }
    Ok(())
}

pub async fn show(store: &SessionStore, id: &str, json: bool) -> Result<()> {
    let session = require_session(store).await?;
    let entry = store
        .client(&session)?
        .claim(id)
        .await
        .map_err(|e| anyhow!(e.user_message(CLAIM_FAILED_MESSAGE)))
        .with_context(|| format!("show analysis '{id}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print_entry(&entry);
    }
    Ok(())
}

fn confidence(percent: Option<u16>) -> String {
    percent.map_or_else(|| "-".to_string(), |p| format!("{p}%"))
}

fn print_result(result: &AnalysisResult) {
    println!("Decision:   {}", result.decision);
    if let Some(percent) = result.confidence_percent() {
        println!("Confidence: {percent}%");
    }
    if let Some(id) = &result.id {
        println!("ID:         {id}");
    }
    println!();
    println!("{}", result.reasoning);
}

fn print_entry(entry: &HistoryEntry) {
    println!("ID:           {}", entry.id);
    println!("Analyzed:     {}", entry.display_date());
    println!("Decision:     {}", entry.decision);
    println!("Confidence:   {}", confidence(entry.confidence_percent()));
    println!("Policy:       {}", entry.policy_file);
    println!("Claim:        {}", entry.claim_file);
    if let Some(bills) = &entry.bills_file {
        println!("Bills:        {bills}");
    }
    if let Some(notes) = &entry.doctor_notes_file {
        println!("Doctor notes: {notes}");
    }
    println!();
    println!("{}", entry.reasoning);
}

fn history_table(entries: &[HistoryEntry]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Date",
        "Decision",
        "Confidence",
        "Policy",
        "Claim",
        "ID",
    ]);
    for entry in entries {
        table.add_row(vec![
            entry.display_date(),
            entry.decision.to_string(),
            confidence(entry.confidence_percent()),
            entry.policy_file.clone(),
            entry.claim_file.clone(),
            entry.id.clone(),
        ]);
    }
    table
}
