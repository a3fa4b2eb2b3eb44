//! The four-document upload set.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use enum_map::{Enum, EnumMap};
use reqwest::multipart::{Form, Part};

use crate::api::{ApiError, ApiResult};

/// Media type every attachment must have.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Shown when analyze is attempted with an incomplete upload set.
pub const MISSING_DOCUMENTS_MESSAGE: &str = "Please upload all documents before analyzing.";

/// Fixed document roles, in display and multipart order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum DocumentRole {
    Policy,
    Claim,
    Bills,
    DoctorNotes,
}

impl DocumentRole {
    pub const ALL: [DocumentRole; 4] = [
        DocumentRole::Policy,
        DocumentRole::Claim,
        DocumentRole::Bills,
        DocumentRole::DoctorNotes,
    ];

    /// Multipart field name expected by the analyze endpoint.
    pub fn field_name(self) -> &'static str {
        match self {
            DocumentRole::Policy => "policy",
            DocumentRole::Claim => "claim",
            DocumentRole::Bills => "bills",
            DocumentRole::DoctorNotes => "doctor_notes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentRole::Policy => "Policy document",
            DocumentRole::Claim => "Claim form",
            DocumentRole::Bills => "Medical bills",
            DocumentRole::DoctorNotes => "Doctor notes",
        }
    }
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A selected file: name, sniffed media type and contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    name: String,
    media_type: Option<&'static str>,
    bytes: Vec<u8>,
}

impl DocumentFile {
    /// Reads a file from disk. The media type comes from the content, not
    /// the extension.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string());
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let media_type = infer::get(&bytes).map(|kind| kind.mime_type());
        Self {
            name: name.into(),
            media_type,
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type == Some(PDF_MEDIA_TYPE)
    }
}

/// Client-side upload validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    NotPdf {
        role: DocumentRole,
        file_name: String,
        media_type: Option<&'static str>,
    },
    Missing(Vec<DocumentRole>),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::NotPdf {
                role,
                file_name,
                media_type,
            } => write!(
                f,
                "Please select a PDF file for {} ({file_name} is {})",
                role.label().to_lowercase(),
                media_type.unwrap_or("not a recognized document")
            ),
            UploadError::Missing(_) => f.write_str(MISSING_DOCUMENTS_MESSAGE),
        }
    }
}

impl Error for UploadError {}

/// At most one PDF per role.
#[derive(Debug, Clone, Default)]
pub struct UploadSet {
    slots: EnumMap<DocumentRole, Option<DocumentFile>>,
}

impl UploadSet {
    /// Places `file` in `role`, replacing any previous file.
    ///
    /// Non-PDF files are rejected and the slot keeps its previous content.
    ///
    /// # Errors
    /// Returns `UploadError::NotPdf` when the content is not a PDF.
    pub fn select(&mut self, role: DocumentRole, file: DocumentFile) -> Result<(), UploadError> {
        if !file.is_pdf() {
            return Err(UploadError::NotPdf {
                role,
                file_name: file.name,
                media_type: file.media_type,
            });
        }
        self.slots[role] = Some(file);
        Ok(())
    }

    pub fn get(&self, role: DocumentRole) -> Option<&DocumentFile> {
        self.slots[role].as_ref()
    }

    pub fn missing(&self) -> Vec<DocumentRole> {
        DocumentRole::ALL
            .into_iter()
            .filter(|role| self.slots[*role].is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.values().all(Option::is_some)
    }

    /// Snapshot of a complete set, ready to upload.
    ///
    /// # Errors
    /// Returns `UploadError::Missing` when any role has no file.
    pub fn complete(&self) -> Result<CompleteUpload, UploadError> {
        let files: Vec<(DocumentRole, DocumentFile)> = DocumentRole::ALL
            .into_iter()
            .filter_map(|role| self.slots[role].clone().map(|file| (role, file)))
            .collect();
        if files.len() == DocumentRole::ALL.len() {
            Ok(CompleteUpload { files })
        } else {
            Err(UploadError::Missing(self.missing()))
        }
    }
}

/// All four documents, in multipart order.
#[derive(Debug, Clone)]
pub struct CompleteUpload {
    files: Vec<(DocumentRole, DocumentFile)>,
}

impl CompleteUpload {
    pub fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|(_, file)| file.name()).collect()
    }

    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|(_, file)| file.bytes.len()).sum()
    }

    /// Multipart body with one `application/pdf` part per role.
    ///
    /// # Errors
    /// Returns an `ApiError` if a part cannot be given its media type.
    pub fn to_form(&self) -> ApiResult<Form> {
        let mut form = Form::new();
        for (role, file) in &self.files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(PDF_MEDIA_TYPE)
                .map_err(|e| ApiError::parse("attachment media type", &e))?;
            form = form.part(role.field_name(), part);
        }
        Ok(form)
    }
}
