//! Wire types exchanged with the claim-review API.
//!
//! Unknown response fields are ignored so backend additions never break
//! deserialization.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Response of both the login and registration endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Claim decision reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Pass,
    Fail,
    /// Any other value (the backend answers `UNKNOWN` when it cannot parse
    /// its own model output).
    #[serde(other)]
    Unknown,
}

impl Decision {
    pub fn label(self) -> &'static str {
        match self {
            Decision::Pass => "PASS",
            Decision::Fail => "FAIL",
            Decision::Unknown => "UNKNOWN",
        }
    }

    pub fn is_pass(self) -> bool {
        matches!(self, Decision::Pass)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Clamps a raw 0–100 score into a whole percentage.
fn score_to_percent(score: f64) -> Option<u16> {
    score
        .is_finite()
        .then(|| score.round().clamp(0.0, 100.0) as u16)
}

/// Result of one analyze request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub decision: Decision,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl AnalysisResult {
    /// Confidence as a whole percentage in `0..=100`, if the backend sent one.
    pub fn confidence_percent(&self) -> Option<u16> {
        self.confidence_score.and_then(score_to_percent)
    }
}

/// A past analysis as reported by `/api/claims/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub analyzed_at: DateTime<Utc>,
    pub policy_file: String,
    pub claim_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bills_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_notes_file: Option<String>,
    pub decision: Decision,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

impl HistoryEntry {
    pub fn confidence_percent(&self) -> Option<u16> {
        self.confidence_score.and_then(score_to_percent)
    }

    /// Short local date used in listings.
    pub fn display_date(&self) -> String {
        self.analyzed_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }
}
