//! Session state: the draft form, cached codes, catalog, and submit phase.

use qrbar_client::{ChoiceSet, CodeRecord, CodeType, NewCode};
use serde::Serialize;

use crate::catalog::{DEFAULT_BARCODE_FORMAT, DEFAULT_QR_FORMAT};

/// Unsaved input for a new code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftRequest {
    pub text: String,
    pub code_type: CodeType,
    pub qr_format: String,
    pub barcode_format: String,
}

impl Default for DraftRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            code_type: CodeType::QrCode,
            qr_format: DEFAULT_QR_FORMAT.to_string(),
            barcode_format: DEFAULT_BARCODE_FORMAT.to_string(),
        }
    }
}

impl DraftRequest {
    /// Create-request body. Text is sent as typed, not trimmed.
    pub fn to_new_code(&self) -> NewCode {
        NewCode {
            text: self.text.clone(),
            code_type: self.code_type,
            qr_format: self.qr_format.clone(),
            barcode_format: self.barcode_format.clone(),
        }
    }
}

/// Phase of the submission path. Listing and refresh are not gated by it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", content = "message", rename_all = "snake_case")]
pub enum SubmitPhase {
    #[default]
    Idle,
    Submitting,
    Error(String),
}

/// Everything the session controller owns.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionState {
    pub draft: DraftRequest,
    /// Snapshot of the store as of the last successful refresh.
    pub codes: Vec<CodeRecord>,
    /// `None` until the catalog has been fetched once.
    pub choices: Option<ChoiceSet>,
    pub phase: SubmitPhase,
}

impl SessionState {
    pub fn loading(&self) -> bool {
        self.phase == SubmitPhase::Submitting
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            SubmitPhase::Error(message) => Some(message),
            _ => None,
        }
    }
}
