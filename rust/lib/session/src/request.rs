//! Requests the session controller accepts.

use qrbar_client::{CodeId, CodeType};

/// A single draft edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    Text(String),
    CodeType(CodeType),
    QrFormat(String),
    BarcodeFormat(String),
}

/// Controller request, processed one at a time by `SessionController::dispatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Initial load of codes and choices.
    Mount,
    /// Re-fetch the code list.
    Refresh,
    /// Re-fetch the catalog.
    RefreshChoices,
    EditDraft(DraftField),
    Submit,
    Delete(CodeId),
}

impl Command {
    /// Stable path naming the request, used in logs.
    pub fn path(&self) -> &'static str {
        match self {
            Command::Mount => "session/mount",
            Command::Refresh => "codes/refresh",
            Command::RefreshChoices => "choices/refresh",
            Command::EditDraft(_) => "draft/update-field",
            Command::Submit => "codes/create",
            Command::Delete(_) => "codes/delete",
        }
    }
}
