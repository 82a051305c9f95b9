//! Code records and format choices, plus the decode step from wire JSON.
//!
//! The store's JSON is first read into `Wire*` structs that accept any
//! string, then converted with `TryFrom` into typed records. A record whose
//! shape does not match (unknown code type, empty text, bad timestamp) is a
//! [`DecodeError`], never a silently half-filled value.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Identifiers ─────────────────────────────────────────────────────

/// Store-assigned record identifier. Opaque ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeId(pub i64);

impl fmt::Display for CodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(CodeId)
    }
}

// ── CodeType ────────────────────────────────────────────────────────

/// Top-level kind of visual encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeType {
    #[default]
    QrCode,
    Barcode,
}

impl CodeType {
    pub const ALL: [CodeType; 2] = [CodeType::QrCode, CodeType::Barcode];

    /// Wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeType::QrCode => "qr_code",
            CodeType::Barcode => "barcode",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            CodeType::QrCode => "QR Code",
            CodeType::Barcode => "Barcode",
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown code type '{0}' (expected qr_code or barcode)")]
pub struct UnknownCodeType(pub String);

impl FromStr for CodeType {
    type Err = UnknownCodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qr_code" => Ok(CodeType::QrCode),
            "barcode" => Ok(CodeType::Barcode),
            other => Err(UnknownCodeType(other.to_string())),
        }
    }
}

// ── CodeRecord ──────────────────────────────────────────────────────

/// A persisted encoding as returned by the store.
///
/// Only one of `qr_format` / `barcode_format` is meaningful, selected by
/// `code_type`. The other may still carry a value; renderers ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeRecord {
    pub id: CodeId,
    pub text: String,
    pub code_type: CodeType,
    pub qr_format: String,
    pub barcode_format: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CodeRecord {
    /// The sub-format that applies to this record's code type.
    pub fn active_format(&self) -> &str {
        match self.code_type {
            CodeType::QrCode => &self.qr_format,
            CodeType::Barcode => &self.barcode_format,
        }
    }
}

/// Why a wire record could not become a [`CodeRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("record {id}: {source}")]
    CodeType { id: i64, source: UnknownCodeType },

    #[error("record {id}: text is empty")]
    EmptyText { id: i64 },

    #[error("record {id}: invalid {field} timestamp '{value}'")]
    Timestamp {
        id: i64,
        field: &'static str,
        value: String,
    },
}

/// Record exactly as the store serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct WireCodeRecord {
    pub id: i64,
    pub text: String,
    pub code_type: String,
    #[serde(default)]
    pub qr_format: String,
    #[serde(default)]
    pub barcode_format: String,
    pub created_at: String,
    pub updated_at: String,
}

fn parse_timestamp(id: i64, field: &'static str, value: &str) -> Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DecodeError::Timestamp {
            id,
            field,
            value: value.to_string(),
        })
}

impl TryFrom<WireCodeRecord> for CodeRecord {
    type Error = DecodeError;

    fn try_from(wire: WireCodeRecord) -> Result<Self, Self::Error> {
        let id = wire.id;
        let code_type = wire
            .code_type
            .parse::<CodeType>()
            .map_err(|source| DecodeError::CodeType { id, source })?;
        if wire.text.is_empty() {
            return Err(DecodeError::EmptyText { id });
        }
        let created_at = parse_timestamp(id, "created_at", &wire.created_at)?;
        let updated_at = parse_timestamp(id, "updated_at", &wire.updated_at)?;

        Ok(CodeRecord {
            id: CodeId(id),
            text: wire.text,
            code_type,
            qr_format: wire.qr_format,
            barcode_format: wire.barcode_format,
            created_at,
            updated_at,
        })
    }
}

// ── Choices ─────────────────────────────────────────────────────────

/// A selectable value with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Catalog data served by `GET /api/choices`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChoiceSet {
    pub code_types: Vec<Choice>,
    pub qr_formats: Vec<Choice>,
    pub barcode_formats: Vec<Choice>,
}

impl ChoiceSet {
    pub fn contains_qr_format(&self, value: &str) -> bool {
        self.qr_formats.iter().any(|c| c.value == value)
    }

    pub fn contains_barcode_format(&self, value: &str) -> bool {
        self.barcode_formats.iter().any(|c| c.value == value)
    }

    /// Sub-format choices that apply to the given code type.
    pub fn formats_for(&self, code_type: CodeType) -> &[Choice] {
        match code_type {
            CodeType::QrCode => &self.qr_formats,
            CodeType::Barcode => &self.barcode_formats,
        }
    }
}

// ── Request bodies ──────────────────────────────────────────────────

/// Body of `POST /api/codes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCode {
    pub text: String,
    pub code_type: CodeType,
    pub qr_format: String,
    pub barcode_format: String,
}

/// Body of `PUT /api/codes/{id}`. Unset fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CodePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_type: Option<CodeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode_format: Option<String>,
}

impl CodePatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.code_type.is_none()
            && self.qr_format.is_none()
            && self.barcode_format.is_none()
    }
}
