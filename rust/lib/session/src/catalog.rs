//! Format catalog: supported code types, sub-formats, and the mapping from
//! barcode sub-format identifiers to the names a barcode renderer expects.
//!
//! Values are the store's identifiers. Labels are English and may differ
//! from the localized labels the store serves.

use std::fmt;

use qrbar_client::{Choice, ChoiceSet};
use serde::Serialize;

/// Code types as `(value, label)`.
pub const CODE_TYPES: &[(&str, &str)] = &[("qr_code", "QR Code"), ("barcode", "Barcode")];

/// QR sub-formats as `(value, label)`.
pub const QR_FORMATS: &[(&str, &str)] = &[("qr_code", "QR Code"), ("micro_qr", "Micro QR")];

/// Barcode sub-formats as `(value, label)`.
pub const BARCODE_FORMATS: &[(&str, &str)] = &[
    ("code39", "Code39"),
    ("code128", "Code128"),
    ("ean13", "EAN-13"),
    ("ean8", "EAN-8"),
    ("upca", "UPC-A"),
    ("upce", "UPC-E"),
    ("itf", "ITF"),
];

pub const DEFAULT_QR_FORMAT: &str = "qr_code";
pub const DEFAULT_BARCODE_FORMAT: &str = "code128";

/// Barcode symbology identifier understood by the rendering engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RenderFormat {
    #[serde(rename = "CODE39")]
    Code39,
    #[serde(rename = "CODE128")]
    Code128,
    #[serde(rename = "EAN13")]
    Ean13,
    #[serde(rename = "EAN8")]
    Ean8,
    #[serde(rename = "UPC")]
    Upc,
    #[serde(rename = "UPCE")]
    Upce,
    #[serde(rename = "ITF14")]
    Itf14,
}

impl RenderFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderFormat::Code39 => "CODE39",
            RenderFormat::Code128 => "CODE128",
            RenderFormat::Ean13 => "EAN13",
            RenderFormat::Ean8 => "EAN8",
            RenderFormat::Upc => "UPC",
            RenderFormat::Upce => "UPCE",
            RenderFormat::Itf14 => "ITF14",
        }
    }
}

impl fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a wire barcode sub-format to its render format.
///
/// Total: identifiers outside the catalog resolve to `CODE128` so that an
/// unexpected value never blocks rendering an otherwise valid record.
pub fn resolve_render_format(sub_format: &str) -> RenderFormat {
    match sub_format {
        "code39" => RenderFormat::Code39,
        "code128" => RenderFormat::Code128,
        "ean13" => RenderFormat::Ean13,
        "ean8" => RenderFormat::Ean8,
        "upca" => RenderFormat::Upc,
        "upce" => RenderFormat::Upce,
        "itf" => RenderFormat::Itf14,
        _ => RenderFormat::Code128,
    }
}

fn to_choices(table: &[(&str, &str)]) -> Vec<Choice> {
    table.iter().map(|(value, label)| Choice::new(*value, *label)).collect()
}

/// The catalog as the store serves it, built from the static tables.
pub fn builtin_choices() -> ChoiceSet {
    ChoiceSet {
        code_types: to_choices(CODE_TYPES),
        qr_formats: to_choices(QR_FORMATS),
        barcode_formats: to_choices(BARCODE_FORMATS),
    }
}
