//! Renderer selection: which engine draws a record, and with what parameters.

use qrbar_client::{CodeRecord, CodeType};
use serde::Serialize;

use crate::catalog::{RenderFormat, resolve_render_format};

pub const QR_SIZE: u32 = 150;
pub const BARCODE_BAR_WIDTH: f32 = 1.5;
pub const BARCODE_HEIGHT: u32 = 60;
pub const BARCODE_FONT_SIZE: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrSpec {
    /// Encoded verbatim.
    pub value: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarcodeSpec {
    pub value: String,
    pub format: RenderFormat,
    pub bar_width: f32,
    pub height: u32,
    pub font_size: u32,
}

/// Fully parameterized call into a rendering engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum RenderSpec {
    Qr(QrSpec),
    Barcode(BarcodeSpec),
}

/// Pick the engine for `record` and parameterize it. Pure.
pub fn select_renderer(record: &CodeRecord) -> RenderSpec {
    match record.code_type {
        CodeType::QrCode => RenderSpec::Qr(QrSpec {
            value: record.text.clone(),
            size: QR_SIZE,
        }),
        CodeType::Barcode => RenderSpec::Barcode(BarcodeSpec {
            value: record.text.clone(),
            format: resolve_render_format(&record.barcode_format),
            bar_width: BARCODE_BAR_WIDTH,
            height: BARCODE_HEIGHT,
            font_size: BARCODE_FONT_SIZE,
        }),
    }
}
