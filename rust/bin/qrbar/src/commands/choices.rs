//! `qrbar choices`: show the format catalog.

use std::sync::Arc;

use anyhow::Result;
use qrbar_client::{Choice, ChoiceSet, CodeStore};
use qrbar_session::builtin_choices;
use tracing::warn;

/// Fetch the catalog from the store. With `offline`, or when the store is
/// unreachable, print the built-in catalog instead.
pub async fn show(store: Arc<dyn CodeStore>, offline: bool, output_json: bool) -> Result<()> {
    let choices = if offline {
        builtin_choices()
    } else {
        match store.fetch_choices().await {
            Ok(choices) => choices,
            Err(e) => {
                warn!(error = %e, "failed to fetch choices, showing built-in catalog");
                builtin_choices()
            }
        }
    };

    if output_json {
        println!("{}", serde_json::to_string_pretty(&choices)?);
    } else {
        print!("{}", render_table(&choices));
    }
    Ok(())
}

fn render_table(choices: &ChoiceSet) -> String {
    let mut out = String::new();
    section(&mut out, "CODE TYPES", &choices.code_types);
    section(&mut out, "QR FORMATS", &choices.qr_formats);
    section(&mut out, "BARCODE FORMATS", &choices.barcode_formats);
    out
}

fn section(out: &mut String, title: &str, items: &[Choice]) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(title);
    out.push('\n');
    for item in items {
        out.push_str(&format!("  {:10} {}\n", item.value, item.label));
    }
}
