//! Code commands: `qrbar list`, `qrbar create`, `qrbar delete`, ...
//!
//! List, create, delete and render go through the session controller so the
//! CLI sees exactly the state a UI would.

use std::sync::Arc;

use anyhow::Result;
use qrbar_client::{ChoiceSet, CodeId, CodePatch, CodeRecord, CodeStore, CodeType};
use qrbar_session::{DraftField, RenderSpec, SessionController, builtin_choices, select_renderer};
use tracing::warn;

/// Reject a sub-format the catalog does not offer for `code_type`.
fn check_format(choices: &ChoiceSet, code_type: CodeType, format: &str) -> Result<()> {
    let offered = match code_type {
        CodeType::QrCode => choices.contains_qr_format(format),
        CodeType::Barcode => choices.contains_barcode_format(format),
    };
    if !offered {
        let allowed: Vec<&str> = choices
            .formats_for(code_type)
            .iter()
            .map(|c| c.value.as_str())
            .collect();
        anyhow::bail!(
            "Unknown {} format \"{}\". Choose one of: {}",
            code_type,
            format,
            allowed.join(", ")
        );
    }
    Ok(())
}

fn print_table(codes: &[CodeRecord]) {
    if codes.is_empty() {
        println!("No codes yet.");
        return;
    }
    println!("{:6} {:8} {:10} {:25} {}", "ID", "TYPE", "FORMAT", "CREATED", "TEXT");
    for code in codes {
        println!(
            "{:6} {:8} {:10} {:25} {}",
            code.id.to_string(),
            code.code_type.as_str(),
            code.active_format(),
            code.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            code.text
        );
    }
}

fn describe(spec: &RenderSpec) -> String {
    match spec {
        RenderSpec::Qr(qr) => format!("QR {}px", qr.size),
        RenderSpec::Barcode(bar) => format!(
            "{} width={} height={} font={}",
            bar.format, bar.bar_width, bar.height, bar.font_size
        ),
    }
}

/// `qrbar list`
pub async fn list(store: Arc<dyn CodeStore>, output_json: bool) -> Result<()> {
    let mut session = SessionController::new(store);
    session.refresh().await?;

    let codes = &session.state().codes;
    if output_json {
        println!("{}", serde_json::to_string_pretty(codes)?);
    } else {
        print_table(codes);
    }
    Ok(())
}

/// `qrbar show <id>`
pub async fn show(store: Arc<dyn CodeStore>, id: CodeId, output_json: bool) -> Result<()> {
    let code = store.get(id).await?;
    let spec = select_renderer(&code);

    if output_json {
        let body = serde_json::json!({ "code": code, "render": spec });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("ID:       {}", code.id);
        println!("Type:     {} ({})", code.code_type.label(), code.code_type);
        println!("Format:   {}", code.active_format());
        println!("Text:     {}", code.text);
        println!("Created:  {}", code.created_at.to_rfc3339());
        println!("Updated:  {}", code.updated_at.to_rfc3339());
        println!("Render:   {}", describe(&spec));
    }
    Ok(())
}

/// Fields for `qrbar create`.
pub struct CreateArgs {
    pub text: String,
    pub code_type: CodeType,
    pub qr_format: Option<String>,
    pub barcode_format: Option<String>,
}

/// `qrbar create`
pub async fn create(store: Arc<dyn CodeStore>, args: CreateArgs, output_json: bool) -> Result<()> {
    let mut session = SessionController::new(store);
    if session.refresh_choices().await.is_err() {
        warn!("using built-in format catalog");
    }
    let choices = session.state().choices.clone().unwrap_or_else(builtin_choices);

    session.edit(DraftField::Text(args.text));
    session.edit(DraftField::CodeType(args.code_type));
    if let Some(format) = args.qr_format {
        session.edit(DraftField::QrFormat(format));
    }
    if let Some(format) = args.barcode_format {
        session.edit(DraftField::BarcodeFormat(format));
    }

    let draft = &session.state().draft;
    let active = match draft.code_type {
        CodeType::QrCode => &draft.qr_format,
        CodeType::Barcode => &draft.barcode_format,
    };
    check_format(&choices, draft.code_type, active)?;

    let created = session.submit().await?;

    if output_json {
        println!("{}", serde_json::to_string_pretty(&created)?);
    } else {
        println!("Code {} created.", created.id);
        println!("  Render: {}", describe(&select_renderer(&created)));
        println!("  {} code(s) in store.", session.state().codes.len());
    }
    Ok(())
}

/// Build a partial update. Fails when nothing would change.
pub fn build_patch(
    text: Option<String>,
    code_type: Option<CodeType>,
    qr_format: Option<String>,
    barcode_format: Option<String>,
) -> Result<CodePatch> {
    if let Some(text) = &text {
        if text.trim().is_empty() {
            anyhow::bail!("Text cannot be empty.");
        }
    }
    let patch = CodePatch {
        text,
        code_type,
        qr_format,
        barcode_format,
    };
    if patch.is_empty() {
        anyhow::bail!("Nothing to update. Pass --text, --type, --qr-format or --barcode-format.");
    }
    Ok(patch)
}

/// `qrbar update <id>`
pub async fn update(
    store: Arc<dyn CodeStore>,
    id: CodeId,
    patch: CodePatch,
    output_json: bool,
) -> Result<()> {
    let code = store.update(id, &patch).await?;
    if output_json {
        println!("{}", serde_json::to_string_pretty(&code)?);
    } else {
        println!("Code {} updated.", code.id);
    }
    Ok(())
}

/// `qrbar delete <id>`
pub async fn delete(store: Arc<dyn CodeStore>, id: CodeId) -> Result<()> {
    let mut session = SessionController::new(store);
    session.delete(id).await?;
    println!("Code {} deleted.", id);
    Ok(())
}

/// `qrbar render [<id>]`
pub async fn render(store: Arc<dyn CodeStore>, id: Option<CodeId>, output_json: bool) -> Result<()> {
    let mut session = SessionController::new(store);
    session.refresh().await?;

    let specs: Vec<(CodeId, RenderSpec)> = session
        .render_specs()
        .into_iter()
        .filter(|(code_id, _)| id.is_none_or(|wanted| wanted == *code_id))
        .collect();
    if let Some(wanted) = id {
        if specs.is_empty() {
            anyhow::bail!("Code {} not found.", wanted);
        }
    }

    if output_json {
        let body: Vec<serde_json::Value> = specs
            .iter()
            .map(|(code_id, spec)| serde_json::json!({ "id": code_id, "render": spec }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        for (code_id, spec) in &specs {
            println!("{:6} {}", code_id.to_string(), describe(spec));
        }
    }
    Ok(())
}
