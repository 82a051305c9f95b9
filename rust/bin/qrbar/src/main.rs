//! `qrbar`: command-line client for the QR/barcode code store.
//!
//! Lists, creates, updates and deletes stored codes, and prints the render
//! parameters a UI would hand to its QR or barcode engine.

mod commands;
mod config;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use qrbar_client::{CodeId, CodeStore, CodeType, HttpCodeStore};
use tracing::debug;

/// QRBar CLI tool.
#[derive(Parser, Debug)]
#[command(name = "qrbar", about = "QR code and barcode store client")]
struct Cli {
    /// Path to client config file (default: ~/.qrbar/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Base URL of the code store. Overrides QRBAR_API_URL and the config file.
    #[arg(long = "api-url", global = true)]
    api_url: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stored codes, newest first.
    List,

    /// Show one code and its render parameters.
    Show { id: CodeId },

    /// Create a code.
    Create {
        /// Text to encode.
        #[arg(long)]
        text: String,
        /// Code type: qr_code or barcode.
        #[arg(long = "type", default_value = "qr_code")]
        code_type: CodeType,
        /// QR sub-format (default: qr_code).
        #[arg(long)]
        qr_format: Option<String>,
        /// Barcode sub-format (default: code128).
        #[arg(long)]
        barcode_format: Option<String>,
    },

    /// Update fields of a code.
    Update {
        id: CodeId,
        #[arg(long)]
        text: Option<String>,
        #[arg(long = "type")]
        code_type: Option<CodeType>,
        #[arg(long)]
        qr_format: Option<String>,
        #[arg(long)]
        barcode_format: Option<String>,
    },

    /// Delete a code.
    Delete { id: CodeId },

    /// Show supported code types and sub-formats.
    Choices {
        /// Print the built-in catalog without contacting the store.
        #[arg(long)]
        offline: bool,
    },

    /// Print render parameters for all codes, or for one.
    Render { id: Option<CodeId> },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output_json = match cli.output.as_str() {
        "json" => true,
        "table" => false,
        other => anyhow::bail!("Unknown output format \"{}\". Use table or json.", other),
    };

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);
    let client_config = config::ClientConfig::load(&config_path)?;
    let env_url = std::env::var(config::API_URL_ENV).ok();
    let api_url = client_config.resolve_api_url(cli.api_url.as_deref(), env_url.as_deref())?;
    debug!(%api_url, config = %config_path.display(), "resolved code store");

    let store: Arc<dyn CodeStore> = Arc::new(HttpCodeStore::new(api_url));

    match cli.command {
        Commands::List => commands::codes::list(store, output_json).await?,

        Commands::Show { id } => commands::codes::show(store, id, output_json).await?,

        Commands::Create {
            text,
            code_type,
            qr_format,
            barcode_format,
        } => {
            let args = commands::codes::CreateArgs {
                text,
                code_type,
                qr_format,
                barcode_format,
            };
            commands::codes::create(store, args, output_json).await?;
        }

        Commands::Update {
            id,
            text,
            code_type,
            qr_format,
            barcode_format,
        } => {
            let patch = commands::codes::build_patch(text, code_type, qr_format, barcode_format)?;
            commands::codes::update(store, id, patch, output_json).await?;
        }

        Commands::Delete { id } => commands::codes::delete(store, id).await?,

        Commands::Choices { offline } => {
            commands::choices::show(store, offline, output_json).await?
        }

        Commands::Render { id } => commands::codes::render(store, id, output_json).await?,
    }

    Ok(())
}
