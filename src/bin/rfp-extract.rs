//! CLI binary for rfp-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs one extraction and prints the result. The API key
//! is resolved here, once, from `--api-key` or `OPENAI_API_KEY`, and handed to
//! the library explicitly.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rfp_extract::config::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use rfp_extract::output::{self, DOWNLOAD_FILE_NAME};
use rfp_extract::pipeline::input::load_document;
use rfp_extract::{
    extract_text, read_document, Credential, ExtractionConfig, ExtractionOutput, FieldSchema,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  rfp-extract city-bid.pdf
  rfp-extract tender.html --show-raw-text
  rfp-extract notice.dat --media-type text/plain --json > fields.json
  rfp-extract rfp.pdf --base-url http://localhost:4000/v1 --model llama3.1

OUTPUT:
  The extracted fields are printed to stdout and saved as
  rfp_extraction_results.json in --output-dir (default: current directory).

PDF SUPPORT:
  PDF text extraction uses the pdfium shared library. Point PDFIUM_LIB_PATH
  at the directory containing libpdfium if it is not on the loader path.
"#;

/// Extract structured bid fields from RFP documents using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "rfp-extract",
    version,
    about = "Extract structured bid fields from RFP documents (PDF, HTML, text) using an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// RFP document: .pdf, .html/.htm or .txt.
    input: PathBuf,

    /// API key for the model service.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Declared media type (application/pdf, text/html, text/plain); overrides the file extension.
    #[arg(long, env = "RFP_EXTRACT_MEDIA_TYPE")]
    media_type: Option<String>,

    /// Chat model ID.
    #[arg(long, env = "RFP_EXTRACT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// OpenAI-compatible API root.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Max characters of document text sent to the model.
    #[arg(long, env = "RFP_EXTRACT_TEXT_BUDGET", default_value_t = 4000)]
    text_budget: usize,

    /// Max tokens the model may generate.
    #[arg(long, env = "RFP_EXTRACT_MAX_TOKENS", default_value_t = 1000)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "RFP_EXTRACT_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Model call timeout in seconds.
    #[arg(long, env = "RFP_EXTRACT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "RFP_EXTRACT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Print the raw document text before extracting.
    #[arg(long, env = "RFP_EXTRACT_SHOW_RAW_TEXT")]
    show_raw_text: bool,

    /// Directory for rfp_extraction_results.json.
    #[arg(short, long, env = "RFP_EXTRACT_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Do not write rfp_extraction_results.json.
    #[arg(long)]
    no_download: bool,

    /// Print the JSON payload to stdout instead of the field listing.
    #[arg(long, env = "RFP_EXTRACT_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RFP_EXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "RFP_EXTRACT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO lines would tear the spinner; only warnings get through while it runs.
    let show_spinner = !cli.quiet && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_spinner).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", red("Extraction Error:"), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, show_spinner: bool) -> Result<()> {
    let config = build_config(cli).await?;

    // ── Read ─────────────────────────────────────────────────────────────
    let doc = load_document(&cli.input, cli.media_type.as_deref()).await?;
    let text = read_document(&doc, &config).await?;

    if cli.show_raw_text {
        eprintln!("{}", bold("Raw Document Text"));
        eprintln!("{}", text.raw_text);
        eprintln!();
    }

    // ── Extract ──────────────────────────────────────────────────────────
    let spinner = show_spinner.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Extracting RFP information…");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let extracted = extract_text(text, &config).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let extracted = extracted?;

    // ── Save, then present ───────────────────────────────────────────────
    let saved = save_and_print(cli, &extracted, &mut io::stdout().lock()).await?;

    if !cli.quiet {
        let stats = &extracted.stats;
        eprintln!(
            "{}  {} fields  {}ms{}",
            green("✔"),
            extracted.result.len(),
            stats.total_duration_ms,
            saved
                .as_ref()
                .map(|p| format!("  →  {}", bold(&p.display().to_string())))
                .unwrap_or_default(),
        );
        if let (Some(p), Some(c)) = (stats.prompt_tokens, stats.completion_tokens) {
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&p.to_string()),
                dim(&c.to_string()),
            );
        }
        if stats.truncated {
            eprintln!(
                "   {}",
                dim(&format!(
                    "document text cut from {} to {} characters (--text-budget)",
                    stats.raw_chars, stats.normalized_chars
                ))
            );
        }
        if cli.no_download {
            eprintln!("   {}", dim(&format!("{DOWNLOAD_FILE_NAME} not written (--no-download)")));
        }
    }

    Ok(())
}

/// Write the results file, then print the result to `out`.
///
/// The file goes first: if it cannot be written the user sees only the error,
/// never a result followed by a failure.
async fn save_and_print(
    cli: &Cli,
    extracted: &ExtractionOutput,
    out: &mut impl Write,
) -> Result<Option<PathBuf>> {
    let saved = if cli.no_download {
        None
    } else {
        Some(output::write_download(&extracted.result, &cli.output_dir).await?)
    };

    let body = if cli.json {
        extracted.download_payload()?
    } else {
        extracted.render(FieldSchema::rfp())
    };
    out.write_all(body.as_bytes())
        .context("Failed to write to stdout")?;
    if !body.ends_with('\n') {
        out.write_all(b"\n").context("Failed to write to stdout")?;
    }
    out.flush().context("Failed to write to stdout")?;

    Ok(saved)
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .model(&cli.model)
        .base_url(&cli.base_url)
        .maybe_api_key(cli.api_key.clone().and_then(Credential::non_empty))
        .text_budget(cli.text_budget)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    if let Some(ref dir) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(dir);
    }

    Ok(builder.build()?)
}
