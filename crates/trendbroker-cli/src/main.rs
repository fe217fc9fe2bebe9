mod request;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use trendbroker_core::series::SeriesTransform;
use trendbroker_core::{cache_key, TrendRequest, DEFAULT_BASE_DAYS, DEFAULT_OUTPUT_LANG};
use trendbroker_llm::parse_sections;

use crate::request::{build_request, read_csv_export, RequestOptions, DEFAULT_TOP};

#[derive(Debug, Parser)]
#[command(name = "trendbroker-cli")]
#[command(about = "Prepare, inspect and submit trend-summary requests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build a summarize request from a CSV time-series export
    Request {
        /// CSV export with a `date` column and one column per keyword
        #[arg(long)]
        csv: PathBuf,
        /// Number of keywords to keep, ranked by total impressions
        #[arg(long, default_value_t = DEFAULT_TOP)]
        top: usize,
        /// Keep only the trailing N days (1-90) ending on the last exported date
        #[arg(long)]
        days: Option<u32>,
        /// Convert values to each day's share of the total
        #[arg(long)]
        normalized: bool,
        /// Emit running totals
        #[arg(long)]
        cum: bool,
        /// Trailing moving-average window (ignored with --cum)
        #[arg(long, default_value_t = 0)]
        smooth: usize,
        /// Output language tag; the broker default applies when omitted
        #[arg(long)]
        lang: Option<String>,
        /// Short-term horizon in days
        #[arg(long, default_value_t = DEFAULT_BASE_DAYS)]
        base_days: u32,
        /// Ask the broker to skip its cache lookup
        #[arg(long)]
        no_cache: bool,
    },
    /// Print the cache key the broker would use for a request
    CacheKey {
        /// Request JSON file
        #[arg(long)]
        input: PathBuf,
        /// Language assumed when the request omits `output_lang`
        #[arg(long, env = "OUTPUT_LANG", default_value = DEFAULT_OUTPUT_LANG)]
        default_lang: String,
    },
    /// Submit a request to a running broker
    Summarize {
        /// Request JSON file
        #[arg(long)]
        input: PathBuf,
        /// Broker base URL
        #[arg(long, env = "TRENDBROKER_URL", default_value = "http://127.0.0.1:9001")]
        broker_url: String,
        /// Request timeout in seconds
        #[arg(long, default_value_t = 120)]
        timeout_secs: u64,
    },
    /// Run the section parser over a raw model answer
    Parse {
        /// Text file holding the answer
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Request {
            csv,
            top,
            days,
            normalized,
            cum,
            smooth,
            lang,
            base_days,
            no_cache,
        } => {
            let file = std::fs::File::open(&csv)
                .with_context(|| format!("failed to open CSV '{}'", csv.display()))?;
            let export = read_csv_export(file)?;
            let options = RequestOptions {
                top,
                days,
                transform: SeriesTransform {
                    normalized,
                    cumulative: cum,
                    smooth,
                },
                output_lang: lang,
                base_days,
                use_cache: !no_cache,
            };
            let request = build_request(&export, &options)?;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Commands::CacheKey {
            input,
            default_lang,
        } => {
            let request = read_request(&input)?.with_default_lang(&default_lang);
            println!("{}", cache_key(&request)?);
        }
        Commands::Summarize {
            input,
            broker_url,
            timeout_secs,
        } => {
            let request = read_request(&input)?;
            let body = submit(&broker_url, &request, timeout_secs).await?;
            println!("{body}");
        }
        Commands::Parse { input } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read '{}'", input.display()))?;
            let parsed = parse_sections(text.trim());
            let rendered = serde_json::json!({
                "path": format!("{:?}", parsed.path).to_lowercase(),
                "summary": parsed.summary,
                "actions_short": parsed.actions_short,
                "actions_mid": parsed.actions_mid,
                "actions_long": parsed.actions_long,
                "confidence": parsed.confidence,
            });
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
    }

    Ok(())
}

fn read_request(path: &Path) -> anyhow::Result<TrendRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a valid trend request", path.display()))
}

async fn submit(
    broker_url: &str,
    request: &TrendRequest,
    timeout_secs: u64,
) -> anyhow::Result<String> {
    let url = format!("{}/v1/summarize/trend", broker_url.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    tracing::info!(url = %url, keywords = request.top_keywords.len(), "submitting summarize request");
    let response = client.post(&url).json(request).send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        bail!("broker returned {status}: {body}");
    }

    // Pretty-print when possible; fall back to the raw body.
    Ok(serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or(body))
}
