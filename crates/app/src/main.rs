use chrono::Utc;
use clap::{Parser, Subcommand};
use cv_rank_core::{
    ingest_folder, CandidateRecord, OpenAiExtractor, RankerConfig, RankingCoordinator,
    RankingOptions, DEFAULT_API_BASE, DEFAULT_MODEL,
};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const BAR_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "cv-rank", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Chat-completions API base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// API key for the model endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Model identifier
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Per-call request timeout in seconds
    #[arg(long, default_value = "60")]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a folder of PDF CVs and rank candidates by weighted skills.
    Rank {
        /// Folder that contains CV PDFs.
        #[arg(long)]
        folder: String,
        /// Only process files whose stem contains this substring.
        #[arg(long)]
        filter: Option<String>,
        /// Comma-separated skill list, paired positionally with --weights.
        #[arg(
            long,
            default_value = "Wordpress,Programming in PHP,Programming in Javascript,CSS,Programming in Rust,Programming in OCaml"
        )]
        skills: String,
        /// Comma-separated weights, one per skill.
        #[arg(long, default_value = "3,2,1,1,1,1")]
        weights: String,
        /// Maximum number of documents processed at once.
        #[arg(long, default_value = "4")]
        concurrency: usize,
        /// Print the per-skill breakdown for each candidate.
        #[arg(long, default_value_t = false)]
        breakdown: bool,
    },
    /// Dump the extracted text of each PDF in a folder (ingestion debug aid).
    Extract {
        /// Folder that contains CV PDFs.
        #[arg(long)]
        folder: String,
        /// Only process files whose stem contains this substring.
        #[arg(long)]
        filter: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "cv-rank boot"
    );

    match cli.command {
        Command::Rank {
            folder,
            filter,
            skills,
            weights,
            concurrency,
            breakdown,
        } => {
            let skill_names = parse_list(&skills);
            let weight_values = parse_weights(&weights)?;

            let report = ingest_folder(Path::new(&folder), filter.as_deref())
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            for skipped in &report.skipped_files {
                warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped cv");
            }

            info!(
                folder = %folder,
                documents = report.documents.len(),
                skipped = report.skipped_files.len(),
                "ingestion complete"
            );

            let config = RankerConfig::new(
                &cli.api_base,
                cli.api_key,
                cli.model,
                Duration::from_secs(cli.timeout_secs),
            )?;
            let extractor =
                OpenAiExtractor::new(&config).map_err(|error| anyhow::anyhow!(error.to_string()))?;

            let options = RankingOptions {
                max_concurrent_documents: concurrency,
                ..RankingOptions::default()
            };
            let coordinator = RankingCoordinator::with_options(extractor, options);

            let batch = coordinator
                .rank_documents_positional(report.documents, &skill_names, &weight_values)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("Candidate ranking:");
            println!("------------------");
            let top_score = batch
                .records
                .first()
                .map(CandidateRecord::score)
                .unwrap_or(0);

            for record in &batch.records {
                println!(
                    "{:<30} {:>6}  {} ({})",
                    record.identity.name,
                    record.score(),
                    bar(record.score(), top_score),
                    record.source_path
                );

                if breakdown {
                    for weighted in &record.skills {
                        println!(
                            "    {:<28} has_skill={} years={} weight={}",
                            weighted.response.skill,
                            weighted.response.has_skill,
                            weighted.response.years,
                            weighted.weight
                        );
                    }
                }
            }
        }
        Command::Extract { folder, filter } => {
            let report = ingest_folder(Path::new(&folder), filter.as_deref())
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            for skipped in &report.skipped_files {
                warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped cv");
            }

            for document in &report.documents {
                println!("source: {}", document.source_path);
                println!("checksum: {}", document.checksum);
                println!("{}", document.text);
                println!();
            }
        }
    }

    Ok(())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_weights(raw: &str) -> anyhow::Result<Vec<i64>> {
    raw.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<i64>()
                .map_err(|_| anyhow::anyhow!("invalid weight: {item}"))
        })
        .collect()
}

fn bar(score: i64, top_score: i64) -> String {
    if top_score <= 0 || score <= 0 {
        return String::new();
    }

    let width = ((score as f64 / top_score as f64) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(width.max(1))
}
