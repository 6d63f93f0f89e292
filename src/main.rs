use anyhow::Context;
use clap::{Parser, Subcommand};
use jira_harvest::{Config, Crawler, HttpClient, JiraClient, normalize_project_key};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jira-harvest")]
#[command(about = "Crawl a Jira project into line-delimited JSON datasets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl all issues of a project into {PROJECT}_raw.jsonl
    Scrape {
        /// Jira project key, e.g. HADOOP or KAFKA
        #[arg(long)]
        project: String,
        /// Directory for raw and processed output files
        #[arg(long, default_value = "sample_output")]
        output_dir: PathBuf,
        /// Base URL of the Jira instance
        #[arg(long, default_value = "https://issues.apache.org/jira")]
        base_url: String,
        /// Issues requested per search page
        #[arg(long, default_value_t = 30)]
        page_size: usize,
        /// Maximum concurrent issue-detail fetches
        #[arg(long, default_value_t = 10)]
        concurrency: usize,
        /// Attempt budget per HTTP request
        #[arg(long, default_value_t = 5)]
        retry_attempts: u32,
        /// Fixed delay between request attempts, in seconds
        #[arg(long, default_value_t = 3)]
        retry_delay: u64,
        /// Abort after this many consecutive page-fetch failures
        /// (default: retry the same offset indefinitely)
        #[arg(long)]
        max_page_retries: Option<u32>,
    },

    /// Transform {PROJECT}_raw.jsonl into {PROJECT}_processed.jsonl
    Transform {
        /// Jira project key
        #[arg(long)]
        project: String,
        /// Directory holding the raw file and receiving the processed file
        #[arg(long, default_value = "sample_output")]
        output_dir: PathBuf,
    },

    /// Clean and deduplicate a JSONL dataset
    Clean {
        /// Input JSONL file
        #[arg(long)]
        input: PathBuf,
        /// Output JSONL file
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Scrape {
            project,
            output_dir,
            base_url,
            page_size,
            concurrency,
            retry_attempts,
            retry_delay,
            max_page_retries,
        } => {
            let project = normalize_project_key(&project)?;
            let mut config = Config {
                base_url,
                output_dir,
                page_size,
                concurrency,
                ..Default::default()
            };
            config.retry.max_attempts = retry_attempts;
            config.retry.delay = Duration::from_secs(retry_delay);
            config.page_retry.max_attempts = max_page_retries;
            config.validate()?;

            let http = HttpClient::new(config.request_timeout, config.retry.clone())?;
            let api = Arc::new(JiraClient::new(&config.base_url, http)?);
            let summary = Crawler::new(api, config, &project)
                .run()
                .await
                .with_context(|| format!("crawl of {project} failed"))?;
            println!(
                "{} issues written ({} skipped) to {}",
                summary.written,
                summary.skipped,
                summary.sink_path.display()
            );
        }
        Commands::Transform {
            project,
            output_dir,
        } => {
            let project = normalize_project_key(&project)?;
            let count = jira_harvest::transform::transform_project(&project, &output_dir)
                .await
                .with_context(|| format!("transform of {project} failed"))?;
            println!("{count} records transformed");
        }
        Commands::Clean { input, output } => {
            let summary = jira_harvest::clean::clean_file(&input, &output)
                .await
                .context("clean pass failed")?;
            println!(
                "{} records kept, {} dropped",
                summary.written,
                summary.dropped_missing_title + summary.dropped_duplicates
            );
        }
    }
    Ok(())
}
