use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use interfaces::{PriorityLinks, SourceList};
use planet_aggregator::{ApiConfig, ArchiveConfig, FetchConfig, Pipeline, PipelineOptions};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "planet-aggregator")]
#[command(about = "Aggregates feeds into monthly JSON Feed archives and a static JSON API")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every source once and write the output tree
    Aggregate(AggregateArgs),
}

#[derive(clap::Args)]
struct AggregateArgs {
    /// Source list (OPML as JSON)
    #[arg(short = 'o', long, default_value = "feeds.json")]
    opml: PathBuf,

    /// Priority links file (JSON)
    #[arg(short, long)]
    priority: Option<PathBuf>,

    #[arg(short = 'd', long, default_value = "data")]
    output_dir: PathBuf,

    /// Prefix for `{prefix}.json` and monthly files
    #[arg(long, default_value = "feeds")]
    prefix: String,

    /// Split output into monthly files
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    monthly: bool,

    /// Months in the latest feeds (0 = all)
    #[arg(long, default_value_t = 3)]
    latest_months: i32,

    /// Merge with existing monthly files
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    merge: bool,

    /// Max entries per source (0 = all)
    #[arg(long, default_value_t = 50)]
    max_entries: usize,

    /// Max entry age in days (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_age: i64,

    /// Keep only entries carrying one of these tags
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    #[arg(long, default_value_t = 10)]
    concurrency: usize,

    /// Per-fetch timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Stop fetching after this many seconds and write what arrived
    #[arg(long)]
    deadline: Option<u64>,

    #[arg(long, default_value = "Planet")]
    title: String,

    /// API directory name; empty disables the API tree
    #[arg(long, default_value = "v1")]
    api_version: String,

    /// Defaults to --title
    #[arg(long)]
    planet_name: Option<String>,

    #[arg(long)]
    planet_description: Option<String>,

    #[arg(long)]
    planet_url: Option<String>,

    #[arg(long)]
    owner_name: Option<String>,

    #[arg(long)]
    owner_url: Option<String>,

    /// Write feeds/all.json
    #[arg(long)]
    generate_all: bool,

    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    generate_schema: bool,
}

impl AggregateArgs {
    fn options(&self) -> PipelineOptions {
        let fetch = FetchConfig {
            timeout_seconds: self.timeout,
            max_entries: self.max_entries,
            max_age: (self.max_age > 0).then(|| chrono::Duration::days(self.max_age)),
            filter_tags: self.tags.clone(),
            concurrency: self.concurrency,
            deadline_seconds: self.deadline,
            ..FetchConfig::default()
        };

        let archive = ArchiveConfig {
            monthly: self.monthly,
            prefix: self.prefix.clone(),
            latest_months: self.latest_months,
            merge: self.merge,
        };

        let api = ApiConfig {
            enabled: !self.api_version.is_empty(),
            version: self.api_version.clone(),
            planet_name: self.planet_name.clone().unwrap_or_else(|| self.title.clone()),
            planet_description: self.planet_description.clone(),
            planet_url: self.planet_url.clone(),
            owner_name: self.owner_name.clone(),
            owner_url: self.owner_url.clone(),
            generate_all: self.generate_all,
            generate_schema: self.generate_schema,
        };

        PipelineOptions {
            output_dir: self.output_dir.clone(),
            title: self.title.clone(),
            description: self.planet_description.clone(),
            home_url: self.planet_url.clone(),
            fetch,
            archive,
            api,
            generated_at: None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Aggregate(args) => aggregate(args).await,
    }
}

async fn aggregate(args: AggregateArgs) -> anyhow::Result<()> {
    // Configuration problems stop the run before any fetch
    let list = SourceList::read_file(&args.opml)?;
    let sources = list.sources();
    info!("Found {} feeds in {}", sources.len(), args.opml.display());

    let priority = match &args.priority {
        Some(path) => Some(PriorityLinks::read_file(path)?),
        None => None,
    };

    let pipeline = Pipeline::new(args.options()).context("failed to build HTTP client")?;

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, writing what has been fetched so far");
        } else {
            std::future::pending::<()>().await;
        }
    };

    let report = pipeline
        .run_until(&sources, priority.as_ref(), shutdown)
        .await
        .context("aggregation failed")?;

    if !report.errors.is_empty() {
        error!("Encountered {} errors:", report.errors.len());
        for e in &report.errors {
            error!("  - {}", e);
        }
    }
    if report.abandoned > 0 {
        warn!("{} sources were not fetched in time", report.abandoned);
    }
    info!(
        "Generated feed with {} entries ({} files)",
        report.entry_count,
        report.written.len()
    );
    Ok(())
}
