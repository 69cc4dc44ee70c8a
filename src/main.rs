use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use code_retrieval::api;
use code_retrieval::config::Config;
use code_retrieval::report::{build_report, Budgets};
use code_retrieval::search::rank::Ranker;
use code_retrieval::state::AppState;
use code_retrieval::store::BlockStore;

#[derive(Parser)]
#[command(name = "code-retrieval")]
#[command(about = "Find the indexed functions most relevant to a code snippet")]
#[command(version)]
struct Cli {
    /// Parsed index JSON (overrides RETRIEVAL_INDEX_PATH)
    #[arg(short, long, global = true)]
    index: Option<PathBuf>,

    /// Repository root the index line ranges refer to (overrides RETRIEVAL_REPO_ROOT)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank functions against a query file and print a report
    Retrieve {
        /// File containing the query code
        #[arg(short, long)]
        query_file: PathBuf,

        /// bm25, tfidf, jaccard or embedding
        #[arg(short, long)]
        strategy: Option<String>,

        /// Number of functions to return
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Drop functions scoring below this
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Attach sibling methods for the first N results
        #[arg(long, default_value = "0")]
        methods: usize,

        /// Attach called functions for the first N results
        #[arg(long, default_value = "0")]
        calls: usize,

        /// List file imports for the first N results
        #[arg(long, default_value = "0")]
        imports: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Serve retrieval over HTTP
    Serve {
        /// Bind address (overrides RETRIEVAL_BIND_ADDR)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the report on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(index) = cli.index {
        config.index_path = index;
    }
    if let Some(root) = cli.root {
        config.repository_root = root;
    }

    match cli.command {
        Commands::Retrieve {
            query_file,
            strategy,
            top_n,
            threshold,
            methods,
            calls,
            imports,
            format,
        } => {
            if let Some(name) = strategy {
                config.rank.strategy = name
                    .parse()
                    .with_context(|| format!("Invalid --strategy {name}"))?;
            }
            if let Some(n) = top_n {
                anyhow::ensure!(n > 0, "--top-n must be a positive integer");
                config.rank.top_n = n;
            }
            if threshold.is_some() {
                config.rank.score_threshold = threshold;
            }
            let budgets = Budgets {
                relative_methods_num: methods,
                relative_calls_num: calls,
                if_tell_import: imports,
            };
            retrieve(&config, &query_file, budgets, format).await
        }
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            serve(config).await
        }
    }
}

async fn retrieve(
    config: &Config,
    query_file: &Path,
    budgets: Budgets,
    format: OutputFormat,
) -> Result<()> {
    let store = BlockStore::load(&config.index_path)
        .with_context(|| format!("Failed to load index {}", config.index_path.display()))?;
    let query = std::fs::read_to_string(query_file)
        .with_context(|| format!("Failed to read query file {}", query_file.display()))?;

    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()?;
    let ranker = Ranker::from_config(config.repository_root.clone(), &config.llm, client);

    let report = build_report(&store, &ranker, &query, &config.rank, budgets).await?;
    match format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!("Index: {}", config.index_path.display());
    tracing::info!("Repository root: {}", config.repository_root.display());
    tracing::info!(
        "Embedding provider: {} ({})",
        config.llm.provider,
        config.llm.base_url
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
