//! CLI application for the address enrichment service.

use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{error, info};

use addrstats_enrichment::{
    load_addresses, run_fetch_loop, AddressEnricher, CheckpointStore, FixedPacing,
    OverviewEnricher, ResultWriter, TxCountEnricher,
};
use addrstats_explorer::ExplorerClient;
use addrstats_telemetry::{init_logging, Metrics};

#[derive(Parser)]
#[command(name = "addrstats")]
#[command(about = "Enrich labeled blockchain addresses with explorer statistics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich addresses with native balance and first/latest transaction age
    Overview {
        /// Input CSV with an address column and optional label column
        #[arg(long, default_value = "labeled_addresses.csv")]
        input_csv: String,

        /// Output CSV path, appended to across resumed runs
        #[arg(long, default_value = "labeled_addresses_days_balance.csv")]
        output_csv: String,

        /// Checkpoint file recording the last completed address
        #[arg(long, default_value = "checkpoint.txt")]
        checkpoint_path: String,

        /// Explorer API origin (Etherscan-compatible)
        #[arg(long, default_value = "https://api.etherscan.io")]
        explorer_url: String,

        /// Explorer API key
        #[arg(long)]
        api_key: Option<String>,

        /// Delay between records in milliseconds
        #[arg(long, default_value = "1000")]
        request_delay_ms: u64,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "15")]
        request_timeout_secs: u64,

        /// Metrics bind address (serves GET /metrics when set)
        #[arg(long)]
        metrics_bind_address: Option<String>,

        /// Log level
        #[arg(long)]
        log_level: Option<String>,

        /// Sample output path for audit logs
        #[arg(long)]
        sample_output_path: Option<String>,
    },
    /// Enrich addresses with outgoing/incoming transaction counts
    TxCounts {
        /// Input CSV with an address column and optional label column
        #[arg(long, default_value = "labeled_addresses.csv")]
        input_csv: String,

        /// Output CSV path, appended to across resumed runs
        #[arg(long, default_value = "labeled_addresses_transaction_counts.csv")]
        output_csv: String,

        /// Checkpoint file recording the last completed address
        #[arg(long, default_value = "checkpoint.txt")]
        checkpoint_path: String,

        /// Explorer API origin (Etherscan-compatible)
        #[arg(long, default_value = "https://api.etherscan.io")]
        explorer_url: String,

        /// Explorer API key
        #[arg(long)]
        api_key: Option<String>,

        /// Delay between records in milliseconds
        #[arg(long, default_value = "1000")]
        request_delay_ms: u64,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "15")]
        request_timeout_secs: u64,

        /// Metrics bind address (serves GET /metrics when set)
        #[arg(long)]
        metrics_bind_address: Option<String>,

        /// Log level
        #[arg(long)]
        log_level: Option<String>,

        /// Sample output path for audit logs
        #[arg(long)]
        sample_output_path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Overview {
            input_csv,
            output_csv,
            checkpoint_path,
            explorer_url,
            api_key,
            request_delay_ms,
            request_timeout_secs,
            metrics_bind_address,
            log_level,
            sample_output_path,
        } => {
            init_logging(log_level.as_deref())?;
            let metrics = Metrics::new()?;
            let client = ExplorerClient::connect(
                &explorer_url,
                api_key,
                Duration::from_secs(request_timeout_secs),
                metrics.clone(),
            )?;
            let enricher = OverviewEnricher::new(client);
            run_enrichment(
                &enricher,
                &input_csv,
                &output_csv,
                &checkpoint_path,
                request_delay_ms,
                metrics_bind_address,
                sample_output_path,
                metrics,
            )
            .await?;
        }
        Commands::TxCounts {
            input_csv,
            output_csv,
            checkpoint_path,
            explorer_url,
            api_key,
            request_delay_ms,
            request_timeout_secs,
            metrics_bind_address,
            log_level,
            sample_output_path,
        } => {
            init_logging(log_level.as_deref())?;
            let metrics = Metrics::new()?;
            let client = ExplorerClient::connect(
                &explorer_url,
                api_key,
                Duration::from_secs(request_timeout_secs),
                metrics.clone(),
            )?;
            let enricher = TxCountEnricher::new(client);
            run_enrichment(
                &enricher,
                &input_csv,
                &output_csv,
                &checkpoint_path,
                request_delay_ms,
                metrics_bind_address,
                sample_output_path,
                metrics,
            )
            .await?;
        }
    }

    Ok(())
}

async fn run_enrichment(
    enricher: &dyn AddressEnricher,
    input_csv: &str,
    output_csv: &str,
    checkpoint_path: &str,
    request_delay_ms: u64,
    metrics_bind_address: Option<String>,
    sample_output_path: Option<String>,
    metrics: Metrics,
) -> anyhow::Result<()> {
    info!("Starting address enrichment run");

    let inputs = load_addresses(input_csv)?;

    let mut columns: Vec<&str> = vec!["address", "label"];
    columns.extend_from_slice(enricher.metric_columns());
    let mut writer = ResultWriter::append(output_csv, &columns)?;

    let checkpoints = CheckpointStore::new(checkpoint_path);
    let pacing = FixedPacing::new(Duration::from_millis(request_delay_ms));

    if let Some(addr) = metrics_bind_address.as_deref() {
        start_metrics_server(addr, metrics.clone()).await?;
    }

    let summary = run_fetch_loop(
        &inputs,
        enricher,
        &mut writer,
        &checkpoints,
        &pacing,
        &metrics,
        sample_output_path.as_deref(),
    )
    .await?;

    info!(
        "Enriched {} addresses ({} skipped via checkpoint, {} missing metric values), results in {}",
        summary.processed, summary.skipped, summary.missing_metrics, output_csv
    );

    Ok(())
}

async fn start_metrics_server(addr: &str, metrics: Metrics) -> anyhow::Result<()> {
    use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
    use std::sync::Arc;

    let metrics = Arc::new(metrics);

    async fn metrics_handler(
        State(metrics): State<Arc<Metrics>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match metrics.gather() {
            Ok(body) => Ok((StatusCode::OK, body)),
            Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Metrics server listening on http://{}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}
