// Demo binary: runs one bulk print job against the in-memory simulated host
// and prints every lifecycle event as JSON.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use bulk_print::orchestrator::PrintOrchestrator;
use bulk_print::sim::{AutoConfirm, SignalBehavior, SimHost, sim_bindings};
use bulk_print::{EventKind, PrintOptions, load_options};

#[derive(Parser, Debug)]
#[command(name = "bulk-print-demo", about = "Run a simulated bulk print job")]
struct Args {
    /// Total pages in the simulated container
    #[arg(long, default_value_t = 250)]
    pages: usize,
    /// Explicit batch size (heuristic when omitted)
    #[arg(long)]
    batch_size: Option<usize>,
    /// Skip all confirmation prompts
    #[arg(long, default_value_t = false)]
    auto: bool,
    /// Delay between batches in milliseconds
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,
    /// Direct-print threshold
    #[arg(long, default_value_t = 100)]
    threshold: usize,
    /// Optional TOML options file; flags override its values
    #[arg(long)]
    options: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let mut options = match &args.options {
        Some(path) => {
            tracing::info!("Loading options from: {}", path);
            load_options(path)?
        }
        None => PrintOptions::default(),
    };
    options.batch_size = args.batch_size.or(options.batch_size);
    options.auto_mode = args.auto || options.auto_mode;
    options.delay_between_batches_ms = args.delay_ms;
    options.batch_threshold = args.threshold;

    let host = Arc::new(
        SimHost::new()
            .with_container("report", args.pages)
            .with_signal(SignalBehavior::Fires(Duration::from_millis(20))),
    );
    // The demo auto-accepts every prompt; real hosts inject their own
    // confirmation provider.
    let bindings = sim_bindings(host.clone(), Arc::new(AutoConfirm(true)), &options);
    let orchestrator = PrintOrchestrator::new(options, bindings)?;

    for kind in [
        EventKind::BatchStart,
        EventKind::Progress,
        EventKind::Finish,
        EventKind::Cancel,
        EventKind::Stopped,
        EventKind::Error,
    ] {
        orchestrator.on(kind, |event| match serde_json::to_string(event) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("failed to serialize event: {}", e),
        });
    }

    tracing::info!("Starting simulated bulk print of {} pages", args.pages);
    let outcome = orchestrator.print("report", args.pages).await?;
    let status = orchestrator.get_status().await;
    tracing::info!(
        "Job finished: success={} printed={} batches={} max_live_surfaces={}",
        outcome.success,
        outcome.printed_pages,
        status.total_batches,
        host.max_live_surfaces()
    );

    Ok(())
}
