//! Run with: cargo run --bin remove_duplicates

use docdedup::config::plan::DedupPlan;
use docdedup::config::{database::ConnectError, Settings};
use docdedup::modules::dedup::schema::{DedupOptions, PassOutcome};
use docdedup::{cleanup, Connector};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            println!("Error: {}", e);
            return Ok(ExitCode::from(1));
        }
    };

    let plan = match settings.plan_path.as_deref() {
        Some(path) => DedupPlan::load(path),
        None => Ok(DedupPlan::default()),
    };
    let plan = match plan {
        Ok(p) => p,
        Err(e) => {
            println!("Error: {}", e);
            return Ok(ExitCode::from(1));
        }
    };

    let connector = Connector::new(&settings.credentials_path);
    let options = DedupOptions {
        batch_size: settings.batch_size,
        dry_run: settings.dry_run,
    };
    let summary = match cleanup(&connector, &plan, options).await {
        Ok(summary) => summary,
        Err(ConnectError::Config(e)) => {
            println!("Error: {}", e);
            return Ok(ExitCode::from(1));
        }
        Err(e) => return Err(e.into()),
    };

    println!();
    for pass in &summary.passes {
        match pass {
            PassOutcome::Completed(r) if r.dry_run => println!(
                "  {}: {} scanned, {} duplicates (not deleted)",
                r.collection,
                r.scanned,
                r.duplicate_count()
            ),
            PassOutcome::Completed(r) => println!(
                "  {}: {} scanned, {} deleted in {} batches",
                r.collection, r.scanned, r.deleted, r.batches
            ),
            PassOutcome::Failed { collection, error } => {
                println!("  {}: failed ({})", collection, error)
            }
        }
    }

    if summary.failed() > 0 {
        println!(
            "\nDuplicate cleanup finished with {} failed collection(s).",
            summary.failed()
        );
        return Ok(ExitCode::from(2));
    }

    println!(
        "\nDuplicate cleanup complete. {} documents removed.",
        summary.total_deleted()
    );
    Ok(ExitCode::SUCCESS)
}
