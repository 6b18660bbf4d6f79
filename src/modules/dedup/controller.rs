use futures::TryStreamExt;
use tracing::{debug, warn};

use crate::config::database::{ConnectError, Connector};
use crate::config::plan::DedupPlan;
use crate::modules::dedup::model::DuplicateScan;
use crate::modules::dedup::schema::{DedupOptions, DedupReport, PassOutcome, RunSummary};
use crate::services::store::{DocumentStore, StoreError, WriteBatch, MAX_BATCH_OPERATIONS};

/// Removes documents of `collection` whose `key_fields` values repeat an
/// earlier document's.
///
/// The first document in stream order survives. Deletes are committed in
/// batches of at most `options.batch_size`; a failed commit leaves earlier
/// batches applied.
pub async fn deduplicate<S: DocumentStore>(
    store: &S,
    collection: &str,
    key_fields: &[String],
    options: DedupOptions,
) -> Result<DedupReport, StoreError> {
    println!("Checking for duplicates in '{}'...", collection);

    let mut scan = DuplicateScan::new(key_fields);
    let mut docs = store.stream(collection).await?;
    while let Some(doc) = docs.try_next().await? {
        scan.observe(doc);
    }

    let scanned = scan.scanned();
    let duplicates = scan.into_duplicates();
    let mut report = DedupReport {
        collection: collection.to_string(),
        key_fields: key_fields.to_vec(),
        scanned,
        duplicates: Vec::new(),
        deleted: 0,
        batches: 0,
        dry_run: options.dry_run,
    };

    if duplicates.is_empty() {
        println!("  No duplicates found in '{}'.", collection);
        return Ok(report);
    }

    if options.dry_run {
        println!(
            "  Found {} duplicates in '{}' (dry run, nothing deleted).",
            duplicates.len(),
            collection
        );
        report.duplicates = duplicates;
        return Ok(report);
    }

    println!(
        "  Found {} duplicates in '{}'. Deleting...",
        duplicates.len(),
        collection
    );

    let limit = options.batch_size.clamp(1, MAX_BATCH_OPERATIONS);
    let mut batch = store.batch();
    for id in &duplicates {
        batch.delete(store.document(collection, id.clone()));

        if batch.len() >= limit {
            let full = std::mem::replace(&mut batch, store.batch());
            let deleted = commit(full, collection, &report).await?;
            report.deleted += deleted;
            report.batches += 1;
        }
    }

    if !batch.is_empty() {
        let deleted = commit(batch, collection, &report).await?;
        report.deleted += deleted;
        report.batches += 1;
    }

    println!("  Deleted {} duplicates from '{}'.", report.deleted, collection);
    report.duplicates = duplicates;
    Ok(report)
}

async fn commit<B: WriteBatch>(
    batch: B,
    collection: &str,
    progress: &DedupReport,
) -> Result<u64, StoreError> {
    let size = batch.len();
    match batch.commit().await {
        Ok(deleted) => {
            debug!(collection, size, deleted, "batch committed");
            Ok(deleted)
        }
        Err(e) => {
            warn!(
                collection,
                size,
                committed_batches = progress.batches,
                already_deleted = progress.deleted,
                "batch commit failed: {}",
                e
            );
            Err(e)
        }
    }
}

/// Runs every pass of `plan` in order. A failing pass is recorded and the
/// run moves on to the next collection.
pub async fn run_plan<S: DocumentStore>(
    store: &S,
    plan: &DedupPlan,
    options: DedupOptions,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for pass in plan.passes() {
        let outcome = match deduplicate(store, &pass.collection, &pass.key_fields, options).await {
            Ok(report) => PassOutcome::Completed(report),
            Err(e) => {
                println!("  Error processing '{}': {}", pass.collection, e);
                warn!(collection = %pass.collection, "dedup pass failed: {}", e);
                PassOutcome::Failed {
                    collection: pass.collection.clone(),
                    error: e.to_string(),
                }
            }
        };
        summary.passes.push(outcome);
    }

    summary
}

/// Connects through `connector` and runs `plan`. A connection failure is
/// returned before any pass starts.
pub async fn cleanup(
    connector: &Connector,
    plan: &DedupPlan,
    options: DedupOptions,
) -> Result<RunSummary, ConnectError> {
    let store = connector.connect().await?;
    Ok(run_plan(store, plan, options).await)
}
