use serde::Serialize;

use crate::modules::dedup::model::DocumentId;

#[derive(Debug, Clone, Copy)]
pub struct DedupOptions {
    pub batch_size: usize,
    pub dry_run: bool,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            batch_size: crate::config::DEFAULT_BATCH_SIZE,
            dry_run: false,
        }
    }
}

/// Result of one collection pass.
#[derive(Debug, Clone, Serialize)]
pub struct DedupReport {
    pub collection: String,
    pub key_fields: Vec<String>,
    pub scanned: u64,
    pub duplicates: Vec<DocumentId>,
    pub deleted: u64,
    pub batches: usize,
    pub dry_run: bool,
}

impl DedupReport {
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    Completed(DedupReport),
    Failed { collection: String, error: String },
}

impl PassOutcome {
    pub fn collection(&self) -> &str {
        match self {
            PassOutcome::Completed(report) => &report.collection,
            PassOutcome::Failed { collection, .. } => collection,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PassOutcome::Failed { .. })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub passes: Vec<PassOutcome>,
}

impl RunSummary {
    pub fn total_deleted(&self) -> u64 {
        self.passes
            .iter()
            .map(|p| match p {
                PassOutcome::Completed(r) => r.deleted,
                PassOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn failed(&self) -> usize {
        self.passes.iter().filter(|p| p.is_failed()).count()
    }
}
