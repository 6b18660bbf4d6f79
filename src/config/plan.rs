use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use validator::Validate;

use crate::config::ConfigError;

/// One collection to deduplicate and the fields that form its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DedupPass {
    #[validate(length(min = 1, message = "Collection name cannot be empty"))]
    pub collection: String,
    #[validate(length(min = 1, message = "At least one key field is required"))]
    pub key_fields: Vec<String>,
}

impl DedupPass {
    pub fn new(collection: &str, key_fields: &[&str]) -> Self {
        Self {
            collection: collection.to_string(),
            key_fields: key_fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DedupPlan {
    passes: Vec<DedupPass>,
}

impl Default for DedupPlan {
    fn default() -> Self {
        Self {
            passes: vec![
                DedupPass::new("projects", &["title"]),
                DedupPass::new("achievements", &["title", "category"]),
                DedupPass::new("cv_education", &["degree", "institution"]),
                DedupPass::new("cv_experience", &["job_title", "company"]),
                DedupPass::new("cv_skills", &["category"]),
                // Unconfirmed whether live certification records use `name`; override via DEDUP_PLAN.
                DedupPass::new("cv_certifications", &["name"]),
            ],
        }
    }
}

impl DedupPlan {
    pub fn new(passes: Vec<DedupPass>) -> Result<Self, ConfigError> {
        for pass in &passes {
            pass.validate()
                .map_err(|e| ConfigError::InvalidPlan(format!("{}: {}", pass.collection, e)))?;

            if pass.key_fields.iter().any(|f| f.trim().is_empty()) {
                return Err(ConfigError::InvalidPlan(format!(
                    "{}: key field names cannot be blank",
                    pass.collection
                )));
            }
        }

        Ok(Self { passes })
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let passes: Vec<DedupPass> =
            serde_json::from_str(raw).map_err(|e| ConfigError::InvalidPlan(e.to_string()))?;
        Self::new(passes)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidPlan(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn passes(&self) -> &[DedupPass] {
        &self.passes
    }
}
