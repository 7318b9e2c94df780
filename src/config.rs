use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Loader configuration
// ---------------------------------------------------------------------------

/// What to do when a recognised file lacks one of the requested fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Abort the load with `LoadError::MissingField`.
    #[default]
    Fail,
    /// Contribute no chunk for that field and count the gap in the report.
    Skip,
}

/// What to do when a recognised file cannot be read or is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadFilePolicy {
    /// Abort the whole load on the first bad file.
    #[default]
    Abort,
    /// Record the failure and continue with the next file.
    Skip,
}

/// Options for [`crate::data::loader::load_dataset`].
///
/// Every key is optional in JSON:
///
/// ```json
/// { "extension": "parquet", "elastic_arms": true, "on_missing_field": "skip" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// File extension (without the dot) of recognised record files.
    pub extension: String,
    /// Also load the elastic-arms reconstructed vertex (`vtxEA.*`).
    pub elastic_arms: bool,
    pub on_missing_field: MissingFieldPolicy,
    pub on_bad_file: BadFilePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extension: "parquet".to_string(),
            elastic_arms: false,
            on_missing_field: MissingFieldPolicy::default(),
            on_bad_file: BadFilePolicy::default(),
        }
    }
}

impl LoadOptions {
    /// Default options with the elastic-arms fields requested.
    pub fn with_elastic_arms() -> Self {
        Self {
            elastic_arms: true,
            ..Self::default()
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).context("parsing loader config JSON")
    }
}
