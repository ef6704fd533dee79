use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::gpa::{GradePointTable, StandingTable};

pub const CONFIG_ENV: &str = "SRS_CONFIG";

/// Institution-specific grading scale and standing bands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicConfig {
    pub grade_points: GradePointTable,
    pub standings: StandingTable,
}

impl AcademicConfig {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let config: AcademicConfig =
            serde_json::from_str(raw).context("invalid academic configuration")?;
        config
            .grade_points
            .validate()
            .context("invalid grade point table")?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("in {}", path.display()))
    }
}

/// Explicit path first, then `SRS_CONFIG`.
pub fn resolve_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

/// Built-in defaults when no path is configured.
pub fn load_or_default(explicit: Option<PathBuf>) -> anyhow::Result<AcademicConfig> {
    match resolve_path(explicit) {
        Some(path) => {
            info!(path = %path.display(), "loading academic configuration");
            AcademicConfig::load(&path)
        }
        None => Ok(AcademicConfig::default()),
    }
}
