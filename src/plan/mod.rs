pub mod orchestrator;

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::settings::{GhostSettings, QuoteLength, Settings, TestMode};

pub use orchestrator::{PlanOrchestrator, PlanSummary, PlanView, StepResult};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read plan {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid plan file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("plan has no steps")]
    Empty,

    #[error("duplicate step id {0:?}")]
    DuplicateId(String),
}

/// Settings a plan step overrides. Anything left out keeps the user's current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSettings {
    pub mode: TestMode,
    pub duration_secs: Option<u32>,
    pub word_target: Option<usize>,
    pub difficulty: Option<String>,
    pub punctuation: Option<bool>,
    pub numbers: Option<bool>,
    pub capitalization: Option<bool>,
    pub quote_length: Option<QuoteLength>,
    pub preset_text: Option<String>,
    pub ghost: Option<GhostSettings>,
}

impl StepSettings {
    pub fn apply_to(&self, base: &Settings) -> Settings {
        let mut settings = base.clone();
        settings.mode = self.mode;
        if let Some(v) = self.duration_secs {
            settings.duration_secs = v;
        }
        if let Some(v) = self.word_target {
            settings.word_target = v;
        }
        if let Some(v) = &self.difficulty {
            settings.difficulty = v.clone();
        }
        if let Some(v) = self.punctuation {
            settings.punctuation = v;
        }
        if let Some(v) = self.numbers {
            settings.numbers = v;
        }
        if let Some(v) = self.capitalization {
            settings.capitalization = v;
        }
        if let Some(v) = self.quote_length {
            settings.quote_length = v;
        }
        if self.preset_text.is_some() {
            settings.preset_text = self.preset_text.clone();
        }
        if let Some(v) = self.ghost {
            settings.ghost = v;
        }
        settings
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub settings: StepSettings,
}

impl PlanItem {
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<PlanItem>,
}

impl Plan {
    pub fn from_toml(content: &str) -> Result<Self, PlanError> {
        let plan: Plan = toml::from_str(content)?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<(), PlanError> {
        if self.steps.is_empty() {
            return Err(PlanError::Empty);
        }
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(PlanError::DuplicateId(step.id.clone()));
            }
        }
        Ok(())
    }
}

/// Plan files (`*.toml`) in `dir`, sorted by name. A missing directory has no plans.
pub fn list_plans(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("toml"))
        .collect();
    paths.sort();
    paths
}
