use serde::{Deserialize, Serialize};

/// What the worklist engine does with a call site whose dispatch cannot be resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Abort the run with the resolution error.
    #[default]
    Strict,
    /// Drop the call site, log a warning and continue.
    Lenient,
}

/// Order in which the worklist hands out methods.
///
/// The resulting edge set does not depend on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WorklistOrder {
    #[default]
    Fifo,
    Lifo,
}

/// Settings shared by all call graph algorithms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub resolution: ResolutionPolicy,
    pub worklist_order: WorklistOrder,
}

impl AnalysisConfig {
    pub fn lenient(self) -> Self {
        Self {
            resolution: ResolutionPolicy::Lenient,
            ..self
        }
    }

    pub fn with_worklist_order(self, worklist_order: WorklistOrder) -> Self {
        Self {
            worklist_order,
            ..self
        }
    }
}
