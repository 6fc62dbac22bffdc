use serde::{Deserialize, Serialize};
use std::fmt;

/// Named plan for how many requests a document's text is split into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStrategy {
    /// One request over the whole text
    Single,
    /// Two chunk requests plus one consolidation request
    Dual,
    /// Four to six independent chunk requests
    Multi,
}

impl fmt::Display for ProcessingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "SINGLE",
            Self::Dual => "DUAL",
            Self::Multi => "MULTI",
        };
        f.write_str(name)
    }
}

/// A strategy offered to the caller with its trade-offs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOption {
    pub strategy: ProcessingStrategy,

    /// Upper bound of requests this option consumes
    pub estimated_requests: u32,

    pub benefits: Vec<String>,
    pub drawbacks: Vec<String>,
    pub recommended: bool,

    /// Offered only because nothing else fits the remaining quota
    pub quota_constrained: bool,

    /// Number of chunk requests (excluding consolidation)
    pub chunk_count: usize,

    /// Whether partial summaries are merged by a final request
    pub consolidate: bool,

    /// Leading characters summarized when the option cannot cover the full text
    pub input_limit: Option<usize>,
}

impl ProcessingOption {
    /// Execution plan the orchestrator runs for this option
    pub fn plan(&self) -> ExecutionPlan {
        ExecutionPlan {
            strategy: self.strategy,
            chunk_count: self.chunk_count.max(1),
            consolidate: self.consolidate,
            input_limit: self.input_limit,
        }
    }
}

/// Concrete execution parameters for one orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub strategy: ProcessingStrategy,
    pub chunk_count: usize,
    pub consolidate: bool,
    pub input_limit: Option<usize>,
}

impl ExecutionPlan {
    pub fn single() -> Self {
        Self { strategy: ProcessingStrategy::Single, chunk_count: 1, consolidate: false, input_limit: None }
    }

    pub fn dual() -> Self {
        Self { strategy: ProcessingStrategy::Dual, chunk_count: 2, consolidate: true, input_limit: None }
    }

    pub fn multi(chunk_count: usize) -> Self {
        Self {
            strategy: ProcessingStrategy::Multi,
            chunk_count: chunk_count.max(1),
            consolidate: false,
            input_limit: None,
        }
    }

    /// Maximum number of backend requests this plan can make
    pub fn max_requests(&self) -> u32 {
        let consolidation = u32::from(self.consolidate && self.chunk_count > 1);
        self.chunk_count as u32 + consolidation
    }
}
