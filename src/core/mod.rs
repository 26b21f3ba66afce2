// mod.rs - Core logic module

pub mod aggregate;
pub mod executor;
pub mod pairs;
pub mod pipeline;

// Re-export main types for convenience
pub use aggregate::{GroupPairSummary, ResultAggregator};
pub use executor::{
    default_threads, CancellationToken, ComparisonExecutor, Deadline, ExecutionStats, ExecutorConfig,
    PairResult,
};
pub use pairs::{ComparisonScope, GroupPairKey, PairEnumerator, PairTask};
pub use pipeline::{
    load_groups, planned_comparisons, run_analysis, run_analysis_with, AnalysisOutcome, AnalysisSettings,
};
