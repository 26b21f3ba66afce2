// lib.rs - dndsgroup library root

//! # dndsgroup - Grouped dN/dS (Ka/Ks) summaries for coding-sequence collections
//!
//! Records from a single FASTA file are annotated from their free-form
//! headers (country, year, subgenotype), trimmed to a coding window and
//! partitioned into country or country-year groups. Every within-group and
//! between-group pair is sent through a pluggable rate estimator on a bounded
//! worker pool, and the per-pair rates are reduced to one row per group pair.
//!
//! ## Features
//!
//! - **Header parsing**: pipe-delimited and slash-delimited strain names, country
//!   normalization with ISO codes, aliases and fuzzy matching
//! - **Estimators**: in-process Nei-Gojobori (1986) or external KaKs_Calculator
//! - **Bounded execution**: fixed worker pool, bounded task queue, isolated
//!   per-pair failures, retry of transient tool failures, cancellation
//! - **Deterministic output**: summaries do not depend on completion order
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use dndsgroup::prelude::*;
//!
//! let mut settings = AnalysisSettings::new("vp1.fasta", "dnds_output.csv");
//! settings.grouping = GroupingMode::CountryYear;
//! settings.window = TrimWindow::new(Some(1), Some(891))?;
//!
//! let outcome = run_analysis(&settings)?;
//! for summary in &outcome.summaries {
//!     println!("{} vs {}: {:?}", summary.group_a, summary.group_b, summary.ratio);
//! }
//! # Ok::<(), dndsgroup::DndsError>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod estimators;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, Config, ValidationResult};
    pub use crate::core::{run_analysis, run_analysis_with, AnalysisOutcome, AnalysisSettings};
    pub use crate::core::{CancellationToken, ComparisonExecutor, ComparisonScope, ExecutorConfig};
    pub use crate::core::{GroupPairSummary, PairEnumerator, ResultAggregator};
    pub use crate::data::{CountryNormalizer, CountryTable, GroupIndex, GroupingMode, TrimWindow};
    pub use crate::error::{DndsError, RateError, TrimError};
    pub use crate::estimators::{EstimatorFactory, EstimatorKind, RateEstimator, SubstitutionRates};
    pub use crate::output::OutputFormat;
}

// Re-export main types at the root level for convenience
pub use cli::{Args, ValidationResult};
pub use core::{AnalysisSettings, ComparisonScope, GroupPairSummary};
pub use data::{GroupIndex, GroupingMode, SequenceRecord};
pub use error::{DndsError, RateError, TrimError};
pub use estimators::{RateEstimator, SubstitutionRates};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
