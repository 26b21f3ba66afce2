// mod.rs - Pluggable pairwise dN/dS estimators

pub mod factory;
pub mod genetic_code;
pub mod kaks_calculator;
pub mod nei_gojobori;
pub mod traits;

// Re-export main types for convenience
pub use factory::{EstimatorFactory, EstimatorKind, EstimatorSettings};
pub use genetic_code::GeneticCode;
pub use kaks_calculator::KaKsCalculator;
pub use nei_gojobori::NeiGojobori;
pub use traits::{RateEstimator, SubstitutionRates};
