// traits.rs - Core traits and types for the rate estimator system

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::RateError;

/// Nonsynonymous / synonymous substitution rates for one sequence pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionRates {
    /// dN (Ka): nonsynonymous substitutions per nonsynonymous site
    pub dn: f64,
    /// dS (Ks): synonymous substitutions per synonymous site
    pub ds: f64,
}

impl SubstitutionRates {
    pub fn new(dn: f64, ds: f64) -> Self {
        Self { dn, ds }
    }

    pub fn is_finite(&self) -> bool {
        self.dn.is_finite() && self.ds.is_finite()
    }
}

/// Pairwise dN/dS estimation strategy.
///
/// Implementations are shared by every worker of the comparison pool and
/// must not keep per-call mutable state.
pub trait RateEstimator: Send + Sync + Debug {
    /// Estimate rates for two coding sequences of (near) equal length.
    fn estimate(&self, seq1: &[u8], seq2: &[u8]) -> Result<SubstitutionRates, RateError>;

    /// Get a human-readable name for this estimator
    fn name(&self) -> &'static str;

    /// Get a description of this estimator
    fn description(&self) -> &'static str;

    /// Check that the estimator can run at all (external binaries present,
    /// supported genetic code). Called once before any pair is evaluated.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Cut both sequences to whole codons and require equal coding lengths.
pub fn codon_frames<'a>(seq1: &'a [u8], seq2: &'a [u8]) -> Result<(&'a [u8], &'a [u8]), RateError> {
    let len1 = seq1.len() - seq1.len() % 3;
    let len2 = seq2.len() - seq2.len() % 3;
    if len1 != len2 {
        return Err(RateError::LengthMismatch(len1, len2));
    }
    if len1 == 0 {
        return Err(RateError::NoComparableCodons);
    }
    Ok((&seq1[..len1], &seq2[..len2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codon_frames_truncate_partial_codons() {
        let (a, b) = codon_frames(b"ATGAAAC", b"ATGAAGTT").unwrap();
        assert_eq!(a, b"ATGAAA");
        assert_eq!(b, b"ATGAAG");
    }

    #[test]
    fn test_codon_frames_length_mismatch() {
        assert_eq!(
            codon_frames(b"ATGAAA", b"ATG"),
            Err(RateError::LengthMismatch(6, 3))
        );
        assert_eq!(codon_frames(b"AT", b"AT"), Err(RateError::NoComparableCodons));
    }
}
