// nei_gojobori.rs - In-process Nei-Gojobori (1986) estimator

//! Pairwise dN/dS by the Nei-Gojobori counting method with Jukes-Cantor
//! correction.
//!
//! Sites are counted per codon as the fraction of single-base changes that
//! are synonymous, averaged over both sequences. Differences between codons
//! that differ at two or three positions are averaged over every mutational
//! pathway that avoids intermediate stop codons.

use itertools::Itertools;

use super::genetic_code::{GeneticCode, STOP};
use super::traits::{codon_frames, RateEstimator, SubstitutionRates};
use crate::error::RateError;

const BASES: [u8; 4] = [b'T', b'C', b'A', b'G'];

/// Proportion of differences at which Jukes-Cantor correction diverges.
const SATURATION: f64 = 0.75;

#[derive(Debug, Clone, Copy, Default)]
pub struct NeiGojobori {
    code: GeneticCode,
}

/// Site and difference totals behind one estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SiteCounts {
    pub syn_sites: f64,
    pub nonsyn_sites: f64,
    pub syn_diffs: f64,
    pub nonsyn_diffs: f64,
    pub codons_compared: usize,
}

impl NeiGojobori {
    pub fn new(code: GeneticCode) -> Self {
        Self { code }
    }

    /// Accumulate sites and differences over comparable codons. Codons with
    /// non-ACGT bases or a stop in either sequence are skipped.
    pub fn count(&self, seq1: &[u8], seq2: &[u8]) -> Result<SiteCounts, RateError> {
        let (seq1, seq2) = codon_frames(seq1, seq2)?;
        let mut counts = SiteCounts::default();

        for (c1, c2) in seq1.chunks_exact(3).zip(seq2.chunks_exact(3)) {
            let c1 = upper_codon(c1);
            let c2 = upper_codon(c2);
            let (Some(aa1), Some(aa2)) = (self.code.translate(&c1), self.code.translate(&c2)) else {
                continue;
            };
            if aa1 == STOP || aa2 == STOP {
                continue;
            }

            let s1 = self.synonymous_sites(c1);
            let s2 = self.synonymous_sites(c2);
            counts.syn_sites += (s1 + s2) / 2.0;
            counts.nonsyn_sites += 3.0 - (s1 + s2) / 2.0;

            let (syn, non) = self.codon_differences(c1, c2);
            counts.syn_diffs += syn;
            counts.nonsyn_diffs += non;
            counts.codons_compared += 1;
        }

        if counts.codons_compared == 0 {
            return Err(RateError::NoComparableCodons);
        }
        Ok(counts)
    }

    /// Synonymous sites of one sense codon: sum over positions of the share
    /// of the three possible changes that keep the amino acid.
    fn synonymous_sites(&self, codon: [u8; 3]) -> f64 {
        let Some(aa) = self.code.translate(&codon) else {
            return 0.0;
        };
        let mut sites = 0.0;
        for pos in 0..3 {
            let synonymous = BASES
                .iter()
                .filter(|&&b| b != codon[pos])
                .filter(|&&b| {
                    let mut mutant = codon;
                    mutant[pos] = b;
                    self.code.translate(&mutant) == Some(aa)
                })
                .count();
            sites += synonymous as f64 / 3.0;
        }
        sites
    }

    /// (synonymous, nonsynonymous) differences between two sense codons.
    fn codon_differences(&self, c1: [u8; 3], c2: [u8; 3]) -> (f64, f64) {
        let positions: Vec<usize> = (0..3).filter(|&i| c1[i] != c2[i]).collect();
        match positions.len() {
            0 => (0.0, 0.0),
            1 => {
                if self.code.translate(&c1) == self.code.translate(&c2) {
                    (1.0, 0.0)
                } else {
                    (0.0, 1.0)
                }
            }
            n => {
                let mut syn = 0.0;
                let mut non = 0.0;
                let mut pathways = 0usize;
                for order in positions.iter().copied().permutations(n) {
                    if let Some((s, m)) = self.walk_pathway(c1, c2, &order) {
                        syn += s;
                        non += m;
                        pathways += 1;
                    }
                }
                if pathways == 0 {
                    // Every pathway passes through a stop codon
                    (0.0, n as f64)
                } else {
                    (syn / pathways as f64, non / pathways as f64)
                }
            }
        }
    }

    /// Step from `c1` to `c2` in the given order; `None` if a step hits a
    /// stop codon.
    fn walk_pathway(&self, c1: [u8; 3], c2: [u8; 3], order: &[usize]) -> Option<(f64, f64)> {
        let mut current = c1;
        let mut syn = 0.0;
        let mut non = 0.0;
        for &pos in order {
            let before = self.code.translate(&current)?;
            current[pos] = c2[pos];
            let after = self.code.translate(&current)?;
            if after == STOP {
                return None;
            }
            if before == after {
                syn += 1.0;
            } else {
                non += 1.0;
            }
        }
        Some((syn, non))
    }
}

impl RateEstimator for NeiGojobori {
    fn estimate(&self, seq1: &[u8], seq2: &[u8]) -> Result<SubstitutionRates, RateError> {
        let counts = self.count(seq1, seq2)?;
        let p_s = proportion(counts.syn_diffs, counts.syn_sites);
        let p_n = proportion(counts.nonsyn_diffs, counts.nonsyn_sites);
        let ds = jukes_cantor(p_s).ok_or(RateError::Saturated(p_s))?;
        let dn = jukes_cantor(p_n).ok_or(RateError::Saturated(p_n))?;
        Ok(SubstitutionRates::new(dn, ds))
    }

    fn name(&self) -> &'static str {
        "NG86"
    }

    fn description(&self) -> &'static str {
        "In-process Nei-Gojobori (1986) counting method with Jukes-Cantor correction"
    }
}

fn upper_codon(codon: &[u8]) -> [u8; 3] {
    [
        codon[0].to_ascii_uppercase(),
        codon[1].to_ascii_uppercase(),
        codon[2].to_ascii_uppercase(),
    ]
}

fn proportion(diffs: f64, sites: f64) -> f64 {
    if sites > 0.0 {
        diffs / sites
    } else {
        0.0
    }
}

/// d = -3/4 ln(1 - 4p/3); `None` once p reaches saturation.
fn jukes_cantor(p: f64) -> Option<f64> {
    if p <= 0.0 {
        return Some(0.0);
    }
    if p >= SATURATION {
        return None;
    }
    Some(-0.75 * (1.0 - 4.0 * p / 3.0).ln())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ng() -> NeiGojobori {
        NeiGojobori::default()
    }

    #[test]
    fn test_identical_sequences() {
        let seq = b"ATGGCTAAATTTGCT";
        let rates = ng().estimate(seq, seq).unwrap();
        assert_eq!(rates, SubstitutionRates::new(0.0, 0.0));
    }

    #[test]
    fn test_synonymous_change_only() {
        // TTT (Phe) -> TTC (Phe)
        let rates = ng().estimate(b"TTTGCTAAAGGG", b"TTCGCTAAAGGG").unwrap();
        assert!(rates.ds > 0.0);
        assert_eq!(rates.dn, 0.0);
    }

    #[test]
    fn test_nonsynonymous_change_only() {
        // AAA (Lys) -> GAA (Glu)
        let rates = ng().estimate(b"AAAGCTGCTGCTGCT", b"GAAGCTGCTGCTGCT").unwrap();
        assert!(rates.dn > 0.0);
        assert_eq!(rates.ds, 0.0);
    }

    #[test]
    fn test_site_counts() {
        let ng = ng();
        // ATG: every change is nonsynonymous
        assert_eq!(ng.synonymous_sites(*b"ATG"), 0.0);
        // GCT: third position is fourfold degenerate
        assert!((ng.synonymous_sites(*b"GCT") - 1.0).abs() < 1e-12);

        let counts = ng.count(b"ATGGCT", b"ATGGCC").unwrap();
        assert_eq!(counts.codons_compared, 2);
        assert!((counts.syn_sites + counts.nonsyn_sites - 6.0).abs() < 1e-12);
        assert!((counts.syn_diffs - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_multi_position_pathways() {
        // CTT (Leu) -> TTA (Leu): one pathway via TTT (Phe), one via CTA (Leu)
        let (syn, non) = ng().codon_differences(*b"CTT", *b"TTA");
        assert!((syn + non - 2.0).abs() < 1e-12);
        assert!(syn > 0.0);
    }

    #[test]
    fn test_skips_ambiguous_and_stop_codons() {
        let counts = ng().count(b"ATGNNNTAAGCT", b"ATGGCTTAAGCT").unwrap();
        assert_eq!(counts.codons_compared, 2);
        assert_eq!(
            ng().count(b"NNNTAA", b"GCTTAA"),
            Err(RateError::NoComparableCodons)
        );
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            ng().estimate(b"ATGATGATG", b"ATGATG"),
            Err(RateError::LengthMismatch(9, 6))
        );
    }

    #[test]
    fn test_saturation_is_an_error() {
        // Every codon differs at the third position, all synonymous
        let seq1 = b"GCTGCTGCTGCT";
        let seq2 = b"GCCGCCGCCGCC";
        let err = ng().estimate(seq1, seq2).unwrap_err();
        assert!(matches!(err, RateError::Saturated(_)));
    }

    #[test]
    fn test_jukes_cantor() {
        assert_eq!(jukes_cantor(0.0), Some(0.0));
        let d = jukes_cantor(0.01).unwrap();
        assert!(d > 0.01 && d < 0.011);
        assert_eq!(jukes_cantor(0.75), None);
    }

    #[test]
    fn test_three_position_difference() {
        // AAA (Lys) -> GGG (Gly): each of the six pathways has one synonymous step
        assert_eq!(ng().codon_differences(*b"AAA", *b"GGG"), (1.0, 2.0));
    }
}
