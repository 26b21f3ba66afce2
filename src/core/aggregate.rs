// aggregate.rs - Reduction of pair results into per-group-pair summaries

use std::collections::BTreeMap;

use log::info;
use serde::Serialize;

use crate::core::executor::PairResult;
use crate::core::pairs::GroupPairKey;
use crate::data::GroupIndex;

/// Aggregated rates for one unordered group pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPairSummary {
    pub group_a: String,
    pub group_b: String,
    pub continent_a: String,
    pub continent_b: String,
    pub mean_dn: f64,
    pub mean_ds: f64,
    /// `None` when `mean_ds` is exactly zero
    pub ratio: Option<f64>,
    pub pairs: usize,
    pub failed: usize,
}

impl GroupPairSummary {
    /// Same summary with the two groups swapped.
    pub fn mirrored(&self) -> Self {
        Self {
            group_a: self.group_b.clone(),
            group_b: self.group_a.clone(),
            continent_a: self.continent_b.clone(),
            continent_b: self.continent_a.clone(),
            ..self.clone()
        }
    }

    pub fn is_within(&self) -> bool {
        self.group_a == self.group_b
    }
}

/// Fixed-point scale for rate sums: 2^-50 resolution.
const SUM_SCALE: f64 = (1u64 << 50) as f64;

/// Exact running sum of rates. Each value is rounded once onto a fixed grid,
/// after which addition is associative, so totals do not depend on the order
/// results arrive in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FixedSum(i128);

impl FixedSum {
    fn add(&mut self, value: f64) {
        self.0 += (value * SUM_SCALE).round() as i128;
    }

    fn merge(&mut self, other: FixedSum) {
        self.0 += other.0;
    }

    fn mean(&self, n: usize) -> f64 {
        self.0 as f64 / SUM_SCALE / n as f64
    }
}

#[derive(Debug, Default, Clone)]
struct Accumulator {
    sum_dn: FixedSum,
    sum_ds: FixedSum,
    pairs: usize,
    failed: usize,
}

/// Collects pair outcomes by group pair as running totals. Recording order
/// does not affect the result.
#[derive(Debug, Default, Clone)]
pub struct ResultAggregator {
    entries: BTreeMap<GroupPairKey, Accumulator>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &PairResult) {
        let entry = self.entries.entry(result.task.key()).or_default();
        match &result.outcome {
            Ok(rates) if rates.is_finite() => {
                entry.sum_dn.add(rates.dn);
                entry.sum_ds.add(rates.ds);
                entry.pairs += 1;
            }
            _ => entry.failed += 1,
        }
    }

    pub fn merge(&mut self, other: ResultAggregator) {
        for (key, acc) in other.entries {
            let entry = self.entries.entry(key).or_default();
            entry.sum_dn.merge(acc.sum_dn);
            entry.sum_ds.merge(acc.sum_ds);
            entry.pairs += acc.pairs;
            entry.failed += acc.failed;
        }
    }

    pub fn successes(&self) -> usize {
        self.entries.values().map(|a| a.pairs).sum()
    }

    pub fn failures(&self) -> usize {
        self.entries.values().map(|a| a.failed).sum()
    }

    /// Summaries ordered by group first-appearance order. Group pairs with
    /// no successful comparison are left out.
    pub fn finish(self, index: &GroupIndex) -> Vec<GroupPairSummary> {
        let mut summaries = Vec::with_capacity(self.entries.len());
        let mut omitted = 0usize;

        for (key, acc) in self.entries {
            if acc.pairs == 0 {
                omitted += 1;
                continue;
            }

            let mean_dn = acc.sum_dn.mean(acc.pairs);
            let mean_ds = acc.sum_ds.mean(acc.pairs);
            let ratio = if mean_ds == 0.0 { None } else { Some(mean_dn / mean_ds) };

            let a = index.group_at(key.group_a);
            let b = index.group_at(key.group_b);
            summaries.push(GroupPairSummary {
                group_a: a.name.clone(),
                group_b: b.name.clone(),
                continent_a: a.continent.clone(),
                continent_b: b.continent.clone(),
                mean_dn,
                mean_ds,
                ratio,
                pairs: acc.pairs,
                failed: acc.failed,
            });
        }

        if omitted > 0 {
            info!("{} group pairs had no successful comparison and were omitted", omitted);
        }
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pairs::PairTask;
    use crate::data::groups::tests::record;
    use crate::data::GroupingMode;
    use crate::error::RateError;
    use crate::estimators::SubstitutionRates;

    fn index() -> GroupIndex {
        GroupIndex::build(
            vec![
                record("a0", "China", None, b"ATG"),
                record("a1", "China", None, b"ATG"),
                record("b0", "Japan", None, b"ATG"),
                record("b1", "Japan", None, b"ATG"),
            ],
            GroupingMode::Country,
        )
    }

    fn ok(first: usize, second: usize, dn: f64, ds: f64) -> PairResult {
        let g = |i: usize| i / 2;
        PairResult {
            task: PairTask::new(first, g(first), second, g(second)),
            outcome: Ok(SubstitutionRates::new(dn, ds)),
            attempts: 1,
        }
    }

    fn failed(first: usize, second: usize) -> PairResult {
        let g = |i: usize| i / 2;
        PairResult {
            task: PairTask::new(first, g(first), second, g(second)),
            outcome: Err(RateError::NoComparableCodons),
            attempts: 1,
        }
    }

    #[test]
    fn test_means_and_counts() {
        let mut agg = ResultAggregator::new();
        agg.record(&ok(0, 2, 0.1, 0.4));
        agg.record(&ok(0, 3, 0.3, 0.2));
        agg.record(&failed(1, 2));
        agg.record(&ok(0, 1, 0.05, 0.1));

        let summaries = agg.finish(&index());
        assert_eq!(summaries.len(), 2);

        let within = &summaries[0];
        assert_eq!((within.group_a.as_str(), within.group_b.as_str()), ("China", "China"));
        assert_eq!(within.pairs, 1);

        let between = &summaries[1];
        assert_eq!((between.group_a.as_str(), between.group_b.as_str()), ("China", "Japan"));
        assert_eq!(between.pairs, 2);
        assert_eq!(between.failed, 1);
        assert!((between.mean_dn - 0.2).abs() < 1e-12);
        assert!((between.mean_ds - 0.3).abs() < 1e-12);
        assert!((between.ratio.unwrap() - 0.2 / 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_zero_ds_ratio_is_undefined() {
        let mut agg = ResultAggregator::new();
        agg.record(&ok(0, 1, 0.01, 0.0));
        let summaries = agg.finish(&index());
        assert_eq!(summaries[0].ratio, None);
        assert!(summaries[0].mean_dn > 0.0);
    }

    #[test]
    fn test_all_failed_pair_is_omitted() {
        let mut agg = ResultAggregator::new();
        agg.record(&failed(2, 3));
        agg.record(&ok(0, 2, 0.1, 0.2));
        let summaries = agg.finish(&index());
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].group_b, "Japan");
        assert_eq!(summaries[0].group_a, "China");
    }

    #[test]
    fn test_order_independent() {
        let results = vec![
            ok(0, 2, 0.1, 0.3),
            ok(0, 3, 0.7, 0.11),
            ok(1, 2, 0.013, 0.9),
            ok(1, 3, 0.2, 0.0001),
            failed(0, 1),
            ok(2, 3, 0.5, 0.5),
        ];

        let mut forward = ResultAggregator::new();
        results.iter().for_each(|r| forward.record(r));

        let mut backward = ResultAggregator::new();
        results.iter().rev().for_each(|r| backward.record(r));

        let mut split_a = ResultAggregator::new();
        let mut split_b = ResultAggregator::new();
        for (i, r) in results.iter().enumerate() {
            if i % 2 == 0 {
                split_b.record(r);
            } else {
                split_a.record(r);
            }
        }
        split_a.merge(split_b);

        let expected = forward.finish(&index());
        assert_eq!(backward.finish(&index()), expected);
        assert_eq!(split_a.finish(&index()), expected);
    }

    #[test]
    fn test_fixed_sum_is_associative() {
        let values = [0.1, 0.2, 0.3, 1e-9, 2.5, 0.7];
        let mut forward = FixedSum::default();
        values.iter().for_each(|&v| forward.add(v));
        let mut backward = FixedSum::default();
        values.iter().rev().for_each(|&v| backward.add(v));
        assert_eq!(forward, backward);
        assert!((forward.mean(values.len()) - values.iter().sum::<f64>() / 6.0).abs() < 1e-12);

        let mut zero = FixedSum::default();
        zero.add(0.0);
        zero.add(0.0);
        assert_eq!(zero.mean(2), 0.0);
    }

    #[test]
    fn test_running_totals_stay_constant_in_size() {
        let mut agg = ResultAggregator::new();
        for _ in 0..10_000 {
            agg.record(&ok(0, 2, 0.1, 0.2));
        }
        agg.record(&failed(1, 3));
        assert_eq!(agg.entries.len(), 1);
        assert_eq!(agg.successes(), 10_000);
        assert_eq!(agg.failures(), 1);

        let summary = agg.finish(&index()).remove(0);
        assert_eq!(summary.pairs, 10_000);
        assert!((summary.mean_dn - 0.1).abs() < 1e-12);
        assert!((summary.ratio.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_mirrored() {
        let mut agg = ResultAggregator::new();
        agg.record(&ok(0, 2, 0.1, 0.2));
        let summary = agg.finish(&index()).remove(0);
        let mirror = summary.mirrored();
        assert_eq!(mirror.group_a, "Japan");
        assert_eq!(mirror.continent_b, summary.continent_a);
        assert_eq!(mirror.mean_dn, summary.mean_dn);
    }
}
