// pairs.rs - Enumeration of pairwise comparison tasks

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::data::{Group, GroupIndex};

/// Which comparisons a run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonScope {
    /// Every unordered pair inside each group
    Within,
    /// Every cross-group pair for each unordered pair of distinct groups
    Between,
    Both,
}

impl ComparisonScope {
    pub fn includes_within(&self) -> bool {
        matches!(self, ComparisonScope::Within | ComparisonScope::Both)
    }

    pub fn includes_between(&self) -> bool {
        matches!(self, ComparisonScope::Between | ComparisonScope::Both)
    }
}

impl FromStr for ComparisonScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "within" => Ok(ComparisonScope::Within),
            "between" => Ok(ComparisonScope::Between),
            "both" => Ok(ComparisonScope::Both),
            _ => Err(format!("Invalid comparison mode: {}. Use: within, between, both", s)),
        }
    }
}

impl fmt::Display for ComparisonScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonScope::Within => write!(f, "within"),
            ComparisonScope::Between => write!(f, "between"),
            ComparisonScope::Both => write!(f, "both"),
        }
    }
}

/// Unordered group pair, stored as (lower, higher) group index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupPairKey {
    pub group_a: usize,
    pub group_b: usize,
}

impl GroupPairKey {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            group_a: a.min(b),
            group_b: a.max(b),
        }
    }

    pub fn is_within(&self) -> bool {
        self.group_a == self.group_b
    }
}

/// One comparison. `first` belongs to `group_a`, `second` to `group_b`,
/// with `group_a <= group_b`; within a group `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairTask {
    pub first: usize,
    pub second: usize,
    pub group_a: usize,
    pub group_b: usize,
}

impl PairTask {
    pub fn new(first: usize, group_first: usize, second: usize, group_second: usize) -> Self {
        let swap = group_first > group_second || (group_first == group_second && first > second);
        if swap {
            Self {
                first: second,
                second: first,
                group_a: group_second,
                group_b: group_first,
            }
        } else {
            Self {
                first,
                second,
                group_a: group_first,
                group_b: group_second,
            }
        }
    }

    pub fn key(&self) -> GroupPairKey {
        GroupPairKey::new(self.group_a, self.group_b)
    }

    pub fn is_within(&self) -> bool {
        self.group_a == self.group_b
    }
}

/// Produces the exact task set for a scope, lazily and in a fixed order:
/// group pairs by (lower, higher) group index, members in group order.
pub struct PairEnumerator<'a> {
    index: &'a GroupIndex,
    scope: ComparisonScope,
    exclude_unknown: bool,
}

impl<'a> PairEnumerator<'a> {
    pub fn new(index: &'a GroupIndex, scope: ComparisonScope) -> Self {
        Self {
            index,
            scope,
            exclude_unknown: false,
        }
    }

    /// Leave out groups whose country could not be resolved.
    pub fn excluding_unknown(mut self, exclude: bool) -> Self {
        self.exclude_unknown = exclude;
        self
    }

    pub fn index(&self) -> &'a GroupIndex {
        self.index
    }

    pub fn scope(&self) -> ComparisonScope {
        self.scope
    }

    fn eligible(&self) -> Vec<(usize, &'a Group)> {
        self.index
            .groups()
            .iter()
            .enumerate()
            .filter(|(_, g)| !g.is_empty())
            .filter(|(_, g)| !(self.exclude_unknown && g.has_unknown_country()))
            .collect()
    }

    /// Number of tasks [`tasks`](Self::tasks) yields, without enumerating.
    pub fn count(&self) -> u64 {
        let sizes: Vec<u64> = self.eligible().iter().map(|(_, g)| g.len() as u64).collect();
        let mut total = 0u64;
        if self.scope.includes_within() {
            total += sizes.iter().map(|&n| n * n.saturating_sub(1) / 2).sum::<u64>();
        }
        if self.scope.includes_between() {
            for (i, &m) in sizes.iter().enumerate() {
                for &n in &sizes[i + 1..] {
                    total += m * n;
                }
            }
        }
        total
    }

    pub fn tasks(&self) -> impl Iterator<Item = PairTask> + 'a {
        let groups = self.eligible();
        let within = self.scope.includes_within();
        let between = self.scope.includes_between();

        let group_pairs: Vec<((usize, &'a Group), (usize, &'a Group))> = groups
            .iter()
            .enumerate()
            .flat_map(|(i, &a)| groups[i..].iter().map(move |&b| (a, b)))
            .filter(|((ga, _), (gb, _))| if ga == gb { within } else { between })
            .collect();

        group_pairs.into_iter().flat_map(|((ga, a), (gb, b))| {
            let pairs: Box<dyn Iterator<Item = PairTask> + 'a> = if ga == gb {
                Box::new(
                    a.members
                        .iter()
                        .tuple_combinations()
                        .map(move |(&x, &y)| PairTask::new(x, ga, y, gb)),
                )
            } else {
                Box::new(
                    a.members
                        .iter()
                        .cartesian_product(b.members.iter())
                        .map(move |(&x, &y)| PairTask::new(x, ga, y, gb)),
                )
            };
            pairs
        })
    }

    pub fn collect_tasks(&self) -> Vec<PairTask> {
        self.tasks().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::groups::tests::record;
    use crate::data::{GroupingMode, UNKNOWN};
    use std::collections::HashSet;

    fn index_with(sizes: &[(&str, usize)]) -> GroupIndex {
        let mut records = Vec::new();
        for (country, n) in sizes {
            for i in 0..*n {
                records.push(record(&format!("{}{}", country, i), country, Some(2010), b"ATG"));
            }
        }
        GroupIndex::build(records, GroupingMode::Country)
    }

    #[test]
    fn test_within_count() {
        let index = index_with(&[("China", 5), ("Japan", 1)]);
        let e = PairEnumerator::new(&index, ComparisonScope::Within);
        assert_eq!(e.count(), 10);
        assert_eq!(e.collect_tasks().len(), 10);
        assert!(e.tasks().all(|t| t.is_within() && t.first < t.second));
    }

    #[test]
    fn test_between_count() {
        let index = index_with(&[("China", 3), ("Japan", 4), ("Peru", 2)]);
        let e = PairEnumerator::new(&index, ComparisonScope::Between);
        assert_eq!(e.count(), 3 * 4 + 3 * 2 + 4 * 2);
        assert_eq!(e.collect_tasks().len() as u64, e.count());
        assert!(e.tasks().all(|t| !t.is_within()));
    }

    #[test]
    fn test_both_is_union_without_duplicates() {
        let index = index_with(&[("China", 3), ("Japan", 4), ("Peru", 1)]);
        let e = PairEnumerator::new(&index, ComparisonScope::Both);
        let tasks = e.collect_tasks();
        assert_eq!(tasks.len() as u64, e.count());
        assert_eq!(tasks.len(), 3 + 6 + 0 + 12 + 3 + 4);

        let unordered: HashSet<(usize, usize)> = tasks
            .iter()
            .map(|t| (t.first.min(t.second), t.first.max(t.second)))
            .collect();
        assert_eq!(unordered.len(), tasks.len());
        assert!(tasks.iter().all(|t| t.first != t.second));
        // Every unordered record pair appears exactly once
        assert_eq!(tasks.len(), 8 * 7 / 2);
    }

    #[test]
    fn test_task_groups_match_records() {
        let index = index_with(&[("China", 2), ("Japan", 2)]);
        for task in PairEnumerator::new(&index, ComparisonScope::Both).tasks() {
            assert_eq!(index.group_of(task.first), task.group_a);
            assert_eq!(index.group_of(task.second), task.group_b);
            assert!(task.group_a <= task.group_b);
        }
    }

    #[test]
    fn test_scenario_china_unknown() {
        let records = vec![
            record("cn1", "China", Some(2013), b"ATG"),
            record("cn2", "China", Some(2016), b"ATG"),
            record("x1", UNKNOWN, None, b"ATG"),
        ];
        let index = GroupIndex::build(records, GroupingMode::Country);

        let between = PairEnumerator::new(&index, ComparisonScope::Between).collect_tasks();
        assert_eq!(between.len(), 2);
        assert!(between.iter().all(|t| t.key() == GroupPairKey::new(0, 1)));

        let within = PairEnumerator::new(&index, ComparisonScope::Within).collect_tasks();
        assert_eq!(within, vec![PairTask::new(0, 0, 1, 0)]);

        let known = PairEnumerator::new(&index, ComparisonScope::Both).excluding_unknown(true);
        assert_eq!(known.count(), 1);
    }

    #[test]
    fn test_singletons_only_between() {
        let index = index_with(&[("China", 1), ("Japan", 1)]);
        assert_eq!(PairEnumerator::new(&index, ComparisonScope::Within).count(), 0);
        assert_eq!(PairEnumerator::new(&index, ComparisonScope::Between).count(), 1);
    }

    #[test]
    fn test_pair_task_normalization() {
        let t = PairTask::new(7, 2, 3, 1);
        assert_eq!((t.first, t.group_a, t.second, t.group_b), (3, 1, 7, 2));
        let w = PairTask::new(5, 0, 2, 0);
        assert_eq!((w.first, w.second), (2, 5));
        assert_eq!(GroupPairKey::new(4, 1), GroupPairKey::new(1, 4));
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("both".parse::<ComparisonScope>(), Ok(ComparisonScope::Both));
        assert!("all".parse::<ComparisonScope>().is_err());
    }
}
