// groups.rs - Partitioning records into comparison groups

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::country::UNKNOWN;
use crate::data::record::SequenceRecord;

/// How records are keyed into groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupingMode {
    Country,
    CountryYear,
}

impl FromStr for GroupingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "country" | "by-country" => Ok(GroupingMode::Country),
            "country-year" | "by-country-year" => Ok(GroupingMode::CountryYear),
            _ => Err(format!(
                "Invalid grouping mode: {}. Use: country, country-year",
                s
            )),
        }
    }
}

impl fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingMode::Country => write!(f, "country"),
            GroupingMode::CountryYear => write!(f, "country-year"),
        }
    }
}

impl GroupingMode {
    /// Group name for a record: `China` or `China_2013` (`China_Unknown`
    /// without a year).
    pub fn group_name(&self, record: &SequenceRecord) -> String {
        match self {
            GroupingMode::Country => record.metadata.country.clone(),
            GroupingMode::CountryYear => format!(
                "{}_{}",
                record.metadata.country,
                record.metadata.year_label()
            ),
        }
    }
}

/// One partition of the record collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub country: String,
    pub continent: String,
    /// Indices into the owning [`GroupIndex`] record table, in input order
    pub members: Vec<usize>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn has_unknown_country(&self) -> bool {
        self.country == UNKNOWN
    }

    /// Group name with whitespace replaced, for use in FASTA identifiers.
    pub fn label(&self) -> String {
        self.name.split_whitespace().collect::<Vec<_>>().join("_")
    }
}

/// Owns the records and their disjoint grouping. Groups appear in order of
/// first occurrence so naming and ordering are stable for identical input.
#[derive(Debug, Clone)]
pub struct GroupIndex {
    mode: GroupingMode,
    records: Vec<SequenceRecord>,
    groups: Vec<Group>,
    record_group: Vec<usize>,
    by_name: HashMap<String, usize>,
}

impl GroupIndex {
    pub fn build(records: Vec<SequenceRecord>, mode: GroupingMode) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut record_group = Vec::with_capacity(records.len());

        for (idx, record) in records.iter().enumerate() {
            let name = mode.group_name(record);
            let group_idx = *by_name.entry(name.clone()).or_insert_with(|| {
                groups.push(Group {
                    name,
                    country: record.metadata.country.clone(),
                    continent: record.metadata.continent.clone(),
                    members: Vec::new(),
                });
                groups.len() - 1
            });
            groups[group_idx].members.push(idx);
            record_group.push(group_idx);
        }

        Self {
            mode,
            records,
            groups,
            record_group,
            by_name,
        }
    }

    pub fn mode(&self) -> GroupingMode {
        self.mode
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.by_name.get(name).map(|&idx| &self.groups[idx])
    }

    pub fn group_at(&self, idx: usize) -> &Group {
        &self.groups[idx]
    }

    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }

    pub fn record(&self, idx: usize) -> &SequenceRecord {
        &self.records[idx]
    }

    /// Group index of a record.
    pub fn group_of(&self, record_idx: usize) -> usize {
        self.record_group[record_idx]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
