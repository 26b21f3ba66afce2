// mod.rs - Summary table, trimmed FASTA and run report writers

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bio::io::fasta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::aggregate::GroupPairSummary;
use crate::core::executor::ExecutionStats;
use crate::data::GroupIndex;
use crate::error::DndsError;

pub const SUMMARY_COLUMNS: [&str; 12] = [
    "Group_A",
    "Group_B",
    "Continent_A",
    "Continent_B",
    "mean_Ka",
    "mean_Ks",
    "Ka/Ks",
    "pairs",
    "failed",
    "gene",
    "start",
    "stop",
];

/// Written for an undefined ratio or an absent coordinate.
pub const MISSING: &str = "NA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
}

impl OutputFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            OutputFormat::Tsv => b'\t',
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            _ => Err(format!("Invalid format: {}. Use: csv, tsv", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Tsv => write!(f, "tsv"),
        }
    }
}

/// Gene label and trim coordinates repeated on every summary row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionLabel {
    pub gene: Option<String>,
    pub start: Option<usize>,
    pub stop: Option<usize>,
}

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(path: &Path) -> Result<(), DndsError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(|source| DndsError::Output {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

fn create_output(path: &Path) -> Result<BufWriter<File>, DndsError> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|source| DndsError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

fn summary_row(summary: &GroupPairSummary, region: &RegionLabel) -> Vec<String> {
    let optional = |v: Option<usize>| v.map_or_else(|| MISSING.to_string(), |n| n.to_string());
    vec![
        summary.group_a.clone(),
        summary.group_b.clone(),
        summary.continent_a.clone(),
        summary.continent_b.clone(),
        summary.mean_dn.to_string(),
        summary.mean_ds.to_string(),
        summary
            .ratio
            .map_or_else(|| MISSING.to_string(), |r| r.to_string()),
        summary.pairs.to_string(),
        summary.failed.to_string(),
        region.gene.clone().unwrap_or_else(|| MISSING.to_string()),
        optional(region.start),
        optional(region.stop),
    ]
}

/// Write the per-group-pair summary table. With `mirror_rows` every
/// between-group row is followed by its swapped (B, A) copy.
pub fn write_summary(
    path: &Path,
    summaries: &[GroupPairSummary],
    region: &RegionLabel,
    format: OutputFormat,
    mirror_rows: bool,
) -> Result<usize, DndsError> {
    let writer = create_output(path)?;
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(writer);

    csv_writer.write_record(SUMMARY_COLUMNS)?;
    let mut rows = 0usize;
    for summary in summaries {
        csv_writer.write_record(summary_row(summary, region))?;
        rows += 1;
        if mirror_rows && !summary.is_within() {
            csv_writer.write_record(summary_row(&summary.mirrored(), region))?;
            rows += 1;
        }
    }
    csv_writer.flush().map_err(|source| DndsError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(rows)
}

/// `<dir>/<output stem>_trimmed.fasta` next to the summary table.
pub fn trimmed_fasta_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dnds_output".to_string());
    output.with_file_name(format!("{}_trimmed.fasta", stem))
}

/// Write every grouped record as `>{id}_{group label}` with its trimmed
/// sequence.
pub fn write_trimmed_fasta(path: &Path, index: &GroupIndex) -> Result<usize, DndsError> {
    let to_output_err = |source: std::io::Error| DndsError::Output {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = fasta::Writer::new(create_output(path)?);
    for (idx, record) in index.records().iter().enumerate() {
        let label = index.group_at(index.group_of(idx)).label();
        let id = format!("{}_{}", record.id, label);
        writer
            .write(&id, None, &record.sequence)
            .map_err(to_output_err)?;
    }
    writer.flush().map_err(to_output_err)?;
    Ok(index.len())
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub country: String,
    pub continent: String,
    pub size: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub records_read: usize,
    pub records_used: usize,
    pub out_of_range: usize,
    pub too_short: usize,
    pub country_counts: BTreeMap<String, usize>,
}

/// Machine-readable account of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub tool: String,
    pub version: String,
    pub generated: DateTime<Utc>,
    pub command_line: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub region: RegionLabel,
    pub grouping: String,
    pub scope: String,
    pub estimator: String,
    pub load: LoadReport,
    pub groups: Vec<GroupReport>,
    pub execution: ExecutionStats,
    pub summaries: Vec<GroupPairSummary>,
}

impl RunReport {
    pub fn group_reports(index: &GroupIndex) -> Vec<GroupReport> {
        index
            .groups()
            .iter()
            .map(|g| GroupReport {
                name: g.name.clone(),
                country: g.country.clone(),
                continent: g.continent.clone(),
                size: g.len(),
            })
            .collect()
    }
}

pub fn write_report_json(path: &Path, report: &RunReport) -> Result<(), DndsError> {
    let mut writer = create_output(path)?;
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)
        .and_then(|_| writer.flush())
        .map_err(|source| DndsError::Output {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}
