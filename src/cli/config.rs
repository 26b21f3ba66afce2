// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub input: Option<String>,
    pub output: Option<String>,
    pub format: Option<String>,
    pub report_json: Option<String>,
    pub save_trimmed_fasta: Option<bool>,
    pub mirror_rows: Option<bool>,

    // Region
    pub gene: Option<String>,
    pub start: Option<usize>,
    pub stop: Option<usize>,
    pub min_length: Option<usize>,

    // Grouping
    pub group_by: Option<String>,
    pub mode: Option<String>,
    pub exclude_unknown: Option<bool>,
    pub fuzzy_threshold: Option<f64>,
    /// Extra region/city names mapped to a country, e.g. `PENANG = "Malaysia"`
    pub region_aliases: Option<BTreeMap<String, String>>,

    // Estimator
    pub estimator: Option<String>,
    pub genetic_code: Option<u8>,
    pub method: Option<String>,
    pub kaks_binary: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,

    // Performance
    pub threads: Option<usize>,
    pub queue_size: Option<usize>,
    pub max_runtime_secs: Option<u64>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    pub fn region_aliases(&self) -> BTreeMap<String, String> {
        self.region_aliases.clone().unwrap_or_default()
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# dndsgroup.toml - Configuration file for dndsgroup
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Input FASTA with coding sequences
input = "/path/to/sequences.fasta"

# Output summary table
output = "dnds_output.csv"

# Output format: csv, tsv
format = "csv"

# JSON run report (groups, counts, timings, summaries)
# report_json = "dnds_report.json"

# Save trimmed sequences to <output stem>_trimmed.fasta
save_trimmed_fasta = false

# Write every between-group row twice (A,B and B,A)
mirror_rows = false

# =============================================================================
# REGION
# =============================================================================

# Gene label written on every summary row
gene = "VP1"

# 1-based inclusive trim coordinates (omit for the full sequence)
# start = 1
# stop = 891

# Minimum usable length in nt after trimming
min_length = 90

# =============================================================================
# GROUPING
# =============================================================================

# Grouping: country, country-year
group_by = "country"

# Comparisons: within, between, both
mode = "both"

# Leave out groups whose country could not be resolved
exclude_unknown = false

# Minimum similarity score (0-100) for fuzzy country matching
fuzzy_threshold = 80.0

# =============================================================================
# ESTIMATOR
# =============================================================================

# Rate estimator: ng86 (in-process), kaks (external KaKs_Calculator)
estimator = "ng86"

# NCBI genetic code table (ng86 supports 1, 2, 11)
genetic_code = 1

# KaKs_Calculator method and binary (kaks only)
method = "YN"
kaks_binary = "KaKs_Calculator"

# Per-pair timeout for the external estimator, in seconds
timeout_secs = 300

# Retries for transient external estimator failures
retries = 1

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of worker threads (omit for available cores minus one)
# threads = 8

# Task queue capacity (omit for 4 x threads)
# queue_size = 32

# Stop submitting comparisons after this many seconds
# max_runtime_secs = 3600

# =============================================================================
# REGION ALIASES
# =============================================================================

# Extra region or city names found in headers, mapped to a country
[region_aliases]
PENANG = "Malaysia"
HCMC = "Viet Nam"
"#
        .to_string()
    }
}
