// validation.rs - Input validation utilities

use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::cli::args::Args;
use crate::core::{AnalysisSettings, ComparisonScope, ExecutorConfig};
use crate::data::country::DEFAULT_FUZZY_THRESHOLD;
use crate::data::{GroupingMode, TrimWindow};
use crate::estimators::{EstimatorFactory, EstimatorKind, EstimatorSettings};
use crate::output::OutputFormat;

#[derive(Debug)]
pub struct ValidationResult {
    pub settings: AnalysisSettings,
    /// Name of the estimator that passed its startup check
    pub estimator_name: &'static str,
}

/// Validate all command line arguments
pub fn validate_args(
    args: &Args,
    region_aliases: &BTreeMap<String, String>,
) -> Result<ValidationResult, String> {
    // Input must exist and be readable
    let input = args
        .input
        .as_ref()
        .ok_or_else(|| "--input is required (or set `input` in the config file)".to_string())?;
    let input = PathBuf::from(input);
    File::open(&input).map_err(|e| format!("Cannot read input file '{}': {}", input.display(), e))?;

    // Outputs must be writable before any work starts
    let output = PathBuf::from(&args.output);
    check_writable(&output)?;
    let report_json = args.report_json.as_ref().map(PathBuf::from);
    if let Some(path) = &report_json {
        check_writable(path)?;
    }

    let window = TrimWindow::new(args.start, args.stop).map_err(|e| e.to_string())?;
    let grouping = GroupingMode::from_str(&args.group_by)?;
    let scope = ComparisonScope::from_str(&args.mode)?;
    let format = OutputFormat::from_str(&args.format)?;
    let estimator = EstimatorKind::from_str(&args.estimator)?;

    if args.min_length < 3 {
        return Err("--min-length must be at least 3 (one codon)".to_string());
    }
    if args.timeout_secs == 0 {
        return Err("--timeout-secs must be greater than 0".to_string());
    }
    if args.max_runtime_secs == Some(0) {
        return Err("--max-runtime-secs must be greater than 0".to_string());
    }
    let fuzzy_threshold = args.fuzzy_threshold.unwrap_or(DEFAULT_FUZZY_THRESHOLD);
    if !(0.0..=100.0).contains(&fuzzy_threshold) {
        return Err("Fuzzy threshold must be between 0 and 100".to_string());
    }

    let mut executor = match args.threads {
        Some(0) => return Err("--threads must be at least 1".to_string()),
        Some(threads) => ExecutorConfig::new(threads),
        None => ExecutorConfig::default(),
    };
    match args.queue_size {
        Some(0) => return Err("--queue-size must be at least 1".to_string()),
        Some(size) => executor.queue_capacity = size,
        None => {}
    }
    executor.max_retries = args.retries;
    executor.show_progress = !args.no_progress;

    // Build the estimator once so a missing binary or unsupported genetic
    // code fails here
    let estimator_settings = EstimatorSettings {
        genetic_code: args.genetic_code,
        method: args.method.clone(),
        kaks_binary: PathBuf::from(&args.kaks_binary),
        timeout: Duration::from_secs(args.timeout_secs),
    };
    let estimator_name = EstimatorFactory::create(estimator, &estimator_settings)?.name();

    let settings = AnalysisSettings {
        input,
        output,
        gene: args.gene.clone(),
        window,
        grouping,
        scope,
        estimator,
        estimator_settings,
        executor,
        min_length: args.min_length,
        exclude_unknown: args.exclude_unknown,
        mirror_rows: args.mirror_rows,
        format,
        save_trimmed_fasta: args.save_trimmed_fasta,
        report_json,
        max_runtime: args.max_runtime_secs.map(Duration::from_secs),
        region_aliases: region_aliases.clone(),
        fuzzy_threshold,
        command_line: std::env::args().collect::<Vec<_>>().join(" "),
    };

    Ok(ValidationResult {
        settings,
        estimator_name,
    })
}

/// Create the parent directory if needed and prove a file can be created
/// in it.
fn check_writable(path: &Path) -> Result<(), String> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    create_dir_all(&parent)
        .map_err(|e| format!("Failed to create output directory '{}': {}", parent.display(), e))?;
    tempfile::NamedTempFile::new_in(&parent)
        .map(drop)
        .map_err(|e| format!("Output directory '{}' is not writable: {}", parent.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;
    use std::io::Write;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["dndsgroup"], args).unwrap()
    }

    fn input_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">a|China|2013\nATGATGATG").unwrap();
        file
    }

    #[test]
    fn test_valid_arguments() {
        let input = input_file();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("dnds.tsv");
        let args = parse(&[
            "--input",
            input.path().to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--format",
            "tsv",
            "--group-by",
            "country-year",
            "--mode",
            "within",
            "--start",
            "4",
            "--stop",
            "615",
            "--threads",
            "3",
            "--no-progress",
        ]);

        let mut aliases = BTreeMap::new();
        aliases.insert("PENANG".to_string(), "Malaysia".to_string());
        let result = validate_args(&args, &aliases).unwrap();
        let settings = result.settings;

        assert_eq!(result.estimator_name, "NG86");
        assert_eq!(settings.format, OutputFormat::Tsv);
        assert_eq!(settings.grouping, GroupingMode::CountryYear);
        assert_eq!(settings.scope, ComparisonScope::Within);
        assert_eq!(settings.window, TrimWindow::new(Some(4), Some(615)).unwrap());
        assert_eq!(settings.executor.threads, 3);
        assert_eq!(settings.executor.queue_capacity, 12);
        assert!(!settings.executor.show_progress);
        assert_eq!(settings.region_aliases.len(), 1);
        assert!(output.parent().unwrap().is_dir());
    }

    #[test]
    fn test_missing_input() {
        let args = parse(&["--input", "/nonexistent/seqs.fasta"]);
        assert!(validate_args(&args, &BTreeMap::new()).unwrap_err().contains("Cannot read"));
        assert!(validate_args(&parse(&[]), &BTreeMap::new()).is_err());
    }

    #[test]
    fn test_invalid_coordinates() {
        let input = input_file();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let path = input.path().to_str().unwrap();
        let out = output.to_str().unwrap();

        for bad in [["--start", "0"], ["--stop", "0"]] {
            let args = parse(&["--input", path, "--output", out, bad[0], bad[1]]);
            assert!(validate_args(&args, &BTreeMap::new()).is_err());
        }
        let args = parse(&["--input", path, "--output", out, "--start", "10", "--stop", "5"]);
        assert!(validate_args(&args, &BTreeMap::new()).is_err());
    }

    #[test]
    fn test_invalid_choices() {
        let input = input_file();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let path = input.path().to_str().unwrap();
        let out = output.to_str().unwrap();

        for (flag, value) in [
            ("--group-by", "continent"),
            ("--mode", "all"),
            ("--format", "xlsx"),
            ("--estimator", "ml"),
            ("--genetic-code", "4"),
            ("--threads", "0"),
            ("--queue-size", "0"),
            ("--fuzzy-threshold", "120"),
        ] {
            let args = parse(&["--input", path, "--output", out, flag, value]);
            assert!(validate_args(&args, &BTreeMap::new()).is_err(), "{} {}", flag, value);
        }
    }

    #[test]
    fn test_missing_kaks_binary() {
        let input = input_file();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let args = parse(&[
            "--input",
            input.path().to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--estimator",
            "kaks",
            "--kaks-binary",
            "/nonexistent/KaKs_Calculator",
        ]);
        let err = validate_args(&args, &BTreeMap::new()).unwrap_err();
        assert!(err.contains("not found"));
    }
}
