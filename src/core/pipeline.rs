// pipeline.rs - End-to-end analysis: load, group, compare, aggregate, write

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};

use crate::core::aggregate::GroupPairSummary;
use crate::core::executor::{CancellationToken, ComparisonExecutor, ExecutionStats, ExecutorConfig};
use crate::core::pairs::{ComparisonScope, PairEnumerator};
use crate::data::{
    read_fasta, CountryTable, GroupIndex, GroupingMode, HeaderMetadataExtractor, RecordLoader,
    SequenceTrimmer, TrimWindow,
};
use crate::error::DndsError;
use crate::estimators::{EstimatorFactory, EstimatorKind, EstimatorSettings, RateEstimator};
use crate::output::{self, LoadReport, OutputFormat, RegionLabel, RunReport};

/// Fully resolved run settings
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub gene: Option<String>,
    pub window: TrimWindow,
    pub grouping: GroupingMode,
    pub scope: ComparisonScope,
    pub estimator: EstimatorKind,
    pub estimator_settings: EstimatorSettings,
    pub executor: ExecutorConfig,
    pub min_length: usize,
    pub exclude_unknown: bool,
    pub mirror_rows: bool,
    pub format: OutputFormat,
    pub save_trimmed_fasta: bool,
    pub report_json: Option<PathBuf>,
    pub max_runtime: Option<Duration>,
    /// Extra region → country mappings on top of the built-in ones
    pub region_aliases: BTreeMap<String, String>,
    pub fuzzy_threshold: f64,
    pub command_line: String,
}

impl AnalysisSettings {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            gene: None,
            window: TrimWindow::full(),
            grouping: GroupingMode::Country,
            scope: ComparisonScope::Both,
            estimator: EstimatorKind::Ng86,
            estimator_settings: EstimatorSettings::default(),
            executor: ExecutorConfig::default(),
            min_length: crate::data::record::DEFAULT_MIN_LENGTH,
            exclude_unknown: false,
            mirror_rows: false,
            format: OutputFormat::Csv,
            save_trimmed_fasta: false,
            report_json: None,
            max_runtime: None,
            region_aliases: BTreeMap::new(),
            fuzzy_threshold: crate::data::country::DEFAULT_FUZZY_THRESHOLD,
            command_line: String::new(),
        }
    }

    pub fn region_label(&self) -> RegionLabel {
        RegionLabel {
            gene: self.gene.clone(),
            start: self.window.start,
            stop: self.window.stop,
        }
    }

    fn country_table(&self) -> CountryTable {
        let mut table = CountryTable::new().with_fuzzy_threshold(self.fuzzy_threshold);
        for (region, country) in &self.region_aliases {
            table.add_region_alias(region, country);
        }
        table
    }
}

/// What a completed run produced
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub summaries: Vec<GroupPairSummary>,
    pub stats: ExecutionStats,
    pub load: LoadReport,
    pub group_count: usize,
    pub rows_written: usize,
    pub trimmed_fasta: Option<PathBuf>,
}

/// Run the whole analysis with an estimator built from the settings.
pub fn run_analysis(settings: &AnalysisSettings) -> Result<AnalysisOutcome, DndsError> {
    let estimator = EstimatorFactory::create(settings.estimator, &settings.estimator_settings)
        .map_err(DndsError::Config)?;
    run_analysis_with(settings, estimator.as_ref(), &CancellationToken::new())
}

/// Read, annotate, trim and group the input records.
pub fn load_groups(settings: &AnalysisSettings) -> Result<(GroupIndex, LoadReport), DndsError> {
    let raw = read_fasta(&settings.input)?;
    let records_read = raw.len();

    let table = settings.country_table();
    let loader = RecordLoader::new(
        HeaderMetadataExtractor::new(&table),
        SequenceTrimmer::new(settings.window),
    )
    .with_min_length(settings.min_length);
    let outcome = loader.load(raw);

    let load = LoadReport {
        records_read,
        records_used: outcome.records.len(),
        out_of_range: outcome.out_of_range,
        too_short: outcome.too_short,
        country_counts: outcome.country_counts.clone(),
    };
    if outcome.records.is_empty() {
        return Err(DndsError::NoUsableSequences);
    }
    info!("Loaded {} usable records of {}", load.records_used, records_read);

    let index = GroupIndex::build(outcome.records, settings.grouping);
    info!("Built {} groups ({})", index.groups().len(), settings.grouping);
    for group in index.groups() {
        debug!("  {} [{}]: {} records", group.name, group.continent, group.len());
    }
    Ok((index, load))
}

/// Number of comparisons a run over `index` would evaluate.
pub fn planned_comparisons(settings: &AnalysisSettings, index: &GroupIndex) -> u64 {
    PairEnumerator::new(index, settings.scope)
        .excluding_unknown(settings.exclude_unknown)
        .count()
}

/// Run the analysis with a caller-supplied estimator and cancellation token.
pub fn run_analysis_with(
    settings: &AnalysisSettings,
    estimator: &dyn RateEstimator,
    cancel: &CancellationToken,
) -> Result<AnalysisOutcome, DndsError> {
    let (index, load) = load_groups(settings)?;

    let trimmed_fasta = if settings.save_trimmed_fasta {
        let path = output::trimmed_fasta_path(&settings.output);
        let written = output::write_trimmed_fasta(&path, &index)?;
        info!("Wrote {} trimmed sequences to {}", written, path.display());
        Some(path)
    } else {
        None
    };

    // Compare
    let enumerator =
        PairEnumerator::new(&index, settings.scope).excluding_unknown(settings.exclude_unknown);
    // The time limit cancels only this run, never the caller's token
    let run_cancel = cancel.child();
    let deadline = settings.max_runtime.map(|limit| run_cancel.cancel_after(limit));
    let executor = ComparisonExecutor::new(settings.executor.clone());
    let (aggregator, stats) = executor.run(&enumerator, estimator, &run_cancel)?;
    drop(deadline);

    // Aggregate
    let summaries = aggregator.finish(&index);
    if summaries.is_empty() {
        return Err(DndsError::NoResults);
    }

    let rows_written = output::write_summary(
        &settings.output,
        &summaries,
        &settings.region_label(),
        settings.format,
        settings.mirror_rows,
    )?;
    info!("Wrote {} summary rows to {}", rows_written, settings.output.display());

    if let Some(report_path) = &settings.report_json {
        let report = RunReport {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated: Utc::now(),
            command_line: settings.command_line.clone(),
            input: settings.input.clone(),
            output: settings.output.clone(),
            region: settings.region_label(),
            grouping: settings.grouping.to_string(),
            scope: settings.scope.to_string(),
            estimator: estimator.name().to_string(),
            load: load.clone(),
            groups: RunReport::group_reports(&index),
            execution: stats.clone(),
            summaries: summaries.clone(),
        };
        output::write_report_json(report_path, &report)?;
        info!("Wrote run report to {}", report_path.display());
    }

    Ok(AnalysisOutcome {
        group_count: index.groups().len(),
        summaries,
        stats,
        load,
        rows_written,
        trimmed_fasta,
    })
}
