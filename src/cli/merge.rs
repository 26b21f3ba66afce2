// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: &Config) -> Self {
        // Input/Output
        if self.input.is_none() {
            self.input = config.input.clone();
        }
        if let Some(output) = &config.output {
            if self.output == "dnds_output.csv" {
                self.output = output.clone();
            }
        }
        if let Some(format) = &config.format {
            if self.format == "csv" {
                self.format = format.clone();
            }
        }
        if self.report_json.is_none() {
            self.report_json = config.report_json.clone();
        }

        // Region
        if self.gene.is_none() {
            self.gene = config.gene.clone();
        }
        if self.start.is_none() {
            self.start = config.start;
        }
        if self.stop.is_none() {
            self.stop = config.stop;
        }
        if let Some(min_length) = config.min_length {
            if self.min_length == 90 {
                self.min_length = min_length;
            }
        }

        // Grouping (only override defaults, not explicit CLI values)
        if let Some(group_by) = &config.group_by {
            if self.group_by == "country" {
                self.group_by = group_by.clone();
            }
        }
        if let Some(mode) = &config.mode {
            if self.mode == "both" {
                self.mode = mode.clone();
            }
        }
        if self.fuzzy_threshold.is_none() {
            self.fuzzy_threshold = config.fuzzy_threshold;
        }

        // Estimator
        if let Some(estimator) = &config.estimator {
            if self.estimator == "ng86" {
                self.estimator = estimator.clone();
            }
        }
        if let Some(code) = config.genetic_code {
            if self.genetic_code == 1 {
                self.genetic_code = code;
            }
        }
        if let Some(method) = &config.method {
            if self.method == "YN" {
                self.method = method.clone();
            }
        }
        if let Some(binary) = &config.kaks_binary {
            if self.kaks_binary == "KaKs_Calculator" {
                self.kaks_binary = binary.clone();
            }
        }
        if let Some(timeout) = config.timeout_secs {
            if self.timeout_secs == 300 {
                self.timeout_secs = timeout;
            }
        }
        if let Some(retries) = config.retries {
            if self.retries == 1 {
                self.retries = retries;
            }
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }
        if self.queue_size.is_none() {
            self.queue_size = config.queue_size;
        }
        if self.max_runtime_secs.is_none() {
            self.max_runtime_secs = config.max_runtime_secs;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.exclude_unknown && config.exclude_unknown.unwrap_or(false) {
            self.exclude_unknown = true;
        }
        if !self.mirror_rows && config.mirror_rows.unwrap_or(false) {
            self.mirror_rows = true;
        }
        if !self.save_trimmed_fasta && config.save_trimmed_fasta.unwrap_or(false) {
            self.save_trimmed_fasta = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<(Self, Config), String> {
        let config = Config::from_file(config_path)?;
        Ok((self.merge_with_config(&config), config))
    }
}
