// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// dndsgroup - Grouped dN/dS (Ka/Ks) between country and year groups of coding sequences
pub struct Args {
    /// input FASTA with coding sequences (headers carry country/year metadata)
    #[argh(option)]
    pub input: Option<String>,

    /// output summary table (default: dnds_output.csv)
    #[argh(option, default = "String::from(\"dnds_output.csv\")")]
    pub output: String,

    /// gene label written on every summary row
    #[argh(option)]
    pub gene: Option<String>,

    /// one-based inclusive trim start
    #[argh(option)]
    pub start: Option<usize>,

    /// one-based inclusive trim stop
    #[argh(option)]
    pub stop: Option<usize>,

    /// grouping: country, country-year (default: country)
    #[argh(option, default = "String::from(\"country\")")]
    pub group_by: String,

    /// comparisons: within, between, both (default: both)
    #[argh(option, default = "String::from(\"both\")")]
    pub mode: String,

    /// rate estimator: ng86, kaks (default: ng86)
    #[argh(option, default = "String::from(\"ng86\")")]
    pub estimator: String,

    /// genetic code table number, NCBI numbering (default: 1)
    #[argh(option, default = "1")]
    pub genetic_code: u8,

    /// method passed to KaKs_Calculator (default: YN)
    #[argh(option, default = "String::from(\"YN\")")]
    pub method: String,

    /// path to the KaKs_Calculator binary (default: looked up on PATH)
    #[argh(option, default = "String::from(\"KaKs_Calculator\")")]
    pub kaks_binary: String,

    /// per-pair timeout for the external estimator in seconds (default: 300)
    #[argh(option, default = "300")]
    pub timeout_secs: u64,

    /// retries for transient external estimator failures (default: 1)
    #[argh(option, default = "1")]
    pub retries: u32,

    /// number of worker threads (default: available cores minus one)
    #[argh(option)]
    pub threads: Option<usize>,

    /// task queue capacity (default: 4 x threads)
    #[argh(option)]
    pub queue_size: Option<usize>,

    /// minimum usable length in nt after trimming (default: 90)
    #[argh(option, default = "90")]
    pub min_length: usize,

    /// minimum similarity score (0-100) for fuzzy country matching (default: 80)
    #[argh(option)]
    pub fuzzy_threshold: Option<f64>,

    /// leave out groups whose country could not be resolved
    #[argh(switch)]
    pub exclude_unknown: bool,

    /// write every between-group row twice (A,B and B,A)
    #[argh(switch)]
    pub mirror_rows: bool,

    /// output format: csv, tsv (default: csv)
    #[argh(option, default = "String::from(\"csv\")")]
    pub format: String,

    /// save trimmed sequences to <output stem>_trimmed.fasta
    #[argh(switch)]
    pub save_trimmed_fasta: bool,

    /// write a JSON run report to this path
    #[argh(option)]
    pub report_json: Option<String>,

    /// stop submitting comparisons after this many seconds
    #[argh(option)]
    pub max_runtime_secs: Option<u64>,

    /// disable the progress bar
    #[argh(switch)]
    pub no_progress: bool,

    /// debug-level logging (per-header parses, per-pair failures)
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// validate inputs and print the comparison plan without computing
    #[argh(switch)]
    pub dry_run: bool,

    /// list available rate estimators and exit
    #[argh(switch)]
    pub list_estimators: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
