// main.rs - CLI entry point

use std::time::Instant;

use dndsgroup::cli::{resolve_config, Config};
use dndsgroup::core::{load_groups, planned_comparisons};
use dndsgroup::estimators::EstimatorFactory;
use dndsgroup::prelude::*;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let args: Args = argh::from_env();

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    if args.list_estimators {
        println!("Available estimators:");
        for (name, desc) in EstimatorFactory::list_available() {
            println!("  - {}: {}", name, desc);
        }
        return Ok(());
    }

    init_logging(args.verbose);

    // Load configuration file if specified
    let (args, region_aliases) = resolve_config(args)?;

    let validation = validate_args(&args, &region_aliases)?;
    let settings = validation.settings;

    println!("🚀 dndsgroup v{}", dndsgroup::VERSION);
    println!("📂 Input: {}", settings.input.display());
    println!(
        "🧭 Grouping: {} | Comparisons: {}{}",
        settings.grouping,
        settings.scope,
        if settings.exclude_unknown { " (known countries only)" } else { "" }
    );
    println!("🧬 Estimator: {}", validation.estimator_name);
    println!("🧵 Threads: {}", settings.executor.threads);
    if let Some(gene) = &settings.gene {
        println!("🏷️  Gene: {}", gene);
    }
    if !settings.window.is_full() {
        println!(
            "✂️  Trim window: {}..{}",
            settings.window.start.map_or_else(|| "1".to_string(), |s| s.to_string()),
            settings.window.stop.map_or_else(|| "end".to_string(), |s| s.to_string())
        );
    }

    if args.dry_run {
        let (index, load) = load_groups(&settings).map_err(|e| e.to_string())?;
        println!("✅ Dry run completed successfully");
        println!(
            "📊 {} of {} records usable, {} groups, {} comparisons planned",
            load.records_used,
            load.records_read,
            index.groups().len(),
            planned_comparisons(&settings, &index)
        );
        for group in index.groups() {
            println!("  {} [{}]: {} records", group.name, group.continent, group.len());
        }
        return Ok(());
    }

    let start = Instant::now();
    let outcome = run_analysis(&settings).map_err(|e| e.to_string())?;

    println!(
        "📊 {} records in {} groups, {} comparisons ({} ok, {} failed, {} skipped)",
        outcome.load.records_used,
        outcome.group_count,
        outcome.stats.total_tasks,
        outcome.stats.succeeded,
        outcome.stats.failed,
        outcome.stats.skipped
    );
    if let Some(path) = &outcome.trimmed_fasta {
        println!("🧾 Trimmed sequences written to: {}", path.display());
    }
    println!(
        "✅ {} summary rows written to: {}",
        outcome.rows_written,
        settings.output.display()
    );
    if let Some(path) = &settings.report_json {
        println!("📝 Run report written to: {}", path.display());
    }
    println!("⏱️  Total time: {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}
