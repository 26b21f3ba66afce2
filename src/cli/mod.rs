// mod.rs - Command line surface: flags, TOML config, merging and validation

use std::collections::BTreeMap;

pub mod args;
pub mod config;
pub mod merge;
pub mod validation;

pub use args::Args;
pub use config::Config;
pub use validation::{validate_args, ValidationResult};

/// Apply `--config` if given, returning the merged flags and any region aliases
/// declared in the file.
pub fn resolve_config(args: Args) -> Result<(Args, BTreeMap<String, String>), String> {
    match args.config.clone() {
        Some(path) => {
            let (merged, config) = args.with_config_file(&path)?;
            Ok((merged, config.region_aliases()))
        }
        None => Ok((args, BTreeMap::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    #[test]
    fn test_resolve_without_config() {
        let args = Args::from_args(&["dndsgroup"], &["--input", "a.fasta"]).unwrap();
        let (args, aliases) = resolve_config(args).unwrap();
        assert_eq!(args.input.as_deref(), Some("a.fasta"));
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_resolve_reads_region_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            "input = \"cfg.fasta\"\n\n[region_aliases]\nSarawak = \"Malaysia\"\n",
        )
        .unwrap();

        let path = path.to_string_lossy().to_string();
        let args = Args::from_args(&["dndsgroup"], &["--config", &path]).unwrap();
        let (args, aliases) = resolve_config(args).unwrap();
        assert_eq!(args.input.as_deref(), Some("cfg.fasta"));
        assert_eq!(aliases.get("Sarawak").map(String::as_str), Some("Malaysia"));
    }

    #[test]
    fn test_resolve_missing_config_fails() {
        let args = Args::from_args(&["dndsgroup"], &["--config", "/nonexistent/run.toml"]).unwrap();
        assert!(resolve_config(args).is_err());
    }
}
