// kaks_calculator.rs - External KaKs_Calculator process per sequence pair

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use super::traits::{codon_frames, RateEstimator, SubstitutionRates};
use crate::error::RateError;

pub const DEFAULT_BINARY: &str = "KaKs_Calculator";
pub const DEFAULT_METHOD: &str = "YN";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Methods accepted by `KaKs_Calculator -m`.
pub const SUPPORTED_METHODS: &[&str] = &[
    "NG", "LWL", "LPB", "MLWL", "MLPB", "GY", "YN", "MYN", "MS", "MA", "GNG", "GLWL", "GLPB",
    "GMLWL", "GMLPB", "GYN", "GMYN",
];

/// Runs one `KaKs_Calculator` child per pair inside a private scratch
/// directory. Nothing is shared between calls, so one instance serves every
/// worker.
#[derive(Debug, Clone)]
pub struct KaKsCalculator {
    binary: PathBuf,
    method: String,
    genetic_code: u8,
    timeout: Duration,
}

impl KaKsCalculator {
    pub fn new(binary: impl Into<PathBuf>, method: &str, genetic_code: u8, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            method: method.to_string(),
            genetic_code,
            timeout,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    fn run(&self, seq1: &[u8], seq2: &[u8]) -> Result<SubstitutionRates, RateError> {
        let scratch = tempfile::Builder::new()
            .prefix("dndsgroup-")
            .tempdir()
            .map_err(|e| RateError::ToolFailed(format!("cannot create scratch dir: {}", e)))?;
        let input = scratch.path().join("pair.axt");
        let output = scratch.path().join("pair.kaks");
        let stderr_path = scratch.path().join("stderr.txt");

        write_axt(&input, seq1, seq2)
            .map_err(|e| RateError::ToolFailed(format!("cannot write AXT input: {}", e)))?;
        let stderr_file = File::create(&stderr_path)
            .map_err(|e| RateError::ToolFailed(format!("cannot capture stderr: {}", e)))?;

        let mut command = Command::new(&self.binary);
        command
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .arg("-c")
            .arg(self.genetic_code.to_string())
            .arg("-m")
            .arg(&self.method)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file));
        debug!("Running {:?}", command);

        let mut child = command
            .spawn()
            .map_err(|e| RateError::ToolFailed(format!("cannot start {}: {}", self.binary.display(), e)))?;

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if started.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(RateError::Timeout(self.timeout));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = child.kill();
                    return Err(RateError::ToolFailed(format!("wait failed: {}", e)));
                }
            }
        };

        if !status.success() {
            let stderr = fs::read_to_string(&stderr_path).unwrap_or_default();
            let detail = stderr.lines().last().unwrap_or("").trim();
            return Err(RateError::ToolFailed(format!("{} ({})", status, detail)));
        }

        let content = fs::read_to_string(&output)
            .map_err(|e| RateError::MalformedOutput(format!("missing output file: {}", e)))?;
        parse_kaks_output(&content)
    }
}

impl Default for KaKsCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY, DEFAULT_METHOD, 1, DEFAULT_TIMEOUT)
    }
}

impl RateEstimator for KaKsCalculator {
    fn estimate(&self, seq1: &[u8], seq2: &[u8]) -> Result<SubstitutionRates, RateError> {
        let (seq1, seq2) = codon_frames(seq1, seq2)?;
        self.run(seq1, seq2)
    }

    fn name(&self) -> &'static str {
        "KaKs_Calculator"
    }

    fn description(&self) -> &'static str {
        "External KaKs_Calculator process, one per pair, with per-call timeout"
    }

    fn validate(&self) -> Result<(), String> {
        if !SUPPORTED_METHODS.contains(&self.method.as_str()) {
            return Err(format!(
                "Unknown KaKs_Calculator method: {}. Use one of: {}",
                self.method,
                SUPPORTED_METHODS.join(", ")
            ));
        }
        if resolve_binary(&self.binary).is_none() {
            return Err(format!(
                "KaKs_Calculator binary not found: {} (install it or pass --kaks-binary)",
                self.binary.display()
            ));
        }
        Ok(())
    }
}

/// AXT block: name line, the two sequences, blank line.
fn write_axt(path: &Path, seq1: &[u8], seq2: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(b"seq1-seq2\n")?;
    file.write_all(seq1)?;
    file.write_all(b"\n")?;
    file.write_all(seq2)?;
    file.write_all(b"\n\n")?;
    file.flush()
}

/// Locate the binary: explicit paths must exist, bare names are searched
/// on `PATH`.
pub fn resolve_binary(binary: &Path) -> Option<PathBuf> {
    if binary.components().count() > 1 {
        return binary.is_file().then(|| binary.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// Read `Ka` and `Ks` from the first data row of a tab-separated
/// KaKs_Calculator result file.
pub fn parse_kaks_output(content: &str) -> Result<SubstitutionRates, RateError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| RateError::MalformedOutput(e.to_string()))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| RateError::MalformedOutput(format!("no '{}' column", name)))
    };
    let ka_col = column("Ka")?;
    let ks_col = column("Ks")?;

    let row = reader
        .records()
        .next()
        .ok_or_else(|| RateError::MalformedOutput("no result row".to_string()))?
        .map_err(|e| RateError::MalformedOutput(e.to_string()))?;

    let value = |col: usize, name: &str| -> Result<f64, RateError> {
        let raw = row.get(col).map(str::trim).unwrap_or("");
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RateError::MalformedOutput(format!("{} = '{}'", name, raw)))
    };

    Ok(SubstitutionRates::new(value(ka_col, "Ka")?, value(ks_col, "Ks")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Sequence\tMethod\tKa\tKs\tKa/Ks\tP-Value(Fisher)\tLength\n\
                          seq1-seq2\tYN\t0.0123\t0.2345\t0.0524\t0.01\t600\n";

    #[test]
    fn test_parse_kaks_output() {
        let rates = parse_kaks_output(SAMPLE).unwrap();
        assert!((rates.dn - 0.0123).abs() < 1e-12);
        assert!((rates.ds - 0.2345).abs() < 1e-12);
    }

    #[test]
    fn test_parse_na_values() {
        let content = "Sequence\tMethod\tKa\tKs\nseq1-seq2\tYN\tNA\t0.1\n";
        assert!(matches!(
            parse_kaks_output(content),
            Err(RateError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_parse_missing_columns_and_rows() {
        assert!(parse_kaks_output("Sequence\tMethod\n").is_err());
        assert!(parse_kaks_output("Sequence\tKa\tKs\n").is_err());
    }

    #[test]
    fn test_write_axt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.axt");
        write_axt(&path, b"ATGAAA", b"ATGAAG").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "seq1-seq2\nATGAAA\nATGAAG\n\n");
    }

    #[test]
    fn test_missing_binary() {
        let calc = KaKsCalculator::new(
            "/nonexistent/bin/KaKs_Calculator",
            DEFAULT_METHOD,
            1,
            Duration::from_secs(1),
        );
        assert!(calc.validate().is_err());

        let err = calc.estimate(b"ATGAAA", b"ATGAAG").unwrap_err();
        assert!(matches!(err, RateError::ToolFailed(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_unknown_method() {
        let calc = KaKsCalculator::new("/bin/sh", "XYZ", 1, DEFAULT_TIMEOUT);
        assert!(calc.validate().unwrap_err().contains("method"));
    }

    #[test]
    fn test_length_checked_before_spawn() {
        let calc = KaKsCalculator::default();
        assert_eq!(
            calc.estimate(b"ATGAAA", b"ATG"),
            Err(RateError::LengthMismatch(6, 3))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow.sh");
        fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let calc = KaKsCalculator::new(&script, DEFAULT_METHOD, 1, Duration::from_millis(100));
        let started = Instant::now();
        let err = calc.estimate(b"ATGAAA", b"ATGAAG").unwrap_err();
        assert_eq!(err, RateError::Timeout(Duration::from_millis(100)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
