// Factory for creating rate estimators

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::genetic_code::GeneticCode;
use super::kaks_calculator::{KaKsCalculator, DEFAULT_BINARY, DEFAULT_METHOD, DEFAULT_TIMEOUT};
use super::nei_gojobori::NeiGojobori;
use super::traits::RateEstimator;

/// Which estimator backs the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorKind {
    Ng86,
    KaKs,
}

impl FromStr for EstimatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ng86" | "ng" | "nei-gojobori" => Ok(EstimatorKind::Ng86),
            "kaks" | "kaks_calculator" | "kaks-calculator" => Ok(EstimatorKind::KaKs),
            _ => Err(format!("Unknown estimator: {}. Use: ng86, kaks", s)),
        }
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatorKind::Ng86 => write!(f, "ng86"),
            EstimatorKind::KaKs => write!(f, "kaks"),
        }
    }
}

/// Everything an estimator may need; each kind reads only its own fields.
#[derive(Debug, Clone)]
pub struct EstimatorSettings {
    pub genetic_code: u8,
    pub method: String,
    pub kaks_binary: PathBuf,
    pub timeout: Duration,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            genetic_code: 1,
            method: DEFAULT_METHOD.to_string(),
            kaks_binary: PathBuf::from(DEFAULT_BINARY),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct EstimatorFactory;

impl EstimatorFactory {
    /// Build and validate an estimator. Validation failures are reported
    /// before any pair is scheduled.
    pub fn create(kind: EstimatorKind, settings: &EstimatorSettings) -> Result<Box<dyn RateEstimator>, String> {
        let estimator: Box<dyn RateEstimator> = match kind {
            EstimatorKind::Ng86 => {
                let code = GeneticCode::from_id(settings.genetic_code)?;
                Box::new(NeiGojobori::new(code))
            }
            EstimatorKind::KaKs => Box::new(KaKsCalculator::new(
                settings.kaks_binary.clone(),
                &settings.method,
                settings.genetic_code,
                settings.timeout,
            )),
        };
        estimator.validate()?;
        Ok(estimator)
    }

    /// List all available estimators
    pub fn list_available() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ng86", "Nei-Gojobori (1986) with Jukes-Cantor correction, computed in-process"),
            ("kaks", "External KaKs_Calculator (method via --method, default YN)"),
        ]
    }
}
