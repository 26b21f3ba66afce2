// trim.rs - Coordinate trimming and ambiguous-base stripping

use serde::{Deserialize, Serialize};

use crate::error::{DndsError, TrimError};

/// The "unknown base" symbol stripped from both sequence ends.
pub const AMBIGUOUS_BASE: u8 = b'N';

/// Optional 1-based inclusive trim coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start: Option<usize>,
    pub stop: Option<usize>,
}

impl TrimWindow {
    /// Validate coordinates before any record is touched. A zero start or a
    /// start beyond the stop is a configuration error.
    pub fn new(start: Option<usize>, stop: Option<usize>) -> Result<Self, DndsError> {
        if start == Some(0) {
            return Err(DndsError::config("--start is 1-based and must be at least 1"));
        }
        if stop == Some(0) {
            return Err(DndsError::config("--stop is 1-based and must be at least 1"));
        }
        if let (Some(start), Some(stop)) = (start, stop) {
            if start > stop {
                return Err(DndsError::config(format!(
                    "--start ({}) must not exceed --stop ({})",
                    start, stop
                )));
            }
        }
        Ok(Self { start, stop })
    }

    pub fn full() -> Self {
        Self::default()
    }

    pub fn is_full(&self) -> bool {
        self.start.is_none() && self.stop.is_none()
    }

    /// Zero-based half-open range for a sequence of `length` bases.
    fn resolve(&self, length: usize) -> Result<std::ops::Range<usize>, TrimError> {
        let start = self.start.unwrap_or(1);
        let stop = self.stop.unwrap_or(length);
        if start > length || stop > length || start > stop {
            return Err(TrimError::OutOfRangeTrim { start, stop, length });
        }
        Ok(start - 1..stop)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceTrimmer {
    window: TrimWindow,
}

impl SequenceTrimmer {
    pub fn new(window: TrimWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> TrimWindow {
        self.window
    }

    /// Uppercase, cut to the window, then strip leading and trailing `N`
    /// runs. No padding is applied.
    pub fn trim(&self, sequence: &[u8]) -> Result<Vec<u8>, TrimError> {
        let range = if self.window.is_full() {
            0..sequence.len()
        } else {
            self.window.resolve(sequence.len())?
        };

        let window = &sequence[range];
        let first = window
            .iter()
            .position(|b| !b.eq_ignore_ascii_case(&AMBIGUOUS_BASE));
        let trimmed: &[u8] = match first {
            Some(first) => {
                let last = window
                    .iter()
                    .rposition(|b| !b.eq_ignore_ascii_case(&AMBIGUOUS_BASE))
                    .unwrap_or(first);
                &window[first..=last]
            }
            None => &[],
        };

        Ok(trimmed.to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_within_bounds() {
        let seq = vec![b'A'; 615];
        let trimmer = SequenceTrimmer::new(TrimWindow::new(Some(1), Some(612)).unwrap());
        assert_eq!(trimmer.trim(&seq).unwrap().len(), 612);
    }

    #[test]
    fn test_window_out_of_range() {
        let seq = vec![b'A'; 615];
        let trimmer = SequenceTrimmer::new(TrimWindow::new(Some(1), Some(700)).unwrap());
        assert_eq!(
            trimmer.trim(&seq),
            Err(TrimError::OutOfRangeTrim { start: 1, stop: 700, length: 615 })
        );

        let trimmer = SequenceTrimmer::new(TrimWindow::new(Some(620), None).unwrap());
        assert!(trimmer.trim(&seq).is_err());
    }

    #[test]
    fn test_open_ended_windows() {
        let seq = b"ACGTACGTAC";
        let from = SequenceTrimmer::new(TrimWindow::new(Some(3), None).unwrap());
        assert_eq!(from.trim(seq).unwrap(), b"GTACGTAC".to_vec());

        let until = SequenceTrimmer::new(TrimWindow::new(None, Some(4)).unwrap());
        assert_eq!(until.trim(seq).unwrap(), b"ACGT".to_vec());
    }

    #[test]
    fn test_strips_ambiguous_runs_after_windowing() {
        let trimmer = SequenceTrimmer::default();
        assert_eq!(trimmer.trim(b"nnNacgtNNacgNNN").unwrap(), b"ACGTNNACG".to_vec());
        assert_eq!(trimmer.trim(b"NNNN").unwrap(), Vec::<u8>::new());
        assert_eq!(trimmer.trim(b"").unwrap(), Vec::<u8>::new());

        let windowed = SequenceTrimmer::new(TrimWindow::new(Some(2), Some(6)).unwrap());
        assert_eq!(windowed.trim(b"ANNACGT").unwrap(), b"ACG".to_vec());
    }

    #[test]
    fn test_invalid_coordinates_are_config_errors() {
        assert!(TrimWindow::new(Some(0), Some(10)).is_err());
        assert!(TrimWindow::new(Some(10), Some(5)).is_err());
        assert!(TrimWindow::new(None, Some(0)).is_err());
        assert!(TrimWindow::new(Some(5), Some(5)).is_ok());
        assert!(TrimWindow::new(None, None).unwrap().is_full());
    }
}
