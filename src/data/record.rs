// record.rs - Sequence records and FASTA loading

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bio::io::fasta;
use log::{debug, info, warn};

use crate::data::metadata::{HeaderMetadataExtractor, SequenceMetadata};
use crate::data::trim::SequenceTrimmer;
use crate::error::DndsError;

/// Default minimum usable coding length (whole codons) after trimming.
pub const DEFAULT_MIN_LENGTH: usize = 90;

/// A (header, sequence) pair as read from FASTA, before any processing.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub id: String,
    pub header: String,
    pub sequence: Vec<u8>,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, header: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            sequence: sequence.into(),
        }
    }
}

/// A trimmed, annotated record. Immutable once built.
#[derive(Debug, Clone)]
pub struct SequenceRecord {
    pub id: String,
    pub header: String,
    pub sequence: Vec<u8>,
    pub metadata: SequenceMetadata,
}

impl SequenceRecord {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Read every record of a FASTA file. The header is the id plus the
/// description, matching what appears after `>`.
pub fn read_fasta(path: &Path) -> Result<Vec<RawRecord>, DndsError> {
    let file = File::open(path).map_err(|source| DndsError::Input {
        path: path.to_path_buf(),
        source,
    })?;

    let reader = fasta::Reader::new(BufReader::new(file));
    let mut records = Vec::new();
    for record_result in reader.records() {
        let record = record_result.map_err(|e| DndsError::Fasta {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let header = match record.desc() {
            Some(desc) => format!("{} {}", record.id(), desc),
            None => record.id().to_string(),
        };
        records.push(RawRecord::new(record.id(), header, record.seq()));
    }

    info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Records kept after loading plus the reasons others were dropped.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub records: Vec<SequenceRecord>,
    pub out_of_range: usize,
    pub too_short: usize,
    /// Records per normalized country, sorted by name
    pub country_counts: BTreeMap<String, usize>,
}

impl LoadOutcome {
    pub fn skipped(&self) -> usize {
        self.out_of_range + self.too_short
    }
}

/// Runs header extraction and trimming over raw records.
pub struct RecordLoader<'a> {
    extractor: HeaderMetadataExtractor<'a>,
    trimmer: SequenceTrimmer,
    min_length: usize,
}

impl<'a> RecordLoader<'a> {
    pub fn new(extractor: HeaderMetadataExtractor<'a>, trimmer: SequenceTrimmer) -> Self {
        Self {
            extractor,
            trimmer,
            min_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Annotate and trim every record. Trim errors and short sequences are
    /// reported per record and never abort the load.
    pub fn load(&self, raw: Vec<RawRecord>) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();

        for RawRecord { id, header, sequence } in raw {
            let sequence = match self.trimmer.trim(&sequence) {
                Ok(seq) => seq,
                Err(e) => {
                    warn!("Skipping {}: {}", id, e);
                    outcome.out_of_range += 1;
                    continue;
                }
            };

            let usable = sequence.len() - sequence.len() % 3;
            if usable < self.min_length {
                debug!(
                    "Skipping {}: {} usable nt after trimming (minimum {})",
                    id, usable, self.min_length
                );
                outcome.too_short += 1;
                continue;
            }

            let metadata = self.extractor.extract(&header);
            *outcome
                .country_counts
                .entry(metadata.country.clone())
                .or_default() += 1;
            outcome.records.push(SequenceRecord {
                id,
                header,
                sequence,
                metadata,
            });
        }

        info!("Countries detected:");
        for (country, count) in &outcome.country_counts {
            info!("  {}: {}", country, count);
        }
        if outcome.skipped() > 0 {
            info!(
                "Skipped {} records ({} outside trim window, {} too short)",
                outcome.skipped(),
                outcome.out_of_range,
                outcome.too_short
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::country::CountryTable;
    use crate::data::trim::TrimWindow;
    use std::io::Write;

    fn codons(n: usize) -> Vec<u8> {
        b"ATG".repeat(n)
    }

    #[test]
    fn test_loader_filters_and_tallies() {
        let table = CountryTable::new();
        let trimmer = SequenceTrimmer::new(TrimWindow::new(Some(1), Some(120)).unwrap());
        let loader = RecordLoader::new(HeaderMetadataExtractor::new(&table), trimmer);

        let raw = vec![
            RawRecord::new("a", "a|China|2013", codons(50)),
            RawRecord::new("b", "b|China|2016", codons(45)),
            RawRecord::new("c", "c|2015", codons(10)),
            RawRecord::new("d", "d|Japan|2001", codons(60)),
        ];
        let outcome = loader.load(raw);

        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.out_of_range, 1);
        assert_eq!(outcome.too_short, 0);
        assert_eq!(outcome.country_counts.get("China"), Some(&2));
        assert_eq!(outcome.country_counts.get("Japan"), Some(&1));
        assert!(outcome.records.iter().all(|r| r.len() == 120));
    }

    #[test]
    fn test_loader_min_length() {
        let table = CountryTable::new();
        let loader = RecordLoader::new(HeaderMetadataExtractor::new(&table), SequenceTrimmer::default())
            .with_min_length(30);

        let mut short = codons(9);
        short.extend_from_slice(b"NNNN");
        let outcome = loader.load(vec![
            RawRecord::new("short", "short|Peru|2010", short),
            RawRecord::new("long", "long|Peru|2010", codons(10)),
        ]);

        assert_eq!(outcome.too_short, 1);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].id, "long");
    }

    #[test]
    fn test_read_fasta() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">seq1 China|2013").unwrap();
        writeln!(file, "ATGATG").unwrap();
        writeln!(file, "ATG").unwrap();
        writeln!(file, ">seq2").unwrap();
        writeln!(file, "CCC").unwrap();
        file.flush().unwrap();

        let records = read_fasta(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "seq1");
        assert_eq!(records[0].header, "seq1 China|2013");
        assert_eq!(records[0].sequence, b"ATGATGATG".to_vec());
        assert_eq!(records[1].header, "seq2");
    }

    #[test]
    fn test_read_missing_fasta() {
        let err = read_fasta(Path::new("/nonexistent/input.fasta")).unwrap_err();
        assert!(matches!(err, DndsError::Input { .. }));
    }
}
