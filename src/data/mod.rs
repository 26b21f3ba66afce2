// mod.rs - Record loading and grouping module

pub mod country;
pub mod groups;
pub mod metadata;
pub mod record;
pub mod trim;

// Re-export main types for convenience
pub use country::{CountryNormalizer, CountryTable, UNKNOWN};
pub use groups::{Group, GroupIndex, GroupingMode};
pub use metadata::{HeaderMetadataExtractor, HeaderPattern, SequenceMetadata};
pub use record::{read_fasta, LoadOutcome, RawRecord, RecordLoader, SequenceRecord};
pub use trim::{SequenceTrimmer, TrimWindow};
