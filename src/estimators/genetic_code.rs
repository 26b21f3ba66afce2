// genetic_code.rs - NCBI translation tables used by the in-process estimator

/// Amino acids in NCBI order (first base T,C,A,G; second T,C,A,G; third T,C,A,G).
const STANDARD: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";
const VERTEBRATE_MITOCHONDRIAL: &[u8; 64] =
    b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSS**VVVVAAAADDEEGGGG";

pub const STOP: u8 = b'*';

/// A translation table identified by its NCBI number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneticCode {
    id: u8,
    table: &'static [u8; 64],
}

impl GeneticCode {
    /// Supported tables: 1 (standard), 2 (vertebrate mitochondrial),
    /// 11 (bacterial, archaeal and plant plastid; same amino acids as 1).
    pub fn from_id(id: u8) -> Result<Self, String> {
        let table = match id {
            1 | 11 => STANDARD,
            2 => VERTEBRATE_MITOCHONDRIAL,
            _ => {
                return Err(format!(
                    "Unsupported genetic code {} for the in-process estimator. Use: 1, 2, 11",
                    id
                ))
            }
        };
        Ok(Self { id, table })
    }

    pub fn standard() -> Self {
        Self { id: 1, table: STANDARD }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Amino acid for an uppercase ACGT codon, `None` for anything else.
    pub fn translate(&self, codon: &[u8]) -> Option<u8> {
        if codon.len() != 3 {
            return None;
        }
        let mut index = 0usize;
        for &base in codon {
            index = index * 4 + base_index(base)?;
        }
        Some(self.table[index])
    }

    pub fn is_stop(&self, codon: &[u8]) -> bool {
        self.translate(codon) == Some(STOP)
    }
}

impl Default for GeneticCode {
    fn default() -> Self {
        Self::standard()
    }
}

fn base_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}
