use std::io::Read;

use crate::Result;

pub const ALPHABET_SIZE: usize = 256;

/// Occurrence count for every byte value, gathered in one pass over the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; ALPHABET_SIZE],
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self {
            counts: [0; ALPHABET_SIZE],
        }
    }
}

impl FrequencyTable {
    pub fn from_reader<R: Read>(mut source: R) -> Result<Self> {
        let mut table = Self::default();
        let mut buf = [0u8; 8192];
        loop {
            let read = match source.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            table.extend(&buf[..read]);
        }
        Ok(table)
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.counts[byte as usize] += 1;
        }
    }

    pub fn count(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    /// Sum of all counts, equal to the number of bytes scanned.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Symbols with a non-zero count, in ascending symbol order.
    pub fn present(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(symbol, &count)| (symbol as u8, count))
    }

    pub fn distinct(&self) -> usize {
        self.present().count()
    }
}

impl From<&[u8]> for FrequencyTable {
    fn from(bytes: &[u8]) -> Self {
        let mut table = Self::default();
        table.extend(bytes);
        table
    }
}
