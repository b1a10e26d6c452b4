//! Error types for encode and decode operations.

use std::{io, path::PathBuf};

use bitstream_io::huffman::HuffmanTreeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HuffError>;

#[derive(Debug, Error)]
pub enum HuffError {
    /// Open/read/write failure on one of the files involved.
    #[error("I/O error on {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O failure on a caller-provided stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed line in a persisted code table.
    #[error("corrupt code table at line {line}: {reason}")]
    CorruptTable { line: usize, reason: String },

    /// Bit sequence that can never decode against the loaded table.
    #[error("corrupt compressed stream after {bits} bits: {reason}")]
    CorruptStream { bits: u64, reason: String },

    /// The code set could not be compiled into a write tree.
    #[error("invalid code table: {0}")]
    InvalidCodeTable(#[from] HuffmanTreeError),
}

impl HuffError {
    pub(crate) fn corrupt_table(line: usize, reason: impl Into<String>) -> Self {
        Self::CorruptTable {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt_stream(bits: u64, reason: impl Into<String>) -> Self {
        Self::CorruptStream {
            bits,
            reason: reason.into(),
        }
    }
}

/// Attaches the offending path to an I/O error.
pub(crate) trait PathContext<T> {
    fn with_path<P: Into<PathBuf>>(self, path: P) -> Result<T>;
}

impl<T> PathContext<T> for std::result::Result<T, io::Error> {
    fn with_path<P: Into<PathBuf>>(self, path: P) -> Result<T> {
        self.map_err(|source| HuffError::File {
            path: path.into(),
            source,
        })
    }
}
