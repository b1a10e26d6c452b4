//! Static Huffman compression of byte streams.
//!
//! Encoding counts byte frequencies, builds a Huffman code and writes two files:
//! a text code table (`<bits>\t<symbol>` per line) and the input rewritten as a
//! bit-packed stream. Decoding reads both back.
//!
//! ```no_run
//! huffpack::encode("input.txt", "input.code", "input.huf")?;
//! huffpack::decode("input.huf", "input.code", "restored.txt")?;
//! # Ok::<(), huffpack::HuffError>(())
//! ```

mod config;
mod decoder;
mod encoder;
mod error;
pub mod huffman;
mod rw_stream;

pub use config::CodecOptions;
pub use decoder::{decode, DecodeSummary, Decoder};
pub use encoder::{encode, encode_with, EncodeSummary, Encoder};
pub use error::{HuffError, Result};
pub use rw_stream::{BitSink, BitSource};
