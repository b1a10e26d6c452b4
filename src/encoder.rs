use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
};

use tracing::{debug, info};

use crate::{
    error::PathContext,
    huffman::{CodeTable, FrequencyTable},
    rw_stream::BitSink,
    CodecOptions, HuffError, Result,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeSummary {
    pub symbols: u64,
    pub distinct_symbols: usize,
    pub bits: u64,
    pub bytes: u64,
}

/// Two-pass encoder: count, build the table, then re-read and pack.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    options: CodecOptions,
}

impl Encoder {
    pub fn new(options: CodecOptions) -> Self {
        Self { options }
    }

    pub fn encode_stream<R, T, W>(
        &self,
        mut input: R,
        table_out: T,
        compressed: W,
    ) -> Result<EncodeSummary>
    where
        R: Read + Seek,
        T: Write,
        W: Write,
    {
        let frequencies = FrequencyTable::from_reader(&mut input)?;
        let table = CodeTable::from_frequencies(&frequencies);
        let symbols = frequencies.total();
        debug!(
            symbols,
            distinct = table.len(),
            max_code_len = table.max_code_len(),
            "built code table"
        );

        let symbol_count = (self.options.symbol_count && !table.is_empty()).then_some(symbols);
        table.write_to(table_out, symbol_count)?;

        input.seek(SeekFrom::Start(0))?;
        let mut sink = BitSink::new(compressed);
        if !table.is_empty() {
            let tree = table.write_tree()?;
            let mut code_lens = [0usize; 256];
            for (symbol, code) in table.entries() {
                code_lens[*symbol as usize] = code.len();
            }

            let mut written = 0u64;
            for byte in input.by_ref().bytes() {
                let byte = byte?;
                if code_lens[byte as usize] == 0 {
                    return Err(changed_input());
                }
                sink.write_symbol(&tree, byte, code_lens[byte as usize])?;
                written += 1;
            }
            if written != symbols {
                return Err(changed_input());
            }
        }

        let bits = sink.bits_written();
        sink.close()?;

        let summary = EncodeSummary {
            symbols,
            distinct_symbols: table.len(),
            bits,
            bytes: (bits + 7) / 8,
        };
        debug!(expected_bits = table.encoded_bits(&frequencies), "packed stream");
        info!(?summary, "encoded");
        Ok(summary)
    }
}

fn changed_input() -> HuffError {
    io::Error::new(io::ErrorKind::InvalidData, "input changed between passes").into()
}

/// Compresses `input` into a code table file and a bit-packed stream file.
pub fn encode<P, Q, S>(input: P, table: Q, compressed: S) -> Result<EncodeSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    S: AsRef<Path>,
{
    encode_with(input, table, compressed, CodecOptions::default())
}

pub fn encode_with<P, Q, S>(
    input: P,
    table: Q,
    compressed: S,
    options: CodecOptions,
) -> Result<EncodeSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    S: AsRef<Path>,
{
    let (input, table, compressed) = (input.as_ref(), table.as_ref(), compressed.as_ref());
    debug!(
        input = %input.display(),
        table = %table.display(),
        compressed = %compressed.display(),
        "encoding"
    );

    let reader = BufReader::new(File::open(input).with_path(input)?);
    let table_out = BufWriter::new(File::create(table).with_path(table)?);
    let compressed_out = BufWriter::new(File::create(compressed).with_path(compressed)?);

    Encoder::new(options).encode_stream(reader, table_out, compressed_out)
}
