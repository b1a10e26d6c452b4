use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
};

use tracing::{debug, info, warn};

use crate::{
    error::PathContext,
    huffman::{Code, CodeTable},
    rw_stream::BitSource,
    HuffError, Result,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub symbols: u64,
    pub bits_consumed: u64,
}

/// Bit-accumulating decoder over a loaded code table.
#[derive(Clone, Debug)]
pub struct Decoder {
    table: CodeTable,
    symbol_count: Option<u64>,
}

impl Decoder {
    pub fn new(table: CodeTable, symbol_count: Option<u64>) -> Self {
        Self {
            table,
            symbol_count,
        }
    }

    pub fn from_table_reader<T: BufRead>(table: T) -> Result<Self> {
        let (table, symbol_count) = CodeTable::read_from(table)?;
        debug!(codes = table.len(), ?symbol_count, "loaded code table");
        if symbol_count.is_none() && !table.is_empty() {
            warn!("code table has no symbol count, trailing padding may decode as extra symbols");
        }
        Ok(Self::new(table, symbol_count))
    }

    pub fn table(&self) -> &CodeTable {
        &self.table
    }

    /// Without a symbol count, a short run of zeros may still turn out to be
    /// the padding of the final byte.
    fn may_be_padding(&self, acc: &[u8]) -> bool {
        self.symbol_count.is_none() && acc.len() < 8 && acc.iter().all(|&bit| bit == 0)
    }

    pub fn decode_stream<R: Read, W: Write>(
        &self,
        compressed: R,
        mut output: W,
    ) -> Result<DecodeSummary> {
        let mut source = BitSource::new(compressed);
        let mut acc = Vec::with_capacity(self.table.max_code_len());
        let mut symbols = 0u64;

        while self.symbol_count != Some(symbols) {
            let bit = match source.read_bit()? {
                Some(bit) => bit,
                None => break,
            };
            acc.push(bit as u8);

            if let Some(symbol) = self.table.symbol(&acc) {
                output.write_all(&[symbol])?;
                symbols += 1;
                acc.clear();
            } else if !self.table.is_prefix(&acc) && !self.may_be_padding(&acc) {
                return Err(HuffError::corrupt_stream(
                    source.bits_read(),
                    format!("bit sequence {} matches no code", Code::from(acc)),
                ));
            }
        }

        let decoded_bits = source.bits_read();
        match self.symbol_count {
            Some(expected) => {
                if symbols < expected {
                    return Err(HuffError::corrupt_stream(
                        decoded_bits,
                        format!("stream ended after {symbols} of {expected} symbols"),
                    ));
                }
                check_padding(&mut source, decoded_bits)?;
            }
            None if !acc.is_empty() => {
                if acc.len() >= 8 || acc.contains(&1) {
                    return Err(HuffError::corrupt_stream(
                        decoded_bits,
                        format!("stream ends inside code {}", Code::from(acc)),
                    ));
                }
                debug!(bits = acc.len(), "discarded trailing padding");
            }
            None => {}
        }

        output.flush()?;
        let summary = DecodeSummary {
            symbols,
            bits_consumed: source.bits_read(),
        };
        info!(?summary, "decoded");
        Ok(summary)
    }
}

/// After the last counted symbol only zero bits up to the next byte boundary may remain.
fn check_padding<R: Read>(source: &mut BitSource<R>, decoded_bits: u64) -> Result<()> {
    let boundary = (decoded_bits + 7) / 8 * 8;
    while let Some(bit) = source.read_bit()? {
        if source.bits_read() > boundary {
            return Err(HuffError::corrupt_stream(
                decoded_bits,
                "unexpected data after the last symbol",
            ));
        }
        if bit {
            return Err(HuffError::corrupt_stream(
                source.bits_read(),
                "non-zero padding bit",
            ));
        }
    }
    Ok(())
}

/// Restores the original bytes from a compressed stream file and its code table file.
pub fn decode<P, Q, S>(compressed: P, table: Q, output: S) -> Result<DecodeSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    S: AsRef<Path>,
{
    let (compressed, table, output) = (compressed.as_ref(), table.as_ref(), output.as_ref());
    debug!(
        compressed = %compressed.display(),
        table = %table.display(),
        output = %output.display(),
        "decoding"
    );

    let table_in = BufReader::new(File::open(table).with_path(table)?);
    let decoder = Decoder::from_table_reader(table_in)?;
    let reader = BufReader::new(File::open(compressed).with_path(compressed)?);
    let writer = BufWriter::new(File::create(output).with_path(output)?);

    decoder.decode_stream(reader, writer)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;

    use super::*;
    use crate::{encode, encode_with, CodecOptions, Encoder};

    fn pack(data: &[u8], options: CodecOptions) -> (Vec<u8>, Vec<u8>) {
        let mut table = Vec::new();
        let mut compressed = Vec::new();
        Encoder::new(options)
            .encode_stream(Cursor::new(data), &mut table, &mut compressed)
            .unwrap();
        (table, compressed)
    }

    fn unpack(table: &[u8], compressed: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        Decoder::from_table_reader(table)?.decode_stream(compressed, &mut output)?;
        Ok(output)
    }

    fn roundtrip(data: &[u8]) -> Vec<u8> {
        let (table, compressed) = pack(data, CodecOptions::default());
        unpack(&table, &compressed).unwrap()
    }

    fn stream_error(table: &str, compressed: &[u8]) -> String {
        match unpack(table.as_bytes(), compressed) {
            Err(HuffError::CorruptStream { reason, .. }) => reason,
            other => panic!("expected a corrupt stream, got {other:?}"),
        }
    }

    #[test]
    fn test_abc_roundtrip() {
        assert_eq!(roundtrip(b"AAABBC"), b"AAABBC");
    }

    #[test]
    fn test_empty_roundtrip() {
        let (table, compressed) = pack(b"", CodecOptions::default());
        assert!(table.is_empty() && compressed.is_empty());
        assert_eq!(unpack(&table, &compressed).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_single_symbol_roundtrip() {
        for n in [1, 7, 8, 9, 1000] {
            let data = vec![b'z'; n];
            let (table, compressed) = pack(&data, CodecOptions::default());
            let (loaded, _) = CodeTable::read_from(&table[..]).unwrap();
            assert_eq!(loaded.len(), 1);
            assert_eq!(loaded.code(b'z').unwrap().len(), 1);
            assert_eq!(unpack(&table, &compressed).unwrap(), data);
        }
    }

    #[test]
    fn test_classic_single_symbol_roundtrip() {
        for n in [1, 7, 8, 9, 10, 1000] {
            let data = vec![7u8; n];
            let (table, compressed) = pack(&data, CodecOptions::classic());
            assert_eq!(std::str::from_utf8(&table).unwrap(), "1\t7\n");
            assert_eq!(unpack(&table, &compressed).unwrap(), data);
        }
    }

    #[test]
    fn test_classic_zero_run_then_one_is_corrupt() {
        let reason = stream_error("1\t7\n", &[0b1000_0010]);
        assert!(reason.contains("matches no code"), "{reason}");
    }

    #[test]
    fn test_nul_roundtrip() {
        let data = [0u8, 1, 0, 0, 255, 0, 128];
        assert_eq!(roundtrip(&data), data);
    }

    #[test]
    fn test_all_byte_values() {
        let data = (0..=255u8).cycle().take(4096).collect::<Vec<_>>();
        assert_eq!(roundtrip(&data), data);
    }

    #[test]
    fn test_classic_format_roundtrip() {
        let data = b"abcdefgh abcdefgh xyz";
        let (table, compressed) = pack(data, CodecOptions::classic());
        let table_text = String::from_utf8(table.clone()).unwrap();
        assert!(!table_text.contains("symbols"));
        let (loaded, _) = CodeTable::read_from(&table[..]).unwrap();
        let decoded = unpack(&table, &compressed).unwrap();
        assert!(decoded.starts_with(data));
        // Anything past the input can only come from decoding the zero padding.
        assert!(decoded.len() - data.len() < 8);
        assert!(decoded[data.len()..]
            .iter()
            .all(|&s| loaded.code(s).unwrap().bits().iter().all(|&b| b == 0)));
    }

    #[test]
    fn test_classic_padding_can_spell_extra_symbols() {
        // Known limitation of tables without a symbol count: here the seven
        // zero padding bits each spell A, so the output gains seven bogus As.
        let table = "0\t65\n10\t67\n11\t66\n";
        assert_eq!(
            unpack(table.as_bytes(), &[0b0001_1111, 0b0000_0000]).unwrap(),
            b"AAABBCAAAAAAA"
        );
    }

    #[test]
    fn test_mid_stream_corruption() {
        let table = "00\t1\n01\t2\n10\t3\nsymbols\t4\n";
        let reason = stream_error(table, &[0b0001_1100]);
        assert!(reason.contains("11"), "{reason}");
    }

    #[test]
    fn test_truncated_stream() {
        let (table, compressed) = pack(b"hello, huffman", CodecOptions::default());
        let reason = stream_error(
            std::str::from_utf8(&table).unwrap(),
            &compressed[..compressed.len() - 1],
        );
        assert!(reason.contains("stream ended"), "{reason}");
    }

    #[test]
    fn test_trailing_data() {
        let (table, mut compressed) = pack(b"AAABBC", CodecOptions::default());
        compressed.push(0);
        let reason = stream_error(std::str::from_utf8(&table).unwrap(), &compressed);
        assert!(reason.contains("after the last symbol"), "{reason}");
    }

    #[test]
    fn test_non_zero_padding() {
        let table = "0\t65\n10\t67\n11\t66\nsymbols\t6\n";
        let reason = stream_error(table, &[0b0001_1111, 0b0100_0000]);
        assert!(reason.contains("padding"), "{reason}");
    }

    #[test]
    fn test_classic_stream_ending_inside_code() {
        let reason = stream_error("00\t1\n010\t2\n011\t3\n1\t4\n", &[0b1111_1101]);
        assert!(reason.contains("inside code"), "{reason}");
    }

    #[test]
    fn test_bits_against_empty_table() {
        let reason = stream_error("", &[0]);
        assert!(reason.contains("matches no code"), "{reason}");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        let table = dir.path().join("input.code");
        let compressed = dir.path().join("input.huf");
        let output = dir.path().join("output.bin");

        let data = b"mississippi river\0banks\0".repeat(50);
        std::fs::write(&input, &data).unwrap();

        let encoded = encode(&input, &table, &compressed).unwrap();
        assert_eq!(std::fs::metadata(&compressed).unwrap().len(), encoded.bytes);

        let decoded = decode(&compressed, &table, &output).unwrap();
        assert_eq!(decoded.symbols, data.len() as u64);
        assert_eq!(std::fs::read(&output).unwrap(), data);
    }

    #[test]
    fn test_file_classic_roundtrip_of_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty");
        let table = dir.path().join("empty.code");
        let compressed = dir.path().join("empty.huf");
        let output = dir.path().join("empty.out");
        std::fs::write(&input, b"").unwrap();

        encode_with(&input, &table, &compressed, CodecOptions::classic()).unwrap();
        assert_eq!(std::fs::read(&table).unwrap().len(), 0);
        assert_eq!(std::fs::read(&compressed).unwrap().len(), 0);

        decode(&compressed, &table, &output).unwrap();
        assert!(std::fs::read(&output).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("bad.code");
        let compressed = dir.path().join("bad.huf");
        std::fs::write(&table, "0\t65\nnonsense\n").unwrap();
        std::fs::write(&compressed, [0u8]).unwrap();

        let err = decode(&compressed, &table, dir.path().join("out")).unwrap_err();
        assert!(matches!(err, HuffError::CorruptTable { line: 2, .. }));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            prop_assert_eq!(roundtrip(&data), data);
        }

        #[test]
        fn prop_skewed_roundtrip(data in proptest::collection::vec(0u8..4, 0..512)) {
            prop_assert_eq!(roundtrip(&data), data);
        }

        #[test]
        fn prop_codes_prefix_free(data in proptest::collection::vec(any::<u8>(), 1..1024)) {
            let (table, _) = pack(&data, CodecOptions::default());
            let (table, count) = CodeTable::read_from(&table[..]).unwrap();
            prop_assert_eq!(count, Some(data.len() as u64));
            for (a, code_a) in table.entries() {
                for (b, code_b) in table.entries() {
                    prop_assert!(a == b || !code_a.is_prefix_of(code_b));
                }
            }
        }
    }
}
