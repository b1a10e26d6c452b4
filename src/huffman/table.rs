use std::{
    borrow::Borrow,
    collections::{HashMap, HashSet},
    fmt,
    io::{BufRead, Write},
};

use bitstream_io::{huffman::compile_write_tree, BigEndian};

use super::{FrequencyTable, HuffNode};
use crate::{rw_stream::HuffmanTreeWrite, HuffError, Result};

const SYMBOL_COUNT_KEY: &str = "symbols";

/// Bit pattern assigned to one symbol, stored one bit (0 or 1) per byte.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Code(Vec<u8>);

impl Code {
    pub fn bits(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_prefix_of(&self, other: &Code) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl From<Vec<u8>> for Code {
    fn from(bits: Vec<u8>) -> Self {
        Self(bits)
    }
}

impl Borrow<[u8]> for Code {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit == 0 { "0" } else { "1" })?;
        }
        Ok(())
    }
}

/// Symbol <-> code mapping. Immutable once built.
#[derive(Clone, Debug, Default)]
pub struct CodeTable {
    entries: Vec<(u8, Code)>,
    by_symbol: HashMap<u8, usize>,
    by_code: HashMap<Code, u8>,
    prefixes: HashSet<Vec<u8>>,
    max_len: usize,
}

impl CodeTable {
    pub fn from_frequencies(frequencies: &FrequencyTable) -> Self {
        match HuffNode::build(frequencies) {
            Some(root) => Self::from_tree(&root),
            None => Self::default(),
        }
    }

    pub fn from_tree(root: &HuffNode) -> Self {
        let mut table = Self::default();
        for (symbol, code) in root.codes() {
            table.insert(symbol, code);
        }
        table
    }

    fn insert(&mut self, symbol: u8, code: Code) {
        for end in 1..code.len() {
            self.prefixes.insert(code.bits()[..end].to_vec());
        }
        self.max_len = self.max_len.max(code.len());
        self.by_symbol.insert(symbol, self.entries.len());
        self.by_code.insert(code.clone(), symbol);
        self.entries.push((symbol, code));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_code_len(&self) -> usize {
        self.max_len
    }

    /// Entries in traversal (and file) order.
    pub fn entries(&self) -> &[(u8, Code)] {
        &self.entries
    }

    pub fn code(&self, symbol: u8) -> Option<&Code> {
        self.by_symbol
            .get(&symbol)
            .map(|&index| &self.entries[index].1)
    }

    pub fn symbol(&self, bits: &[u8]) -> Option<u8> {
        self.by_code.get(bits).copied()
    }

    /// True when `bits` is a proper prefix of at least one code.
    pub fn is_prefix(&self, bits: &[u8]) -> bool {
        (bits.is_empty() && !self.entries.is_empty()) || self.prefixes.contains(bits)
    }

    /// Total encoded length in bits for the given counts.
    pub fn encoded_bits(&self, frequencies: &FrequencyTable) -> u64 {
        self.entries
            .iter()
            .map(|(symbol, code)| frequencies.count(*symbol) * code.len() as u64)
            .sum()
    }

    pub fn write_tree(&self) -> Result<HuffmanTreeWrite> {
        let pairs = self
            .entries
            .iter()
            .map(|(symbol, code)| (*symbol, code.bits().to_vec()))
            .collect::<Vec<_>>();
        Ok(compile_write_tree::<BigEndian, _>(pairs)?)
    }

    /// Writes one `<bits>\t<symbol>` line per entry, then the optional
    /// `symbols\t<count>` trailer.
    pub fn write_to<W: Write>(&self, mut writer: W, symbol_count: Option<u64>) -> Result<()> {
        for (symbol, code) in &self.entries {
            writeln!(writer, "{code}\t{symbol}")?;
        }
        if let Some(count) = symbol_count {
            writeln!(writer, "{SYMBOL_COUNT_KEY}\t{count}")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Parses a persisted table, returning it with the recorded symbol count if any.
    pub fn read_from<R: BufRead>(reader: R) -> Result<(Self, Option<u64>)> {
        let mut table = Self::default();
        let mut symbol_count = None;
        let mut count_line = 0;
        let mut code_lines = Vec::new();

        for (index, line) in reader.split(b'\n').enumerate() {
            let line_no = index + 1;
            let line = line?;
            let line = std::str::from_utf8(&line)
                .map_err(|_| HuffError::corrupt_table(line_no, "line is not valid UTF-8"))?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }

            let (left, right) = line
                .split_once('\t')
                .ok_or_else(|| HuffError::corrupt_table(line_no, "expected a tab separator"))?;

            if left == SYMBOL_COUNT_KEY {
                if symbol_count.is_some() {
                    return Err(HuffError::corrupt_table(line_no, "repeated symbol count"));
                }
                let count = right.parse::<u64>().map_err(|_| {
                    HuffError::corrupt_table(line_no, format!("bad symbol count {right:?}"))
                })?;
                symbol_count = Some(count);
                count_line = line_no;
                continue;
            }
            if symbol_count.is_some() {
                return Err(HuffError::corrupt_table(line_no, "code after symbol count"));
            }

            let code =
                parse_code(left).map_err(|reason| HuffError::corrupt_table(line_no, reason))?;
            let symbol = right.parse::<u8>().map_err(|_| {
                HuffError::corrupt_table(line_no, format!("bad symbol value {right:?}"))
            })?;

            if table.by_symbol.contains_key(&symbol) {
                return Err(HuffError::corrupt_table(
                    line_no,
                    format!("symbol {symbol} listed twice"),
                ));
            }
            if table.by_code.contains_key(&code) {
                return Err(HuffError::corrupt_table(
                    line_no,
                    format!("code {code} listed twice"),
                ));
            }
            code_lines.push(line_no);
            table.insert(symbol, code);
        }

        for ((_, code), &line_no) in table.entries.iter().zip(&code_lines) {
            if table.prefixes.contains(code.bits()) {
                return Err(HuffError::corrupt_table(
                    line_no,
                    format!("code {code} is a prefix of another code"),
                ));
            }
        }

        if table.is_empty() && symbol_count.map_or(false, |count| count > 0) {
            return Err(HuffError::corrupt_table(count_line, "symbol count without any codes"));
        }

        Ok((table, symbol_count))
    }
}

fn parse_code(text: &str) -> std::result::Result<Code, String> {
    if text.is_empty() {
        return Err("empty code".to_string());
    }
    text.chars()
        .map(|c| match c {
            '0' => Ok(0),
            '1' => Ok(1),
            _ => Err(format!("invalid bit {c:?} in code {text:?}")),
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(Code::from)
}
