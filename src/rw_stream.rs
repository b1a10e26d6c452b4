use std::io::{self, Read, Write};

use bitstream_io::{
    huffman::WriteHuffmanTree, BigEndian, BitRead, BitReader, BitWrite, BitWriter, HuffmanWrite,
};

pub type HuffmanTreeWrite = WriteHuffmanTree<BigEndian, u8>;

/// Packs bits MSB-first into bytes written to `W`.
pub struct BitSink<W: Write> {
    writer: BitWriter<W, BigEndian>,
    bits: u64,
}

/// Yields the bits of `R` one at a time, MSB-first.
pub struct BitSource<R: Read> {
    reader: BitReader<R, BigEndian>,
    bits: u64,
}

impl<W: Write> BitSink<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: BitWriter::endian(sink, BigEndian),
            bits: 0,
        }
    }

    pub fn bits_written(&self) -> u64 {
        self.bits
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.writer.write_bit(bit)?;
        self.bits += 1;
        Ok(())
    }

    /// Writes `symbol`'s code from a compiled tree. `len` is the code length.
    pub fn write_symbol(
        &mut self,
        tree: &HuffmanTreeWrite,
        symbol: u8,
        len: usize,
    ) -> io::Result<()> {
        self.writer.write_huffman(tree, symbol)?;
        self.bits += len as u64;
        Ok(())
    }

    /// Right-pads the final partial byte with zero bits, flushes and hands back the sink.
    pub fn close(mut self) -> io::Result<W> {
        self.writer.byte_align()?;
        let mut sink = self.writer.into_writer();
        sink.flush()?;
        Ok(sink)
    }
}

impl<R: Read> BitSource<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: BitReader::endian(source, BigEndian),
            bits: 0,
        }
    }

    pub fn bits_read(&self) -> u64 {
        self.bits
    }

    /// Next bit, or `None` once the underlying source is exhausted.
    pub fn read_bit(&mut self) -> io::Result<Option<bool>> {
        match self.reader.read_bit() {
            Ok(bit) => {
                self.bits += 1;
                Ok(Some(bit))
            }
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err),
        }
    }
}
