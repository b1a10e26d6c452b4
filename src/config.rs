/// Knobs for the encoder. Decoding needs none: it reads everything from the table file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    /// Append a `symbols\t<count>` trailer to the code table so the decoder can
    /// tell the final symbols apart from zero padding. Without it the table file
    /// is plain two-column `<bits>\t<symbol>` lines.
    pub symbol_count: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self { symbol_count: true }
    }
}

impl CodecOptions {
    pub fn classic() -> Self {
        Self {
            symbol_count: false,
        }
    }
}
