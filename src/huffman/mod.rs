mod frequency;
mod table;
mod tree;

pub use frequency::FrequencyTable;
pub use table::{Code, CodeTable};
pub use tree::HuffNode;
