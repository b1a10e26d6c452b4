use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use super::{Code, FrequencyTable};

/// Node of a Huffman tree. Parents own their children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        weight: u64,
        symbol: u8,
    },
    Internal {
        weight: u64,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

/// Queue slot ordered by weight, then by insertion sequence.
struct Queued {
    weight: u64,
    seq: usize,
    node: HuffNode,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.weight, self.seq).cmp(&(other.weight, other.seq))
    }
}

impl HuffNode {
    pub fn weight(&self) -> u64 {
        match self {
            HuffNode::Leaf { weight, .. } | HuffNode::Internal { weight, .. } => *weight,
        }
    }

    /// Greedily merges the two lightest nodes until one remains.
    ///
    /// Ties go to the node queued first. Leaves are queued in ascending symbol
    /// order and every merged node is queued after everything before it, so the
    /// resulting shape is reproducible. The first node taken becomes the left (0)
    /// child. Returns `None` when no symbol has a non-zero count.
    pub fn build(frequencies: &FrequencyTable) -> Option<HuffNode> {
        let mut queue = BinaryHeap::new();
        let mut seq = 0;
        for (symbol, weight) in frequencies.present() {
            queue.push(Reverse(Queued {
                weight,
                seq,
                node: HuffNode::Leaf { weight, symbol },
            }));
            seq += 1;
        }

        while queue.len() > 1 {
            if let (Some(Reverse(left)), Some(Reverse(right))) = (queue.pop(), queue.pop()) {
                let weight = left.weight + right.weight;
                queue.push(Reverse(Queued {
                    weight,
                    seq,
                    node: HuffNode::Internal {
                        weight,
                        left: Box::new(left.node),
                        right: Box::new(right.node),
                    },
                }));
                seq += 1;
            }
        }

        queue.pop().map(|Reverse(root)| root.node)
    }

    /// Binds every leaf to its root-to-leaf path, left = 0 and right = 1, in
    /// left-to-right leaf order. A lone root leaf gets the one-bit code `1`,
    /// which zero padding can never spell.
    pub fn codes(&self) -> Vec<(u8, Code)> {
        let mut codes = Vec::new();
        match self {
            HuffNode::Leaf { symbol, .. } => codes.push((*symbol, Code::from(vec![1]))),
            HuffNode::Internal { .. } => self.collect_codes(&mut Vec::new(), &mut codes),
        }
        codes
    }

    fn collect_codes(&self, path: &mut Vec<u8>, codes: &mut Vec<(u8, Code)>) {
        match self {
            HuffNode::Leaf { symbol, .. } => codes.push((*symbol, Code::from(path.clone()))),
            HuffNode::Internal { left, right, .. } => {
                path.push(0);
                left.collect_codes(path, codes);
                path.pop();

                path.push(1);
                right.collect_codes(path, codes);
                path.pop();
            }
        }
    }
}
