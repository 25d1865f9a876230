//! Byte blocks and message partitioning.
//!
//! A [`Block`] is a contiguous range of data being encoded or decoded, or a
//! block of coded data. How the source text is split into blocks is governed
//! by the particular fountain code in use. Padding bytes are notional: they
//! count toward the block length and XOR as zeros, but are never stored.

/// A source, auxiliary, or code block: a byte payload plus a count of
/// notional zero padding bytes at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    /// Data content of this block.
    pub data: Vec<u8>,

    /// How many padding bytes this block has at the end.
    pub padding: usize,
}

impl Block {
    /// Creates a block of the given logical length consisting entirely of
    /// padding.
    pub fn new(len: usize) -> Self {
        Block {
            data: Vec::new(),
            padding: len,
        }
    }

    /// Creates a block owning the given payload, with no padding.
    pub fn from_data(data: Vec<u8>) -> Self {
        Block { data, padding: 0 }
    }

    /// Length of the block in bytes, counting data bytes as well as padding.
    pub fn length(&self) -> usize {
        self.data.len() + self.padding
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// XORs another block into this one. Padding bytes count as zero (the
    /// XOR identity); the destination grows so that its data is large enough
    /// to contain the result, converting padding into materialized bytes as
    /// needed. The logical length never shrinks, and afterwards
    /// `self.data.len() >= other.data.len()`.
    pub fn xor(&mut self, other: &Block) {
        if self.data.len() < other.data.len() {
            let inc = other.data.len() - self.data.len();
            self.data.resize(other.data.len(), 0);
            if self.padding > inc {
                self.padding -= inc;
            } else {
                self.padding = 0;
            }
        }

        for (dst, src) in self.data.iter_mut().zip(other.data.iter()) {
            *dst ^= src;
        }
    }
}

/// The block partitioning function from RFC 5053 S.5.3.1.2.
///
/// Splits a size `total` into `p` semi-equal pieces: `num_long` longer pieces
/// of `len_long` bytes followed by `num_short` shorter pieces of `len_short`
/// bytes. Returns `(len_long, len_short, num_long, num_short)`, satisfying
/// `num_long * len_long + num_short * len_short == total` and
/// `num_long + num_short == p`.
pub fn partition(total: usize, p: usize) -> (usize, usize, usize, usize) {
    let mut len_long = total.div_ceil(p);
    let mut len_short = total / p;
    let num_long = total - len_short * p;
    let num_short = p - num_long;

    if num_long == 0 {
        len_long = 0;
    }
    if num_short == 0 {
        len_short = 0;
    }

    (len_long, len_short, num_long, num_short)
}

/// Partitions an input text into `p` blocks sized by [`partition`]. The last
/// block may carry padding for the shortfall. Returns the longer blocks and
/// the shorter blocks separately; within each slice all lengths are uniform.
pub fn partition_bytes(input: &[u8], p: usize) -> (Vec<Block>, Vec<Block>) {
    fn slice_into_blocks(mut input: &[u8], num: usize, length: usize) -> (Vec<Block>, &[u8]) {
        let mut blocks = Vec::with_capacity(num);
        for _ in 0..num {
            let take = length.min(input.len());
            let (chunk, rest) = input.split_at(take);
            input = rest;
            blocks.push(Block {
                data: chunk.to_vec(),
                padding: length - take,
            });
        }
        (blocks, input)
    }

    let (len_long, len_short, num_long, num_short) = partition(input.len(), p);
    let (long, rest) = slice_into_blocks(input, num_long, len_long);
    let (short, _) = slice_into_blocks(rest, num_short, len_short);
    (long, short)
}

/// Adds padding to all short blocks to make them equal in size to the long
/// blocks, then returns the concatenation (long blocks first). The caller
/// should ensure all long blocks already share one length.
pub fn equalize_block_lengths(long: Vec<Block>, mut short: Vec<Block>) -> Vec<Block> {
    if long.is_empty() {
        return short;
    }
    if short.is_empty() {
        return long;
    }

    let target = long[0].length();
    for b in &mut short {
        b.padding += target - b.length();
    }

    let mut blocks = long;
    blocks.append(&mut short);
    blocks
}
