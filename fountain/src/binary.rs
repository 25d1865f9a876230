//! The random binary fountain code: the constituent source blocks of each
//! code block are selected randomly and independently by coin flip.

use crate::block::{equalize_block_lengths, partition, partition_bytes, Block};
use crate::codec::{Codec, Decoder, LtBlock};
use crate::matrix::SparseMatrix;
use crate::mersenne::{MersenneTwister, Source};
use crate::FountainError;

/// Codec for the random binary fountain.
#[derive(Debug, Clone)]
pub struct BinaryCodec {
    num_source_blocks: usize,
}

impl BinaryCodec {
    /// Creates a binary fountain codec over the given number of source
    /// blocks.
    pub fn new(num_source_blocks: usize) -> Result<Self, FountainError> {
        if num_source_blocks == 0 {
            return Err(FountainError::InvalidParameter(
                "number of source blocks must be > 0".to_string(),
            ));
        }
        Ok(BinaryCodec { num_source_blocks })
    }
}

impl Codec for BinaryCodec {
    fn source_blocks(&self) -> usize {
        self.num_source_blocks
    }

    /// Flips one coin per source block, seeded by the code-block ID.
    fn pick_indices(&mut self, code_block_id: i64) -> Vec<usize> {
        let mut random = MersenneTwister::new(code_block_id);
        (0..self.num_source_blocks)
            .filter(|_| random.int_n(2) == 1)
            .collect()
    }

    /// No precoding: the partition of the message is the intermediate set.
    fn generate_intermediate_blocks(&self, message: &[u8]) -> Vec<Block> {
        let (long, short) = partition_bytes(message, self.num_source_blocks);
        equalize_block_lengths(long, short)
    }

    fn new_decoder(&self, message_length: usize) -> Box<dyn Decoder> {
        Box::new(BinaryDecoder::new(self.clone(), message_length))
    }
}

/// Decoder state for a binary-fountain message.
pub struct BinaryDecoder {
    codec: BinaryCodec,
    message_length: usize,
    matrix: SparseMatrix,
}

impl BinaryDecoder {
    fn new(codec: BinaryCodec, message_length: usize) -> Self {
        let n = codec.num_source_blocks;
        BinaryDecoder {
            codec,
            message_length,
            matrix: SparseMatrix::new(n),
        }
    }
}

impl Decoder for BinaryDecoder {
    fn add_blocks(&mut self, blocks: &[LtBlock]) -> bool {
        for block in blocks {
            self.matrix.add_equation(
                self.codec.pick_indices(block.code),
                Block::from_data(block.data.clone()),
            );
        }
        self.matrix.determined()
    }

    fn decode(&mut self) -> Option<Vec<u8>> {
        if !self.matrix.determined() {
            return None;
        }

        self.matrix.reduce();

        let (len_long, len_short, num_long, num_short) =
            partition(self.message_length, self.codec.num_source_blocks);
        Some(
            self.matrix
                .reconstruct(self.message_length, len_long, len_short, num_long, num_short),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_indices_is_deterministic() {
        let mut codec = BinaryCodec::new(8).unwrap();
        assert_eq!(codec.pick_indices(42), [0, 2, 4, 5, 6, 7]);
        assert_eq!(codec.pick_indices(7), [0, 2, 3, 5, 7]);
        assert_eq!(codec.pick_indices(42), [0, 2, 4, 5, 6, 7]);
    }

    #[test]
    fn rejects_zero_blocks() {
        assert!(BinaryCodec::new(0).is_err());
    }
}
