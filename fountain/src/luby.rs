//! The Luby Transform code: each code block is the XOR of `d` uniformly
//! chosen source blocks, with `d` drawn from a caller-supplied degree
//! distribution. See "LT Codes", M. Luby (2002).

use crate::block::{equalize_block_lengths, partition, partition_bytes, Block};
use crate::codec::{Codec, Decoder, LtBlock};
use crate::matrix::SparseMatrix;
use crate::mersenne::{MersenneTwister, Source};
use crate::soliton::{pick_degree, sample_uniform};
use crate::FountainError;

/// Codec for the Luby Transform code.
#[derive(Debug, Clone)]
pub struct LubyCodec {
    source_blocks: usize,

    /// Sampling source for the degree and the block choices. Reseeded with
    /// the code-block ID on every [`Codec::pick_indices`] call.
    random: MersenneTwister,

    /// CDF of the degree distribution encoding blocks are composed from,
    /// typically [`soliton_distribution`](crate::soliton_distribution).
    degree_cdf: Vec<f64>,
}

impl LubyCodec {
    /// Creates an LT codec from a source-block count, a generator, and a
    /// degree CDF over `1..=source_blocks`.
    pub fn new(
        source_blocks: usize,
        random: MersenneTwister,
        degree_cdf: Vec<f64>,
    ) -> Result<Self, FountainError> {
        if source_blocks == 0 {
            return Err(FountainError::InvalidParameter(
                "number of source blocks must be > 0".to_string(),
            ));
        }
        if degree_cdf.len() < 2 {
            return Err(FountainError::InvalidParameter(
                "degree CDF must cover at least degree 1".to_string(),
            ));
        }
        Ok(LubyCodec {
            source_blocks,
            random,
            degree_cdf,
        })
    }
}

impl Codec for LubyCodec {
    fn source_blocks(&self) -> usize {
        self.source_blocks
    }

    /// Reseeds the embedded generator with the block ID, draws a degree from
    /// the CDF, and samples that many distinct source indices.
    fn pick_indices(&mut self, code_block_id: i64) -> Vec<usize> {
        self.random.seed(code_block_id);
        let d = pick_degree(&mut self.random, &self.degree_cdf);
        sample_uniform(&mut self.random, d, self.source_blocks)
    }

    /// No precoding: the partition of the message is the intermediate set.
    fn generate_intermediate_blocks(&self, message: &[u8]) -> Vec<Block> {
        let (long, short) = partition_bytes(message, self.source_blocks);
        equalize_block_lengths(long, short)
    }

    fn new_decoder(&self, message_length: usize) -> Box<dyn Decoder> {
        Box::new(LubyDecoder::new(self.clone(), message_length))
    }
}

/// Decoder state for a Luby Transform message.
pub struct LubyDecoder {
    codec: LubyCodec,
    message_length: usize,
    matrix: SparseMatrix,
}

impl LubyDecoder {
    fn new(codec: LubyCodec, message_length: usize) -> Self {
        let n = codec.source_blocks;
        LubyDecoder {
            codec,
            message_length,
            matrix: SparseMatrix::new(n),
        }
    }
}

impl Decoder for LubyDecoder {
    fn add_blocks(&mut self, blocks: &[LtBlock]) -> bool {
        for block in blocks {
            let indices = self.codec.pick_indices(block.code);
            self.matrix
                .add_equation(indices, Block::from_data(block.data.clone()));
        }
        self.matrix.determined()
    }

    fn decode(&mut self) -> Option<Vec<u8>> {
        if !self.matrix.determined() {
            return None;
        }

        self.matrix.reduce();

        let (len_long, len_short, num_long, num_short) =
            partition(self.message_length, self.codec.source_blocks);
        Some(
            self.matrix
                .reconstruct(self.message_length, len_long, len_short, num_long, num_short),
        )
    }
}
