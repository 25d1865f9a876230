//! Online codes, after Maymounkov and Mazieres.
//!
//! The message blocks are first expanded with a small set of auxiliary
//! blocks, each the XOR of `quality` randomly chosen source blocks (the
//! outer encoding). Code blocks then draw from the combined source + aux
//! set using the online soliton distribution. The decoder knows the outer
//! relation and injects it as zero-valued equations before any code block
//! arrives.
//!
//! A message of N blocks can be decoded with high probability from
//! `(1 + 3*epsilon) * N` received blocks; with `(1+epsilon)(N + aux)` blocks
//! the failure rate is about `(epsilon/2)^(quality+1)`. Small messages want
//! a fairly large epsilon (say 0.3) with a large quality to compensate;
//! large messages can run epsilon down to 0.01 with quality around 3.

use crate::block::{equalize_block_lengths, partition, partition_bytes, Block};
use crate::codec::{Codec, Decoder, LtBlock};
use crate::matrix::SparseMatrix;
use crate::mersenne::MersenneTwister;
use crate::soliton::{online_soliton_distribution, pick_degree, sample_uniform};
use crate::FountainError;

/// Codec parameters for an Online code.
#[derive(Debug, Clone)]
pub struct OnlineCodec {
    /// Suboptimality parameter ("efficiency", `e`).
    epsilon: f64,

    /// Decoder quality factor (`q`); governs the failure rate.
    quality: usize,

    /// Number of source blocks (`N`) the message is split into.
    num_source_blocks: usize,

    /// Seed for the auxiliary-block relation; must match between encoder
    /// and decoder.
    random_seed: i64,

    /// CDF of the online soliton degree distribution for `epsilon`.
    cdf: Vec<f64>,
}

impl OnlineCodec {
    /// Creates an Online codec. `epsilon` must lie in (0, 1) and `quality`
    /// must be positive; `seed` fixes the auxiliary relation.
    pub fn new(
        num_source_blocks: usize,
        epsilon: f64,
        quality: usize,
        seed: i64,
    ) -> Result<Self, FountainError> {
        if num_source_blocks == 0 {
            return Err(FountainError::InvalidParameter(
                "number of source blocks must be > 0".to_string(),
            ));
        }
        if !(epsilon > 0.0 && epsilon < 1.0) {
            return Err(FountainError::InvalidParameter(format!(
                "epsilon must be in (0, 1), got {epsilon}"
            )));
        }
        if quality == 0 {
            return Err(FountainError::InvalidParameter(
                "quality must be > 0".to_string(),
            ));
        }
        Ok(OnlineCodec {
            epsilon,
            quality,
            num_source_blocks,
            random_seed: seed,
            cdf: online_soliton_distribution(epsilon),
        })
    }

    /// Number of auxiliary blocks in the outer encoding,
    /// `ceil(0.55 * q * e * N)`.
    pub fn num_aux_blocks(&self) -> usize {
        (0.55 * self.quality as f64 * self.epsilon * self.num_source_blocks as f64).ceil() as usize
    }

    /// Rough lower bound on the number of code blocks likely needed for a
    /// successful decode, `ceil((1 + e) * (N + aux))`.
    pub fn estimate_decode_blocks_needed(&self) -> usize {
        ((1.0 + self.epsilon) * (self.num_source_blocks + self.num_aux_blocks()) as f64).ceil()
            as usize
    }

    /// Builds the outer encoding: the partitioned source blocks plus the
    /// auxiliary blocks each source block was XORed into.
    fn generate_outer_encoding(&self, message: &[u8]) -> (Vec<Block>, Vec<Block>) {
        let num_aux = self.num_aux_blocks();
        let (long, short) = partition_bytes(message, self.num_source_blocks);
        let source = equalize_block_lengths(long, short);

        // Aux blocks start as all padding so they share the common length
        // even if nothing lands on them.
        let mut aux = vec![Block::new(source[0].length()); num_aux];

        let mut random = MersenneTwister::new(self.random_seed);
        for src in &source {
            for j in sample_uniform(&mut random, self.quality, num_aux) {
                aux[j].xor(src);
            }
        }

        (source, aux)
    }

    /// The per-aux-block composition of the outer relation: for each aux
    /// index, which source blocks were XORed into it.
    fn aux_block_composition(&self) -> Vec<Vec<usize>> {
        let num_aux = self.num_aux_blocks();
        let mut composition = vec![Vec::new(); num_aux];
        let mut random = MersenneTwister::new(self.random_seed);
        for i in 0..self.num_source_blocks {
            for j in sample_uniform(&mut random, self.quality, num_aux) {
                composition[j].push(i);
            }
        }
        composition
    }
}

impl Codec for OnlineCodec {
    fn source_blocks(&self) -> usize {
        self.num_source_blocks
    }

    /// The outer encoding appended to the source partition.
    fn generate_intermediate_blocks(&self, message: &[u8]) -> Vec<Block> {
        let (source, aux) = self.generate_outer_encoding(message);
        let mut intermediate = source;
        intermediate.extend(aux);
        intermediate
    }

    /// Seeds a fresh generator with the block ID, draws a degree from the
    /// online soliton CDF, and samples from the source + aux set.
    fn pick_indices(&mut self, code_block_id: i64) -> Vec<usize> {
        let mut random = MersenneTwister::new(code_block_id);
        let degree = pick_degree(&mut random, &self.cdf);
        sample_uniform(
            &mut random,
            degree,
            self.num_source_blocks + self.num_aux_blocks(),
        )
    }

    fn new_decoder(&self, message_length: usize) -> Box<dyn Decoder> {
        Box::new(OnlineDecoder::new(self.clone(), message_length))
    }
}

/// Decoder state for an Online-coded message. Must be built with the same
/// codec parameters the encoder used.
pub struct OnlineDecoder {
    codec: OnlineCodec,
    message_length: usize,
    matrix: SparseMatrix,
}

impl OnlineDecoder {
    fn new(codec: OnlineCodec, message_length: usize) -> Self {
        let num_aux = codec.num_aux_blocks();
        let mut matrix = SparseMatrix::new(codec.num_source_blocks + num_aux);

        // Pre-populate the auxiliary relation as synthetic zero-valued
        // equations. Each composition is sorted by construction: source
        // indices were appended in ascending order, followed by the aux
        // block's own index.
        let mut composition = codec.aux_block_composition();
        for (j, comp) in composition.iter_mut().enumerate() {
            comp.push(codec.num_source_blocks + j);
        }
        for comp in composition {
            matrix.add_equation(comp, Block::default());
        }

        OnlineDecoder {
            codec,
            message_length,
            matrix,
        }
    }
}

impl Decoder for OnlineDecoder {
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
            partition(self.message_length, self.codec.num_source_blocks);
        Some(
            self.matrix
                .reconstruct(self.message_length, len_long, len_short, num_long, num_short),
        )
    }
}
