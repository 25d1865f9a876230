//! RU10: an unsystematic fountain code with R10's degree distribution and
//! intermediate-block scheme.
//!
//! Giving up the systematic property makes independent block generation much
//! cheaper: intermediates are built by direct XOR through the LDPC and
//! half-symbol patterns, with no reverse decode run. Multiple encoders can
//! work from the same source blocks without coordinating over which ESIs
//! reproduce source symbols, and because the triple values come from a
//! seeded generator rather than the systematic index table, the ID space is
//! effectively unlimited.

use crate::block::{equalize_block_lengths, partition, partition_bytes, Block};
use crate::codec::{generate_luby_transform_block, Codec, Decoder, LtBlock};
use crate::matrix::SparseMatrix;
use crate::mersenne::{MersenneTwister64, Source};
use crate::raptor::{
    constraint_matrix, deg, half_compositions, intermediate_symbols, ldpc_compositions,
    lt_indices_from_triple, MAX_SOURCE_SYMBOLS, MIN_SOURCE_SYMBOLS,
};
use crate::util::smallest_prime_greater_or_equal;
use crate::FountainError;

/// Derives `(d, a, b)` for code symbol `x` from an MT19937-64 stream seeded
/// with `x`, in place of the systematic table lookup.
fn ru10_triple_generator(k: usize, x: i64) -> (usize, u32, u32) {
    let (l, _, _) = intermediate_symbols(k);
    let lprime = smallest_prime_greater_or_equal(l) as i64;

    let mut random = MersenneTwister64::new(x);
    let v = (random.int63() % 1048576) as u32;
    let a = (1 + random.int63() % (lprime - 1)) as u32;
    let b = (random.int63() % lprime) as u32;
    let d = deg(v);

    (d, a, b)
}

/// Codec for the unsystematic Raptor-like RU10 code.
#[derive(Debug, Clone)]
pub struct Ru10Codec {
    num_source_symbols: usize,
    symbol_alignment_size: usize,
}

impl Ru10Codec {
    pub fn new(
        num_source_symbols: usize,
        symbol_alignment_size: usize,
    ) -> Result<Self, FountainError> {
        if !(MIN_SOURCE_SYMBOLS..=MAX_SOURCE_SYMBOLS).contains(&num_source_symbols) {
            return Err(FountainError::InvalidParameter(format!(
                "number of source symbols must be in [{MIN_SOURCE_SYMBOLS}, {MAX_SOURCE_SYMBOLS}], got {num_source_symbols}"
            )));
        }
        if symbol_alignment_size == 0 {
            return Err(FountainError::InvalidParameter(
                "symbol alignment must be > 0".to_string(),
            ));
        }
        Ok(Ru10Codec {
            num_source_symbols,
            symbol_alignment_size,
        })
    }

    /// `Al`, the XOR granularity in bytes the caller sizes messages for.
    pub fn symbol_alignment_size(&self) -> usize {
        self.symbol_alignment_size
    }
}

impl Codec for Ru10Codec {
    fn source_blocks(&self) -> usize {
        self.num_source_symbols
    }

    /// Walks the same index recurrence as R10, with triples drawn from the
    /// seeded generator.
    fn pick_indices(&mut self, code_block_id: i64) -> Vec<usize> {
        let (l, _, _) = intermediate_symbols(self.num_source_symbols);
        let (d, a, b) = ru10_triple_generator(self.num_source_symbols, code_block_id);
        lt_indices_from_triple(l, d, a, b)
    }

    /// The intermediate encoding is the source partition followed by the S
    /// LDPC blocks and H half blocks, built by direct XOR. No reverse decode
    /// is needed because the code is unsystematic: the first K intermediates
    /// are the source blocks themselves.
    fn generate_intermediate_blocks(&self, message: &[u8]) -> Vec<Block> {
        let (long, short) = partition_bytes(message, self.num_source_symbols);
        let mut blocks = equalize_block_lengths(long, short);

        let k = self.num_source_symbols;
        let (_, s, h) = intermediate_symbols(k);

        for composition in ldpc_compositions(k, s) {
            blocks.push(generate_luby_transform_block(&blocks, &composition));
        }
        for composition in half_compositions(k, s, h) {
            blocks.push(generate_luby_transform_block(&blocks, &composition));
        }

        blocks
    }

    fn new_decoder(&self, message_length: usize) -> Box<dyn Decoder> {
        Box::new(Ru10Decoder::new(self.clone(), message_length))
    }
}

/// Decoder state for an RU10-coded message. The intermediate constraints are
/// identical to R10's; recovery just reads the first K solved rows instead
/// of re-encoding.
pub struct Ru10Decoder {
    codec: Ru10Codec,
    message_length: usize,
    matrix: SparseMatrix,
}

impl Ru10Decoder {
    fn new(codec: Ru10Codec, message_length: usize) -> Self {
        let matrix = constraint_matrix(codec.num_source_symbols);
        Ru10Decoder {
            codec,
            message_length,
            matrix,
        }
    }
}

impl Decoder for Ru10Decoder {
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
            partition(self.message_length, self.codec.num_source_symbols);
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
    fn pick_indices_vectors() {
        let mut codec = Ru10Codec::new(13, 2).unwrap();
        assert_eq!(codec.pick_indices(1), [0, 3, 23]);
        assert_eq!(codec.pick_indices(2000), [17, 21]);
        // Same ID, same composition.
        assert_eq!(codec.pick_indices(1), [0, 3, 23]);
    }

    #[test]
    fn intermediate_block_count() {
        let codec = Ru10Codec::new(13, 2).unwrap();
        let blocks = codec.generate_intermediate_blocks(b"abcdefghijklmnopqrstuvwxyz");
        let (l, _, _) = intermediate_symbols(13);
        assert_eq!(blocks.len(), l);

        // All intermediates share the source block length.
        assert!(blocks.iter().all(|b| b.length() == blocks[0].length()));
    }

    #[test]
    fn source_symbol_range_is_validated() {
        assert!(Ru10Codec::new(3, 4).is_err());
        assert!(Ru10Codec::new(8193, 4).is_err());
        assert!(Ru10Codec::new(13, 0).is_err());
    }
}
