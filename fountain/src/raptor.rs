//! The systematic R10 Raptor code from RFC 5053.
//!
//! R10 nearly matches the performance of the random binary fountain while
//! capping the code-block degree, which makes decoding linear instead of
//! quadratic. It is systematic: code blocks with ESIs `0..K` are the source
//! blocks themselves, so a sender can transmit the message plainly and then
//! produce repair blocks as needed.
//!
//! The construction works through an intermediate encoding of
//! `L = K + S + H` symbols: `S` LDPC symbols arranged in successive
//! clusters (cheap decode-friendly redundancy) and `H` half symbols whose
//! Gray-code composition covers about half of the other symbols apiece
//! (random-fountain-like coverage). The systematic index `J(K)` is chosen
//! so that the `L` equations relating the source symbols to the
//! intermediate symbols are jointly invertible; intermediate generation
//! solves that system, and every code block is then an XOR of intermediate
//! symbols selected by the triple generator.
//!
//! The code supports at most 8192 source symbols; larger messages should be
//! split into sub-messages first, per the RFC's transport guidance.

use crate::block::{equalize_block_lengths, partition, partition_bytes, Block};
use crate::codec::{Codec, Decoder, LtBlock};
use crate::matrix::SparseMatrix;
use crate::tables::{SYSTEMATIC_INDEX_TABLE, V0_TABLE, V1_TABLE};
use crate::util::{bit_set, build_gray_sequence, center_binomial, smallest_prime_greater_or_equal};
use crate::FountainError;

/// Bounds on the source-symbol count, set by the systematic index table.
pub const MIN_SOURCE_SYMBOLS: usize = 4;
pub const MAX_SOURCE_SYMBOLS: usize = 8192;

/// The Rand function from RFC 5053 S.5.4.4.1: a pseudo-random value in
/// `[0, m)` derived from the fixed V0/V1 tables.
pub(crate) fn raptor_rand(x: u32, i: u32, m: u32) -> u32 {
    let v0 = V0_TABLE[((x + i) % 256) as usize];
    let v1 = V1_TABLE[((x / 256 + i) % 256) as usize];
    (v0 ^ v1) % m
}

/// The Deg function from RFC 5053 S.5.4.4.2: maps a value in `[0, 2^20)` to
/// a code-block degree through the fixed threshold table.
pub(crate) fn deg(v: u32) -> usize {
    const F: [u32; 8] = [0, 10241, 491582, 712794, 831695, 948446, 1032189, 1048576];
    const D: [usize; 8] = [0, 1, 2, 3, 4, 10, 11, 40];

    for j in 1..F.len() - 1 {
        if v < F[j] {
            return D[j];
        }
    }
    D[D.len() - 1]
}

/// Computes `(L, S, H)` from `K` per RFC 5053 S.5.4.2.3: `L = K + S + H`
/// intermediate symbols, of which `S` are LDPC symbols and `H` are half
/// symbols.
pub fn intermediate_symbols(k: usize) -> (usize, usize, usize) {
    // X is the smallest positive integer with X*(X-1) >= 2K.
    let mut x = (2.0 * k as f64).sqrt().floor() as usize;
    if x < 1 {
        x = 1;
    }
    while x * (x - 1) < 2 * k {
        x += 1;
    }

    // S is the smallest prime >= ceil(0.01*K) + X.
    let s = smallest_prime_greater_or_equal((0.01 * k as f64).ceil() as usize + x);

    // H is the smallest integer with choose(H, ceil(H/2)) >= K + S;
    // choose(h, h/2) <= 4^(h/2) gives the starting point.
    let mut h = (((s + k) as f64).ln() / 4f64.ln()).floor() as usize;
    while center_binomial(h as u64) < (k + s) as u64 {
        h += 1;
    }

    (k + s + h, s, h)
}

/// The triple generator from RFC 5053 S.5.4.4.4: derives `(d, a, b)` for
/// code symbol `x` of a K-symbol code via the systematic index `J(K)`.
pub fn triple_generator(k: usize, x: u16) -> (usize, u32, u32) {
    let (l, _, _) = intermediate_symbols(k);
    let lprime = smallest_prime_greater_or_equal(l) as u32;
    // Largest prime below 2^16.
    let q: u64 = 65521;
    let jk = u64::from(SYSTEMATIC_INDEX_TABLE[k]);

    let a = (53591 + jk * 997) % q;
    let b = (10267 * (jk + 1)) % q;
    let y = ((b + u64::from(x) * a) % q) as u32;
    let v = raptor_rand(y, 0, 1 << 20);
    let d = deg(v);
    let a = 1 + raptor_rand(y, 1, lprime - 1);
    let b = raptor_rand(y, 2, lprime);

    (d, a, b)
}

/// Walks the `(d, a, b)` recurrence over the intermediate-symbol range,
/// skipping values past `l`, and returns the sorted index set.
pub(crate) fn lt_indices_from_triple(l: usize, d: usize, a: u32, b: u32) -> Vec<usize> {
    let lprime = smallest_prime_greater_or_equal(l) as u32;
    let l = l as u32;
    let d = d.min(l as usize);
    let (mut b, a) = (b, a);

    let mut indices = Vec::with_capacity(d);
    while b >= l {
        b = (b + a) % lprime;
    }
    indices.push(b as usize);

    for _ in 1..d {
        b = (b + a) % lprime;
        while b >= l {
            b = (b + a) % lprime;
        }
        indices.push(b as usize);
    }

    indices.sort_unstable();
    indices
}

/// The composition of the ESI=`x` LT code block for a K-symbol code.
pub fn find_lt_indices(k: usize, x: u16) -> Vec<usize> {
    let (l, _, _) = intermediate_symbols(k);
    let (d, a, b) = triple_generator(k, x);
    lt_indices_from_triple(l, d, a, b)
}

/// The LT encoding function from RFC 5053 S.5.4.4.3: XORs the intermediate
/// symbols selected for symbol ID `x`.
pub(crate) fn lt_encode(k: usize, x: u16, intermediate: &[Block]) -> Block {
    let mut result = Block::default();
    for i in find_lt_indices(k, x) {
        result.xor(&intermediate[i]);
    }
    result
}

/// The LDPC clusters: for each of the `s` LDPC rows, the source indices
/// that cycle into it (each source index lands in exactly three rows).
pub(crate) fn ldpc_compositions(k: usize, s: usize) -> Vec<Vec<usize>> {
    let mut compositions = vec![Vec::new(); s];
    for i in 0..k {
        let a = 1 + (i / s) % (s - 1);
        let mut b = i % s;
        compositions[b].push(i);
        b = (b + a) % s;
        compositions[b].push(i);
        b = (b + a) % s;
        compositions[b].push(i);
    }
    compositions
}

/// The half-symbol rows: row `i` covers every index `j < k + s` whose Gray
/// code has bit `i` set, out of a sequence of Gray codes with exactly
/// `ceil(h/2)` bits.
pub(crate) fn half_compositions(k: usize, s: usize, h: usize) -> Vec<Vec<usize>> {
    let hprime = h.div_ceil(2);
    let m = build_gray_sequence(k + s, hprime as u32);

    (0..h)
        .map(|i| {
            (0..k + s)
                .filter(|&j| bit_set(m[j], i as u32))
                .collect()
        })
        .collect()
}

/// A decode matrix over the `L` intermediate symbols, pre-seeded with the
/// `S + H` zero-valued constraint equations.
pub(crate) fn constraint_matrix(k: usize) -> SparseMatrix {
    let (l, s, h) = intermediate_symbols(k);
    let mut matrix = SparseMatrix::new(l);

    for (i, mut composition) in ldpc_compositions(k, s).into_iter().enumerate() {
        composition.push(k + i);
        matrix.add_equation(composition, Block::default());
    }

    for (i, mut composition) in half_compositions(k, s, h).into_iter().enumerate() {
        composition.push(k + s + i);
        matrix.add_equation(composition, Block::default());
    }

    matrix
}

/// Derives the intermediate encoding from the source blocks by solving the
/// constraint system: the LT relation ties intermediate symbols to the
/// source symbols at ESIs `0..K`, and the `J(K)` selection guarantees the
/// combined system is invertible. Re-encoding ESI `i` of the result yields
/// source block `i` exactly, which is what makes the code systematic.
fn raptor_intermediate_blocks(source: Vec<Block>) -> Vec<Block> {
    let k = source.len();
    let mut matrix = constraint_matrix(k);
    for (i, block) in source.into_iter().enumerate() {
        matrix.add_equation(find_lt_indices(k, i as u16), block);
    }

    matrix.reduce();
    matrix.v
}

/// Codec for the systematic R10 Raptor code.
///
/// Block IDs are ESIs, semantically 16-bit: IDs below `K` reproduce source
/// blocks, IDs at or above `K` are repair blocks.
#[derive(Debug, Clone)]
pub struct RaptorCodec {
    /// `K`, the number of source symbols, in `[4, 8192]`.
    num_source_symbols: usize,

    /// `Al`, the symbol alignment in bytes; the XOR granularity the caller
    /// sizes messages for. Usually 4.
    symbol_alignment_size: usize,
}

impl RaptorCodec {
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
        Ok(RaptorCodec {
            num_source_symbols,
            symbol_alignment_size,
        })
    }

    /// `Al`, the XOR granularity in bytes the caller sizes messages for.
    /// Usually 4: on 32-bit machines 4-byte XORs are the efficient unit,
    /// while larger source-block counts lower the coding overhead.
    pub fn symbol_alignment_size(&self) -> usize {
        self.symbol_alignment_size
    }
}

impl Codec for RaptorCodec {
    fn source_blocks(&self) -> usize {
        self.num_source_symbols
    }

    /// Builds the intermediate encoding by the reverse-decode process, so
    /// that block ID `i < K` re-encodes to the `i`th source block.
    fn generate_intermediate_blocks(&self, message: &[u8]) -> Vec<Block> {
        let (long, short) = partition_bytes(message, self.num_source_symbols);
        let source = equalize_block_lengths(long, short);
        raptor_intermediate_blocks(source)
    }

    fn pick_indices(&mut self, code_block_id: i64) -> Vec<usize> {
        find_lt_indices(self.num_source_symbols, code_block_id as u16)
    }

    fn new_decoder(&self, message_length: usize) -> Box<dyn Decoder> {
        Box::new(RaptorDecoder::new(self.clone(), message_length))
    }
}

/// Decoder state for an R10-coded message. Must be built with the same
/// codec parameters the encoder used.
pub struct RaptorDecoder {
    codec: RaptorCodec,
    message_length: usize,
    matrix: SparseMatrix,
}

impl RaptorDecoder {
    fn new(codec: RaptorCodec, message_length: usize) -> Self {
        let matrix = constraint_matrix(codec.num_source_symbols);
        RaptorDecoder {
            codec,
            message_length,
            matrix,
        }
    }

    #[cfg(test)]
    fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }
}

impl Decoder for RaptorDecoder {
    fn add_blocks(&mut self, blocks: &[LtBlock]) -> bool {
        for block in blocks {
            let indices = find_lt_indices(self.codec.num_source_symbols, block.code as u16);
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

        // The solved rows hold the intermediate symbols; run the encoder
        // over ESIs 0..K to recover the source blocks.
        let k = self.codec.num_source_symbols;
        let source: Vec<Block> = (0..k)
            .map(|i| lt_encode(k, i as u16, &self.matrix.v))
            .collect();

        let (len_long, len_short, num_long, num_short) = partition(self.message_length, k);
        let mut out = Vec::with_capacity(self.message_length);
        for block in source.iter().take(num_long) {
            out.extend_from_slice(&block.data[..len_long]);
        }
        for block in source.iter().skip(num_long).take(num_short) {
            out.extend_from_slice(&block.data[..len_short]);
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::SYSTEMATIC_INDEX_TABLE;

    #[test]
    fn raptor_rand_vectors() {
        let cases = [
            (1, 4, 150, 50),
            (20005, 19, 25, 6),
            (2180, 11, 1383483, 1166141),
        ];
        for (x, i, m, want) in cases {
            assert_eq!(raptor_rand(x, i, m), want);
        }
    }

    #[test]
    fn deg_thresholds() {
        let cases = [
            (0, 1),
            (10000, 1),
            (10240, 1),
            (10241, 2),
            (10242, 2),
            (715000, 4),
            (1000000, 11),
            (1034300, 40),
            (1048575, 40),
            (1048576, 40),
        ];
        for (v, want) in cases {
            assert_eq!(deg(v), want, "deg({v})");
        }
    }

    #[test]
    fn intermediate_symbol_counts() {
        let cases = [
            (0, (4, 2, 2)),
            (1, (8, 3, 4)),
            (10, (23, 7, 6)),
            (13, (26, 7, 6)),
            (14, (28, 7, 7)),
            (500, (553, 41, 12)),
            (5000, (5166, 151, 15)),
        ];
        for (k, want) in cases {
            assert_eq!(intermediate_symbols(k), want, "K={k}");
        }
    }

    #[test]
    fn triple_generator_vectors() {
        let cases = [
            (0, 3, (2, 4, 3)),
            (1, 4, (4, 2, 5)),
            (4, 0, (10, 13, 1)),
            (4, 4, (4, 6, 2)),
            (500, 514, (2, 107, 279)),
            (1000, 52918, (3, 1070, 121)),
        ];
        for (k, x, want) in cases {
            assert_eq!(triple_generator(k, x), want, "triple({k}, {x})");
        }
    }

    #[test]
    fn systematic_index_entries() {
        assert_eq!(SYSTEMATIC_INDEX_TABLE[4], 18);
        assert_eq!(SYSTEMATIC_INDEX_TABLE[21], 2);
        assert_eq!(SYSTEMATIC_INDEX_TABLE[8192], 2665);
    }

    #[test]
    fn lt_index_vectors() {
        let cases: [(usize, u16, &[usize]); 5] = [
            (4, 0, &[1, 2, 3, 4, 6, 7, 8, 10, 11, 12]),
            (4, 4, &[2, 3, 8, 9]),
            (100, 1, &[51, 104]),
            (1000, 727, &[306, 687, 1040]),
            (10, 57279, &[19, 20, 21, 22]),
        ];
        for (k, x, want) in cases {
            assert_eq!(find_lt_indices(k, x), want, "findLTIndices({k}, {x})");
        }
    }

    #[test]
    fn constraint_rows_for_k10() {
        let decoder = RaptorDecoder::new(RaptorCodec::new(10, 1).unwrap(), 1);
        // Vectors from a worked example by Luby and Shokrollahi.
        assert_eq!(decoder.matrix().coeff[0], [0, 5, 6, 7, 10]);
        assert_eq!(decoder.matrix().coeff[1], [1, 2, 3, 8, 13]);
        assert_eq!(decoder.matrix().coeff[2], [2, 3, 4, 7, 9, 14]);
    }

    #[test]
    fn intermediate_blocks_invert_the_lt_relation() {
        let source: Vec<Block> = (0..4)
            .map(|i| {
                let mut data = vec![0u8; 4];
                data[3 - i] = 1;
                Block::from_data(data)
            })
            .collect();

        let intermediate = raptor_intermediate_blocks(source.clone());
        assert_eq!(intermediate.len(), 14);

        for (i, want) in source.iter().enumerate() {
            let encoded = lt_encode(4, i as u16, &intermediate);
            assert_eq!(&encoded.data, &want.data, "ESI {i}");
        }
    }

    #[test]
    fn code_is_systematic() {
        let message = b"abcdefghijklmnopqrstuvwxyz";
        let codec = RaptorCodec::new(13, 2).unwrap();
        let intermediate = codec.generate_intermediate_blocks(message);

        let (long, short) = partition_bytes(message, 13);
        let source = equalize_block_lengths(long, short);

        for esi in 0..6u16 {
            let b = lt_encode(13, esi, &intermediate);
            assert_eq!(b.data, source[esi as usize].data, "ESI {esi}");
        }
    }

    #[test]
    fn source_symbol_range_is_validated() {
        assert!(RaptorCodec::new(3, 4).is_err());
        assert!(RaptorCodec::new(8193, 4).is_err());
        assert!(RaptorCodec::new(13, 0).is_err());
        assert!(RaptorCodec::new(4, 1).is_ok());
        assert!(RaptorCodec::new(8192, 1).is_ok());
    }
}
