//! Fountain (rateless erasure) codes.
//!
//! A fountain code turns a fixed set of source blocks into a more or less
//! unlimited stream of equal-sized code blocks; the original message can be
//! recovered from any sufficiently large subset of them. A receiver never
//! needs to report which blocks it got, only when it has enough.
//!
//! Every codec here follows the same scheme: split the source message into
//! blocks, optionally derive a set of precode blocks from them, then for
//! each code-block ID pick constituent precode blocks and XOR them together
//! (the LT process). Decoding feeds each received block into one shared
//! sparse-equation engine ([`SparseMatrix`]) that triangularizes
//! incrementally and back-substitutes once the system is determined.
//!
//! Four codecs are provided:
//!
//! - [`BinaryCodec`]: the random binary fountain; blocks are uniformly
//!   random subsets of the source blocks.
//! - [`LubyCodec`]: the classical LT code driven by a degree distribution
//!   such as [`soliton_distribution`].
//! - [`OnlineCodec`]: an Online code with an auxiliary outer layer.
//! - [`RaptorCodec`]: the systematic R10 Raptor code of RFC 5053, plus
//!   [`Ru10Codec`], an unsystematic variant with cheap encoder setup.
//!
//! ```
//! use fountain::{encode_lt_blocks, soliton_distribution, LubyCodec, MersenneTwister};
//!
//! let message = b"abcdefghijklmnopqrstuvwxyz".to_vec();
//! let mut codec =
//!     LubyCodec::new(4, MersenneTwister::new(200), soliton_distribution(4)).unwrap();
//!
//! let blocks = encode_lt_blocks(&message, &[7, 34, 5, 31, 25], &mut codec);
//!
//! let mut decoder = codec.new_decoder(message.len());
//! assert!(decoder.add_blocks(&blocks));
//! assert_eq!(decoder.decode(), Some(message));
//! ```

pub mod binary;
pub mod block;
pub mod codec;
pub mod luby;
pub mod matrix;
pub mod mersenne;
pub mod online;
pub mod raptor;
pub mod ru10;
pub mod soliton;
mod tables;
pub mod util;

pub use binary::BinaryCodec;
pub use block::{equalize_block_lengths, partition, partition_bytes, Block};
pub use codec::{encode_lt_blocks, Codec, Decoder, LtBlock};
pub use luby::LubyCodec;
pub use matrix::SparseMatrix;
pub use mersenne::{MersenneTwister, MersenneTwister64, Source};
pub use online::OnlineCodec;
pub use raptor::{
    find_lt_indices, intermediate_symbols, triple_generator, RaptorCodec, MAX_SOURCE_SYMBOLS,
    MIN_SOURCE_SYMBOLS,
};
pub use ru10::Ru10Codec;
pub use soliton::{
    online_soliton_distribution, pick_degree, robust_soliton_distribution, sample_uniform,
    soliton_distribution,
};

use thiserror::Error;

/// Errors reported by codec constructors.
///
/// Everything past construction is sentinel-based: an undetermined decoder
/// returns `None` from [`Decoder::decode`], and redundant equations are
/// silently absorbed.
#[derive(Error, Debug)]
pub enum FountainError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
