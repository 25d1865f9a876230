//! The codec contract shared by every fountain code in this crate.
//!
//! Each codec follows the same overall scheme: split a source message into
//! source blocks, optionally transform those into a set of precode blocks,
//! then for each requested code-block ID pick constituent precode blocks and
//! XOR them together. The decoders all feed the resulting equations into one
//! [`SparseMatrix`](crate::SparseMatrix) engine.

use crate::block::Block;

/// A fountain code: intermediate-block construction plus per-ID selection of
/// the blocks XORed into each code block.
pub trait Codec {
    /// The number of source blocks the codec splits a message into. This may
    /// differ from the number of intermediate blocks; it is the minimum
    /// number of encoded blocks needed to reconstruct the message.
    fn source_blocks(&self) -> usize;

    /// Prepares the precode blocks for a message. These may be exactly the
    /// partitioned source blocks, or a codec-specific transformation (Online
    /// codes append auxiliary blocks; Raptor codes replace the source blocks
    /// with an intermediate encoding). The message is copied into owned
    /// blocks; the caller's buffer is not modified.
    fn generate_intermediate_blocks(&self, message: &[u8]) -> Vec<Block>;

    /// Selects the precode blocks XORed together to form the code block with
    /// the given ID. Takes `&mut self` because some codecs reseed an
    /// embedded generator; for a given ID and codec parameters the result is
    /// always the same.
    fn pick_indices(&mut self, code_block_id: i64) -> Vec<usize>;

    /// Creates a decoder for blocks produced by this codec, for a message of
    /// a known length in bytes.
    fn new_decoder(&self, message_length: usize) -> Box<dyn Decoder>;
}

/// Incremental decoder for one particular message.
pub trait Decoder {
    /// Adds encoded blocks to the decoder. Returns true once the message can
    /// be fully decoded, false while information is still insufficient.
    fn add_blocks(&mut self, blocks: &[LtBlock]) -> bool;

    /// Extracts the decoded message, or `None` if the decoder does not yet
    /// have enough information.
    fn decode(&mut self) -> Option<Vec<u8>>;
}

/// An encoded code block: the ID it was constructed from plus its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LtBlock {
    /// The ID used to construct the block. How the ID maps to a choice of
    /// precode blocks varies by codec.
    pub code: i64,

    /// The block payload, always the codec's common block length.
    pub data: Vec<u8>,
}

/// XORs the precode blocks at `indices` into a fresh code block.
pub(crate) fn generate_luby_transform_block(source: &[Block], indices: &[usize]) -> Block {
    let mut symbol = Block::default();
    for &i in indices {
        if let Some(b) = source.get(i) {
            symbol.xor(b);
        }
    }
    symbol
}

/// Encodes one code block per ID from the given message, using any codec.
pub fn encode_lt_blocks(message: &[u8], encoded_block_ids: &[i64], codec: &mut dyn Codec) -> Vec<LtBlock> {
    let source = codec.generate_intermediate_blocks(message);

    encoded_block_ids
        .iter()
        .map(|&id| {
            let indices = codec.pick_indices(id);
            let b = generate_luby_transform_block(&source, &indices);
            // Materialize trailing padding so every payload has the full
            // common block length.
            let mut data = b.data;
            data.resize(data.len() + b.padding, 0);
            LtBlock { code: id, data }
        })
        .collect()
}
