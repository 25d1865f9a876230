//! End-to-end round trips across the four codecs.
//!
//! Block-ID streams come from the crate's own seeded twisters so that decode
//! outcomes are fixed vectors; message payloads come from ChaCha so that the
//! content varies independently of the equation structure (which depends
//! only on the IDs and codec parameters).

use fountain::{
    encode_lt_blocks, robust_soliton_distribution, soliton_distribution, BinaryCodec, Codec,
    LtBlock, LubyCodec, MersenneTwister, OnlineCodec, RaptorCodec, Ru10Codec, Source,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MESSAGE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

fn block_ids(seed: i64, count: usize, max: i64) -> Vec<i64> {
    let mut random = MersenneTwister::new(seed);
    (0..count).map(|_| random.int_n(max)).collect()
}

fn random_message(rng: &mut ChaCha8Rng, len: usize) -> Vec<u8> {
    let mut message = vec![0u8; len];
    rng.fill(&mut message[..]);
    message
}

/// Feeds blocks one at a time and returns how many it took to determine the
/// decoder, then checks the decoded output.
fn decode_incrementally(codec: &mut dyn Codec, blocks: &[LtBlock], message: &[u8]) -> usize {
    let mut decoder = codec.new_decoder(message.len());
    for (i, block) in blocks.iter().enumerate() {
        if decoder.add_blocks(std::slice::from_ref(block)) {
            assert_eq!(decoder.decode().as_deref(), Some(message));
            return i + 1;
        }
        assert_eq!(decoder.decode(), None, "undetermined decoder must yield None");
    }
    panic!("decoder never became determined");
}

#[test]
fn binary_round_trip() {
    let mut codec = BinaryCodec::new(13).unwrap();
    let ids = block_ids(8923489, 45, 100000);
    let blocks = encode_lt_blocks(MESSAGE, &ids, &mut codec);

    let needed = decode_incrementally(&mut codec, &blocks, MESSAGE);
    assert_eq!(needed, 16);
}

#[test]
fn binary_random_messages() {
    let mut codec = BinaryCodec::new(10).unwrap();
    let ids = block_ids(8234982, 25, 100000);
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    for len in [26, 100, 999, 1500] {
        let message = random_message(&mut rng, len);
        let blocks = encode_lt_blocks(&message, &ids, &mut codec);

        let mut decoder = codec.new_decoder(message.len());
        assert!(decoder.add_blocks(&blocks), "len={len}");
        assert_eq!(decoder.decode(), Some(message));
    }
}

#[test]
fn luby_round_trip_robust_soliton() {
    let cdf = robust_soliton_distribution(13, 4, 0.01);
    let mut codec = LubyCodec::new(13, MersenneTwister::new(200), cdf).unwrap();
    let ids = block_ids(8923489, 60, 100000);
    let blocks = encode_lt_blocks(MESSAGE, &ids, &mut codec);

    let needed = decode_incrementally(&mut codec, &blocks, MESSAGE);
    assert_eq!(needed, 16);
}

#[test]
fn luby_encoding_is_deterministic() {
    let cdf = soliton_distribution(8);
    let ids = block_ids(12, 20, 50000);
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let message = random_message(&mut rng, 333);

    let mut codec_a = LubyCodec::new(8, MersenneTwister::new(7), cdf.clone()).unwrap();
    let mut codec_b = LubyCodec::new(8, MersenneTwister::new(7), cdf).unwrap();
    assert_eq!(
        encode_lt_blocks(&message, &ids, &mut codec_a),
        encode_lt_blocks(&message, &ids, &mut codec_b)
    );
}

#[test]
fn online_round_trip() {
    let mut codec = OnlineCodec::new(13, 0.3, 10, 200).unwrap();
    let ids = block_ids(8923489, 45, 100000);
    let blocks = encode_lt_blocks(MESSAGE, &ids, &mut codec);

    let needed = decode_incrementally(&mut codec, &blocks, MESSAGE);
    assert_eq!(needed, 15);
}

#[test]
fn online_random_messages() {
    let mut codec = OnlineCodec::new(10, 0.2, 7, 77).unwrap();
    assert_eq!(codec.source_blocks(), 10);

    let ids = block_ids(4242, 40, 100000);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    for len in [40, 1000, 1517] {
        let message = random_message(&mut rng, len);
        let blocks = encode_lt_blocks(&message, &ids, &mut codec);

        let mut decoder = codec.new_decoder(message.len());
        assert!(decoder.add_blocks(&blocks), "len={len}");
        assert_eq!(decoder.decode(), Some(message));
    }
}

#[test]
fn raptor_round_trip() {
    let mut codec = RaptorCodec::new(13, 2).unwrap();
    let ids = block_ids(8923489, 45, 60000);
    let blocks = encode_lt_blocks(MESSAGE, &ids, &mut codec);

    let needed = decode_incrementally(&mut codec, &blocks, MESSAGE);
    assert_eq!(needed, 17);
}

#[test]
fn raptor_random_messages() {
    let mut codec = RaptorCodec::new(20, 4).unwrap();
    let ids = block_ids(555, 40, 60000);
    let mut rng = ChaCha8Rng::seed_from_u64(4);

    for len in [80, 1000, 2003] {
        let message = random_message(&mut rng, len);
        let blocks = encode_lt_blocks(&message, &ids, &mut codec);

        let mut decoder = codec.new_decoder(message.len());
        assert!(decoder.add_blocks(&blocks), "len={len}");
        assert_eq!(decoder.decode(), Some(message));
    }
}

#[test]
fn raptor_systematic_transmission() {
    // The first K ESIs are the source blocks themselves; a receiver that
    // loses some of them recovers from repair ESIs >= K.
    let mut codec = RaptorCodec::new(13, 2).unwrap();

    let systematic_ids: Vec<i64> = (0..13).collect();
    let blocks = encode_lt_blocks(MESSAGE, &systematic_ids, &mut codec);

    let mut plain: Vec<u8> = Vec::new();
    for block in &blocks {
        plain.extend_from_slice(&block.data);
    }
    assert!(plain.starts_with(MESSAGE), "systematic prefix carries the message");

    let received: Vec<LtBlock> = blocks
        .iter()
        .enumerate()
        .filter(|(i, _)| ![1, 5, 6, 11].contains(i))
        .map(|(_, b)| b.clone())
        .collect();
    let repair_ids: Vec<i64> = (100..105).collect();
    let repair = encode_lt_blocks(MESSAGE, &repair_ids, &mut codec);

    let mut decoder = codec.new_decoder(MESSAGE.len());
    decoder.add_blocks(&received);
    assert!(decoder.add_blocks(&repair));
    assert_eq!(decoder.decode().as_deref(), Some(MESSAGE));
}

#[test]
fn ru10_round_trip() {
    let mut codec = Ru10Codec::new(13, 2).unwrap();
    let ids = block_ids(8923489, 45, 1000000);
    let blocks = encode_lt_blocks(MESSAGE, &ids, &mut codec);

    let needed = decode_incrementally(&mut codec, &blocks, MESSAGE);
    assert_eq!(needed, 16);
}

#[test]
fn ru10_random_messages() {
    let mut codec = Ru10Codec::new(20, 4).unwrap();
    let ids = block_ids(555, 40, 1000000);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    for len in [80, 1000, 2003] {
        let message = random_message(&mut rng, len);
        let blocks = encode_lt_blocks(&message, &ids, &mut codec);

        let mut decoder = codec.new_decoder(message.len());
        assert!(decoder.add_blocks(&blocks), "len={len}");
        assert_eq!(decoder.decode(), Some(message));
    }
}

#[test]
fn redundant_blocks_are_absorbed() {
    // Adding blocks past the point of determination never hurts.
    let mut codec = BinaryCodec::new(13).unwrap();
    let ids = block_ids(8923489, 45, 100000);
    let blocks = encode_lt_blocks(MESSAGE, &ids, &mut codec);

    let mut decoder = codec.new_decoder(MESSAGE.len());
    assert!(decoder.add_blocks(&blocks[..16]));
    assert!(decoder.add_blocks(&blocks[16..]));
    assert_eq!(decoder.decode().as_deref(), Some(MESSAGE));
}
