//! Conformance of the strict codec with the `base64` crate.

use base64_external::{
    engine::general_purpose::{STANDARD, URL_SAFE},
    Engine,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use strict_base64::{decode, decode_into, decoded_len, encode, encode_url_safe, Error};

/// Symbols biased towards the edge cases: padding, both forms of 62 and 63,
/// and final symbols with and without low bits set.
const FUZZ_SYMBOLS: &[u8] = b"AQgwBRhx+/-_=";

fn generate_blob(rng: &mut StdRng) -> Vec<u8> {
    let length = rng.gen_range(0..=100);
    (0..length).map(|_| rng.gen::<u8>()).collect()
}

fn generate_candidate(rng: &mut StdRng) -> String {
    let length = rng.gen_range(0..=3) * 4 + if rng.gen_bool(0.1) { 1 } else { 0 };
    (0..length)
        .map(|_| char::from(FUZZ_SYMBOLS[rng.gen_range(0..FUZZ_SYMBOLS.len())]))
        .collect()
}

#[test]
fn test_encode_matches_external() {
    let mut rng = StdRng::seed_from_u64(0x6261_7365_3634);

    for _ in 0..500 {
        let blob = generate_blob(&mut rng);
        assert_eq!(encode(&blob), STANDARD.encode(&blob));
        assert_eq!(encode_url_safe(&blob), URL_SAFE.encode(&blob));
    }
}

#[test]
fn test_decode_external_output() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..500 {
        let blob = generate_blob(&mut rng);
        assert_eq!(decode(STANDARD.encode(&blob)).unwrap(), blob);
        assert_eq!(decode(URL_SAFE.encode(&blob)).unwrap(), blob);
    }
}

#[test]
fn test_external_decodes_our_output() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..500 {
        let blob = generate_blob(&mut rng);
        assert_eq!(STANDARD.decode(encode(&blob)).unwrap(), blob);
        assert_eq!(URL_SAFE.decode(encode_url_safe(&blob)).unwrap(), blob);
    }
}

#[test]
fn test_decode_into_roundtrip() {
    let mut rng = StdRng::seed_from_u64(1234);
    let mut buf = [0u8; 128];

    for _ in 0..500 {
        let blob = generate_blob(&mut rng);
        let encoded = encode(&blob);
        assert_eq!(decoded_len(&encoded), Ok(blob.len()));

        let written = decode_into(&mut buf, &encoded).unwrap();
        assert_eq!(&buf[..written], &blob[..]);

        if !blob.is_empty() {
            let short = blob.len() - 1;
            assert_eq!(
                decode_into(&mut buf[..short], &encoded),
                Err(Error::BufferTooSmall {
                    needed: blob.len(),
                    available: short
                })
            );
        }
    }
}

#[test]
fn test_strict_acceptance_matches_external() {
    let mut rng = StdRng::seed_from_u64(0xdead_beef);

    for _ in 0..20_000 {
        let candidate = generate_candidate(&mut rng);
        // The external standard engine only knows '+' and '/'.
        let normalized = candidate.replace('-', "+").replace('_', "/");

        match (decode(&candidate), STANDARD.decode(&normalized)) {
            (Ok(ours), Ok(theirs)) => assert_eq!(ours, theirs, "mismatch for {:?}", candidate),
            (Err(_), Err(_)) => {}
            (ours, theirs) => panic!(
                "acceptance differs for {:?}: ours {:?}, external {:?}",
                candidate, ours, theirs
            ),
        }
    }
}
