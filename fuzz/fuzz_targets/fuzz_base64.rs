#![no_main]

use base64_external::{engine::general_purpose::STANDARD, Engine};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Encode roundtrip, both alphabets
    let encoded = strict_base64::encode(data);
    let decoded = strict_base64::decode(&encoded).expect("own encoding must decode");
    assert_eq!(data, &decoded[..], "Roundtrip failed");

    let encoded_url = strict_base64::encode_url_safe(data);
    let decoded_url = strict_base64::decode(&encoded_url).expect("own encoding must decode");
    assert_eq!(data, &decoded_url[..], "URL-safe roundtrip failed");

    // Conformance with external crate
    assert_eq!(encoded, STANDARD.encode(data), "External crate encode mismatch");

    // Arbitrary input must never panic, and strict acceptance must agree with
    // the external decoder once '-' and '_' are mapped to '+' and '/'
    let ours = strict_base64::decode(data);
    let normalized: Vec<u8> = data
        .iter()
        .map(|&b| match b {
            b'-' => b'+',
            b'_' => b'/',
            other => other,
        })
        .collect();
    match (ours, STANDARD.decode(&normalized)) {
        (Ok(ours), Ok(theirs)) => assert_eq!(ours, theirs, "Decode mismatch"),
        (Err(_), Err(_)) => {}
        (ours, theirs) => panic!("Acceptance mismatch: ours {:?}, external {:?}", ours, theirs),
    }

    // Buffer decode agrees with owned decode
    if let Ok(len) = strict_base64::decoded_len(data) {
        let mut buf = vec![0u8; len];
        match (strict_base64::decode_into(&mut buf, data), strict_base64::decode(data)) {
            (Ok(written), Ok(owned)) => assert_eq!(&buf[..written], &owned[..]),
            (Err(a), Err(b)) => assert_eq!(a, b),
            (a, b) => panic!("decode_into {:?} vs decode {:?}", a, b),
        }
    }
});
