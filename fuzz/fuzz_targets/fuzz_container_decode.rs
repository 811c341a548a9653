//! Fuzz target for container decoding.
//!
//! Arbitrary bytes must never panic the decoder. Anything that decodes must
//! re-encode to a container that decodes to the same fields.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pico_core::container::{decode, encode};

fuzz_target!(|data: &[u8]| {
    if let Ok(container) = decode(data) {
        let bytes = encode(&container).expect("decoded container must re-encode");
        assert_eq!(decode(&bytes).expect("re-encoded container must decode"), container);
    }
});
