//! Fuzz target for payload envelope parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pico_core::models::payload::decode_envelope;

fuzz_target!(|data: &[u8]| {
    let _ = decode_envelope(data);
});
