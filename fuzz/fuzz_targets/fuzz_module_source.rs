//! Fuzz target for module source compilation.
//!
//! Arbitrary text must only ever produce a module or an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pico_core::models::KindCatalog;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let catalog = KindCatalog::with_builtin();
        if let Ok((_, module)) = catalog.compile(text) {
            let _ = module.construct(&[]);
        }
    }
});
