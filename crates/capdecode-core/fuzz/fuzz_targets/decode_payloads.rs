#![no_main]

use capdecode_core::{decode_compressed, decode_full, decode_structured};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = decode_structured(text);
    let _ = decode_full(text);
    let _ = decode_compressed(text);
});
