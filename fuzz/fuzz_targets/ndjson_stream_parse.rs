//! Fuzz target for NDJSON stream parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the NDJSON reader,
//! checking for panics, crashes, or hangs.

#![no_main]

use labelwire::ndjson::io::from_ndjson_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_ndjson_slice(data);
});
