//! Fuzz target for single import-record parsing.
//!
//! Feeds arbitrary byte sequences to the record parser and, when a
//! record parses, pushes it through the converter round trip, checking
//! for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;

use labelwire::ndjson::{deserialize, serialize, ImportRecord};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(record) = serde_json::from_slice::<ImportRecord>(data) else {
        return;
    };

    if let Ok(labels) = deserialize(std::slice::from_ref(&record)) {
        let _ = serialize(&labels);
    }
});
