//! Fuzz target for the compact `id|checksum|timestamp|data` parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use montikey_proto::{format_compact, parse_compact};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(parsed) = parse_compact(text) {
        let reparsed =
            parse_compact(&format_compact(&parsed)).expect("formatted line must parse");
        assert_eq!(reparsed, parsed);
    }
});
