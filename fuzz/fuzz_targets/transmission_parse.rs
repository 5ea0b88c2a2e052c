//! Fuzz target for the transmission block parser
//!
//! Arbitrary text must parse or fail with an error, never panic. Anything
//! that parses must survive a format/parse cycle unchanged.

#![no_main]

use libfuzzer_sys::fuzz_target;
use montikey_proto::{format_transmission, parse_transmission};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(parsed) = parse_transmission(text) {
        let reparsed = parse_transmission(&format_transmission(&parsed))
            .expect("formatted block must parse");
        assert_eq!(reparsed, parsed);
    }
});
