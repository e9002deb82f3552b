//! Fuzz target for line decoding
//!
//! Feeds arbitrary bytes through the same lossy UTF-8 conversion the receive
//! loop uses, then decodes them. Looks for:
//! - panics on slicing around multi-byte markers
//! - range bounds that overflow `i64`
//! - lines whose text is lost instead of surfaced
//!
//! The decoder should NEVER panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use numbomb_proto::{decode, parse_range, ProtocolEvent};

fuzz_target!(|input: (&[u8], &str)| {
    let (bytes, player) = input;
    let line = String::from_utf8_lossy(bytes);

    match decode(&line, player) {
        ProtocolEvent::Unrecognized { raw } => assert_eq!(raw, line),
        ProtocolEvent::RangeUpdated { min, max } => {
            assert_eq!(parse_range(&line), Ok((min, max)));
        },
        _ => {},
    }
});
