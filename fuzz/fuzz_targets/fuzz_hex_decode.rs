//! Fuzz target for decoding stored values.
//!
//! Values come from etcd and may have been written by anything, so decoding
//! must never panic and must only accept well-formed hex.

#![no_main]

use bolt_monitor::codec::{decode, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|value: &str| {
    // Should never panic
    if let Ok(bytes) = decode("/fuzz", value) {
        assert_eq!(bytes.len() * 2, value.len());
        assert_eq!(encode(&bytes), value.to_ascii_lowercase());
    }
});
