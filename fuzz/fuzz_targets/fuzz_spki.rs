#![no_main]

use keyward_core::spki::{decode_public_key, encode_public_key};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Try to parse - should not panic
    if let Ok(public_key) = decode_public_key(data) {
        // Anything accepted must re-encode to a form that decodes identically
        let reencoded = encode_public_key(&public_key);
        let decoded = decode_public_key(&reencoded).expect("re-encoded SPKI must decode");
        assert_eq!(decoded, public_key);
    }
});
