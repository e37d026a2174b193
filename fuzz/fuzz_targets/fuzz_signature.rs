#![no_main]

use keyward_core::signature::{decode_signature, encode_signature, is_low_s};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(signature) = decode_signature(data) {
        assert!(is_low_s(signature.s()));

        // Canonical output is stable under re-encoding
        let der = encode_signature(signature.r(), signature.s())
            .expect("canonical scalars must encode");
        let again = decode_signature(&der).expect("re-encoded signature must decode");
        assert_eq!(again, signature);
    }
});
