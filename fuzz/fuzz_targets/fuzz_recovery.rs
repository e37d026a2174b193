#![no_main]

use arbitrary::Arbitrary;
use keyward_core::recovery::{recover_address, resolve};
use keyward_core::signature::normalize;
use keyward_core::{Address, MessageHash, RecoveryCandidates, Resolution};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    digest: [u8; 32],
    r: [u8; 32],
    s: [u8; 32],
    address: [u8; 20],
}

fuzz_target!(|input: Input| {
    let Ok(signature) = normalize(input.r, input.s) else {
        return;
    };
    let digest = MessageHash::new(input.digest);

    // Resolving against a recovered address must pick that parity
    for y_odd in [false, true] {
        if let Some(address) = recover_address(&digest, &signature, y_odd) {
            let resolution = resolve(&address, &digest, &signature, RecoveryCandidates::legacy());
            assert!(matches!(resolution, Resolution::Resolved(_)));
        }
    }

    // Arbitrary addresses never panic
    let _ = resolve(
        &Address::new(input.address),
        &digest,
        &signature,
        RecoveryCandidates::legacy(),
    );
});
