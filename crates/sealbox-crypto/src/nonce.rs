use rand::rngs::OsRng;
use rand::RngCore;
use sealbox_core::constants::NONCE_BYTES;

/// Draw a fresh 32-byte challenge nonce from the OS RNG.
///
/// Issued for every challenge request whether or not the account exists, so
/// the response is indistinguishable to an existence probe.
pub fn challenge_nonce() -> [u8; NONCE_BYTES] {
    let mut nonce = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonces_do_not_repeat() {
        assert_ne!(challenge_nonce(), challenge_nonce());
    }
}
