use ed25519_dalek::{Signature, VerifyingKey};
use sealbox_core::types::{DetachedSig, IdentityKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("public key is not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// Verify a detached Ed25519 signature over `message`.
///
/// [`IdentityKey`] and [`DetachedSig`] are fixed-size, so length checks
/// happen before this call; what remains is rejecting keys that decode to
/// no valid curve point and signatures that fail strict verification.
pub fn verify_signature(
    public_key: &IdentityKey,
    message: &[u8],
    signature: &DetachedSig,
) -> Result<(), SignatureError> {
    let vk = VerifyingKey::from_bytes(public_key.as_bytes())
        .map_err(|_| SignatureError::InvalidPublicKey)?;
    let sig = Signature::from_bytes(signature.as_bytes());
    vk.verify_strict(message, &sig)
        .map_err(|_| SignatureError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::KeyPair;

    #[test]
    fn sign_verify_round_trip() {
        let kp = KeyPair::generate();
        let message = b"a blind relay keeps no ledger of who spoke";
        let sig = kp.sign(message);
        assert!(verify_signature(&kp.public_key(), message, &sig).is_ok());
    }

    #[test]
    fn tampered_message_fails() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"original");
        assert!(verify_signature(&kp.public_key(), b"tampered", &sig).is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let sig = kp.sign(b"message");
        assert!(verify_signature(&other.public_key(), b"message", &sig).is_err());
    }

    #[test]
    fn all_zero_key_is_rejected_before_verification() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"message");
        // 32 zero bytes decode to no valid public key.
        let bogus = IdentityKey([0u8; 32]);
        assert!(matches!(
            verify_signature(&bogus, b"message", &sig),
            Err(SignatureError::InvalidSignature) | Err(SignatureError::InvalidPublicKey)
        ));
    }
}
