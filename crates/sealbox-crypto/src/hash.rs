use sha2::{Digest, Sha256};

/// SHA-256 of arbitrary bytes → lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Rate-limiter key material: a one-way fingerprint of the bearer credential.
/// The limiter never sees the credential itself, an account id, or a network
/// address — only this digest.
pub fn credential_hash(credential: &str) -> String {
    sha256_hex(credential.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // NIST test vector for "abc".
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn credential_hash_is_deterministic_and_distinct() {
        assert_eq!(credential_hash("tok"), credential_hash("tok"));
        assert_ne!(credential_hash("tok"), credential_hash("tok2"));
    }
}
