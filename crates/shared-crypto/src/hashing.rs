//! # SHA-256 Hashing
//!
//! Block headers, block data and transaction IDs are all SHA-256 digests.

use sha2::{Digest, Sha256};

/// SHA-256 output (256-bit).
pub type Hash = [u8; 32];

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash the concatenation of multiple inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_many_matches_concatenation() {
        assert_eq!(sha256_many(&[b"ab", b"c"]), sha256(b"abc"));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(sha256_many(&[]), sha256(b""));
    }
}
