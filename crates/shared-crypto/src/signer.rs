//! # Local Signer
//!
//! The identity the orderer uses when it mints envelopes of its own
//! (CONFIG results and channel-creation ORDERER_TRANSACTIONs).
//!
//! Identities are raw Ed25519 public keys; signatures are Ed25519 over the
//! marshalled payload bytes.

use crate::CryptoError;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;

/// Nonce length carried in every signature header.
pub const NONCE_SIZE: usize = 24;

/// Signing identity of the local process.
pub trait LocalSigner: Send + Sync {
    /// Serialized creator identity placed in signature headers.
    fn identity(&self) -> Vec<u8>;

    /// Sign the given bytes.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Generate a fresh random nonce for a signature header.
pub fn create_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Ed25519-backed [`LocalSigner`]. The secret key is zeroized on drop.
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    /// Signer with a freshly generated key.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::thread_rng()),
        }
    }

    /// Signer derived from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Public half of the signing key.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Check a signature produced by a creator identity.
    pub fn verify(creator: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let creator: [u8; 32] = creator
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        let verifying_key =
            VerifyingKey::from_bytes(&creator).map_err(|_| CryptoError::InvalidPublicKey)?;
        let signature = Signature::from_slice(signature)
            .map_err(|_| CryptoError::InvalidSignatureFormat(signature.len()))?;

        verifying_key
            .verify(message, &signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl LocalSigner for Ed25519Signer {
    fn identity(&self) -> Vec<u8> {
        self.public_key().to_vec()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(self.signing_key.sign(message).to_bytes().to_vec())
    }
}
