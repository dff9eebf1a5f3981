//! Session key material derivation.
//!
//! A relay session runs two independent encrypted channels: the relay data
//! channel and the signaling channel. Both derive their key material from the
//! caller's user token plus fresh CSPRNG randomness.
//!
//! The relay channel keys off the backend's one-way transform of the token
//! (`encrypted_token`, opaque to this crate); the signaling channel keys off
//! the raw token bytes. Randomness comes from the OS CSPRNG and a failure to
//! read it is fatal.

use crate::error::RelayError;
use crate::{AES_BLOCK_SIZE, SESSION_RANDOM_SIZE};
use aes::Aes128;
use aes::cipher::{BlockEncrypt, KeyInit};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key material for one relay session.
///
/// `encrypt_key` is `encrypted_token ‖ relay_random` and `decrypt_key` is
/// `relay_random ‖ encrypted_token` - the concatenation order is the only
/// difference, and both sides of a connection must agree on which ordering
/// is which.
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKeyMaterial {
    /// Fresh random half of the relay channel keys
    pub relay_random: [u8; SESSION_RANDOM_SIZE],
    /// `relay_random` encrypted under the transformed token, clamped to 16 bytes
    pub relay_encrypted_random: [u8; SESSION_RANDOM_SIZE],
    /// Relay channel send key
    pub encrypt_key: Vec<u8>,
    /// Relay channel receive key
    pub decrypt_key: Vec<u8>,
    /// Fresh random seed for the signaling channel
    pub signaling_seed: [u8; SESSION_RANDOM_SIZE],
    /// `signaling_seed` encrypted under the raw token, clamped to 16 bytes
    pub signaling_ticket: [u8; SESSION_RANDOM_SIZE],
}

impl SessionKeyMaterial {
    /// Derive key material from a user token and its backend transform.
    ///
    /// Draws 32 bytes from the OS CSPRNG (16 per channel) and runs the
    /// deterministic derivation in [`SessionKeyMaterial::derive_with`].
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RandomFailed`] if the CSPRNG fails, or
    /// [`RelayError::Cipher`] if cipher initialization fails.
    pub fn derive(user_token: &str, encrypted_token: &[u8]) -> Result<Self, RelayError> {
        let mut relay_random = [0u8; SESSION_RANDOM_SIZE];
        getrandom::getrandom(&mut relay_random).map_err(|_| RelayError::RandomFailed)?;

        let mut signaling_seed = [0u8; SESSION_RANDOM_SIZE];
        getrandom::getrandom(&mut signaling_seed).map_err(|_| RelayError::RandomFailed)?;

        Self::derive_with(user_token, encrypted_token, relay_random, signaling_seed)
    }

    /// Deterministic core of the derivation, with randomness supplied.
    ///
    /// Same token and same random blocks always produce the same material.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Cipher`] if cipher initialization fails.
    pub fn derive_with(
        user_token: &str,
        encrypted_token: &[u8],
        relay_random: [u8; SESSION_RANDOM_SIZE],
        signaling_seed: [u8; SESSION_RANDOM_SIZE],
    ) -> Result<Self, RelayError> {
        let relay_encrypted_random = clamp_block(&aes_ecb_encrypt(&relay_random, encrypted_token)?);

        let mut encrypt_key = Vec::with_capacity(encrypted_token.len() + relay_random.len());
        encrypt_key.extend_from_slice(encrypted_token);
        encrypt_key.extend_from_slice(&relay_random);

        let mut decrypt_key = Vec::with_capacity(encrypted_token.len() + relay_random.len());
        decrypt_key.extend_from_slice(&relay_random);
        decrypt_key.extend_from_slice(encrypted_token);

        let signaling_ticket =
            clamp_block(&aes_ecb_encrypt(&signaling_seed, user_token.as_bytes())?);

        Ok(Self {
            relay_random,
            relay_encrypted_random,
            encrypt_key,
            decrypt_key,
            signaling_seed,
            signaling_ticket,
        })
    }
}

/// Encrypt `plaintext` with AES-128 in ECB mode.
///
/// The key is clamped to the AES-128 key size (truncated, or zero-padded when
/// shorter) and the input is PKCS#7-padded, so the output is always a whole
/// number of blocks and at least one block longer than the input.
///
/// ECB carries no intra-block chaining; it is used here only to mix fixed-size
/// random blocks with token-derived keys, never for bulk data.
///
/// # Errors
///
/// Returns [`RelayError::Cipher`] if cipher initialization fails.
pub fn aes_ecb_encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, RelayError> {
    let mut clamped = [0u8; AES_BLOCK_SIZE];
    let take = key.len().min(AES_BLOCK_SIZE);
    clamped[..take].copy_from_slice(&key[..take]);

    let cipher = Aes128::new_from_slice(&clamped).map_err(|_| RelayError::Cipher)?;

    let pad = AES_BLOCK_SIZE - plaintext.len() % AES_BLOCK_SIZE;
    let mut out = Vec::with_capacity(plaintext.len() + pad);
    out.extend_from_slice(plaintext);
    out.resize(plaintext.len() + pad, pad as u8);

    for chunk in out.chunks_exact_mut(AES_BLOCK_SIZE) {
        let block = aes::Block::from_mut_slice(chunk);
        cipher.encrypt_block(block);
    }

    Ok(out)
}

/// First 16 bytes of an ECB output block sequence.
fn clamp_block(data: &[u8]) -> [u8; SESSION_RANDOM_SIZE] {
    let mut out = [0u8; SESSION_RANDOM_SIZE];
    out.copy_from_slice(&data[..SESSION_RANDOM_SIZE]);
    out
}
