//! Credential encryption for stored broker secrets.
//!
//! A master secret is digested into a fixed-length key; per-user keys are
//! derived from it with Argon2id so that compromising one user's key does
//! not expose another's. Secrets are sealed with ChaCha20-Poly1305 and a
//! fresh random nonce on every call.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::errors::{BrokerSyncError, Result};

/// ChaCha20-Poly1305 nonce size in bytes.
const NONCE_LEN: usize = 12;

/// Minimum master secret length in characters.
const MIN_MASTER_SECRET_LEN: usize = 32;

/// Argon2 memory cost (19 MiB).
const ARGON2_M_COST: u32 = 19_456;
/// Argon2 iteration count.
const ARGON2_T_COST: u32 = 2;
/// Argon2 parallelism.
const ARGON2_P_COST: u32 = 1;

/// Ciphertext plus the nonce it was sealed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

impl EncryptedPayload {
    /// Encodes the payload as a single storable string, `nonce.ciphertext`
    /// with both parts base64.
    pub fn encode(&self) -> String {
        format!("{}.{}", BASE64.encode(&self.nonce), BASE64.encode(&self.ciphertext))
    }

    /// Parses the string form produced by [`encode`](Self::encode).
    pub fn decode(encoded: &str) -> Result<Self> {
        let (nonce_part, cipher_part) = encoded.split_once('.').ok_or_else(|| {
            BrokerSyncError::InvalidInput("Encrypted payload is missing the nonce separator".into())
        })?;
        let nonce = BASE64
            .decode(nonce_part)
            .map_err(|e| BrokerSyncError::InvalidInput(format!("Failed to decode nonce: {e}")))?;
        let ciphertext = BASE64.decode(cipher_part).map_err(|e| {
            BrokerSyncError::InvalidInput(format!("Failed to decode ciphertext: {e}"))
        })?;
        Ok(Self { ciphertext, nonce })
    }
}

/// Authenticated encryption of broker credentials with per-user keys.
pub struct CredentialEncryptor {
    master_key: [u8; 32],
}

impl CredentialEncryptor {
    /// Creates an encryptor from the master secret.
    ///
    /// The secret must be at least 32 characters; it is digested to the
    /// internal 256-bit master key.
    pub fn new(master_secret: &str) -> Result<Self> {
        if master_secret.len() < MIN_MASTER_SECRET_LEN {
            return Err(BrokerSyncError::Config(format!(
                "Master secret must be at least {} characters",
                MIN_MASTER_SECRET_LEN
            )));
        }
        let digest = Sha256::digest(master_secret.as_bytes());
        let mut master_key = [0u8; 32];
        master_key.copy_from_slice(&digest);
        Ok(Self { master_key })
    }

    /// Derives the deterministic 256-bit key for one user.
    ///
    /// Argon2id keyed on the master key, salted with a digest of the user id
    /// so short ids still salt correctly.
    pub fn derive_key(&self, user_id: &str) -> Result<[u8; 32]> {
        let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
            .map_err(|e| BrokerSyncError::Crypto(format!("Invalid Argon2 params: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = Sha256::digest(user_id.as_bytes());
        let mut key = [0u8; 32];
        argon2
            .hash_password_into(&self.master_key, &salt, &mut key)
            .map_err(|e| BrokerSyncError::Crypto(format!("Key derivation failed: {e}")))?;
        Ok(key)
    }

    /// Encrypts a secret for one user, returning ciphertext and the fresh
    /// nonce it was sealed with.
    pub fn encrypt(&self, plaintext: &str, user_id: &str) -> Result<EncryptedPayload> {
        let key = self.derive_key(user_id)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| BrokerSyncError::Crypto("Failed to encrypt secret".into()))?;

        Ok(EncryptedPayload {
            ciphertext,
            nonce: nonce_bytes.to_vec(),
        })
    }

    /// Decrypts a secret for one user.
    ///
    /// An empty or wrong-size nonce is rejected as invalid input; an
    /// authentication-tag mismatch is reported as a decryption failure.
    /// Callers rely on the distinction.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &[u8], user_id: &str) -> Result<String> {
        if nonce.len() != NONCE_LEN {
            return Err(BrokerSyncError::InvalidInput(format!(
                "Nonce must be exactly {} bytes, got {}",
                NONCE_LEN,
                nonce.len()
            )));
        }

        let key = self.derive_key(user_id)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| BrokerSyncError::DecryptionFailed)?;

        String::from_utf8(plaintext)
            .map_err(|_| BrokerSyncError::InvalidInput("Decrypted secret is not UTF-8".into()))
    }

    /// Encrypts straight to the storable string form.
    pub fn encrypt_to_string(&self, plaintext: &str, user_id: &str) -> Result<String> {
        Ok(self.encrypt(plaintext, user_id)?.encode())
    }

    /// Decrypts from the storable string form.
    pub fn decrypt_from_string(&self, encoded: &str, user_id: &str) -> Result<String> {
        let payload = EncryptedPayload::decode(encoded)?;
        self.decrypt(&payload.ciphertext, &payload.nonce, user_id)
    }
}
