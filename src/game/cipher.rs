// Session cipher for post-handshake traffic
//
// AES-128 in ECB mode with PKCS#7 padding, keyed by the 16-byte session key
// negotiated during login. This is deterministic and unauthenticated: equal
// plaintext blocks produce equal ciphertext blocks, and a tampered frame is
// only caught if it breaks the padding. It is kept this way so the record
// format stays bit-compatible with existing clients.

use crate::game::error::CryptoError;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use rand::RngCore;

type Aes128EcbEnc = ecb::Encryptor<aes::Aes128>;
type Aes128EcbDec = ecb::Decryptor<aes::Aes128>;

/// Session key length in bytes
pub const SESSION_KEY_LEN: usize = 16;

/// AES block size in bytes
pub const BLOCK_LEN: usize = 16;

/// Symmetric cipher bound to one session key
#[derive(Clone)]
pub struct SessionCipher {
    key: [u8; SESSION_KEY_LEN],
}

impl SessionCipher {
    /// Create a cipher from a raw 16-byte key
    pub fn new(key: [u8; SESSION_KEY_LEN]) -> Self {
        Self { key }
    }

    /// Create a cipher from a decrypted key blob, checking its length
    pub fn from_slice(key: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; SESSION_KEY_LEN] = key
            .try_into()
            .map_err(|_| CryptoError::BadKeyLength(key.len()))?;
        Ok(Self::new(key))
    }

    /// Draw a fresh random session key from the OS generator
    pub fn generate_key() -> [u8; SESSION_KEY_LEN] {
        let mut key = [0u8; SESSION_KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut key);
        key
    }

    /// Raw key bytes, as sent (RSA-wrapped) to the client
    pub fn key(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.key
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        Aes128EcbEnc::new(&self.key.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CryptoError::BadLength(ciphertext.len()));
        }

        Aes128EcbDec::new(&self.key.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::BadPadding)
    }
}

impl std::fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCipher").finish_non_exhaustive()
    }
}
