// RSA key encoding helpers
//
// Keys are stored and exchanged as base64 text of their standard DER
// encodings: X.509 SubjectPublicKeyInfo for public keys, PKCS#8 for
// private keys.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// Default modulus size for generated keys
pub const DEFAULT_KEY_BITS: usize = 1024;

/// Parse a base64 SubjectPublicKeyInfo public key
pub fn decode_public_key(text: &str) -> Result<RsaPublicKey> {
    let der = BASE64
        .decode(text.trim())
        .context("Public key is not valid base64")?;
    RsaPublicKey::from_public_key_der(&der).context("Public key is not an RSA SubjectPublicKeyInfo")
}

/// Parse a base64 PKCS#8 private key
pub fn decode_private_key(text: &str) -> Result<RsaPrivateKey> {
    let der = BASE64
        .decode(text.trim())
        .context("Private key is not valid base64")?;
    RsaPrivateKey::from_pkcs8_der(&der).context("Private key is not an RSA PKCS#8 key")
}

pub fn encode_public_key(key: &RsaPublicKey) -> Result<String> {
    let der = key
        .to_public_key_der()
        .context("Failed to encode public key")?;
    Ok(BASE64.encode(der.as_bytes()))
}

pub fn encode_private_key(key: &RsaPrivateKey) -> Result<String> {
    let der = key.to_pkcs8_der().context("Failed to encode private key")?;
    Ok(BASE64.encode(der.as_bytes()))
}

/// Generate a fresh key pair
pub fn generate_private_key(bits: usize) -> Result<RsaPrivateKey> {
    let mut rng = rand::rngs::OsRng;
    RsaPrivateKey::new(&mut rng, bits).context("Failed to generate RSA key")
}

/// Short hex fingerprint used to identify a key in logs
pub fn fingerprint(key: &RsaPublicKey) -> String {
    match key.to_public_key_der() {
        Ok(der) => {
            let digest = Sha256::digest(der.as_bytes());
            hex::encode(&digest[..8])
        }
        Err(_) => "unencodable".to_string(),
    }
}
