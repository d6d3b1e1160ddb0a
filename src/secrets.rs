use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use serde::Deserialize;

use crate::error::{Error, Result};

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;

/// A string that must never leak into logs or serialized output.
/// `Debug` prints a redaction marker; the value is only reachable
/// through [`SecretString::expose`].
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

/// Seals provider access tokens with AES-256-GCM before they are written to
/// the database. The sealed form is `base64(nonce || ciphertext)`; a fresh
/// random 96-bit nonce is drawn per seal, so the same token never produces
/// the same ciphertext twice.
#[derive(Clone)]
pub struct TokenCipher {
    key: [u8; KEY_SIZE],
}

impl TokenCipher {
    /// Builds a cipher from a raw 32-byte key.
    pub fn new(key: &[u8]) -> Result<Self> {
        let key: [u8; KEY_SIZE] = key
            .try_into()
            .map_err(|_| Error::Config(format!("token key must be {KEY_SIZE} bytes")))?;
        Ok(Self { key })
    }

    /// Builds a cipher from a hex-encoded key, the on-disk format of
    /// the `.token_key` file.
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| Error::Config(format!("invalid token key encoding: {e}")))?;
        Self::new(&bytes)
    }

    /// Generates a cipher with a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    #[must_use]
    pub fn key_hex(&self) -> String {
        hex::encode(self.key)
    }

    pub fn seal(&self, plaintext: &SecretString) -> Result<String> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.expose().as_bytes())
            .map_err(|e| Error::Config(format!("failed to seal token: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    pub fn open(&self, sealed: &str) -> Result<SecretString> {
        let bytes = BASE64
            .decode(sealed)
            .map_err(|e| Error::Config(format!("invalid sealed token encoding: {e}")))?;
        if bytes.len() < NONCE_SIZE {
            return Err(Error::Config("sealed token too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| Error::Config(format!("failed to open sealed token: {e}")))?;

        String::from_utf8(plaintext)
            .map(SecretString::new)
            .map_err(|e| Error::Config(format!("sealed token is not utf-8: {e}")))
    }
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenCipher([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_round_trip() {
        let cipher = TokenCipher::generate();
        let token = SecretString::new("gho_abcdef123456");

        let sealed = cipher.seal(&token).unwrap();
        let opened = cipher.open(&sealed).unwrap();

        assert_eq!(opened.expose(), "gho_abcdef123456");
    }

    #[test]
    fn test_seal_is_randomized() {
        let cipher = TokenCipher::generate();
        let token = SecretString::new("gho_abcdef123456");

        let a = cipher.seal(&token).unwrap();
        let b = cipher.seal(&token).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails_to_open() {
        let sealed = TokenCipher::generate()
            .seal(&SecretString::new("gho_abcdef123456"))
            .unwrap();

        assert!(TokenCipher::generate().open(&sealed).is_err());
    }

    #[test]
    fn test_key_round_trips_through_hex() {
        let cipher = TokenCipher::generate();
        let restored = TokenCipher::from_hex(&cipher.key_hex()).unwrap();

        let sealed = cipher.seal(&SecretString::new("gho_token")).unwrap();
        assert_eq!(restored.open(&sealed).unwrap().expose(), "gho_token");
    }

    #[test]
    fn test_short_key_is_rejected() {
        assert!(TokenCipher::new(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_debug_output_is_redacted() {
        let secret = SecretString::new("gho_supersecret");
        let debug = format!("{secret:?}");

        assert!(!debug.contains("gho_supersecret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
