//! Password-based sealing of provider API keys.
//!
//! A sealed blob is self-contained: `salt[16] || nonce[12] || ciphertext || tag[16]`,
//! base64 encoded (standard alphabet, padded). The key is PBKDF2-HMAC-SHA256 over the
//! password and the embedded salt; the cipher is AES-256-GCM.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CipherError;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

/// Offset of the ciphertext inside a decoded blob.
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;

pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = MIN_PBKDF2_ITERATIONS;

/// Key derivation cost. The same value must be used to open a blob as was used to
/// seal it; a mismatch is indistinguishable from a wrong password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherParams {
    iterations: u32,
}

impl CipherParams {
    pub fn new(iterations: u32) -> Result<Self, CipherError> {
        if iterations < MIN_PBKDF2_ITERATIONS {
            return Err(CipherError::IterationsTooLow(iterations));
        }
        Ok(Self { iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for CipherParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

/// Encrypts `plaintext` on the blocking pool with a fresh salt and nonce.
pub async fn encrypt(
    plaintext: &str,
    password: &str,
    params: CipherParams,
) -> Result<String, CipherError> {
    let plaintext = Zeroizing::new(plaintext.to_owned());
    let password = Zeroizing::new(password.to_owned());
    tokio::task::spawn_blocking(move || seal(&plaintext, &password, params)).await?
}

/// Decrypts a blob produced by [`encrypt`] on the blocking pool.
pub async fn decrypt(
    blob: &str,
    password: &str,
    params: CipherParams,
) -> Result<Zeroizing<String>, CipherError> {
    let blob = blob.to_owned();
    let password = Zeroizing::new(password.to_owned());
    tokio::task::spawn_blocking(move || open(&blob, &password, params)).await?
}

/// Synchronous form of [`encrypt`].
pub fn seal(plaintext: &str, password: &str, params: CipherParams) -> Result<String, CipherError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(nonce.as_slice());

    seal_with(plaintext, password, &salt, &nonce_bytes, params)
}

/// Synchronous form of [`decrypt`].
pub fn open(
    blob: &str,
    password: &str,
    params: CipherParams,
) -> Result<Zeroizing<String>, CipherError> {
    let raw = BASE64
        .decode(blob.as_bytes())
        .map_err(|_| CipherError::Authentication)?;
    if raw.len() < HEADER_LEN + TAG_LEN {
        return Err(CipherError::Authentication);
    }

    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(password, salt, params.iterations);
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| CipherError::Authentication)?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Authentication)?,
    );

    let text = std::str::from_utf8(&plaintext).map_err(|_| CipherError::Authentication)?;
    Ok(Zeroizing::new(text.to_owned()))
}

fn seal_with(
    plaintext: &str,
    password: &str,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
    params: CipherParams,
) -> Result<String, CipherError> {
    let key = derive_key(password, salt, params.iterations);
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| CipherError::Encryption)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext.as_bytes())
        .map_err(|_| CipherError::Encryption)?;

    let mut blob = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    blob.extend_from_slice(salt);
    blob.extend_from_slice(nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(blob))
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key[..]);
    key
}
