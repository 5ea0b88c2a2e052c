//! Cipher and hash primitives.
//!
//! Thin wrappers over the RustCrypto block ciphers in CBC mode with PKCS#7
//! padding. All functions are pure: the IV is supplied by the caller.
//!
//! # Security
//!
//! CBC without a MAC is malleable and, when decryption errors are observable,
//! open to padding-oracle attacks. DES is broken. Both are kept for
//! compatibility with the key material this crate handles.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{
    BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit, block_padding::Pkcs7,
};
use des::{Des, TdesEde2, TdesEde3};
use sha2::{Digest, Sha256};

use crate::error::PrimitiveError;

/// SHA-256 digest size (32 bytes)
pub const SHA256_LEN: usize = 32;

/// AES block and IV size (16 bytes)
pub const AES_IV_LEN: usize = 16;

/// DES / 3DES block and IV size (8 bytes)
pub const DES_IV_LEN: usize = 8;

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; SHA256_LEN] {
    let mut out = [0u8; SHA256_LEN];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Render bytes as uppercase hexadecimal.
pub fn to_hex_upper(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Encrypt with AES-CBC. Key length selects AES-128, AES-192 or AES-256.
pub fn aes_cbc_encrypt(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    check_iv(iv, AES_IV_LEN)?;
    match key.len() {
        16 => cbc_encrypt::<Aes128>(data, key, iv, "AES"),
        24 => cbc_encrypt::<Aes192>(data, key, iv, "AES"),
        32 => cbc_encrypt::<Aes256>(data, key, iv, "AES"),
        actual => Err(PrimitiveError::InvalidKeyLength { cipher: "AES", actual }),
    }
}

/// Decrypt AES-CBC ciphertext produced by [`aes_cbc_encrypt`].
pub fn aes_cbc_decrypt(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    check_iv(iv, AES_IV_LEN)?;
    match key.len() {
        16 => cbc_decrypt::<Aes128>(data, key, iv, "AES"),
        24 => cbc_decrypt::<Aes192>(data, key, iv, "AES"),
        32 => cbc_decrypt::<Aes256>(data, key, iv, "AES"),
        actual => Err(PrimitiveError::InvalidKeyLength { cipher: "AES", actual }),
    }
}

/// Encrypt with single DES in CBC mode. Requires an 8-byte key.
pub fn des_cbc_encrypt(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    check_iv(iv, DES_IV_LEN)?;
    cbc_encrypt::<Des>(data, key, iv, "DES")
}

/// Decrypt single-DES CBC ciphertext.
pub fn des_cbc_decrypt(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    check_iv(iv, DES_IV_LEN)?;
    cbc_decrypt::<Des>(data, key, iv, "DES")
}

/// Encrypt with triple DES (EDE) in CBC mode.
///
/// A 16-byte key selects two-key 3DES, a 24-byte key three-key 3DES.
pub fn triple_des_cbc_encrypt(
    data: &[u8],
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, PrimitiveError> {
    check_iv(iv, DES_IV_LEN)?;
    match key.len() {
        16 => cbc_encrypt::<TdesEde2>(data, key, iv, "3DES"),
        24 => cbc_encrypt::<TdesEde3>(data, key, iv, "3DES"),
        actual => Err(PrimitiveError::InvalidKeyLength { cipher: "3DES", actual }),
    }
}

/// Decrypt triple-DES CBC ciphertext.
pub fn triple_des_cbc_decrypt(
    data: &[u8],
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, PrimitiveError> {
    check_iv(iv, DES_IV_LEN)?;
    match key.len() {
        16 => cbc_decrypt::<TdesEde2>(data, key, iv, "3DES"),
        24 => cbc_decrypt::<TdesEde3>(data, key, iv, "3DES"),
        actual => Err(PrimitiveError::InvalidKeyLength { cipher: "3DES", actual }),
    }
}

fn check_iv(iv: &[u8], expected: usize) -> Result<(), PrimitiveError> {
    if iv.len() == expected {
        Ok(())
    } else {
        Err(PrimitiveError::InvalidIvLength { expected, actual: iv.len() })
    }
}

fn cbc_encrypt<C>(
    data: &[u8],
    key: &[u8],
    iv: &[u8],
    cipher: &'static str,
) -> Result<Vec<u8>, PrimitiveError>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| PrimitiveError::InvalidKeyLength { cipher, actual: key.len() })?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(data))
}

fn cbc_decrypt<C>(
    data: &[u8],
    key: &[u8],
    iv: &[u8],
    cipher: &'static str,
) -> Result<Vec<u8>, PrimitiveError>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| PrimitiveError::InvalidKeyLength { cipher, actual: key.len() })?;
    decryptor.decrypt_padded_vec_mut::<Pkcs7>(data).map_err(|_| PrimitiveError::Padding { cipher })
}
