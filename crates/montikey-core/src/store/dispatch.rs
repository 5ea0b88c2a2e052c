//! Algorithm-tag dispatch onto CBC primitives.
//!
//! Ciphertext layout is `IV || CBC(PKCS#7(plaintext))`. The IV is drawn from
//! the environment on every encryption.

use montikey_crypto::{
    AES_IV_LEN, DES_IV_LEN, PrimitiveError, aes_cbc_decrypt, aes_cbc_encrypt, des_cbc_decrypt,
    des_cbc_encrypt, triple_des_cbc_decrypt, triple_des_cbc_encrypt,
};

use super::StoreError;
use crate::{env::Environment, key::AlgorithmType};

type CipherFn = fn(&[u8], &[u8], &[u8]) -> Result<Vec<u8>, PrimitiveError>;

struct CbcSuite {
    iv_len: usize,
    encrypt: CipherFn,
    decrypt: CipherFn,
}

fn suite(algorithm: AlgorithmType) -> Result<CbcSuite, StoreError> {
    match algorithm {
        AlgorithmType::Aes128 | AlgorithmType::Aes256 => Ok(CbcSuite {
            iv_len: AES_IV_LEN,
            encrypt: aes_cbc_encrypt,
            decrypt: aes_cbc_decrypt,
        }),
        AlgorithmType::Des => Ok(CbcSuite {
            iv_len: DES_IV_LEN,
            encrypt: des_cbc_encrypt,
            decrypt: des_cbc_decrypt,
        }),
        AlgorithmType::TripleDes => Ok(CbcSuite {
            iv_len: DES_IV_LEN,
            encrypt: triple_des_cbc_encrypt,
            decrypt: triple_des_cbc_decrypt,
        }),
        AlgorithmType::MifareClassic => Err(StoreError::UnsupportedAlgorithm { algorithm }),
    }
}

pub(super) fn encrypt<E: Environment>(
    env: &E,
    algorithm: AlgorithmType,
    key: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, StoreError> {
    let suite = suite(algorithm)?;
    let iv = env.random_vec(suite.iv_len)?;
    let ciphertext = (suite.encrypt)(plaintext, key, &iv)?;

    let mut output = Vec::with_capacity(iv.len() + ciphertext.len());
    output.extend_from_slice(&iv);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

pub(super) fn decrypt(
    algorithm: AlgorithmType,
    key: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, StoreError> {
    let suite = suite(algorithm)?;
    if data.len() < suite.iv_len {
        return Err(StoreError::invalid(format!(
            "ciphertext of {} bytes is shorter than the {}-byte IV",
            data.len(),
            suite.iv_len
        )));
    }

    let (iv, ciphertext) = data.split_at(suite.iv_len);
    Ok((suite.decrypt)(ciphertext, key, iv)?)
}
