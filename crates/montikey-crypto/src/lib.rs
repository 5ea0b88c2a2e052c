//! MontiKey Cryptographic Primitives
//!
//! Key derivation and cipher building blocks for MontiKey. Pure functions with
//! deterministic outputs. Randomness is never generated here: callers provide
//! random bytes so derivations stay reproducible under test.
//!
//! # Derivation Pipeline
//!
//! Every derivation funnels raw material through SHA-256 and then through a
//! single length-fitting step. Material shorter than the requested key is
//! extended by hash-chaining, longer material is truncated.
//!
//! ```text
//! Raw Material (wireless payload, identifiers, strings)
//!        │
//!        ▼
//! Concatenate factors → SHA-256
//!        │
//!        ▼
//! derive_key_of_length → Key Bytes (n bytes)
//!        │
//!        ▼
//! Optional: random XOR injection, XOR combination, stretching
//! ```
//!
//! # Security
//!
//! Known properties, preserved rather than fixed:
//! - Encryption is CBC with PKCS#7 padding and has no authentication tag.
//!   Ciphertext can be modified without detection.
//! - Stretching is a bare SHA-256 chain, not a salted password KDF.
//! - Derived strength is bounded by the entropy of the inputs. Device
//!   identifiers and intercepted payloads are low-entropy sources.
//!
//! Buffers that hold key material are `zeroize::Zeroizing`, so they are wiped
//! when dropped. Intermediate concatenation buffers are wiped explicitly.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
pub mod kdf;
pub mod primitives;

pub use error::{KdfError, PrimitiveError};
pub use kdf::{
    MIFARE_KEY_LEN, combine_keys, create_context, derive_key_from_factors, derive_key_from_int,
    derive_key_from_string, derive_key_of_length, derive_key_with_context, derive_mifare_key,
    inject_random_component, random_len_for_bits, stretch_key,
};
pub use primitives::{
    AES_IV_LEN, DES_IV_LEN, SHA256_LEN, aes_cbc_decrypt, aes_cbc_encrypt, des_cbc_decrypt,
    des_cbc_encrypt, sha256, to_hex_upper, triple_des_cbc_decrypt, triple_des_cbc_encrypt,
};
