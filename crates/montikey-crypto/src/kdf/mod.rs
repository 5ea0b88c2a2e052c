//! Key Derivation Engine
//!
//! Stateless functions turning arbitrary-length input material into
//! fixed-length key bytes. [`derive_key_of_length`] is the single length
//! fitting step every other derivation ends in.

mod derivation;
mod mixing;

pub use derivation::{
    MIFARE_KEY_LEN, create_context, derive_key_from_factors, derive_key_from_int,
    derive_key_from_string, derive_key_of_length, derive_key_with_context, derive_mifare_key,
};
pub use mixing::{combine_keys, inject_random_component, random_len_for_bits, stretch_key};
