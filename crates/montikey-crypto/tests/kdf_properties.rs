//! Property-based tests for the key derivation engine
//!
//! These tests verify the length-fitting and mixing invariants for ALL inputs,
//! not just specific examples.

use montikey_crypto::{
    aes_cbc_decrypt, aes_cbc_encrypt, combine_keys, derive_key_from_factors, derive_key_of_length,
    inject_random_component, sha256, stretch_key,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: output is always exactly the requested length
    #[test]
    fn prop_derive_key_of_length_is_exact(
        hash in prop::collection::vec(any::<u8>(), 1..64),
        key_len in 1usize..300,
    ) {
        let key = derive_key_of_length(&hash, key_len).unwrap();
        prop_assert_eq!(key.len(), key_len);
    }

    /// Property: truncation returns a prefix of the input
    #[test]
    fn prop_short_requests_are_prefixes(
        hash in prop::collection::vec(any::<u8>(), 1..64),
        cut in any::<prop::sample::Index>(),
    ) {
        let key_len = cut.index(hash.len()) + 1;
        let key = derive_key_of_length(&hash, key_len).unwrap();
        prop_assert_eq!(&key[..], &hash[..key_len]);
    }

    /// Property: a longer derivation extends a shorter one
    #[test]
    fn prop_extension_is_prefix_stable(
        hash in prop::collection::vec(any::<u8>(), 1..40),
        short in 1usize..100,
        extra in 0usize..100,
    ) {
        let a = derive_key_of_length(&hash, short).unwrap();
        let b = derive_key_of_length(&hash, short + extra).unwrap();
        prop_assert_eq!(&b[..short], &a[..]);
    }

    /// Property: factor derivation equals hashing the concatenation
    #[test]
    fn prop_factors_equal_concatenation(
        factors in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..20), 1..6),
        key_len in 1usize..64,
    ) {
        let concatenated: Vec<u8> = factors.iter().flatten().copied().collect();
        let expected = derive_key_of_length(&sha256(&concatenated), key_len).unwrap();
        let key = derive_key_from_factors(&factors, key_len).unwrap();
        prop_assert_eq!(key, expected);
    }

    /// Property: injecting then re-injecting the same bytes restores the key
    #[test]
    fn prop_injection_is_involution(
        key in prop::collection::vec(any::<u8>(), 1..48),
        random in prop::collection::vec(any::<u8>(), 0..48),
    ) {
        let mixed = inject_random_component(&key, &random);
        prop_assert_eq!(mixed.len(), key.len());
        let restored = inject_random_component(&mixed, &random);
        prop_assert_eq!(&restored[..], &key[..]);
    }

    /// Property: combined length is the longest input
    #[test]
    fn prop_combine_length_is_max(
        keys in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 1..5),
    ) {
        let combined = combine_keys(&keys).unwrap();
        let max = keys.iter().map(Vec::len).max().unwrap_or(0);
        prop_assert_eq!(combined.len(), max);
    }

    /// Property: stretching is deterministic and exact-length
    #[test]
    fn prop_stretch_deterministic(
        input in prop::collection::vec(any::<u8>(), 0..32),
        iterations in 1u32..20,
        key_len in 1usize..80,
    ) {
        let a = stretch_key(&input, iterations, key_len).unwrap();
        let b = stretch_key(&input, iterations, key_len).unwrap();
        prop_assert_eq!(a.len(), key_len);
        prop_assert_eq!(a, b);
    }

    /// Property: AES-CBC decrypt inverts encrypt for any plaintext
    #[test]
    fn prop_aes_roundtrip(
        plaintext in prop::collection::vec(any::<u8>(), 0..256),
        key in prop::array::uniform16(any::<u8>()),
        iv in prop::array::uniform16(any::<u8>()),
    ) {
        let ciphertext = aes_cbc_encrypt(&plaintext, &key, &iv).unwrap();
        let decrypted = aes_cbc_decrypt(&ciphertext, &key, &iv).unwrap();
        prop_assert_eq!(decrypted, plaintext);
    }
}
