//! Stateful encoder tying keys to the transport format

use std::collections::BTreeMap;

use montikey_core::{
    AlgorithmType, DerivedKey, Environment, KeyMetadata, KeySource, SecurityContext,
};
use montikey_crypto::{sha256, to_hex_upper};
use zeroize::Zeroizing;

use crate::{
    checksum::{calculate_checksum, verify_checksum},
    codec::encode_bytes,
    compact::{format_compact, parse_compact},
    encoded::EncodedKey,
    errors::{Result, TransportError},
    transmission::{format_transmission, parse_transmission},
};

/// Hex characters of SHA-256 kept in secure identifiers.
const IDENTIFIER_HASH_CHARS: usize = 12;

/// Encodes keys for transport and imports them back.
///
/// Each encoder has its own [`SecurityContext`] named
/// `MONTI_ENCODER_<millis>`.
pub struct KeyEncoder<E: Environment> {
    env: E,
    context: SecurityContext,
}

impl<E: Environment> KeyEncoder<E> {
    /// Create an encoder.
    pub fn new(env: E) -> Self {
        let now = env.now_millis();
        let context = SecurityContext::with_prefix("MONTI_ENCODER", now);
        context.log_operation(now, "encoder initialized");
        Self { env, context }
    }

    /// Project a key into its transport form.
    ///
    /// Metadata carries `algorithm`, `source`, `length` (bits) and `version`.
    pub fn encode_key(&self, key: &DerivedKey) -> EncodedKey {
        let bytes = key.key_bytes();
        let now = self.env.now_millis();
        let key_metadata = key.metadata();

        let mut metadata = BTreeMap::new();
        metadata.insert("algorithm".to_string(), key_metadata.algorithm().to_string());
        metadata.insert("source".to_string(), key_metadata.source().to_string());
        metadata.insert("length".to_string(), key.key_length_bits().to_string());
        metadata.insert("version".to_string(), key_metadata.version().to_string());

        let encoded = EncodedKey {
            key_id: key.key_id().to_string(),
            encoded_text: encode_bytes(&bytes),
            checksum: calculate_checksum(&bytes),
            timestamp_millis: now,
            metadata,
        };

        self.context.log_operation(now, &format!("encoded key {}", key.key_id()));
        tracing::debug!(key_id = key.key_id(), "encoded key");
        encoded
    }

    /// Encode several keys, preserving order.
    pub fn encode_batch(&self, keys: &[DerivedKey]) -> Vec<EncodedKey> {
        let encoded: Vec<EncodedKey> = keys.iter().map(|key| self.encode_key(key)).collect();
        let now = self.env.now_millis();
        self.context.log_operation(now, &format!("encoded batch of {} keys", encoded.len()));
        encoded
    }

    /// Key bytes recovered from the encoded text.
    pub fn decode(&self, encoded: &EncodedKey) -> Zeroizing<Vec<u8>> {
        let now = self.env.now_millis();
        self.context.log_operation(now, &format!("decoded key {}", encoded.key_id));
        encoded.decoded_bytes()
    }

    /// Whether `original_key` matches the checksum carried by `encoded`.
    pub fn verify_checksum(&self, encoded: &EncodedKey, original_key: &[u8]) -> bool {
        let valid = verify_checksum(original_key, &encoded.checksum);
        if !valid {
            tracing::warn!(key_id = %encoded.key_id, "checksum mismatch");
        }
        valid
    }

    /// Render the multi-line transmission block.
    pub fn format_transmission(&self, encoded: &EncodedKey) -> String {
        format_transmission(encoded)
    }

    /// Parse a transmission block.
    pub fn parse_transmission(&self, text: &str) -> Result<EncodedKey> {
        let parsed = parse_transmission(text);
        self.log_parse("transmission", &parsed);
        parsed
    }

    /// Render the single-line compact form.
    pub fn format_compact(&self, encoded: &EncodedKey) -> String {
        format_compact(encoded)
    }

    /// Parse the single-line compact form.
    pub fn parse_compact(&self, text: &str) -> Result<EncodedKey> {
        let parsed = parse_compact(text);
        self.log_parse("compact", &parsed);
        parsed
    }

    fn log_parse(&self, form: &'static str, parsed: &Result<EncodedKey>) {
        let now = self.env.now_millis();
        match parsed {
            Ok(encoded) => {
                self.context.log_operation(now, &format!("parsed {form} for {}", encoded.key_id));
            },
            Err(err) => {
                self.context.log_operation(now, &format!("rejected {form}: {err}"));
                tracing::warn!(form, error = %err, "malformed transport text");
            },
        }
    }

    /// Uppercase hex of the decoded key bytes.
    pub fn to_hex(&self, encoded: &EncodedKey) -> String {
        to_hex_upper(&encoded.decoded_bytes())
    }

    /// `<prefix>_<first 12 hex chars of SHA-256(data)>_<millis>`.
    pub fn generate_secure_identifier(&self, prefix: &str, data: &[u8]) -> String {
        let digest = to_hex_upper(&sha256(data));
        format!("{prefix}_{}_{}", &digest[..IDENTIFIER_HASH_CHARS], self.env.now_millis())
    }

    /// Human-readable report for an encoded key.
    ///
    /// Reports the encoded length, never the encoded text itself.
    pub fn key_summary(&self, encoded: &EncodedKey) -> String {
        let mut summary = String::from("=== MontiKey Summary ===\n");
        summary.push_str(&format!("Key ID: {}\n", encoded.key_id));
        summary.push_str(&format!("Checksum: {}\n", encoded.checksum));
        summary.push_str(&format!("Timestamp: {}\n", encoded.timestamp_millis));
        summary.push_str(&format!(
            "Encoded Length: {} characters\n",
            encoded.encoded_text.chars().count()
        ));
        summary.push_str("Metadata:\n");
        for (name, value) in &encoded.metadata {
            summary.push_str(&format!("  {name}: {value}\n"));
        }
        summary
    }

    /// Rebuild a key from its transport form.
    ///
    /// The checksum is verified against the decoded bytes first. Algorithm,
    /// source and version come from metadata and default to `AES_128`,
    /// `MANUAL` and 1. The creation time is the encoding timestamp.
    ///
    /// # Errors
    ///
    /// - `ChecksumMismatch` if the decoded bytes do not match
    /// - `UnknownTag` / `InvalidMetadata` for unreadable metadata
    /// - `InvalidKey` if the id or data is empty
    pub fn import_key(&self, encoded: &EncodedKey) -> Result<DerivedKey> {
        let bytes = encoded.decoded_bytes();
        if !verify_checksum(&bytes, &encoded.checksum) {
            tracing::warn!(key_id = %encoded.key_id, "refusing import with bad checksum");
            return Err(TransportError::ChecksumMismatch { key_id: encoded.key_id.clone() });
        }

        let field = |name: &str| encoded.metadata.get(name).map(String::as_str);
        let algorithm = field("algorithm").map_or(Ok(AlgorithmType::Aes128), str::parse)?;
        let source = field("source").map_or(Ok(KeySource::Manual), str::parse)?;
        let version = match field("version") {
            None => 1,
            Some(value) => value.parse().map_err(|_| TransportError::InvalidMetadata {
                key: "version",
                value: value.to_string(),
            })?,
        };

        let metadata = KeyMetadata::new(source, algorithm, "imported from transport", version);
        let key =
            DerivedKey::new(&bytes, encoded.key_id.as_str(), metadata, encoded.timestamp_millis)?;

        let now = self.env.now_millis();
        self.context.log_operation(now, &format!("imported key {}", encoded.key_id));
        tracing::info!(key_id = %encoded.key_id, "imported key");
        Ok(key)
    }

    /// Operation log for this encoder.
    pub fn security_context(&self) -> &SecurityContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    };

    use montikey_core::EntropyError;

    use super::*;

    /// Fixed clock; randomness unused by the encoder.
    #[derive(Clone)]
    struct FixedClock(Arc<AtomicU64>);

    impl FixedClock {
        fn at(millis: u64) -> Self {
            Self(Arc::new(AtomicU64::new(millis)))
        }
    }

    impl Environment for FixedClock {
        fn now_millis(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }

        fn random_bytes(&self, buffer: &mut [u8]) -> std::result::Result<(), EntropyError> {
            buffer.fill(0);
            Ok(())
        }
    }

    fn key(bytes: &[u8]) -> DerivedKey {
        let metadata =
            KeyMetadata::new(KeySource::WirelessIntercept, AlgorithmType::Aes128, "test", 3);
        DerivedKey::new(bytes, "WIRELESS_dev_1", metadata, 1).unwrap()
    }

    #[test]
    fn encode_carries_metadata_and_checksum() {
        let encoder = KeyEncoder::new(FixedClock::at(500));
        let encoded = encoder.encode_key(&key(&[0xAA; 16]));

        assert_eq!(encoded.key_id, "WIRELESS_dev_1");
        assert_eq!(encoded.timestamp_millis, 500);
        assert_eq!(encoded.encoded_text.chars().count(), 16);
        assert_eq!(encoded.checksum, calculate_checksum(&[0xAA; 16]));
        assert_eq!(encoded.metadata["algorithm"], "AES_128");
        assert_eq!(encoded.metadata["source"], "WIRELESS_INTERCEPT");
        assert_eq!(encoded.metadata["length"], "128");
        assert_eq!(encoded.metadata["version"], "3");
    }

    #[test]
    fn verify_against_original() {
        let encoder = KeyEncoder::new(FixedClock::at(0));
        let original = [1u8, 2, 3, 4, 5, 6];
        let encoded = encoder.encode_key(&key(&original));

        assert!(encoder.verify_checksum(&encoded, &original));
        assert!(!encoder.verify_checksum(&encoded, &[1, 2, 3, 4, 5, 7]));
    }

    #[test]
    fn batch_preserves_order() {
        let encoder = KeyEncoder::new(FixedClock::at(0));
        let metadata = KeyMetadata::new(KeySource::Manual, AlgorithmType::Des, "b", 1);
        let second = DerivedKey::new(&[2; 8], "second", metadata, 0).unwrap();

        let batch = encoder.encode_batch(&[key(&[1; 16]), second]);

        let ids: Vec<&str> = batch.iter().map(|e| e.key_id.as_str()).collect();
        assert_eq!(ids, vec!["WIRELESS_dev_1", "second"]);
    }

    #[test]
    fn hex_is_uppercase() {
        let encoder = KeyEncoder::new(FixedClock::at(0));
        let encoded = encoder.encode_key(&key(&[0xAB, 0x01]));
        assert_eq!(encoder.to_hex(&encoded), "AB01");
    }

    #[test]
    fn secure_identifier_format() {
        let encoder = KeyEncoder::new(FixedClock::at(1234));
        // SHA-256("abc") = BA7816BF8F01...
        assert_eq!(encoder.generate_secure_identifier("KEY", b"abc"), "KEY_BA7816BF8F01_1234");
    }

    #[test]
    fn import_restores_key() {
        let encoder = KeyEncoder::new(FixedClock::at(77));
        let original = key(&[5; 24]);
        let encoded = encoder.encode_key(&original);

        let imported = encoder.import_key(&encoded).unwrap();

        assert_eq!(imported.key_id(), original.key_id());
        assert_eq!(imported.key_bytes(), original.key_bytes());
        assert_eq!(imported.metadata().algorithm(), AlgorithmType::Aes128);
        assert_eq!(imported.metadata().source(), KeySource::WirelessIntercept);
        assert_eq!(imported.metadata().version(), 3);
        assert_eq!(imported.created_at_millis(), 77);
    }

    #[test]
    fn import_defaults_without_metadata() {
        let encoder = KeyEncoder::new(FixedClock::at(0));
        let mut encoded = encoder.encode_key(&key(&[5; 16]));
        encoded.metadata.clear();

        let imported = encoder.import_key(&encoded).unwrap();

        assert_eq!(imported.metadata().algorithm(), AlgorithmType::Aes128);
        assert_eq!(imported.metadata().source(), KeySource::Manual);
        assert_eq!(imported.metadata().version(), 1);
    }

    #[test]
    fn import_rejects_tampering() {
        let encoder = KeyEncoder::new(FixedClock::at(0));
        let mut encoded = encoder.encode_key(&key(&[5; 16]));
        encoded.encoded_text = encode_bytes(&[6; 16]);

        let result = encoder.import_key(&encoded);
        assert!(matches!(result, Err(TransportError::ChecksumMismatch { .. })));
    }

    #[test]
    fn import_rejects_unknown_algorithm() {
        let encoder = KeyEncoder::new(FixedClock::at(0));
        let mut encoded = encoder.encode_key(&key(&[5; 16]));
        encoded.metadata.insert("algorithm".into(), "ROT13".into());

        let result = encoder.import_key(&encoded);
        assert!(matches!(result, Err(TransportError::UnknownTag(_))));
    }

    #[test]
    fn import_rejects_bad_version() {
        let encoder = KeyEncoder::new(FixedClock::at(0));
        let mut encoded = encoder.encode_key(&key(&[5; 16]));
        encoded.metadata.insert("version".into(), "two".into());

        let result = encoder.import_key(&encoded);
        assert_eq!(
            result.map(|k| k.key_id().to_string()),
            Err(TransportError::InvalidMetadata { key: "version", value: "two".into() })
        );
    }

    #[test]
    fn summary_report() {
        let encoder = KeyEncoder::new(FixedClock::at(9));
        let encoded = encoder.encode_key(&key(&[0x01, 0x02]));

        insta::assert_snapshot!(encoder.key_summary(&encoded), @r"
        === MontiKey Summary ===
        Key ID: WIRELESS_dev_1
        Checksum: A12871FEE210FB86
        Timestamp: 9
        Encoded Length: 2 characters
        Metadata:
          algorithm: AES_128
          length: 16
          source: WIRELESS_INTERCEPT
          version: 3
        ");
    }

    #[test]
    fn summary_never_contains_key_text() {
        let encoder = KeyEncoder::new(FixedClock::at(9));
        let encoded = encoder.encode_key(&key(&[0x41; 16]));
        let operations_before = encoder.security_context().operations().len();

        let summary = encoder.key_summary(&encoded);

        assert!(!summary.contains(&encoded.encoded_text));
        assert!(!summary.contains('\u{2841}'));
        assert!(summary.contains("Encoded Length: 16 characters\n"));
        assert_eq!(encoder.security_context().operations().len(), operations_before);
    }

    #[test]
    fn parse_failures_are_logged_in_context() {
        let encoder = KeyEncoder::new(FixedClock::at(3));
        assert!(encoder.parse_compact("only|three|fields").is_err());

        let operations = encoder.security_context().operations();
        assert_eq!(
            operations.last().map(String::as_str),
            Some("3: rejected compact: expected 4 fields, got 3")
        );
        assert_eq!(encoder.security_context().context_id(), "MONTI_ENCODER_3");
    }
}
