//! Entropy sources and the cellular key deriver.
//!
//! Acquisition of identifiers and radio readings belongs to the platform.
//! This module only defines the seam ([`EntropySource`]) and what is done with
//! the bytes once they arrive. Unavailability (no permission, no radio, no
//! data) is an expected outcome reported as [`SourceUnavailable`].

use std::{collections::BTreeMap, fmt};

use montikey_crypto::{
    derive_key_from_factors, derive_key_of_length, inject_random_component, random_len_for_bits,
    sha256,
};
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use crate::{
    env::Environment,
    error::DeriveError,
    key::{AlgorithmType, DerivedKey, KeyMetadata, KeySource, SecurityContext},
};

/// Why a source could not supply material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SourceUnavailable {
    /// Platform refused access
    #[error("permission denied")]
    PermissionDenied,
    /// Hardware or service is absent
    #[error("not available")]
    NotAvailable,
    /// Source answered with no data
    #[error("no data")]
    Empty,
}

/// Supplier of raw key material.
pub trait EntropySource: Send + Sync {
    /// Short human-readable name for logs and metadata.
    fn label(&self) -> &str;

    /// Current raw material.
    ///
    /// Never returns an empty buffer on success.
    fn raw_material(&self) -> Result<Zeroizing<Vec<u8>>, SourceUnavailable>;
}

/// Fixed identifier such as a device serial or phone number.
///
/// Material is the UTF-8 encoding of the identifier.
pub struct IdentifierSource {
    label: String,
    value: Zeroizing<String>,
}

impl IdentifierSource {
    /// Create a source reporting `value`.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: Zeroizing::new(value.into()) }
    }
}

impl EntropySource for IdentifierSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn raw_material(&self) -> Result<Zeroizing<Vec<u8>>, SourceUnavailable> {
        if self.value.is_empty() {
            return Err(SourceUnavailable::Empty);
        }
        Ok(Zeroizing::new(self.value.as_bytes().to_vec()))
    }
}

/// Signal strength readings in dBm.
///
/// Each reading is encoded as 4 big-endian bytes, in order.
pub struct SignalStrengthSource {
    readings: Vec<i32>,
}

impl SignalStrengthSource {
    /// Source over a fixed set of readings.
    pub fn from_dbm(readings: &[i32]) -> Self {
        Self { readings: readings.to_vec() }
    }
}

impl EntropySource for SignalStrengthSource {
    fn label(&self) -> &str {
        "signal strength"
    }

    fn raw_material(&self) -> Result<Zeroizing<Vec<u8>>, SourceUnavailable> {
        if self.readings.is_empty() {
            return Err(SourceUnavailable::NotAvailable);
        }
        let bytes = self.readings.iter().flat_map(|dbm| dbm.to_be_bytes()).collect();
        Ok(Zeroizing::new(bytes))
    }
}

/// Source that always reports the same failure.
pub struct UnavailableSource {
    label: String,
    reason: SourceUnavailable,
}

impl UnavailableSource {
    /// Create a source that fails with `reason`.
    pub fn new(label: impl Into<String>, reason: SourceUnavailable) -> Self {
        Self { label: label.into(), reason }
    }
}

impl EntropySource for UnavailableSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn raw_material(&self) -> Result<Zeroizing<Vec<u8>>, SourceUnavailable> {
        Err(self.reason)
    }
}

/// Cellular inputs a key can be derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CellularFactor {
    /// Device identifier
    Imei,
    /// SIM card serial
    SimSerial,
    /// Subscriber phone number
    PhoneNumber,
    /// Signal strength readings
    SignalStrength,
}

impl CellularFactor {
    /// Every factor, in derivation order.
    pub const ALL: [Self; 4] =
        [Self::Imei, Self::SimSerial, Self::PhoneNumber, Self::SignalStrength];

    /// Tag used in key ids and metadata.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Imei => "IMEI",
            Self::SimSerial => "SIM",
            Self::PhoneNumber => "PHONE",
            Self::SignalStrength => "SIGNAL",
        }
    }
}

impl fmt::Display for CellularFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives AES-128 keys from cellular identifiers and readings.
pub struct CellularKeyDeriver<E: Environment> {
    env: E,
    sources: BTreeMap<CellularFactor, Box<dyn EntropySource>>,
    context: SecurityContext,
}

impl<E: Environment> CellularKeyDeriver<E> {
    /// Create a deriver with no sources attached.
    pub fn new(env: E) -> Self {
        let now = env.now_millis();
        let context = SecurityContext::with_prefix("CELLULAR", now);
        context.log_operation(now, "cellular key deriver initialized");
        Self { env, sources: BTreeMap::new(), context }
    }

    /// Attach a source for `factor`, builder style.
    #[must_use]
    pub fn with_source(
        mut self,
        factor: CellularFactor,
        source: impl EntropySource + 'static,
    ) -> Self {
        self.set_source(factor, source);
        self
    }

    /// Attach or replace the source for `factor`.
    pub fn set_source(&mut self, factor: CellularFactor, source: impl EntropySource + 'static) {
        self.sources.insert(factor, Box::new(source));
    }

    /// Factors with a source attached, in derivation order.
    pub fn attached_factors(&self) -> Vec<CellularFactor> {
        self.sources.keys().copied().collect()
    }

    /// Derive a key from one factor.
    ///
    /// Raw material is hashed with SHA-256 and fitted to `key_len` bytes. The
    /// key id is `CELLULAR_<TAG>_<millis>`.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if no source is attached or the source fails
    /// - `Kdf` if `key_len` is zero
    pub fn derive_from(
        &self,
        factor: CellularFactor,
        key_len: usize,
    ) -> Result<DerivedKey, DeriveError> {
        let source = self
            .sources
            .get(&factor)
            .ok_or(DeriveError::Unavailable { factor, reason: SourceUnavailable::NotAvailable })?;

        let raw = source.raw_material().map_err(|reason| {
            tracing::debug!(%factor, %reason, "cellular source unavailable");
            DeriveError::Unavailable { factor, reason }
        })?;

        let mut hash = sha256(&raw);
        let secret = derive_key_of_length(&hash, key_len);
        hash.zeroize();
        let secret = secret?;

        let now = self.env.now_millis();
        let mut metadata = KeyMetadata::new(
            KeySource::Cellular,
            AlgorithmType::Aes128,
            format!("derived from {}", source.label()),
            1,
        );
        metadata.add_info("source", factor.as_str());

        let key = DerivedKey::new(&secret, format!("CELLULAR_{factor}_{now}"), metadata, now)?;
        self.context.log_operation(now, &format!("derived key from {factor}"));
        tracing::info!(key_id = key.key_id(), %factor, "derived cellular key");
        Ok(key)
    }

    /// Derive one key from several factors.
    ///
    /// Each available factor is derived to `key_len` bytes in the order
    /// given, then all of them are combined with
    /// [`derive_key_from_factors`]. Unavailable factors are skipped.
    /// Intermediate keys are wiped.
    ///
    /// # Errors
    ///
    /// - `Kdf(NoFactors)` if no requested factor is available
    /// - `Kdf(InvalidLength)` if `key_len` is zero
    pub fn derive_multi_factor(
        &self,
        factors: &[CellularFactor],
        key_len: usize,
    ) -> Result<DerivedKey, DeriveError> {
        let mut parts: Vec<Zeroizing<Vec<u8>>> = Vec::with_capacity(factors.len());
        let mut used: Vec<&'static str> = Vec::with_capacity(factors.len());

        for &factor in factors {
            match self.derive_from(factor, key_len) {
                Ok(mut key) => {
                    parts.push(key.key_bytes());
                    used.push(factor.as_str());
                    key.clear();
                },
                Err(DeriveError::Unavailable { .. }) => {},
                Err(err) => return Err(err),
            }
        }

        let slices: Vec<&[u8]> = parts.iter().map(|part| part.as_slice()).collect();
        let secret = derive_key_from_factors(&slices, key_len)?;
        drop(slices);
        drop(parts);

        let now = self.env.now_millis();
        let mut metadata = KeyMetadata::new(
            KeySource::Cellular,
            AlgorithmType::Aes128,
            "multi-factor cellular derivation",
            1,
        );
        metadata.add_info("factor_count", used.len().to_string());
        metadata.add_info("factors", used.join(","));

        let key = DerivedKey::new(&secret, format!("CELLULAR_MULTI_{now}"), metadata, now)?;
        self.context.log_operation(now, &format!("multi-factor key from {} factors", used.len()));
        tracing::info!(
            key_id = key.key_id(),
            factor_count = used.len(),
            "derived multi-factor key"
        );
        Ok(key)
    }

    /// Mix `random_bits` of environment randomness into `base`.
    ///
    /// Produces a `HYBRID` key with the same algorithm, `version + 1` and id
    /// `<base id>_RANDOM`. The random bytes are wiped after mixing.
    ///
    /// # Errors
    ///
    /// - `Entropy` if the environment cannot supply randomness
    pub fn inject_random_component(
        &self,
        base: &DerivedKey,
        random_bits: u32,
    ) -> Result<DerivedKey, DeriveError> {
        let random = self.env.random_vec(random_len_for_bits(random_bits))?;
        let secret = inject_random_component(&base.key_bytes(), &random);
        drop(random);

        let now = self.env.now_millis();
        let base_metadata = base.metadata();
        let mut metadata = KeyMetadata::new(
            KeySource::Hybrid,
            base_metadata.algorithm(),
            format!("enhanced with {random_bits} bits of random data"),
            base_metadata.version().saturating_add(1),
        );
        metadata.add_info("base_key", base.key_id());
        metadata.add_info("random_bits", random_bits.to_string());

        let key = DerivedKey::new(&secret, format!("{}_RANDOM", base.key_id()), metadata, now)?;
        self.context.log_operation(now, &format!("injected {random_bits} random bits"));
        tracing::info!(key_id = key.key_id(), random_bits, "injected random component");
        Ok(key)
    }

    /// Operation log for this deriver.
    pub fn security_context(&self) -> &SecurityContext {
        &self.context
    }
}
