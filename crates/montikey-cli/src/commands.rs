//! Command runners.
//!
//! Every runner writes its result to the supplied writer and takes its time
//! and randomness from an [`Environment`], so the same code runs against the
//! OS in the binary and against `SimEnv` in tests.

use std::io::{Read, Write};

use montikey_core::{
    AlgorithmType, ClassifierEvent, DerivedKey, Direction, Environment, InterceptionClassifier,
    KeyMetadata, KeySource, KeyStore, KeyStoreConfig,
};
use montikey_crypto::{
    derive_key_from_factors, derive_key_from_string, derive_mifare_key, stretch_key, to_hex_upper,
};
use montikey_proto::{EncodedKey, KeyEncoder};

use crate::{
    cli::{CliConfig, Command, DeriveCommand, EncodeArgs},
    error::CliError,
};

/// Plaintext pushed through the store by `demo`.
const DEMO_PLAINTEXT: &[u8] = b"MontiKey demo payload";

/// Run one command.
///
/// `input` is only read when a command argument is `-`.
pub fn run<E: Environment>(
    command: &Command,
    config: &CliConfig,
    env: &E,
    input: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    tracing::debug!(?command, "running command");
    match command {
        Command::Derive(derive) => run_derive(derive, out),
        Command::Encode(args) => run_encode(args, config, env, out),
        Command::Decode { input: text } => {
            let text = resolve_input(text, input)?;
            run_decode(&text, config, env, out)
        },
        Command::Classify { source, direction, payloads } => {
            run_classify(source, (*direction).into(), payloads, env, out)
        },
        Command::Demo => run_demo(config, env, out),
    }
}

fn resolve_input(arg: &str, input: &mut dyn Read) -> Result<String, CliError> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    Ok(text)
}

fn run_derive(command: &DeriveCommand, out: &mut dyn Write) -> Result<(), CliError> {
    let key = match command {
        DeriveCommand::String { text, length, stretch: None } => {
            derive_key_from_string(text, *length)?
        },
        DeriveCommand::String { text, length, stretch: Some(iterations) } => {
            stretch_key(text.as_bytes(), *iterations, *length)?
        },
        DeriveCommand::Factors { factors, length } => {
            let decoded = factors.iter().map(hex::decode).collect::<Result<Vec<_>, _>>()?;
            derive_key_from_factors(&decoded, *length)?
        },
        DeriveCommand::Mifare { data } => derive_mifare_key(&hex::decode(data)?)?,
    };

    writeln!(out, "{}", to_hex_upper(&key))?;
    Ok(())
}

fn run_encode<E: Environment>(
    args: &EncodeArgs,
    config: &CliConfig,
    env: &E,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let bytes = hex::decode(&args.key)?;
    let metadata =
        KeyMetadata::new(args.source, args.algorithm, "supplied on the command line", args.version);
    let key = DerivedKey::new(&bytes, args.id.as_str(), metadata, env.now_millis())?;

    if bytes.len() != args.algorithm.key_len() {
        tracing::warn!(
            algorithm = %args.algorithm,
            expected = args.algorithm.key_len(),
            actual = bytes.len(),
            "key length does not match algorithm"
        );
    }

    let encoder = KeyEncoder::new(env.clone());
    let encoded = encoder.encode_key(&key);
    write_transport(&encoder, &encoded, config, out)
}

fn write_transport<E: Environment>(
    encoder: &KeyEncoder<E>,
    encoded: &EncodedKey,
    config: &CliConfig,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    if config.compact {
        writeln!(out, "{}", encoder.format_compact(encoded))?;
    } else {
        write!(out, "{}", encoder.format_transmission(encoded))?;
    }
    Ok(())
}

fn run_decode<E: Environment>(
    text: &str,
    config: &CliConfig,
    env: &E,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let encoder = KeyEncoder::new(env.clone());
    let encoded = if config.compact {
        encoder.parse_compact(text.trim_end_matches(['\r', '\n']))?
    } else {
        encoder.parse_transmission(text)?
    };

    let bytes = encoder.decode(&encoded);
    let valid = encoder.verify_checksum(&encoded, &bytes);

    writeln!(out, "Key ID: {}", encoded.key_id)?;
    writeln!(out, "Checksum: {}", encoded.checksum)?;
    writeln!(out, "Timestamp: {}", encoded.timestamp_millis)?;
    for (name, value) in &encoded.metadata {
        writeln!(out, "Meta {name}: {value}")?;
    }
    writeln!(out, "Key: {}", to_hex_upper(&bytes))?;
    writeln!(out, "Checksum valid: {}", if valid { "yes" } else { "no" })?;
    Ok(())
}

fn run_classify<E: Environment>(
    source: &str,
    direction: Direction,
    payloads: &[String],
    env: &E,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let decoded = payloads.iter().map(hex::decode).collect::<Result<Vec<_>, _>>()?;
    if decoded.iter().all(Vec::is_empty) {
        return Err(CliError::invalid("every payload is empty"));
    }

    let classifier = InterceptionClassifier::new(env.clone());
    for payload in &decoded {
        for event in classifier.observe(source, payload, direction) {
            write_event(&event, out)?;
        }
    }
    classifier.cleanup();
    Ok(())
}

fn write_event(event: &ClassifierEvent, out: &mut dyn Write) -> Result<(), CliError> {
    match event {
        ClassifierEvent::PatternObserved { source_id, direction, len } => {
            writeln!(out, "pattern {source_id} {direction:?} {len} bytes")?;
        },
        ClassifierEvent::KeyIntercepted(key) => {
            writeln!(
                out,
                "key {} {} {} bits",
                key.key_id(),
                key.metadata().algorithm(),
                key.key_length_bits()
            )?;
        },
        ClassifierEvent::Error { source_id, message } => {
            writeln!(out, "error {source_id}: {message}")?;
        },
    }
    Ok(())
}

fn run_demo<E: Environment>(
    config: &CliConfig,
    env: &E,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let store = KeyStore::with_config(
        env.clone(),
        KeyStoreConfig { audit_capacity: config.audit_capacity },
    );
    let encoder = KeyEncoder::new(env.clone());

    let algorithm = AlgorithmType::Aes256;
    let secret = env.random_vec(algorithm.key_len())?;
    let metadata = KeyMetadata::new(KeySource::Generated, algorithm, "demo key", 1);
    let key_id = encoder.generate_secure_identifier("DEMO", &secret);
    let key = DerivedKey::new(&secret, key_id.as_str(), metadata, env.now_millis())?;
    store.store(key)?;
    writeln!(out, "stored {key_id}")?;

    let ciphertext = store.encrypt(&key_id, DEMO_PLAINTEXT)?;
    writeln!(out, "ciphertext: {}", to_hex_upper(&ciphertext))?;
    let plaintext = store.decrypt(&key_id, &ciphertext)?;
    if plaintext != DEMO_PLAINTEXT {
        return Err(CliError::invalid("demo round trip produced different plaintext"));
    }
    writeln!(out, "decrypted: {}", String::from_utf8_lossy(&plaintext))?;

    let rotated = store.rotate(&key_id)?;
    writeln!(out, "rotated to {} (version {})", rotated.key_id(), rotated.metadata().version())?;
    store.delete(&key_id)?;

    let encoded = encoder.encode_key(&rotated);
    write!(out, "{}", encoder.key_summary(&encoded))?;
    write_transport(&encoder, &encoded, config, out)?;
    write!(out, "{}", store.export_audit_log())?;
    Ok(())
}
