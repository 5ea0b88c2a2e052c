//! Command-line arguments and the configuration derived from them

use clap::{Args, Parser, Subcommand, ValueEnum};
use montikey_core::{AlgorithmType, DEFAULT_AUDIT_CAPACITY, Direction, KeySource};

/// MontiKey key derivation and transport tool
#[derive(Parser, Debug)]
#[command(name = "montikey")]
#[command(about = "Derive, classify and transport symmetric keys")]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Audit log capacity for commands that use a key store
    #[arg(long, global = true, default_value_t = DEFAULT_AUDIT_CAPACITY)]
    pub audit_capacity: usize,

    /// Use the single-line compact transport form
    #[arg(long, global = true)]
    pub compact: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Derive key bytes and print them as uppercase hex
    #[command(subcommand)]
    Derive(DeriveCommand),

    /// Encode hex key bytes into transport text
    Encode(EncodeArgs),

    /// Parse transport text and verify its checksum
    Decode {
        /// Transport text, or `-` to read standard input
        input: String,
    },

    /// Classify captured payloads as candidate keys
    Classify {
        /// Characteristic or device the payloads came from
        #[arg(long)]
        source: String,

        /// Whether the payloads were read or written
        #[arg(long, value_enum, default_value_t = DirectionArg::Read)]
        direction: DirectionArg,

        /// Payloads as hex, observed in order
        #[arg(required = true)]
        payloads: Vec<String>,
    },

    /// Walk a generated key through store, encrypt, rotate and audit export
    Demo,
}

/// Key derivation commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum DeriveCommand {
    /// Derive from UTF-8 text
    String {
        /// Input text
        text: String,

        /// Output length in bytes
        #[arg(long, default_value_t = 16)]
        length: usize,

        /// Stretch with this many SHA-256 iterations instead
        #[arg(long)]
        stretch: Option<u32>,
    },

    /// Derive from hex factors, concatenated in order
    Factors {
        /// Factors as hex
        #[arg(required = true)]
        factors: Vec<String>,

        /// Output length in bytes
        #[arg(long, default_value_t = 16)]
        length: usize,
    },

    /// Derive a 6-byte MIFARE Classic key from hex data
    Mifare {
        /// Input as hex
        data: String,
    },
}

/// Arguments of the `encode` command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct EncodeArgs {
    /// Key bytes as hex
    #[arg(long)]
    pub key: String,

    /// Key identifier
    #[arg(long)]
    pub id: String,

    /// Algorithm tag
    #[arg(long, default_value = "AES_128")]
    pub algorithm: AlgorithmType,

    /// Source tag
    #[arg(long, default_value = "MANUAL")]
    pub source: KeySource,

    /// Key version
    #[arg(long, default_value_t = 1)]
    pub version: u32,
}

/// Direction of observed payloads.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    /// Value read or notified by the peripheral
    Read,
    /// Value written by the central
    Write,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Read => Self::Read,
            DirectionArg::Write => Self::Write,
        }
    }
}

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Audit capacity for key stores created by commands
    pub audit_capacity: usize,
    /// Emit and accept the compact transport form
    pub compact: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            compact: false,
        }
    }
}

impl From<&Cli> for CliConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            log_level: cli.log_level.clone(),
            audit_capacity: cli.audit_capacity,
            compact: cli.compact,
        }
    }
}
