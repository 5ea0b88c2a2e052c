//! MontiKey command-line binary.
//!
//! # Usage
//!
//! ```bash
//! # Derive a 32-byte key from an identifier
//! montikey derive string 356938035643809 --length 32
//!
//! # Encode key bytes for transport, then read them back
//! montikey encode --key 00112233445566778899AABBCCDDEEFF --id k1 > key.txt
//! montikey decode - < key.txt
//!
//! # Classify captured payloads
//! montikey classify --source 2A37 00112233445566778899AABBCCDDEEFF 0102
//! ```

use std::io;

use clap::Parser;
use montikey_cli::{Cli, CliConfig, SystemEnv, run};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = CliConfig::from(&cli);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let env = SystemEnv::new();
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    run(&cli.command, &config, &env, &mut stdin, &mut stdout)?;

    Ok(())
}
