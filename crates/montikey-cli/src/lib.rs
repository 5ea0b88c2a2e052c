//! MontiKey command-line front end.
//!
//! The binary is a thin shell: it parses [`Cli`], installs logging and hands
//! the command to [`run`] with a [`SystemEnv`] and the process's standard
//! streams. Everything here is also usable as a library so the commands can
//! be tested against a simulated environment.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod system_env;

pub use cli::{Cli, CliConfig, Command, DeriveCommand, DirectionArg, EncodeArgs};
pub use commands::run;
pub use error::CliError;
pub use system_env::SystemEnv;
