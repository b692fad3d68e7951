//! CLI module for sse-tap.
//!
//! - Argument parsing
//! - Version and usage display
//! - Resolving the streamer configuration from file, environment and flags
//!
//! # Usage
//!
//! ```ignore
//! use sse_tap::cli::{parse_args, run_cli_command, CliCommand};
//!
//! let command = parse_args(std::env::args());
//! if let Some(result) = run_cli_command(&command) {
//!     return result;
//! }
//! // Streaming command, continue
//! ```

pub mod args;

pub use args::{parse_args, CliCommand, StreamArgs};

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::StreamerConfig;
use crate::error::ConfigError;

/// Version string of this build.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Usage text printed by `--help`.
pub const USAGE: &str = "\
Usage: sse-tap [OPTIONS] [URL]

Stream a server-sent event endpoint and print what arrives.

Options:
  -c, --config <PATH>     Config file (default: ~/.sse-tap/config.json)
  -H, --header <H: V>     Extra request header, repeatable
  -X, --method <METHOD>   GET (default) or POST
      --keep-open         Do not end the session on data: [DONE]
  -V, --version           Print version
  -h, --help              Print this help

Environment:
  SSE_TAP_URL, SSE_TAP_METHOD, SSE_TAP_CLOSE_ON_DONE, RUST_LOG";

/// Run a CLI command if applicable.
///
/// # Returns
///
/// * `None` - If the command is `Stream` (the caller streams)
/// * `Some(Ok(()))` - If an informational command ran
/// * `Some(Err(e))` - If the arguments were invalid
pub fn run_cli_command(command: &CliCommand) -> Option<Result<()>> {
    match command {
        CliCommand::Version => {
            println!("sse-tap {}", VERSION);
            Some(Ok(()))
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            Some(Ok(()))
        }
        CliCommand::Invalid(message) => Some(Err(eyre!("{}\n\n{}", message, USAGE))),
        CliCommand::Stream(_) => None,
    }
}

/// Build the configuration for a streaming run.
///
/// File (explicit path, or the default path if it exists), then
/// environment, then flags.
pub fn resolve_config(args: &StreamArgs) -> Result<StreamerConfig, ConfigError> {
    let config = match &args.config_path {
        Some(path) => StreamerConfig::load(path)?,
        None => StreamerConfig::load_default()?,
    };
    let mut config = config.apply_env()?;

    if let Some(url) = &args.url {
        config.url = Some(url.clone());
    }
    if let Some(method) = args.method {
        config.method = method;
    }
    if args.keep_open {
        config.close_on_done = false;
    }
    for (name, value) in &args.headers {
        config.headers.insert(name.clone(), value.clone());
    }
    Ok(config)
}
