//! Command-line argument parsing for the sse-tap binary.

use std::path::PathBuf;

use crate::config::parse_header;
use crate::traits::Method;

/// Options for a streaming run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamArgs {
    /// Stream URL (positional)
    pub url: Option<String>,
    /// Config file given with `--config`
    pub config_path: Option<PathBuf>,
    /// `--keep-open`: the `[DONE]` sentinel does not end the session
    pub keep_open: bool,
    /// Headers given with `--header 'Name: value'`
    pub headers: Vec<(String, String)>,
    /// Method given with `--method`
    pub method: Option<Method>,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Stream events (default)
    Stream(StreamArgs),
    /// Arguments could not be parsed
    Invalid(String),
}

/// Parse command-line arguments and return the command to run.
///
/// # Examples
///
/// ```
/// use sse_tap::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["sse-tap".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut stream = StreamArgs::default();
    // Skip the program name
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--keep-open" => stream.keep_open = true,
            "--config" | "-c" => match args.next() {
                Some(path) => stream.config_path = Some(PathBuf::from(path)),
                None => return CliCommand::Invalid("--config needs a path".to_string()),
            },
            "--header" | "-H" => match args.next() {
                Some(raw) => match parse_header(&raw) {
                    Ok(header) => stream.headers.push(header),
                    Err(err) => return CliCommand::Invalid(err.to_string()),
                },
                None => return CliCommand::Invalid("--header needs 'Name: value'".to_string()),
            },
            "--method" | "-X" => match args.next().map(|m| m.parse::<Method>()) {
                Some(Ok(method)) => stream.method = Some(method),
                Some(Err(err)) => return CliCommand::Invalid(err),
                None => return CliCommand::Invalid("--method needs GET or POST".to_string()),
            },
            flag if flag.starts_with('-') => {
                return CliCommand::Invalid(format!("unknown option '{}'", flag));
            }
            url => {
                if stream.url.is_some() {
                    return CliCommand::Invalid(format!("unexpected argument '{}'", url));
                }
                stream.url = Some(url.to_string());
            }
        }
    }
    CliCommand::Stream(stream)
}
