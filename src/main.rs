use sse_tap::adapters::ReqwestTransport;
use sse_tap::cli::{parse_args, resolve_config, run_cli_command, CliCommand};
use sse_tap::config::StreamerConfig;
use sse_tap::streamer::Streamer;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Default log filter when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "sse_tap=info";

/// Install the tracing subscriber.
///
/// Logs go to stderr so stdout only carries stream output.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Stream `url` until it ends, fails, or Ctrl+C aborts it.
async fn run(config: StreamerConfig, url: String) -> Result<()> {
    let streamer = Arc::new(Streamer::with_config(ReqwestTransport::new(), config));

    streamer.on_data(|payload| println!("[streamer] data: {}", payload));
    streamer.on_event(|name| println!("[streamer] event: {}", name));
    streamer.on_debug(|message| println!("[streamer] : {}", message));
    streamer.on_error(|err| eprintln!("[streamer] error: {}", err.user_message()));

    let handle = Arc::clone(&streamer);
    ctrlc::set_handler(move || {
        handle.abort();
    })?;

    let result = streamer.start_streaming(&url).await;

    let metrics = streamer.metrics();
    eprintln!(
        "[streamer] {} chunks, {} bytes",
        metrics.sse_chunks, metrics.sse_bytes
    );

    match result {
        Ok(end) => {
            tracing::debug!(end = end.as_str(), "Finished");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let command = parse_args(std::env::args());
    if let Some(result) = run_cli_command(&command) {
        return result;
    }
    let CliCommand::Stream(args) = command else {
        return Ok(());
    };

    init_tracing();

    let config = resolve_config(&args)?;
    let url = config
        .url
        .clone()
        .ok_or_else(|| eyre!("No stream URL given. Pass one or set SSE_TAP_URL."))?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config, url))
}
