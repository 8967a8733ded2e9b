//! fxlist - server-list stream reader
//!
//! Usage: `fxlist [config-path] [source]`
//!
//! Reads a length-prefixed server-list stream from stdin, a file or a TCP
//! endpoint and either prints each server as a JSON line or logs an overview.

use anyhow::Context;
use fxlist_analysis::ServerAnalyzer;
use fxlist_config::{OutputMode, StreamConfig, DEFAULT_CONFIG_PATH};
use fxlist_network::{open_source, ServerHandlers, ServerStream, StreamOptions};
use std::io::Write;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const SUMMARY_TOP: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let source_override = args.next();

    let loaded = match &config_path {
        Some(path) => StreamConfig::load_from_file(path),
        None => StreamConfig::load_default(),
    };
    let (mut config, load_error) = match loaded {
        Ok(config) => (config, None),
        Err(e) => (StreamConfig::default(), Some(e)),
    };
    if let Some(source) = source_override {
        config.source = source;
    }

    init_tracing(&config.log_level);

    info!("fxlist starting up");
    if let Some(e) = load_error {
        warn!(
            "Failed to load {}: {}",
            config_path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH),
            e
        );
        warn!("Using default configuration");
    }

    config.validate().context("invalid configuration")?;
    config.display();

    let options = StreamOptions {
        max_servers: config.server_cap(),
        max_frame_size: config.max_frame_size,
        read_chunk_size: config.read_chunk_size,
    };

    let mut handlers = ServerHandlers::new().on_error(|e| {
        if e.is_fatal() {
            error!("Stream failed: {}", e);
        } else {
            warn!("Skipping undecodable frame: {}", e);
        }
    });
    if config.output == OutputMode::Json {
        handlers = handlers.on_server(print_json_line);
    }

    let stream = ServerStream::new(options, handlers);

    let source = open_source(&config.source)
        .await
        .with_context(|| format!("failed to open source {}", config.source))?;

    // Ctrl-C stops the stream and keeps whatever was collected
    let interrupt = {
        let stream = stream.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping stream");
                stream.stop();
            }
        })
    };

    let servers = stream.collect_all(source).await.context("server stream failed")?;
    interrupt.abort();

    info!("Collected {} servers", servers.len());

    if config.output == OutputMode::Summary {
        let mut analyzer = ServerAnalyzer::new();
        analyzer.add_servers(servers);
        analyzer.analyze().display(SUMMARY_TOP);
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json_line(server: &fxlist_core::ServerInfo) {
    match serde_json::to_string(server) {
        Ok(line) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{}", line) {
                warn!("Failed to write server to stdout: {}", e);
            }
        }
        Err(e) => warn!("Failed to serialize server: {}", e),
    }
}
