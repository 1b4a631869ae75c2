// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use chatline::config::ClientConfig;

#[tokio::main]
async fn main() {
    let config = ClientConfig::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config);
    chatline::tls::ensure_crypto();

    if let Err(e) = chatline::terminal::run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout is the chat timeline.
fn init_tracing(config: &ClientConfig) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    match config.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}
