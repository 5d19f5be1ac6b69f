//! Console connector.
//!
//! Reads one chat message per stdin line and prints each reply. Useful for
//! trying commands without a chat platform:
//!
//! ```bash
//! export PANELWARDEN_WHMCS_USERNAME="you@example.net"
//! export PANELWARDEN_WHMCS_PASSWORD="..."
//! echo '!license https://www.host.net' | cargo run
//! ```
//!
//! Set `PANELWARDEN_OUTPUT=json` to print cards as embed JSON instead of text.
//! Logging is controlled with `RUST_LOG` (default `info`).

use panelwarden::{
    InboundMessage, LicenseVerifier, PanelwardenConfig, Reply, Responder, SystemClock,
};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(true));
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn render(reply: &Reply, json: bool) -> Result<String, panelwarden::PanelwardenError> {
    match reply {
        Reply::Text(text) => Ok(text.clone()),
        Reply::Card(card) if json => card.to_json(),
        Reply::Card(card) => Ok(card.render_text()),
    }
}

fn main() -> ExitCode {
    init_logging();

    let config = match PanelwardenConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    let verifier = match LicenseVerifier::new(&config) {
        Ok(verifier) => verifier,
        Err(e) => {
            error!(error = %e, "Failed to start verifier");
            return ExitCode::FAILURE;
        }
    };
    let json = std::env::var("PANELWARDEN_OUTPUT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let responder = Responder::new(verifier, &config, Arc::new(SystemClock));

    info!(bot = %config.bot_name, "Listening for commands on stdin");

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Failed to read stdin");
                return ExitCode::FAILURE;
            }
        };

        let Some(reply) = responder.respond(&InboundMessage::text(&line)) else {
            continue;
        };
        let rendered = match render(&reply, json) {
            Ok(rendered) => rendered,
            Err(e) => {
                error!(error = %e, "Failed to render reply");
                continue;
            }
        };
        if writeln!(stdout, "{}\n", rendered).is_err() {
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
