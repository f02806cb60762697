//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::RawConfig;

#[derive(Debug, Parser)]
#[command(name = "header-proxy")]
#[command(
    about = "Forwards HTTP and WebSocket traffic to a single backend, injecting headers on the way",
    long_about = None
)]
pub struct Cli {
    /// Port on which to listen
    #[arg(long)]
    pub port: Option<u16>,

    /// Interface on which to listen [default: localhost]
    #[arg(long)]
    pub host: Option<String>,

    /// URL of the backend HTTP server to proxy
    #[arg(long)]
    pub backend: Option<String>,

    /// Header name to inject into all requests. Repeat to insert several headers.
    #[arg(long = "insert-header", value_name = "NAME")]
    pub insert_header: Vec<String>,

    /// Value for the matching --insert-header. Repeat once per header.
    #[arg(long = "insert-header-val", value_name = "VALUE")]
    pub insert_header_val: Vec<String>,

    /// Scheme used to open backend websocket connections [default: ws]
    #[arg(long)]
    pub websocket_scheme: Option<String>,

    /// Close both directions of a websocket tunnel as soon as either one ends
    #[arg(long)]
    pub close_together: bool,

    /// Optional TOML file providing any of the settings above
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Layer the flags over settings read from a config file.
    ///
    /// Scalar flags override file values; injected headers from the command
    /// line are appended after the ones from the file.
    pub fn merge_into(self, mut base: RawConfig) -> RawConfig {
        if self.port.is_some() {
            base.port = self.port;
        }
        if self.host.is_some() {
            base.host = self.host;
        }
        if self.backend.is_some() {
            base.backend = self.backend;
        }
        if self.websocket_scheme.is_some() {
            base.websocket_scheme = self.websocket_scheme;
        }
        if self.close_together {
            base.close_together = Some(true);
        }
        base.insert_header.extend(self.insert_header);
        base.insert_header_val.extend(self.insert_header_val);
        base
    }
}
