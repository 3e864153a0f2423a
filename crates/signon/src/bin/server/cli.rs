//! CLI argument handling.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use url::Url;

pub fn args() -> Args {
    Args::parse()
}

#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// The IP address the HTTP server will listen on.
    ///
    /// This takes precedence over the value in the configuration file.
    #[arg(long = "ip")]
    pub ip_addr: Option<IpAddr>,

    /// The port the HTTP server will listen on.
    ///
    /// This takes precedence over the value in the configuration file.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// The URL under which the server is reachable by users.
    ///
    /// This takes precedence over the value in the configuration file.
    #[arg(long, env = "SIGNON_PUBLIC_URL")]
    pub public_url: Option<Url>,

    /// Path to the configuration file.
    ///
    /// Will default to `./signon.toml` if unspecified.
    /// If that file does not exist, default configuration values will be used.
    #[arg(short, long = "config")]
    pub config_path: Option<PathBuf>,
}

impl Args {
    /// Applies any overrides specified as CLI flags to the given config.
    pub fn apply_to_config(&self, config: &mut signon::Config) {
        if let Some(ip_addr) = self.ip_addr {
            config.server.ip_addr = ip_addr;
        }

        if let Some(port) = self.port {
            config.server.port = port;
        }

        if let Some(ref public_url) = self.public_url {
            config.openid.public_url = public_url.clone();
        }
    }
}
