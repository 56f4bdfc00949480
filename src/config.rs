//! Configuration for the tiller server
//!
//! Listen addresses and the prompts directory come from command-line flags
//! with environment-variable fallbacks (`PORT`, `OBS_PORT`, `PROMPTS_DIR`).

use clap::Parser;

/// Server configuration
///
/// Addresses accept the Go-style shorthand `:8080` (all interfaces) as well
/// as a full `host:port` pair; use [`Config::listen_addr`] and
/// [`Config::obs_listen_addr`] to obtain bindable forms.
#[derive(Parser, Debug, Clone)]
#[command(name = "tiller")]
#[command(version, about = "Agent orchestration server", long_about = None)]
pub struct Config {
    /// HTTP listen address for the JSON API
    #[arg(long, env = "PORT", default_value = ":8080")]
    pub port: String,

    /// HTTP listen address for the observability event stream
    #[arg(long = "obs-port", env = "OBS_PORT", default_value = ":9090")]
    pub obs_port: String,

    /// Directory containing the prompt template files
    #[arg(long = "prompts-dir", env = "PROMPTS_DIR", default_value = "prompts")]
    pub prompts_dir: String,
}

impl Config {
    /// Parse configuration from command line and environment
    pub fn load() -> Self {
        Self::parse()
    }

    /// Bindable address for the JSON API listener
    pub fn listen_addr(&self) -> String {
        normalize_addr(&self.port)
    }

    /// Bindable address for the observability listener
    pub fn obs_listen_addr(&self) -> String {
        normalize_addr(&self.obs_port)
    }
}

/// Expand a bare `:port` into an address `TcpListener` accepts.
fn normalize_addr(addr: &str) -> String {
    if let Some(port) = addr.strip_prefix(':') {
        return format!("0.0.0.0:{}", port);
    }
    addr.to_string()
}
