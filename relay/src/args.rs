//! Command line of the relay binary.
//!
//! Every flag has a `RELAY_*` environment variable. The configuration file holds the
//! `[server]`, `[bedrock]`, `[relay]` and `[registry]` sections; a missing file runs the relay
//! with defaults, which serve `/ws` on `127.0.0.1:8000` against Bedrock in the ambient AWS region.

use std::{
    borrow::Cow,
    fmt,
    io::IsTerminal,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    path::PathBuf,
    str::FromStr,
};

use clap::{Parser, ValueEnum};
use config::Config;
use logforth::filter::EnvFilter;

/// Address used when neither the command line nor `[server]` names one.
const DEFAULT_LISTEN_ADDRESS: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8000));

#[derive(Debug, Parser)]
#[command(name = "relay", version, long_about = concat!("Bedrock streaming relay v", env!("CARGO_PKG_VERSION")))]
pub struct Args {
    /// Address for WebSocket clients. Overrides `server.listen_address`. Default: 127.0.0.1:8000
    #[arg(short, long, env = "RELAY_LISTEN_ADDRESS")]
    pub listen_address: Option<SocketAddr>,
    /// relay.toml with the server, bedrock, relay and registry sections
    #[arg(long, short, env = "RELAY_CONFIG_PATH", default_value = "./relay.toml")]
    pub config: PathBuf,
    /// Verbosity of the relay crates; dependencies only log warnings and errors
    #[arg(long = "log", env = "RELAY_LOG", default_value_t = LogLevel::default())]
    pub log_level: LogLevel,
    /// Format of log lines written to stdout
    #[arg(long, env = "RELAY_LOG_STYLE", default_value_t = LogStyle::default())]
    pub log_style: LogStyle,
}

impl Args {
    /// Load and validate the configuration file, or the defaults when it does not exist.
    pub fn config(&self) -> anyhow::Result<Config> {
        if self.config.exists() {
            return Config::load(&self.config);
        }

        let config = Config::default();
        config.validate()?;

        Ok(config)
    }

    /// The address to bind: the command line first, then `server.listen_address`.
    pub fn listen_address(&self, config: &Config) -> SocketAddr {
        self.listen_address
            .or(config.server.listen_address)
            .unwrap_or(DEFAULT_LISTEN_ADDRESS)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogStyle {
    /// Colorized text, used as the default with TTY output
    Color,
    /// Standard text, used as the default with non-TTY output
    Text,
    /// JSON objects
    Json,
}

impl Default for LogStyle {
    fn default() -> Self {
        if std::io::stdout().is_terminal() {
            LogStyle::Color
        } else {
            LogStyle::Text
        }
    }
}

impl AsRef<str> for LogStyle {
    fn as_ref(&self) -> &str {
        match self {
            LogStyle::Color => "color",
            LogStyle::Text => "text",
            LogStyle::Json => "json",
        }
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogLevel {
    /// Disable logging
    Off,
    /// Only log errors
    Error,
    /// Log errors, and warnings
    Warn,
    /// Log errors, warnings, and info messages
    #[default]
    Info,
    /// Log errors, warnings, info, and debug messages
    Debug,
    /// Log errors, warnings, info, debug, and trace messages
    Trace,
}

impl LogLevel {
    /// The filter for this level: workspace crates log at the level, dependencies at `warn`.
    pub fn env_filter(self) -> anyhow::Result<EnvFilter> {
        let filter_str = match self {
            LogLevel::Off => Cow::Borrowed("off"),
            level => Cow::Owned(format!("warn,relay={level},server={level},config={level},llm={level}")),
        };

        EnvFilter::from_str(&filter_str).map_err(|e| anyhow::anyhow!("Invalid log filter '{filter_str}': {e}"))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
