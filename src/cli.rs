//! CLI interface for litelog
//!
//! This module defines the command-line interface using clap.
//!
//! # Example
//!
//! ```bash
//! # Store the gateway connection
//! litelog config set --base-url http://localhost:4000 --admin-key sk-master
//!
//! # List virtual keys, then the last 48 hours of one key
//! litelog keys
//! litelog logs --key prod --older 1
//!
//! # Show one request with its payloads
//! litelog show 0f6a1c2e-... --key prod
//!
//! # Interactive browser
//! litelog browse
//! ```

use crate::settings::SettingsOverrides;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Browse LiteLLM gateway request logs and virtual keys
#[derive(Parser, Debug, Clone)]
#[command(name = "litelog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show informational output (default is quiet mode with only warnings and errors)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Settings file (default: <config dir>/litelog/settings.json)
    #[arg(long, global = true, env = "LITELOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Gateway base URL, e.g. http://localhost:4000
    #[arg(long, global = true, env = "LITELOG_BASE_URL")]
    pub base_url: Option<String>,

    /// Admin (master) API key of the gateway
    #[arg(long, global = true, env = "LITELOG_ADMIN_KEY", hide_env_values = true)]
    pub admin_key: Option<String>,

    /// Hours covered by each fetched window (1-168)
    #[arg(long, global = true)]
    pub lookback_hours: Option<u32>,

    /// Maximum entries per fetched window (10-500)
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Timezone for timestamps (e.g. "America/New_York", "Asia/Tokyo", "UTC")
    /// If not specified, uses the system's local timezone
    #[arg(long, short = 'z', global = true)]
    pub timezone: Option<String>,

    /// Show timestamps in UTC (overrides --timezone)
    #[arg(long, global = true)]
    pub utc: bool,

    /// Subcommand to execute (default: browse)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Settings given on the command line or through the environment
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            base_url: self.base_url.clone(),
            admin_api_key: self.admin_key.clone(),
            lookback_hours: self.lookback_hours,
            page_size: self.page_size,
        }
    }
}

/// Which key and how much history to load
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Key token, alias or name (default: last selected, else the first key)
    #[arg(long, short = 'k')]
    pub key: Option<String>,

    /// Number of older windows to load after the latest one
    #[arg(long, default_value_t = 0)]
    pub older: u32,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List virtual keys
    Keys,

    /// List request logs of a key
    Logs(WindowArgs),

    /// Show one request with its payloads
    Show {
        /// Request id of the entry
        request_id: String,

        /// Show messages and tool calls instead of raw JSON payloads
        #[arg(long, short = 'f')]
        formatted: bool,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Interactive log browser
    Browse,

    /// View or store settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Store --base-url, --admin-key, --lookback-hours and --page-size
    Set,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["litelog", "--json"]);
        assert!(cli.json);
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["litelog", "logs", "--key", "prod", "--older", "2"]);
        match &cli.command {
            Some(Command::Logs(args)) => {
                assert_eq!(args.key.as_deref(), Some("prod"));
                assert_eq!(args.older, 2);
            }
            _ => panic!("Expected Logs command"),
        }
    }

    #[test]
    fn test_show_command() {
        let cli = Cli::parse_from(["litelog", "show", "req-1", "-k", "sk-a", "--utc"]);
        assert!(cli.utc);
        match &cli.command {
            Some(Command::Show {
                request_id,
                formatted,
                window,
            }) => {
                assert_eq!(request_id, "req-1");
                assert!(!formatted);
                assert_eq!(window.key.as_deref(), Some("sk-a"));
                assert_eq!(window.older, 0);
            }
            _ => panic!("Expected Show command"),
        }

        let cli = Cli::parse_from(["litelog", "show", "req-1", "--formatted"]);
        assert!(matches!(
            cli.command,
            Some(Command::Show {
                formatted: true,
                ..
            })
        ));
    }

    #[test]
    fn test_config_set_uses_global_flags() {
        let cli = Cli::parse_from([
            "litelog",
            "config",
            "set",
            "--base-url",
            "http://localhost:4000",
            "--admin-key",
            "sk-master",
            "--page-size",
            "100",
        ]);
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Set
            })
        ));
        let overrides = cli.overrides();
        assert_eq!(overrides.base_url.as_deref(), Some("http://localhost:4000"));
        assert_eq!(overrides.admin_api_key.as_deref(), Some("sk-master"));
        assert_eq!(overrides.page_size, Some(100));
        assert_eq!(overrides.lookback_hours, None);
    }

    #[test]
    fn test_timezone_flags() {
        let cli = Cli::parse_from(["litelog", "keys", "--timezone", "Asia/Tokyo"]);
        assert_eq!(cli.timezone.as_deref(), Some("Asia/Tokyo"));
        assert!(!cli.utc);
    }
}
