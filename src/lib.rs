//! litelog - Browse LiteLLM gateway request logs from the terminal
//!
//! This library provides:
//! - Persisted settings for the gateway connection and window sizing
//! - A [`Session`] holding the key list, the selected key's windowed log
//!   entries, focus and selection, and a single last-error slot
//! - A line-oriented interactive browser on top of the session
//!
//! Domain types, the window cache and the pagination controller live in
//! `litelog-core`; the HTTP client in `litelog-client`; formatters in
//! `litelog-terminal`.
//!
//! # Examples
//!
//! ```no_run
//! use litelog::{Session, Settings};
//! use litelog_client::GatewayClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> litelog::Result<()> {
//!     let settings = Settings {
//!         base_url: "http://localhost:4000".to_string(),
//!         admin_api_key: "sk-master".to_string(),
//!         ..Settings::default()
//!     };
//!     let mut session = Session::new(settings, |s: &Settings| {
//!         GatewayClient::new(&s.base_url, &s.admin_api_key).map(Arc::new)
//!     });
//!
//!     session.refresh_keys().await?;
//!     session.load_older().await?;
//!     println!("{} entries", session.current_entries().len());
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod cli;
pub mod progress;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use litelog_core::error::{LitelogError, Result};
pub use session::{Activity, Session};
pub use settings::{Settings, SettingsOverrides, SettingsStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
