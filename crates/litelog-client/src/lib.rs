//! LiteLLM gateway client for litelog
//!
//! This crate implements [`litelog_core::LogSource`] on top of the gateway's
//! admin endpoints `/key/list` and `/spend/logs/ui`.

pub mod gateway;

pub use gateway::GatewayClient;
