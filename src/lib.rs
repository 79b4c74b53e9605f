//! AppLovin MAX MCP Server Library
//!
//! This crate exposes the AppLovin MAX reporting API as Model Context
//! Protocol (MCP) tools, so agent hosts can pull revenue and cohort
//! analytics without hand-building the query strings themselves.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, transports, and the main server
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: MCP tools that can be executed by clients (`revenue_report`, `cohort_request`)
//!
//! # Example
//!
//! ```rust,no_run
//! use applovin_mcp_server::{core::McpServer, core::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config);
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, McpServer};
