//! Tollgate is a configuration-driven HTTP gateway.
//!
//! It matches each inbound request against a fixed route table, rewrites it
//! into a request for the configured backend (path variables substituted,
//! query parameters filtered, method optionally overridden) and streams the
//! backend's response back. Every matched request carries fresh request and
//! trace identifiers, is access-logged, and may be throttled per route and
//! per client within a fixed one-minute window.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, validate).
//! - [`config`] -- Configuration model, file loading and validation.
//! - [`error`] -- Error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`middleware`] -- The fixed per-request chain: identifiers, access log,
//!   throttling.
//! - [`proxy`] -- Route dispatch, target resolution, header construction and
//!   streaming forwarding.
//! - [`server`] -- Axum server setup, shared application state, HTTP client and
//!   graceful start / stop.
//! - [`throttle`] -- Sharded per-route, per-client counters and the window
//!   reset task.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |

// Library API exists for the binary and the integration tests.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod server;
pub mod throttle;

#[cfg(test)]
mod test_support;
