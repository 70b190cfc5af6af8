//! servergate is a same-origin HTTP gateway to a remote server's
//! management consoles.
//!
//! A browser dashboard cannot call the server's Cockpit console or other
//! HTTP endpoints directly because of CORS. servergate sits next to the
//! dashboard and forwards those calls, relaying cookies and rewriting
//! redirects so the browser never leaves the gateway's origin.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate, health).
//! - [`config`] -- Configuration model, validation, file sources and hot reload
//!   via the [`ConfigSource`](config::ConfigSource) trait.
//! - [`consoles`] -- VNC desktop / web terminal link builder.
//! - [`error`] -- Error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- Request dispatch, the Cockpit and generic proxy handlers,
//!   header construction, and the [`Upstream`](proxy::upstream::Upstream) seam.
//! - [`server`] -- Axum router, shared application state, HTTP client, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file formats |
//! | `full` | All features |

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod consoles;
pub mod error;
pub mod health;
pub mod logging;
pub mod proxy;
pub mod server;
