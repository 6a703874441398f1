//! wgtunnel - point-to-point WireGuard tunnel bootstrap
//!
//! Brings up a kernel WireGuard interface on two hosts, wires them to each
//! other as the only peer, starts a demo container on each end and tears the
//! setup down again on Ctrl-C.
//!
//! # Roles
//!
//! - **Server** (no arguments): generates its own key pair and the client's,
//!   listens on a fixed UDP port and prints the keys the client needs.
//! - **Client** (three arguments): takes the server public key, its own
//!   private key and the server address, then dials the server.
//!
//! # Example
//!
//! ```no_run
//! use wgtunnel::config::{parse_invocation, Role};
//!
//! let invocation = parse_invocation(&[]).unwrap();
//! assert_eq!(invocation.role(), Role::Server);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod platform;
pub mod runtime;
pub mod tunnel;

#[cfg(test)]
mod testing;

pub use error::{Result, WgError};
