//! # linode-ddns
//!
//! Keeps a Linode DNS address record pointed at the caller's public IP.
//!
//! Each invocation performs one reconciliation:
//!
//! - find the zone owning the configured host (`domain.list`)
//! - find the address record inside it (`domain.resource.list`)
//! - ask a plain-text endpoint for the current public IP
//! - push `domain.resource.update` if the two differ
//!
//! ## Usage
//!
//! ```bash
//! # Run from cron every five minutes
//! */5 * * * * linode-ddns --config /etc/linode-ddns/config.toml
//!
//! # Trace requests and responses on stderr
//! linode-ddns --debug
//! ```
//!
//! Exactly one line is printed on stdout: `OK`, `OK <old> -> <new>` or
//! `FAIL <kind>: <message>`, with exit codes 0, 1 and 2 respectively.

pub mod config;
pub mod detector;
pub mod error;
pub mod linode;
pub mod locator;
pub mod reconciler;
pub mod trace;

pub use config::Config;
pub use detector::IpDetector;
pub use error::{DdnsError, ErrorKind, Result};
pub use reconciler::{run_once, Reconciler, RunOutcome};
