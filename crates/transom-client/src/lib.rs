//! # Transmission RPC client with resilient sessions and transports.
//!
//! usage:
//!
//! ```rust,ignore
//! use transom_client::TransmissionClient;
//! use transom_types::{ClientConfig, DaemonControl, TransportKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TransmissionClient::new(ClientConfig::default())?;
//!     let added = client
//!         .add("magnet:?xt=urn:btih:...", Some("/downloads"), true, None)
//!         .await?;
//!     println!("Added torrent: {:?} via {}", added.value, added.via);
//!     Ok(())
//! }
//! ```
//!
//! The session token is negotiated transparently: each call retries at
//! most once when the daemon rejects a stale token, and every other
//! failure surfaces as a typed [`transom_types::Error`]. Calls may route
//! through a SOCKS5 proxy or an SSH-forwarded tunnel per request.

// Some dev-dependencies only serve the integration test targets.
#![cfg_attr(test, allow(unused_crate_dependencies))]

mod client;
mod magnet;
mod rpc;
mod session;
mod transport;
mod tunnel;

#[cfg(test)]
mod testutil;

pub use client::TransmissionClient;
pub use transport::TransportStack;
