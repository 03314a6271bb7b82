//! # Transom Types
//!
//! This crate defines common types and traits for clients controlling a
//! Transmission-compatible download daemon in the Transom project.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for daemon control operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before any network call was made (e.g. a malformed
    /// magnet URI or an empty reference set).
    #[error("invalid input: {0}")]
    Validation(String),

    /// The network path to the daemon failed: connection refused, DNS,
    /// proxy handshake, SSH session, or timeout.
    #[error("transport failure via {via}: {message}")]
    Transport {
        /// The transport that failed to serve the request.
        via: TransportKind,
        /// What went wrong on that path.
        message: String,
    },

    /// The daemon rejected the configured credentials (HTTP 401/403).
    #[error("authentication rejected by daemon")]
    Authentication,

    /// Session token negotiation failed: the daemon rejected a token it
    /// had just issued, or rejected one without issuing a replacement.
    #[error("session negotiation failed: {0}")]
    Session(String),

    /// The daemon answered but reported a failure of its own, carried
    /// verbatim (e.g. an unknown torrent reference).
    #[error("daemon error: {0}")]
    Daemon(String),
}

/// The network path used to reach the daemon's RPC endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportKind {
    /// Plain TCP/HTTP to the daemon's host and port.
    #[default]
    Direct,
    /// The same HTTP exchange routed through a SOCKS5 proxy.
    Socks5,
    /// HTTP through a local port forwarded over an SSH session.
    SshTunnel,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Direct => write!(f, "direct"),
            TransportKind::Socks5 => write!(f, "socks5"),
            TransportKind::SshTunnel => write!(f, "ssh-tunnel"),
        }
    }
}

/// SOCKS5 proxy endpoint. The supported configuration is unauthenticated.
#[derive(Debug, Clone)]
pub struct Socks5Config {
    /// Proxy host.
    pub host: String,
    /// Proxy port.
    pub port: u16,
}

/// SSH endpoint used to forward a local port to the daemon.
#[derive(Debug, Clone)]
pub struct SshTunnelConfig {
    /// Intermediate SSH host.
    pub host: String,
    /// SSH port on the intermediate host.
    pub port: u16,
    /// User to authenticate as.
    pub username: String,
    /// Path to the private key file used for authentication.
    pub key_path: PathBuf,
}

/// Immutable connection configuration handed in at construction.
///
/// The daemon endpoint and credentials apply to every transport; the
/// SOCKS5 and SSH sections only need to be present when the corresponding
/// [`TransportKind`] is requested.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Daemon host.
    pub host: String,
    /// Daemon RPC port.
    pub port: u16,
    /// Basic auth username, if the daemon requires credentials.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Bound on every transport call.
    pub timeout: Duration,
    /// Transport used when a call does not select one explicitly.
    pub default_transport: TransportKind,
    /// SOCKS5 proxy parameters, required for [`TransportKind::Socks5`].
    pub socks5: Option<Socks5Config>,
    /// SSH tunnel parameters, required for [`TransportKind::SshTunnel`].
    pub ssh: Option<SshTunnelConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9091,
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
            default_transport: TransportKind::Direct,
            socks5: None,
            ssh: None,
        }
    }
}

/// Identifier for a daemon-tracked torrent.
///
/// Numeric IDs are daemon-local and unstable across daemon restarts; the
/// info-hash is stable. Operations accept either and never coerce one
/// variant into the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TorrentRef {
    /// Unstable daemon-local numeric ID.
    Id(i64),
    /// Stable content info-hash.
    Hash(String),
}

impl fmt::Display for TorrentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TorrentRef::Id(id) => write!(f, "{id}"),
            TorrentRef::Hash(hash) => write!(f, "{hash}"),
        }
    }
}

impl From<i64> for TorrentRef {
    fn from(id: i64) -> Self {
        TorrentRef::Id(id)
    }
}

impl From<&str> for TorrentRef {
    fn from(hash: &str) -> Self {
        TorrentRef::Hash(hash.to_string())
    }
}

/// Action applied to a set of torrents by [`DaemonControl::control`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Start (resume) the torrents.
    Start,
    /// Stop (pause) the torrents.
    Stop,
    /// Remove the torrents from the daemon.
    Remove,
}

/// Snapshot of a daemon-reported torrent.
///
/// Sizes are bytes, rates are bytes/sec, `percent_done` is the daemon's
/// 0.0..=1.0 ratio. No unit conversion happens below the presentation
/// layer; values are passed through as reported.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)] // rationale: these are the same fields as in Transmission RPC
pub struct Torrent {
    pub id: i64,

    pub hash_string: String,

    pub name: String,

    pub status: i64,

    pub percent_done: f64,

    pub rate_download: i64,

    pub rate_upload: i64,

    pub total_size: i64,

    pub downloaded_ever: i64,

    pub eta: i64,

    pub download_dir: String,

    pub error: i64,

    pub error_string: String,
}

/// The torrent the daemon acknowledged after an add request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedTorrent {
    /// Daemon-local numeric ID at the time of the add.
    pub id: i64,
    /// Stable info-hash.
    pub hash_string: String,
    /// Torrent name.
    pub name: String,
    /// True when the daemon already tracked this torrent.
    #[serde(skip)]
    pub duplicate: bool,
}

impl AddedTorrent {
    /// Stable reference to the added torrent.
    pub fn reference(&self) -> TorrentRef {
        TorrentRef::Hash(self.hash_string.clone())
    }
}

/// Daemon session snapshot from `session-get`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    /// The daemon's default download directory.
    #[serde(rename = "download-dir")]
    pub download_dir: String,
    /// Daemon version string.
    pub version: String,
    /// RPC protocol version.
    #[serde(rename = "rpc-version")]
    pub rpc_version: i64,
}

/// An operation result together with the transport that served it.
#[derive(Debug, Clone)]
pub struct Served<T> {
    /// The decoded result.
    pub value: T,
    /// The transport the request actually went through.
    pub via: TransportKind,
}

/// Operations surface exposed by a daemon client.
///
/// Every call is independent and may be issued concurrently; each takes an
/// optional transport override, falling back to the configured default.
#[allow(async_fn_in_trait)]
pub trait DaemonControl {
    /// List all torrents the daemon tracks, in daemon order (not stable).
    async fn list(&self, via: Option<TransportKind>) -> Result<Served<Vec<Torrent>>, Error>;

    /// Add a torrent from a magnet link, URL, or base64-encoded metainfo.
    ///
    /// Magnet-shaped inputs are validated before any network call. The
    /// daemon's pause flag is always set explicitly: `start == false`
    /// means added paused, `start == true` means added and started,
    /// regardless of daemon configuration.
    async fn add(
        &self,
        source: &str,
        download_dir: Option<&str>,
        start: bool,
        via: Option<TransportKind>,
    ) -> Result<Served<AddedTorrent>, Error>;

    /// Start, stop, or remove torrents.
    ///
    /// `delete_data` only applies to [`ControlAction::Remove`]; removal is
    /// data-preserving unless it is explicitly set.
    async fn control(
        &self,
        action: ControlAction,
        refs: &[TorrentRef],
        delete_data: bool,
        via: Option<TransportKind>,
    ) -> Result<Served<()>, Error>;

    /// Fetch the record for one torrent. Read-only.
    async fn get_details(
        &self,
        reference: &TorrentRef,
        via: Option<TransportKind>,
    ) -> Result<Served<Torrent>, Error>;

    /// Find torrents whose name contains `name` (case-insensitive).
    async fn search(
        &self,
        name: &str,
        via: Option<TransportKind>,
    ) -> Result<Served<Vec<Torrent>>, Error>;

    /// Bytes available at `path`, or at the daemon's default download
    /// directory when `path` is omitted.
    async fn free_space(
        &self,
        path: Option<&str>,
        via: Option<TransportKind>,
    ) -> Result<Served<u64>, Error>;

    /// Fetch the daemon's session information.
    async fn session_info(&self, via: Option<TransportKind>)
    -> Result<Served<SessionInfo>, Error>;
}
