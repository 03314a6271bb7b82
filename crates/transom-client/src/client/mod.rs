//! Transmission implementation of the `DaemonControl` operations.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use transom_types::{
    AddedTorrent, ClientConfig, ControlAction, DaemonControl, Error, Served, SessionInfo, Torrent,
    TorrentRef, TransportKind,
};

use crate::magnet;
use crate::rpc::RpcClient;
use crate::transport::{Transport, TransportStack};


/// Torrent fields requested from the daemon for every read.
const TORRENT_FIELDS: &[&str] = &[
    "id",
    "hashString",
    "name",
    "status",
    "downloadDir",
    "percentDone",
    "totalSize",
    "downloadedEver",
    "rateDownload",
    "rateUpload",
    "eta",
    "error",
    "errorString",
];

/// Client for a Transmission-compatible daemon.
///
/// One instance may be shared by concurrent callers; the only shared
/// mutable state is the per-transport session token, and stale-token
/// refreshes follow an independent-retry discipline (each observer of a
/// rejection retries once with the token that rejection carried).
#[allow(missing_debug_implementations, private_bounds)]
pub struct TransmissionClient<T: Transport = TransportStack> {
    rpc: RpcClient<T>,
}

impl TransmissionClient {
    /// Create a client over the production transport stack.
    ///
    /// Fails when the configuration cannot produce the transports it
    /// names (e.g. an unparseable SOCKS5 endpoint). No network traffic
    /// happens here; the session token is negotiated on the first call.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let transport = TransportStack::new(config.clone())?;
        Ok(Self {
            rpc: RpcClient::new(config, transport),
        })
    }
}

#[allow(private_bounds)]
impl<T: Transport> TransmissionClient<T> {
    /// Create a client with a custom transport implementation.
    /// This is primarily useful for testing with mocks.
    #[cfg(test)]
    pub(crate) fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            rpc: RpcClient::new(config, transport),
        }
    }
}

#[allow(private_bounds)]
impl<T: Transport> DaemonControl for TransmissionClient<T> {
    async fn list(&self, via: Option<TransportKind>) -> Result<Served<Vec<Torrent>>, Error> {
        let via = self.rpc.route(via);
        debug!("listing torrents via {via}");
        let arguments = self
            .rpc
            .call(via, "torrent-get", Map::new(), Some(TORRENT_FIELDS))
            .await?;
        let torrents = decode_member::<Vec<Torrent>>(&arguments, "torrents")?;
        debug!("daemon reported {} torrents", torrents.len());

        Ok(Served {
            value: torrents,
            via,
        })
    }

    async fn add(
        &self,
        source: &str,
        download_dir: Option<&str>,
        start: bool,
        via: Option<TransportKind>,
    ) -> Result<Served<AddedTorrent>, Error> {
        magnet::validate_source(source)?;

        let via = self.rpc.route(via);
        debug!("adding torrent via {via}: {source}");
        let mut arguments = Map::new();
        arguments.insert("filename".to_string(), Value::from(source));
        if let Some(dir) = download_dir {
            arguments.insert("download-dir".to_string(), Value::from(dir));
        }
        // Always explicit, never the daemon's own default.
        arguments.insert("paused".to_string(), Value::from(!start));

        let result = self.rpc.call(via, "torrent-add", arguments, None).await?;
        let added = if let Some(torrent) = result.get("torrent-added") {
            decode_value::<AddedTorrent>(torrent, "torrent-added")?
        } else if let Some(torrent) = result.get("torrent-duplicate") {
            let mut added = decode_value::<AddedTorrent>(torrent, "torrent-duplicate")?;
            added.duplicate = true;
            added
        } else {
            return Err(Error::Daemon(
                "torrent-add response named no torrent".to_string(),
            ));
        };

        debug!("added {added:?}");
        Ok(Served { value: added, via })
    }

    async fn control(
        &self,
        action: ControlAction,
        refs: &[TorrentRef],
        delete_data: bool,
        via: Option<TransportKind>,
    ) -> Result<Served<()>, Error> {
        if refs.is_empty() {
            return Err(Error::Validation(
                "control requires at least one torrent reference".to_string(),
            ));
        }

        let via = self.rpc.route(via);
        debug!("{action:?} on {refs:?} via {via}, delete_data={delete_data}");
        let mut arguments = Map::new();
        arguments.insert(
            "ids".to_string(),
            serde_json::to_value(refs)
                .map_err(|e| Error::Validation(format!("cannot encode references: {e}")))?,
        );

        let method = match action {
            ControlAction::Start => "torrent-start",
            ControlAction::Stop => "torrent-stop",
            ControlAction::Remove => {
                // Data-preserving unless the caller is explicit.
                if delete_data {
                    arguments.insert("delete-local-data".to_string(), Value::from(true));
                }
                "torrent-remove"
            }
        };

        self.rpc.call(via, method, arguments, None).await?;
        Ok(Served { value: (), via })
    }

    async fn get_details(
        &self,
        reference: &TorrentRef,
        via: Option<TransportKind>,
    ) -> Result<Served<Torrent>, Error> {
        let via = self.rpc.route(via);
        debug!("fetching details for {reference} via {via}");
        let mut arguments = Map::new();
        arguments.insert(
            "ids".to_string(),
            serde_json::to_value([reference])
                .map_err(|e| Error::Validation(format!("cannot encode reference: {e}")))?,
        );

        let result = self
            .rpc
            .call(via, "torrent-get", arguments, Some(TORRENT_FIELDS))
            .await?;
        let mut torrents = decode_member::<Vec<Torrent>>(&result, "torrents")?;
        if torrents.is_empty() {
            return Err(Error::Daemon(format!("no torrent matched {reference}")));
        }

        Ok(Served {
            value: torrents.swap_remove(0),
            via,
        })
    }

    async fn search(
        &self,
        name: &str,
        via: Option<TransportKind>,
    ) -> Result<Served<Vec<Torrent>>, Error> {
        let needle = name.to_lowercase();
        let listed = self.list(via).await?;
        let matched = listed
            .value
            .into_iter()
            .filter(|torrent| torrent.name.to_lowercase().contains(&needle))
            .collect();

        Ok(Served {
            value: matched,
            via: listed.via,
        })
    }

    async fn free_space(
        &self,
        path: Option<&str>,
        via: Option<TransportKind>,
    ) -> Result<Served<u64>, Error> {
        let via = self.rpc.route(via);
        debug!("checking free space via {via}, path={path:?}");
        let mut arguments = Map::new();
        // Omitted entirely when absent; the daemon falls back to its
        // configured download directory.
        if let Some(path) = path {
            arguments.insert("path".to_string(), Value::from(path));
        }

        let result = self.rpc.call(via, "free-space", arguments, None).await?;
        let bytes = decode_member::<u64>(&result, "size-bytes")?;
        Ok(Served { value: bytes, via })
    }

    async fn session_info(
        &self,
        via: Option<TransportKind>,
    ) -> Result<Served<SessionInfo>, Error> {
        let via = self.rpc.route(via);
        debug!("fetching session info via {via}");
        let result = self.rpc.call(via, "session-get", Map::new(), None).await?;
        let info = decode_value::<SessionInfo>(&result, "session-get arguments")?;
        Ok(Served { value: info, via })
    }
}

fn decode_member<V: DeserializeOwned>(arguments: &Value, key: &str) -> Result<V, Error> {
    let member = arguments
        .get(key)
        .ok_or_else(|| Error::Daemon(format!("daemon response is missing `{key}`")))?;
    decode_value(member, key)
}

fn decode_value<V: DeserializeOwned>(value: &Value, what: &str) -> Result<V, Error> {
    serde_json::from_value(value.clone())
        .map_err(|e| Error::Daemon(format!("undecodable `{what}` in daemon response: {e}")))
}
