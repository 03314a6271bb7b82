//! Transport abstraction: one HTTP request/response exchange with the
//! daemon, bounded by a timeout, over the network path a call selects.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use transom_types::{ClientConfig, Error, Socks5Config, TransportKind};

use crate::tunnel::SshTunnel;

/// The daemon's fixed RPC path.
pub(crate) const RPC_PATH: &str = "/transmission/rpc";

/// One outgoing HTTP request. The RPC layer owns header construction;
/// transports only carry bytes.
#[derive(Debug, Clone)]
pub(crate) struct HttpRequest {
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: String,
}

/// One HTTP response, undecoded.
#[derive(Debug, Clone)]
pub(crate) struct HttpResponse {
    pub(crate) status: u16,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// One request, one response, bounded by the configured timeout.
///
/// No retries happen at this layer; every failure is reported to the RPC
/// client with the failing transport identified.
#[cfg_attr(test, mockall::automock)]
#[allow(async_fn_in_trait)]
pub(crate) trait Transport {
    async fn send(&self, via: TransportKind, request: HttpRequest) -> Result<HttpResponse, Error>;
}

/// Production transport set: direct and SOCKS5 paths over dedicated
/// reqwest clients, plus a lazily established SSH tunnel.
#[allow(missing_debug_implementations)]
pub struct TransportStack {
    config: ClientConfig,
    direct: reqwest::Client,
    socks5: Option<reqwest::Client>,
    tunnel: Mutex<Option<SshTunnel>>,
}

impl TransportStack {
    /// Build the transports the configuration enables.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let direct = http_client(config.timeout, None)?;
        let socks5 = config
            .socks5
            .as_ref()
            .map(|proxy| http_client(config.timeout, Some(proxy)))
            .transpose()?;

        Ok(Self {
            config,
            direct,
            socks5,
            tunnel: Mutex::new(None),
        })
    }

    fn rpc_url(&self, host: &str, port: u16) -> String {
        format!("http://{host}:{port}{RPC_PATH}")
    }

    /// Local port of a live SSH tunnel, establishing one if none exists.
    ///
    /// A tunnel that died since the last call is discarded and replaced;
    /// the establishment itself can fail, which fails this call only.
    async fn tunnel_port(&self) -> Result<u16, Error> {
        let ssh = self.config.ssh.as_ref().ok_or_else(|| Error::Transport {
            via: TransportKind::SshTunnel,
            message: "SSH tunnel requested but not configured".to_string(),
        })?;

        let mut guard = self.tunnel.lock().await;
        if let Some(tunnel) = guard.as_ref() {
            if tunnel.is_alive() {
                return Ok(tunnel.local_port());
            }
            debug!("cached SSH tunnel is down, replacing it");
            *guard = None;
        }

        let tunnel = SshTunnel::open(
            ssh,
            &self.config.host,
            self.config.port,
            self.config.timeout,
        )
        .await?;
        let port = tunnel.local_port();
        *guard = Some(tunnel);
        Ok(port)
    }
}

impl Transport for TransportStack {
    async fn send(&self, via: TransportKind, request: HttpRequest) -> Result<HttpResponse, Error> {
        let (client, url) = match via {
            TransportKind::Direct => (
                &self.direct,
                self.rpc_url(&self.config.host, self.config.port),
            ),
            TransportKind::Socks5 => {
                let client = self.socks5.as_ref().ok_or_else(|| Error::Transport {
                    via,
                    message: "SOCKS5 transport requested but not configured".to_string(),
                })?;
                (client, self.rpc_url(&self.config.host, self.config.port))
            }
            TransportKind::SshTunnel => {
                let port = self.tunnel_port().await?;
                (&self.direct, self.rpc_url("127.0.0.1", port))
            }
        };

        let mut builder = client.post(&url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(via, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(via, e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn http_client(timeout: Duration, proxy: Option<&Socks5Config>) -> Result<reqwest::Client, Error> {
    let via = if proxy.is_some() {
        TransportKind::Socks5
    } else {
        TransportKind::Direct
    };

    let mut builder = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout);

    builder = match proxy {
        Some(socks) => {
            let proxy = reqwest::Proxy::all(format!("socks5://{}:{}", socks.host, socks.port))
                .map_err(|e| Error::Transport {
                    via,
                    message: format!("invalid SOCKS5 proxy endpoint: {e}"),
                })?;
            builder.proxy(proxy)
        }
        // The direct path must not pick up ambient proxy variables.
        None => builder.no_proxy(),
    };

    builder.build().map_err(|e| Error::Transport {
        via,
        message: format!("cannot build HTTP client: {e}"),
    })
}

fn map_reqwest_error(via: TransportKind, error: reqwest::Error) -> Error {
    let message = if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    };
    Error::Transport { via, message }
}
