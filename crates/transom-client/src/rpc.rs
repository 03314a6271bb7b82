//! RPC envelopes and the call loop with its single 409 retry.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use transom_types::{ClientConfig, Error, TransportKind};

use crate::session::{SESSION_HEADER, SessionStore};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Outgoing RPC body: `{method, arguments, fields?}`. The field list is
/// omitted entirely when a call does not request one.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    arguments: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [&'a str]>,
}

/// Incoming RPC envelope. Anything but `result == "success"` is the
/// daemon's own error message.
#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: String,
    #[serde(default)]
    arguments: Value,
}

/// Executes one logical RPC call per invocation: token attachment, the
/// single stale-token retry, and envelope decoding.
pub(crate) struct RpcClient<T> {
    config: ClientConfig,
    sessions: SessionStore,
    transport: T,
}

impl<T: Transport> RpcClient<T> {
    pub(crate) fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            sessions: SessionStore::default(),
            transport,
        }
    }

    /// Resolve a per-call transport override against the configured default.
    pub(crate) fn route(&self, via: Option<TransportKind>) -> TransportKind {
        via.unwrap_or(self.config.default_transport)
    }

    /// Execute `method` with at most one automatic retry for token
    /// staleness. Authentication failures and transport failures are
    /// never retried here.
    pub(crate) async fn call(
        &self,
        via: TransportKind,
        method: &str,
        arguments: Map<String, Value>,
        fields: Option<&[&str]>,
    ) -> Result<Value, Error> {
        let body = serde_json::to_string(&RpcRequest {
            method,
            arguments: &arguments,
            fields,
        })
        .map_err(|e| Error::Validation(format!("cannot encode RPC request: {e}")))?;

        let first = self.transport.send(via, self.request(via, &body)).await?;
        let response = if first.status == 409 {
            debug!("session token rejected via {via}, renegotiating");
            // The rejection itself carries the replacement token, so no
            // extra round trip is needed to fetch one.
            match first.header(SESSION_HEADER) {
                Some(token) => self.sessions.store(via, token.to_string()),
                None => {
                    self.sessions.invalidate(via);
                    return Err(Error::Session(
                        "daemon rejected the session token without issuing a replacement"
                            .to_string(),
                    ));
                }
            }

            let second = self.transport.send(via, self.request(via, &body)).await?;
            if second.status == 409 {
                // Two consecutive rejections are daemon misconfiguration
                // or churn, not transient staleness.
                return Err(Error::Session(
                    "daemon rejected a freshly issued session token".to_string(),
                ));
            }
            second
        } else {
            first
        };

        decode(response)
    }

    fn request(&self, via: TransportKind, body: &str) -> HttpRequest {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let (Some(user), Some(password)) = (&self.config.username, &self.config.password) {
            let credentials = BASE64.encode(format!("{user}:{password}"));
            headers.push(("Authorization".to_string(), format!("Basic {credentials}")));
        }
        if let Some(token) = self.sessions.get(via) {
            headers.push((SESSION_HEADER.to_string(), token));
        }
        HttpRequest {
            headers,
            body: body.to_string(),
        }
    }
}

fn decode(response: HttpResponse) -> Result<Value, Error> {
    match response.status {
        401 | 403 => return Err(Error::Authentication),
        status if !(200..300).contains(&status) => {
            return Err(Error::Daemon(format!("daemon returned HTTP {status}")));
        }
        _ => {}
    }

    let envelope: RpcEnvelope = serde_json::from_str(&response.body)
        .map_err(|e| Error::Daemon(format!("undecodable RPC response: {e}")))?;
    if envelope.result == "success" {
        Ok(envelope.arguments)
    } else {
        Err(Error::Daemon(envelope.result))
    }
}
