//! Transport abstraction layer.
//!
//! Every remote command is one JSON document posted to the debugger endpoint, the answer is
//! one JSON document too. Transport knows nothing about sessions or command semantics, it only
//! addresses the request to the debugger actor and classifies failures.

use crate::client::error::Error;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use hyper::ext::ReasonPhrase;
use log::debug;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use url::Url;

/// Handler path used when endpoint url has no fragment.
pub const DEFAULT_TARGET: &str = "debugger";

/// Debugger server endpoint.
#[derive(Debug, Clone)]
pub struct Endpoint {
    url: Url,
    target: String,
    host: String,
}

impl Endpoint {
    /// Parse endpoint url, the fragment (if any) selects the debugger actor path.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut url = Url::parse(raw).with_context(|| format!("invalid endpoint url `{raw}`"))?;
        let target = match url.fragment() {
            Some(fragment) if !fragment.is_empty() => fragment.to_string(),
            _ => DEFAULT_TARGET.to_string(),
        };
        url.set_fragment(None);

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(anyhow!("endpoint url `{raw}` has no host")),
        };

        Ok(Self { url, target, host })
    }

    /// Request url (without fragment).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Actor path of the debugger.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// `host[:port]` part of the url.
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Build a request document: caller arguments plus an `address` of the command handler.
pub fn envelope(target: &str, command: &str, mut args: Map<String, Value>) -> Value {
    args.insert(
        "address".to_string(),
        json!({
            "target": target,
            "handler": command,
        }),
    );
    Value::Object(args)
}

/// Trait for request/response exchange with a debugger server.
#[async_trait(?Send)]
pub trait Transport {
    /// Send a single command and return decoded response as is.
    ///
    /// # Arguments
    ///
    /// * `command`: protocol verb, used as a handler name
    /// * `args`: command arguments, session scoping fields must be already there
    async fn call(&self, command: &str, args: Map<String, Value>) -> Result<Value, Error>;
}

/// JSON over HTTP transport.
///
/// One POST request per call. There is no retry and no timeout, a stalled server leaves the
/// call pending.
pub struct HttpTransport {
    endpoint: Endpoint,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

}

/// Reason phrase sent by the server, the canonical one if the server sent the standard phrase.
fn reason_phrase(response: &reqwest::Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or("unknown")
            .to_string(),
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn call(&self, command: &str, args: Map<String, Value>) -> Result<Value, Error> {
        let body = envelope(self.endpoint.target(), command, args);
        debug!(target: "transport", "-> {command}: {body}");

        let response = self
            .client
            .post(self.endpoint.url().clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.into()))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(target: "transport", "<- {command}: status {status}");
            return Err(Error::ServerStatus {
                code: status.as_u16(),
                message: reason_phrase(&response),
            });
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.into()))?;
        let value: Value = serde_json::from_slice(&data)?;
        debug!(target: "transport", "<- {command}: {value}");
        Ok(value)
    }
}
