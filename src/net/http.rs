//! reqwest-backed fetcher for the standalone proxy binary.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::cache::snapshot::ResponseSnapshot;
use crate::net::{FetchError, Fetcher, Method, Request};

/// Headers that describe the transport rather than the payload. They are
/// invalid on a response whose body has been fully buffered.
const HOP_BY_HOP: [&str; 2] = ["transfer-encoding", "connection"];

/// Fetcher that talks to the real upstream over HTTP.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Forward a request upstream, optionally with a body (non-GET
    /// passthroughs), and buffer the response into a snapshot.
    pub async fn forward(
        &self,
        request: &Request,
        body: Option<Bytes>,
    ) -> Result<ResponseSnapshot, FetchError> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_error)?;

        debug!(url = %request.url, status, bytes = body.len(), "upstream response");
        Ok(ResponseSnapshot::new(status, headers, body))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, FetchError> {
        self.forward(request, None).await
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

fn map_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_connect() {
        FetchError::Offline
    } else {
        FetchError::Transport(err.to_string())
    }
}
