//! Upstream HTTP data source.

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty};
use hyper::{header, Method, Request, Uri};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::time::timeout;

use super::{DataSource, FetchError};
use crate::http::client::{create_client, HyperClient};

/// HttpSource reads the whole collection as one JSON array from an upstream URL.
pub struct HttpSource<R> {
    uri: Uri,
    timeout: Duration,
    client: HyperClient,
    _records: PhantomData<fn() -> R>,
}

impl<R> HttpSource<R> {
    /// Creates a new source; `timeout` bounds the whole request including the body read.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let uri: Uri = url
            .parse()
            .with_context(|| format!("invalid source url: {}", url))?;
        let client = create_client();

        Ok(Self {
            uri,
            timeout,
            client,
            _records: PhantomData,
        })
    }

    async fn get(&self) -> Result<Bytes, FetchError> {
        let empty: BoxBody<Bytes, hyper::Error> = Empty::<Bytes>::new()
            .map_err(|never: std::convert::Infallible| match never {})
            .boxed();

        let req = Request::builder()
            .method(Method::GET)
            .uri(self.uri.clone())
            .header(header::ACCEPT, "application/json")
            .body(empty)
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?
            .to_bytes();

        Ok(body)
    }
}

#[async_trait::async_trait]
impl<R> DataSource<R> for HttpSource<R>
where
    R: DeserializeOwned + Send,
{
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_all(&self) -> Result<Vec<R>, FetchError> {
        let body = match timeout(self.timeout, self.get()).await {
            Ok(res) => res?,
            Err(_) => return Err(FetchError::Timeout(self.timeout)),
        };
        Ok(serde_json::from_slice(&body)?)
    }
}
