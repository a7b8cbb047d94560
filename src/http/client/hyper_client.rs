//! Hyper HTTP client used by the upstream data source.
//!
//! The refresher issues one bulk read per cycle, so the pool stays small:
//! - Max idle connections per host: 4
//! - Max idle connection duration: 90s
//! - Connection timeout: 3s
//! - TCP keep-alive: 30s
//! - TCP_NODELAY: enabled

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::dns::GaiResolver;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::warn;

/// Connection pool configuration constants.
pub const CONNS_PER_HOST: usize = 4;
pub const MAX_IDLE_CONN_DURATION: Duration = Duration::from_secs(90);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

pub type HyperClient = Client<HttpsConnector<HttpConnector<GaiResolver>>, BoxBody<Bytes, hyper::Error>>;

/// Creates a Hyper HTTP client accepting both plain and TLS upstreams.
///
/// Platform root certificates are preferred; the bundled webpki roots are
/// used when the platform store cannot be loaded.
pub fn create_client() -> HyperClient {
    let mut http_connector = HttpConnector::new_with_resolver(GaiResolver::new());
    http_connector.set_nodelay(true);
    http_connector.set_keepalive(Some(Duration::from_secs(30)));
    http_connector.set_connect_timeout(Some(CONNECT_TIMEOUT));
    http_connector.enforce_http(false);

    let roots = match HttpsConnectorBuilder::new().with_native_roots() {
        Ok(builder) => builder,
        Err(e) => {
            warn!(
                component = "http-client",
                event = "native_roots_unavailable",
                error = %e,
                "falling back to bundled webpki roots"
            );
            HttpsConnectorBuilder::new().with_webpki_roots()
        }
    };

    let tls = roots
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(MAX_IDLE_CONN_DURATION)
        .pool_max_idle_per_host(CONNS_PER_HOST)
        .build(tls)
}
