//! Process-wide HTTP transport with keep-alive connection pooling.
//!
//! Every [`Client`](crate::Client) sends its requests through one shared
//! hyper connection pool, so repeated operations against the same store
//! reuse established TCP/TLS connections instead of reconnecting per
//! call. The pool is built lazily on first use and lives for the rest of
//! the process; there is no explicit teardown.
//!
//! The transport does not retry and does not impose timeouts. Failures
//! propagate verbatim to the caller as [`Error::Connection`].

use std::sync::OnceLock;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HttpClient;
use hyper_util::rt::TokioExecutor;

use crate::error::{Error, Result};

type HttpsConnector = hyper_rustls::HttpsConnector<HttpConnector>;
type Pool = HttpClient<HttpsConnector, Full<Bytes>>;

static POOL: OnceLock<Pool> = OnceLock::new();

fn build_pool() -> Pool {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .build();

    HttpClient::builder(TokioExecutor::new()).build(connector)
}

/// Send a request through the shared pool.
pub(crate) async fn send(req: Request<Full<Bytes>>) -> Result<Response<Incoming>> {
    POOL.get_or_init(build_pool)
        .request(req)
        .await
        .map_err(|e| Error::Connection(format!("Request failed: {}", e)))
}
