//! Key-value store client with a local read-through cache

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode, Uri};
use serde::Serialize;
use tracing::{debug, warn};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::auth::TokenProvider;
use crate::error::{Error, Result};
use crate::transport;
use crate::types::Value;

/// Environment variable consulted when no URL is passed to the constructor.
pub const URL_ENV_VAR: &str = "KVDB_URL";

/// Characters that survive component encoding unescaped. Everything else
/// (including `/`, `=`, `&`, `;`, newlines, non-ASCII) is percent-encoded,
/// so keys and values are unambiguous both in URL paths and in
/// `application/x-www-form-urlencoded` bodies.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a key, value or prefix for the wire.
fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Rewrite keys with repeated slash runs or a leading slash: `//a///b`
/// becomes `a/b`. A key that normalizes to nothing is rejected.
fn normalize_key(key: &str) -> Result<String> {
    let mut normalized = String::with_capacity(key.len());
    let mut prev_slash = false;
    for ch in key.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        normalized.push(ch);
    }
    if let Some(stripped) = normalized.strip_prefix('/') {
        normalized = stripped.to_string();
    }
    if normalized.is_empty() {
        return Err(Error::EmptyKey);
    }
    if normalized != key {
        warn!("key {:?} rewritten to {:?}", key, normalized);
    }
    Ok(normalized)
}

/// Asynchronous client for the key-value store.
///
/// Holds a base URL, an optional credential provider and an in-memory
/// cache mapping each key to its raw JSON-serialized string. The cache is
/// a memoization layer, not a source of truth: it reflects the last state
/// this client saw and goes stale if another client mutates the store.
/// Clones share the same cache.
///
/// # Example
/// ```rust,no_run
/// use kvdb_client::Client;
///
/// #[tokio::main]
/// async fn main() -> Result<(), kvdb_client::Error> {
///     let client = Client::new("https://kv.example.com/v1/mydb")?;
///
///     client.set("user:1", &serde_json::json!({"name": "John"})).await?;
///     if let Some(value) = client.get("user:1").await? {
///         println!("user:1 = {:?}", value);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    base_url: Arc<str>,
    auth: Option<Arc<dyn TokenProvider>>,
    cache: Arc<Mutex<HashMap<String, String>>>,
}

impl Client {
    /// Create a client for the store at `url`.
    ///
    /// # Errors
    /// Returns [`Error::MissingUrl`] for an empty URL and
    /// [`Error::InvalidUrl`] for one that does not parse as an absolute
    /// http(s) URL.
    pub fn new(url: &str) -> Result<Self> {
        Self::from_url_string(url.to_string())
    }

    /// Create a client from the `KVDB_URL` environment variable.
    pub fn from_env() -> Result<Self> {
        let url = env::var(URL_ENV_VAR).map_err(|_| Error::MissingUrl)?;
        Self::from_url_string(url)
    }

    fn from_url_string(url: String) -> Result<Self> {
        if url.is_empty() {
            return Err(Error::MissingUrl);
        }
        let base_url = url.trim_end_matches('/').to_string();
        let uri: Uri = base_url
            .parse()
            .map_err(|e| Error::InvalidUrl(format!("Invalid database URL: {}", e)))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(Error::InvalidUrl(format!(
                "Database URL must be absolute: {}",
                base_url
            )));
        }
        Ok(Self {
            base_url: base_url.into(),
            auth: None,
            cache: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Attach a credential provider. Every request then carries an
    /// `authorization: Bearer <token>` header with a freshly obtained
    /// token.
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.auth = Some(provider);
        self
    }

    /// The base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cache_lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // The cache stays usable even if a holder of the lock panicked.
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Internal request method. Maps 404 to [`Error::NotFound`] and any
    /// other non-success status to [`Error::Server`].
    async fn request(
        &self,
        path_and_query: &str,
        method: Method,
        body: Option<Bytes>,
        content_type: Option<&str>,
    ) -> Result<Response<Incoming>> {
        let url = format!("{}{}", self.base_url, path_and_query);
        let uri: Uri = url
            .parse()
            .map_err(|e| Error::InvalidUrl(format!("Invalid request URL: {}", e)))?;

        debug!("{} {}", method, path_and_query);

        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(provider) = &self.auth {
            let token = provider.token()?;
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }

        let req = builder
            .body(Full::new(body.unwrap_or_default()))
            .map_err(|e| Error::Connection(format!("Failed to build request: {}", e)))?;

        let response = transport::send(req).await?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => Err(Error::NotFound(path_and_query.to_string())),
            code if code.is_success() => Ok(response),
            code => {
                let body_bytes = Self::read_body(response.into_body()).await?;
                let message = String::from_utf8_lossy(&body_bytes).to_string();
                Err(Error::Server {
                    status: code.as_u16(),
                    message,
                })
            }
        }
    }

    /// Read a response body to bytes. A failure mid-body is a transport
    /// failure like any other.
    async fn read_body(body: Incoming) -> Result<Vec<u8>> {
        let collected = body
            .collect()
            .await
            .map_err(|e| Error::Connection(format!("Failed to read response body: {}", e)))?;
        Ok(collected.to_bytes().to_vec())
    }

    /// Fetch the raw stored text for a key, via the cache when possible.
    async fn get_text(&self, key: &str) -> Result<Option<String>> {
        let key = normalize_key(key)?;

        if let Some(raw) = self.cache_lock().get(&key).cloned() {
            return Ok(Some(raw));
        }

        let path = format!("/{}", encode_component(&key));
        let response = match self.request(&path, Method::GET, None, None).await {
            Ok(response) => response,
            Err(Error::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let body_bytes = Self::read_body(response.into_body()).await?;
        let raw = String::from_utf8(body_bytes)
            .map_err(|e| Error::Decode(format!("value is not valid UTF-8: {}", e)))?;
        self.cache_lock().insert(key, raw.clone());
        Ok(Some(raw))
    }

    /// Retrieve a value by key.
    ///
    /// A cached key is returned without a network round-trip; otherwise
    /// the value is fetched and cached. Text that does not parse as JSON
    /// comes back as [`Value::Raw`], not an error. Returns `Ok(None)` if
    /// the key does not exist.
    ///
    /// # Example
    /// ```rust,no_run
    /// # use kvdb_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), kvdb_client::Error> {
    /// # let client = Client::new("http://localhost:8080")?;
    /// if let Some(value) = client.get("config").await? {
    ///     println!("config = {:?}", value);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.get_text(key).await?.map(|raw| Value::decode(&raw)))
    }

    /// Retrieve the stored text for a key verbatim, never JSON-decoded.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.get_text(key).await
    }

    /// Store a value under a key.
    ///
    /// The value is JSON-serialized and the cache is updated before the
    /// request is sent, so the write is not durable until this future
    /// resolves. If the request fails, cache and remote store diverge
    /// until the next successful write of the key; there is no rollback.
    ///
    /// # Example
    /// ```rust,no_run
    /// # use kvdb_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), kvdb_client::Error> {
    /// # let client = Client::new("http://localhost:8080")?;
    /// client.set("greeting", "hello").await?;
    /// client.set("count", &42).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let key = normalize_key(key)?;
        let raw = serde_json::to_string(value)?;
        let body = format!("{}={}", encode_component(&key), encode_component(&raw));
        self.cache_lock().insert(key, raw);
        self.post_form(body).await
    }

    /// Store several entries with a single request.
    ///
    /// All pairs go out in one form-encoded POST; the cache is updated
    /// for every pair before the request is sent.
    pub async fn set_many<K, T>(&self, entries: &HashMap<K, T>) -> Result<()>
    where
        K: AsRef<str> + std::hash::Hash + Eq,
        T: Serialize,
    {
        if entries.is_empty() {
            return Ok(());
        }
        let mut pairs = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let key = normalize_key(key.as_ref())?;
            let raw = serde_json::to_string(value)?;
            pairs.push(format!("{}={}", encode_component(&key), encode_component(&raw)));
            self.cache_lock().insert(key, raw);
        }
        self.post_form(pairs.join("&")).await
    }

    async fn post_form(&self, body: String) -> Result<()> {
        self.request(
            "/",
            Method::POST,
            Some(Bytes::from(body)),
            Some("application/x-www-form-urlencoded"),
        )
        .await?;
        Ok(())
    }

    /// Delete a key.
    ///
    /// The key is evicted from the cache first. Deleting a key that does
    /// not exist remotely is not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let key = normalize_key(key)?;
        self.cache_lock().remove(&key);

        let path = format!("/{}", encode_component(&key));
        match self.request(&path, Method::DELETE, None, None).await {
            Ok(_) => Ok(()),
            Err(Error::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// List keys starting with `prefix`, in server-returned order.
    ///
    /// Always a network call: the cache is neither consulted nor
    /// populated, and the result is not deduplicated or sorted by the
    /// client. Pass `""` to list every key.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let path = format!("?encode=true&prefix={}", encode_component(prefix));
        let response = self.request(&path, Method::GET, None, None).await?;

        let body_bytes = Self::read_body(response.into_body()).await?;
        let text = String::from_utf8(body_bytes)
            .map_err(|e| Error::Decode(format!("key list is not valid UTF-8: {}", e)))?;
        if text.is_empty() {
            return Ok(Vec::new());
        }

        // Keys arrive percent-encoded and newline-separated, so keys that
        // themselves contain newlines stay unambiguous.
        text.split('\n')
            .map(|key| {
                percent_decode_str(key)
                    .decode_utf8()
                    .map(|cow| cow.into_owned())
                    .map_err(|e| Error::Decode(format!("key is not valid UTF-8: {}", e)))
            })
            .collect()
    }

    /// Fetch every key and its decoded value.
    ///
    /// Lists all keys, then fetches them one at a time in order; keys
    /// already in the cache skip the network.
    pub async fn get_all(&self) -> Result<HashMap<String, Value>> {
        let mut output = HashMap::new();
        for key in self.list("").await? {
            if let Some(value) = self.get(&key).await? {
                output.insert(key, value);
            }
        }
        Ok(output)
    }

    /// Delete keys one at a time, in order.
    ///
    /// The first failure aborts the batch; keys already deleted stay
    /// deleted.
    pub async fn delete_many<S: AsRef<str>>(&self, keys: &[S]) -> Result<()> {
        for key in keys {
            self.delete(key.as_ref()).await?;
        }
        Ok(())
    }

    /// Delete every key in the store and clear the cache.
    ///
    /// With zero keys this is a no-op beyond the list call.
    pub async fn empty(&self) -> Result<()> {
        let keys = self.list("").await?;
        self.delete_many(&keys).await?;
        self.cache_lock().clear();
        Ok(())
    }
}
