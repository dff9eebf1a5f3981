//! Proxy pool acquisition.
//!
//! The pool endpoint hands out one proxy per request. Responses come in two
//! shapes in the wild: a JSON document (either the proxy record itself or an
//! envelope with `ret`/`msg`/`data`) or a plain `host:port` text line. Both
//! are accepted and produce the same proxy URL.

use crate::error::TransportError;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::debug;

/// Environment variable naming the proxy pool endpoint; unset disables the pool
pub const ENV_PROXY_API_URL: &str = "GATEKEY_PROXY_API_URL";
/// Environment variable overriding the proxy scheme
pub const ENV_PROXY_SCHEME: &str = "GATEKEY_PROXY_SCHEME";
/// Environment variable overriding the pool request timeout, in seconds
pub const ENV_PROXY_REQUEST_TIMEOUT: &str = "GATEKEY_PROXY_REQUEST_TIMEOUT_SECS";
/// Environment variable overriding the proxied client timeout, in seconds
pub const ENV_PROXY_CLIENT_TIMEOUT: &str = "GATEKEY_PROXY_CLIENT_TIMEOUT_SECS";

const DEFAULT_SCHEME: &str = "http";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);
const DIAL_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Proxy pool settings, usually read from the environment
#[derive(Debug, Clone)]
pub struct ProxyPoolConfig {
    /// Pool endpoint URL
    pub endpoint: String,
    /// Scheme applied to proxies that arrive without one
    pub scheme: String,
    /// Timeout for the pool endpoint request
    pub request_timeout: Duration,
    /// Overall timeout for the proxied client
    pub client_timeout: Duration,
}

impl ProxyPoolConfig {
    /// Read pool settings from the environment.
    ///
    /// Returns `Ok(None)` when [`ENV_PROXY_API_URL`] is unset or blank, which
    /// means the pool is disabled and callers should use a direct client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] when a timeout variable is present
    /// but not a positive integer number of seconds.
    pub fn from_env() -> Result<Option<Self>, TransportError> {
        let endpoint = env::var(ENV_PROXY_API_URL).unwrap_or_default();
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Ok(None);
        }

        let scheme = env::var(ENV_PROXY_SCHEME)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string());

        Ok(Some(Self {
            endpoint: endpoint.to_string(),
            scheme,
            request_timeout: duration_env(ENV_PROXY_REQUEST_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)?,
            client_timeout: duration_env(ENV_PROXY_CLIENT_TIMEOUT, DEFAULT_CLIENT_TIMEOUT)?,
        }))
    }
}

fn duration_env(key: &str, fallback: Duration) -> Result<Duration, TransportError> {
    match env::var(key) {
        Err(_) => Ok(fallback),
        Ok(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(fallback);
            }
            raw.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| TransportError::Config(format!("{key} must be seconds, got {raw:?}")))
        }
    }
}

/// Acquire an HTTP client according to the environment.
///
/// With a configured pool this draws one proxy and routes the returned client
/// through it; otherwise it returns a direct-connection client.
///
/// # Errors
///
/// Returns a [`TransportError`] when the pool is configured but the draw or
/// the client construction fails. Pool failures are fatal for this
/// acquisition only; calling again starts a fresh draw.
pub async fn acquire() -> Result<reqwest::Client, TransportError> {
    match ProxyPoolConfig::from_env()? {
        Some(cfg) => acquire_with(&cfg).await,
        None => {
            debug!("proxy pool not configured, using direct connection");
            reqwest::Client::builder()
                .timeout(DEFAULT_CLIENT_TIMEOUT)
                .build()
                .map_err(TransportError::Build)
        }
    }
}

/// Acquire an HTTP client routed through one proxy drawn from `cfg`'s pool.
///
/// # Errors
///
/// Returns a [`TransportError`] when the pool request fails, answers with a
/// non-success status, or hands back a response no proxy can be extracted
/// from.
pub async fn acquire_with(cfg: &ProxyPoolConfig) -> Result<reqwest::Client, TransportError> {
    let pool_client = reqwest::Client::builder()
        .timeout(cfg.request_timeout)
        .build()
        .map_err(TransportError::Build)?;

    let response = pool_client
        .get(&cfg.endpoint)
        .send()
        .await
        .map_err(TransportError::PoolRequest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::PoolStatus(status.as_u16()));
    }

    let body = response.text().await.map_err(TransportError::PoolRequest)?;
    let endpoint = parse_proxy_response(&body)?;
    debug!(proxy = %endpoint.authority(), "acquired proxy from pool");

    let mut proxy = reqwest::Proxy::all(endpoint.url(&cfg.scheme)).map_err(TransportError::Build)?;
    if let Some((user, pass)) = endpoint.credentials() {
        proxy = proxy.basic_auth(user, pass);
    }

    reqwest::Client::builder()
        .proxy(proxy)
        .connect_timeout(DIAL_TIMEOUT)
        .pool_idle_timeout(IDLE_TIMEOUT)
        .timeout(cfg.client_timeout)
        .build()
        .map_err(TransportError::Build)
}

/// One proxy as extracted from a pool response
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProxyEndpoint {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
}

impl ProxyEndpoint {
    fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn url(&self, scheme: &str) -> String {
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (None, None) => None,
            (user, pass) => Some((
                user.as_deref().unwrap_or_default(),
                pass.as_deref().unwrap_or_default(),
            )),
        }
    }
}

/// Extract a proxy from a pool response body.
///
/// JSON bodies are tried first (a document starting with `{`); anything else
/// is treated as plain text whose first line is `host:port`.
pub(crate) fn parse_proxy_response(body: &str) -> Result<ProxyEndpoint, TransportError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(TransportError::MalformedResponse(
            "empty body".to_string(),
        ));
    }

    if trimmed.starts_with('{') {
        if let Ok(endpoint) = parse_json_proxy(trimmed) {
            return Ok(endpoint);
        }
    }

    parse_plain_proxy(trimmed)
}

fn parse_json_proxy(body: &str) -> Result<ProxyEndpoint, TransportError> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

    if let Some(ret) = int_field(&root, "ret") {
        if ret != 200 && ret != 0 {
            let msg = string_field(&root, "msg").unwrap_or_else(|| format!("ret={ret}"));
            return Err(TransportError::MalformedResponse(format!(
                "pool error: {msg}"
            )));
        }
    }

    extract_record(&root)
        .ok_or_else(|| TransportError::MalformedResponse("no proxy data".to_string()))
        .and_then(record_to_endpoint)
}

/// Find the object carrying the proxy fields: the root itself, or the
/// first usable element under `data`.
fn extract_record(root: &Value) -> Option<&Value> {
    if string_field(root, "ip").is_some() {
        return Some(root);
    }
    match root.get("data") {
        Some(Value::Array(items)) => items.iter().find(|v| string_field(v, "ip").is_some()),
        Some(obj @ Value::Object(_)) if string_field(obj, "ip").is_some() => Some(obj),
        _ => None,
    }
}

fn record_to_endpoint(record: &Value) -> Result<ProxyEndpoint, TransportError> {
    let host = string_field(record, "ip")
        .ok_or_else(|| TransportError::MalformedResponse("proxy ip missing".to_string()))?;
    let port = string_field(record, "port")
        .and_then(|p| p.parse::<u16>().ok())
        .ok_or_else(|| TransportError::MalformedResponse("proxy port missing".to_string()))?;

    Ok(ProxyEndpoint {
        host,
        port,
        username: first_string_field(record, &["user", "username"]),
        password: first_string_field(record, &["pwd", "password"]),
    })
}

fn parse_plain_proxy(body: &str) -> Result<ProxyEndpoint, TransportError> {
    let line = body
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| TransportError::MalformedResponse("blank line".to_string()))?;

    // Tolerate pools that return a full URL instead of a bare authority.
    let authority = match line.split_once("://") {
        Some((_, rest)) => rest,
        None => line,
    };

    let (host, port) = authority
        .rsplit_once(':')
        .ok_or_else(|| TransportError::MalformedResponse(format!("missing port in {line:?}")))?;
    let port: u16 = port
        .parse()
        .map_err(|_| TransportError::MalformedResponse(format!("invalid port in {line:?}")))?;
    if host.is_empty() {
        return Err(TransportError::MalformedResponse(format!(
            "missing host in {line:?}"
        )));
    }

    Ok(ProxyEndpoint {
        host: host.to_string(),
        port,
        username: None,
        password: None,
    })
}

/// String-valued field, also accepting numbers (ports often arrive as either).
fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| string_field(value, k))
}

fn int_field(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_and_plain_forms_agree() {
        let from_json = parse_proxy_response(r#"{"ip":"1.2.3.4","port":"8080"}"#).unwrap();
        let from_plain = parse_proxy_response("1.2.3.4:8080").unwrap();

        assert_eq!(from_json, from_plain);
        assert_eq!(from_json.url("http"), "http://1.2.3.4:8080");
    }

    #[test]
    fn test_json_numeric_port() {
        let endpoint = parse_proxy_response(r#"{"ip":"1.2.3.4","port":8080}"#).unwrap();
        assert_eq!(endpoint.url("socks5"), "socks5://1.2.3.4:8080");
    }

    #[test]
    fn test_json_envelope_with_data_array() {
        let body = r#"{"ret":200,"msg":"ok","data":[{"ip":"5.6.7.8","port":"3128","user":"u1","pwd":"p1"}]}"#;
        let endpoint = parse_proxy_response(body).unwrap();
        assert_eq!(endpoint.authority(), "5.6.7.8:3128");
        assert_eq!(endpoint.credentials(), Some(("u1", "p1")));
    }

    #[test]
    fn test_json_envelope_with_data_object() {
        let body = r#"{"ret":0,"data":{"ip":"5.6.7.8","port":"3128","username":"u2","password":"p2"}}"#;
        let endpoint = parse_proxy_response(body).unwrap();
        assert_eq!(endpoint.credentials(), Some(("u2", "p2")));
    }

    #[test]
    fn test_json_error_envelope_is_fatal() {
        let result = parse_proxy_response(r#"{"ret":121,"msg":"quota exhausted"}"#);
        assert!(matches!(result, Err(TransportError::MalformedResponse(m)) if m.contains("quota")));
    }

    #[test]
    fn test_plain_takes_first_nonempty_line() {
        let endpoint = parse_proxy_response("\n  9.9.9.9:1080\n10.0.0.1:1081\n").unwrap();
        assert_eq!(endpoint.authority(), "9.9.9.9:1080");
    }

    #[test]
    fn test_plain_accepts_full_url() {
        let endpoint = parse_proxy_response("http://9.9.9.9:1080").unwrap();
        assert_eq!(endpoint.authority(), "9.9.9.9:1080");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_proxy_response("").is_err());
        assert!(parse_proxy_response("   \n  ").is_err());
        assert!(parse_proxy_response("no-port-here").is_err());
        assert!(parse_proxy_response("1.2.3.4:notaport").is_err());
        assert!(parse_proxy_response(r#"{"msg":"nothing useful"}"#).is_err());
    }
}
