//! Purpose: Fetch a JSON document over HTTP with a single blocking GET.
//! Exports: `JsonFetcher`, `HttpFetcher`, `FetchConfig`, `get_json`.
//! Role: Network seam for the org client; tests substitute their own `JsonFetcher`.
//! Invariants: One request per call; no retries, no caching.
//! Invariants: Only http/https URLs are accepted.
//! Invariants: Errors carry the requested URL as context.
//! Invariants: The bearer token is only sent to the origin it is scoped to.
#![allow(clippy::result_large_err)]

use super::github::DEFAULT_API_BASE;
use crate::core::error::{Error, ErrorKind};
use crate::json::parse;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use url::{Origin, Url};

type ApiResult<T> = Result<T, Error>;

/// Anything that can turn a URL into a parsed JSON value.
pub trait JsonFetcher {
    fn get_json(&self, url: &str) -> ApiResult<Value>;
}

impl<F: JsonFetcher + ?Sized> JsonFetcher for &F {
    fn get_json(&self, url: &str) -> ApiResult<Value> {
        (**self).get_json(url)
    }
}

#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub user_agent: String,
    pub token: Option<String>,
    /// Base URL whose origin may receive `token`; defaults to the GitHub API.
    pub token_scope: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("ghorg/", env!("CARGO_PKG_VERSION")).to_string(),
            token: None,
            token_scope: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_token_scope(mut self, base_url: impl Into<String>) -> Self {
        self.token_scope = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[derive(Clone)]
pub struct HttpFetcher {
    inner: Arc<HttpFetcherInner>,
}

struct HttpFetcherInner {
    token: Option<(String, Origin)>,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    documentation_url: Option<String>,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(&config.user_agent)
            .build();
        let scope = Url::parse(&config.token_scope).ok().map(|url| url.origin());
        if config.token.is_some() && scope.is_none() {
            tracing::warn!(scope = %config.token_scope, "invalid token scope; token will not be sent");
        }
        let token = config.token.zip(scope);
        Self {
            inner: Arc::new(HttpFetcherInner { token, agent }),
        }
    }

    fn request(&self, url: &Url) -> ureq::Request {
        let mut request = self
            .inner
            .agent
            .get(url.as_str())
            .set("Accept", "application/json");
        if let Some(token) = self.token_for(url) {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        request
    }

    fn token_for(&self, url: &Url) -> Option<&str> {
        let (token, origin) = self.inner.token.as_ref()?;
        if url.origin() != *origin {
            tracing::debug!(url = %url, "token withheld from foreign origin");
            return None;
        }
        Some(token.as_str())
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

impl JsonFetcher for HttpFetcher {
    fn get_json(&self, url: &str) -> ApiResult<Value> {
        let url = parse_http_url(url)?;
        tracing::debug!(url = %url, "fetching json");
        match self.request(&url).call() {
            Ok(resp) => {
                tracing::trace!(url = %url, status = resp.status(), "response received");
                read_json_response(resp).map_err(|err| err.with_url(url.as_str()))
            }
            Err(ureq::Error::Status(code, resp)) => {
                tracing::debug!(url = %url, status = code, "request rejected");
                Err(parse_error_response(code, resp).with_url(url.as_str()))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_url(url.as_str())
                .with_source(err)),
        }
    }
}

/// Fetches `url` with a default [`HttpFetcher`] and returns the parsed body.
pub fn get_json(url: &str) -> ApiResult<Value> {
    HttpFetcher::default().get_json(url)
}

fn parse_http_url(raw: &str) -> ApiResult<Url> {
    let url = Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid url")
            .with_url(raw)
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("url must use http or https scheme")
            .with_url(raw));
    }
    Ok(url)
}

fn read_json_response(response: ureq::Response) -> ApiResult<Value> {
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    parse::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Corrupt)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    let mut err = Error::new(status_error_kind(status));
    match parse::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("http status {status}"));
            err = err.with_message(format!("{message} (status {status})"));
            if let Some(docs) = envelope.documentation_url {
                err = err.with_hint(format!("See {docs}"));
            }
        }
        Err(_) => {
            err = err.with_message(format!("http status {status}"));
        }
    }
    err
}

fn status_error_kind(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::Permission,
        404 => ErrorKind::NotFound,
        429 => ErrorKind::Busy,
        400..=499 => ErrorKind::Usage,
        500..=599 => ErrorKind::Internal,
        _ => ErrorKind::Io,
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchConfig, HttpFetcher, get_json, parse_http_url, status_error_kind};
    use crate::core::error::ErrorKind;

    #[test]
    fn parse_http_url_accepts_https() {
        let url = parse_http_url("https://api.github.com/orgs/google").expect("url");
        assert_eq!(url.host_str(), Some("api.github.com"));
    }

    #[test]
    fn parse_http_url_rejects_other_schemes() {
        let err = parse_http_url("file:///etc/passwd").expect_err("scheme");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.url(), Some("file:///etc/passwd"));
    }

    #[test]
    fn get_json_rejects_garbage_before_network() {
        let err = get_json("not a url").expect_err("invalid");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn status_error_kind_maps_known_values() {
        assert_eq!(status_error_kind(401), ErrorKind::Permission);
        assert_eq!(status_error_kind(403), ErrorKind::Permission);
        assert_eq!(status_error_kind(404), ErrorKind::NotFound);
        assert_eq!(status_error_kind(422), ErrorKind::Usage);
        assert_eq!(status_error_kind(429), ErrorKind::Busy);
        assert_eq!(status_error_kind(502), ErrorKind::Internal);
        assert_eq!(status_error_kind(304), ErrorKind::Io);
    }

    #[test]
    fn fetch_config_defaults_to_crate_user_agent() {
        let config = FetchConfig::default();
        assert!(config.user_agent.starts_with("ghorg/"));
        assert!(config.token.is_none());
        let config = config.with_token("t0k").with_user_agent("custom");
        assert_eq!(config.token.as_deref(), Some("t0k"));
        assert_eq!(config.user_agent, "custom");
    }

    #[test]
    fn token_is_only_offered_to_scoped_origin() {
        let fetcher = HttpFetcher::new(
            FetchConfig::default()
                .with_token("t0k")
                .with_token_scope("https://ghe.example.com/api/v3"),
        );
        let same = parse_http_url("https://ghe.example.com/api/v3/orgs/acme").expect("url");
        assert_eq!(fetcher.token_for(&same), Some("t0k"));

        for foreign in [
            "https://api.github.com/orgs/acme",
            "http://ghe.example.com/api/v3/orgs/acme",
            "https://ghe.example.com:8443/orgs/acme",
            "https://attacker.example/collect",
        ] {
            let url = parse_http_url(foreign).expect("url");
            assert_eq!(fetcher.token_for(&url), None, "{foreign}");
        }
    }

    #[test]
    fn default_scope_is_github_api() {
        let fetcher = HttpFetcher::new(FetchConfig::default().with_token("t0k"));
        let api = parse_http_url("https://api.github.com/orgs/acme/repos").expect("url");
        assert_eq!(fetcher.token_for(&api), Some("t0k"));
        let raw = parse_http_url("https://raw.githubusercontent.com/x").expect("url");
        assert_eq!(fetcher.token_for(&raw), None);
    }

    #[test]
    fn unparseable_scope_never_sends_token() {
        let fetcher = HttpFetcher::new(
            FetchConfig::default()
                .with_token("t0k")
                .with_token_scope("not a url"),
        );
        let url = parse_http_url("https://api.github.com/orgs/acme").expect("url");
        assert_eq!(fetcher.token_for(&url), None);
    }
}
