//! Purpose: List a GitHub organization's public repositories.
//! Exports: `GithubOrgClient`, `ORG_URL`, `DEFAULT_API_BASE`.
//! Role: Composes the JSON fetcher, per-instance memoization, and nested access.
//! Invariants: The org payload and repos payload are each fetched at most once per client.
//! Invariants: Repo order follows the repos payload.
//! Invariants: A repo without `license.key` never matches a license filter.
//! Invariants: The org name is one percent-encoded path segment under `orgs/`.
#![allow(clippy::result_large_err)]

use super::fetch::JsonFetcher;
use crate::core::access::access_nested_map;
use crate::core::error::{Error, ErrorKind};
use crate::core::memo::Memo;
use serde_json::Value;
use url::Url;

type ApiResult<T> = Result<T, Error>;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const ORG_URL: &str = "https://api.github.com/orgs/{org}";

pub struct GithubOrgClient<F> {
    org_name: String,
    api_base: String,
    fetcher: F,
    org: Memo<Value>,
    repos_payload: Memo<Value>,
}

impl<F: JsonFetcher> GithubOrgClient<F> {
    pub fn new(org_name: impl Into<String>, fetcher: F) -> Self {
        Self {
            org_name: org_name.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            fetcher,
            org: Memo::new(),
            repos_payload: Memo::new(),
        }
    }

    /// Points the client at another API host (GitHub Enterprise, a test stub).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn org_name(&self) -> &str {
        &self.org_name
    }

    /// `{api_base}/orgs/{org}`, with the org name escaped as a single segment.
    pub fn org_url(&self) -> ApiResult<String> {
        let name = self.org_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("invalid organization name {name:?}"))
                .with_hint("Organization names are a single path segment."));
        }
        let mut url = Url::parse(&self.api_base).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("invalid api base url")
                .with_url(&self.api_base)
                .with_source(err)
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                Error::new(ErrorKind::Usage)
                    .with_message("api base url cannot have a path")
                    .with_url(&self.api_base)
            })?
            .pop_if_empty()
            .push("orgs")
            .push(name);
        Ok(url.to_string())
    }

    pub fn org(&self) -> ApiResult<&Value> {
        self.org.get_or_try_init(|| {
            let url = self.org_url()?;
            self.fetcher.get_json(&url)
        })
    }

    pub fn public_repos_url(&self) -> ApiResult<String> {
        let org = self.org()?;
        let url = match access_nested_map(org, &["repos_url"]) {
            Ok(url) => url,
            Err(err) => return Err(Error::from(err).with_url(self.org_url()?)),
        };
        match url.as_str() {
            Some(url) => Ok(url.to_string()),
            None => Err(Error::new(ErrorKind::Corrupt)
                .with_message("repos_url is not a string")
                .with_key("repos_url")
                .with_url(self.org_url()?)),
        }
    }

    pub fn repos_payload(&self) -> ApiResult<&Value> {
        self.repos_payload.get_or_try_init(|| {
            let url = self.public_repos_url()?;
            let payload = self.fetcher.get_json(&url)?;
            if !payload.is_array() {
                return Err(Error::new(ErrorKind::Corrupt)
                    .with_message("repos payload is not an array")
                    .with_url(url));
            }
            Ok(payload)
        })
    }

    /// Names of the org's public repos, optionally limited to one license key.
    pub fn public_repos(&self, license: Option<&str>) -> ApiResult<Vec<String>> {
        let repos = self.repos_payload()?.as_array().map(Vec::as_slice).unwrap_or(&[]);
        let mut names = Vec::new();
        for repo in repos {
            if let Some(license_key) = license {
                if !Self::has_license(repo, license_key) {
                    continue;
                }
            }
            let name = repo.get("name").and_then(Value::as_str).ok_or_else(|| {
                Error::new(ErrorKind::Corrupt)
                    .with_message("repo entry has no name")
                    .with_key("name")
            })?;
            names.push(name.to_string());
        }
        tracing::debug!(org = %self.org_name, count = names.len(), "listed public repos");
        Ok(names)
    }

    pub fn has_license(repo: &Value, license_key: &str) -> bool {
        match access_nested_map(repo, &["license", "key"]) {
            Ok(key) => key.as_str() == Some(license_key),
            Err(_) => false,
        }
    }
}
