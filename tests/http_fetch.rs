//! Purpose: End-to-end tests for the HTTP JSON fetcher and the GitHub org client.
//! Exports: None (integration test module).
//! Role: Validate request shape, status mapping, and memoized org/repos fetching over TCP.
//! Invariants: Uses a loopback-only stub server with canned responses.
//! Invariants: The stub records every request path so fetch counts can be asserted.

use ghorg::api::{ErrorKind, FetchConfig, GithubOrgClient, HttpFetcher, JsonFetcher, get_json};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

struct StubResponse {
    status: u16,
    body: String,
}

#[derive(Clone, Debug)]
struct SeenRequest {
    path: String,
    headers: HashMap<String, String>,
}

struct StubServer {
    base_url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubServer {
    /// Serves `routes` keyed by request path; `{base}` in a body expands to the server URL.
    fn start(routes: Vec<(&str, u16, String)>) -> TestResult<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let routes: HashMap<String, StubResponse> = routes
            .into_iter()
            .map(|(path, status, body)| {
                let body = body.replace("{base}", &base_url);
                (path.to_string(), StubResponse { status, body })
            })
            .collect();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_server = Arc::clone(&seen);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    continue;
                };
                let _ = handle(stream, &routes, &seen_by_server);
            }
        });

        Ok(Self { base_url, seen })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn seen(&self) -> Vec<SeenRequest> {
        self.seen
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

fn handle(
    stream: TcpStream,
    routes: &HashMap<String, StubResponse>,
    seen: &Mutex<Vec<SeenRequest>>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    seen.lock()
        .unwrap_or_else(|poison| poison.into_inner())
        .push(SeenRequest {
            path: path.clone(),
            headers,
        });

    let (status, body) = match routes.get(&path) {
        Some(response) => (response.status, response.body.as_str()),
        None => (404, r#"{"message":"Not Found"}"#),
    };
    let reason = match status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        _ => "Internal Server Error",
    };
    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    stream.flush()
}

fn org_payload(repos_url: &str) -> Value {
    json!({
        "login": "google",
        "id": 1342004,
        "repos_url": repos_url,
        "public_repos": 4,
    })
}

fn repos_payload() -> Value {
    json!([
        {"id": 7697149, "name": "episodes.dart", "license": {"key": "bsd-3-clause", "name": "BSD 3-Clause"}},
        {"id": 7776515, "name": "cpp-netlib", "license": {"key": "bsl-1.0"}},
        {"id": 7968417, "name": "dagger", "license": {"key": "apache-2.0"}},
        {"id": 8165161, "name": "ios-webkit-debug-proxy", "license": null},
    ])
}

#[test]
fn http_fetcher_returns_parsed_body() -> TestResult<()> {
    let server = StubServer::start(vec![("/doc", 200, json!({"a": {"b": 2}}).to_string())])?;
    let value = get_json(&server.url("/doc"))?;
    assert_eq!(value, json!({"a": {"b": 2}}));

    let seen = server.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "/doc");
    assert_eq!(
        seen[0].headers.get("accept").map(String::as_str),
        Some("application/json")
    );
    assert!(!seen[0].headers.contains_key("authorization"));
    Ok(())
}

#[test]
fn http_fetcher_sends_token_and_user_agent() -> TestResult<()> {
    let server = StubServer::start(vec![("/doc", 200, "[]".to_string())])?;
    let fetcher = HttpFetcher::new(
        FetchConfig::default()
            .with_token("s3cret")
            .with_token_scope(&server.base_url)
            .with_user_agent("ghorg-tests"),
    );
    let value = fetcher.get_json(&server.url("/doc"))?;
    assert_eq!(value, json!([]));

    let seen = server.seen();
    assert_eq!(
        seen[0].headers.get("authorization").map(String::as_str),
        Some("Bearer s3cret")
    );
    assert_eq!(
        seen[0].headers.get("user-agent").map(String::as_str),
        Some("ghorg-tests")
    );
    Ok(())
}

#[test]
fn http_fetcher_maps_status_codes() -> TestResult<()> {
    let server = StubServer::start(vec![
        (
            "/forbidden",
            403,
            json!({"message": "API rate limit exceeded", "documentation_url": "https://docs.github.com/rest"})
                .to_string(),
        ),
        ("/limited", 429, "{}".to_string()),
        ("/broken", 500, "oops".to_string()),
    ])?;
    let fetcher = HttpFetcher::default();

    let err = fetcher.get_json(&server.url("/forbidden")).expect_err("403");
    assert_eq!(err.kind(), ErrorKind::Permission);
    assert_eq!(err.message(), Some("API rate limit exceeded (status 403)"));
    assert_eq!(err.hint(), Some("See https://docs.github.com/rest"));
    assert_eq!(err.url(), Some(server.url("/forbidden").as_str()));

    let err = fetcher.get_json(&server.url("/missing")).expect_err("404");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = fetcher.get_json(&server.url("/limited")).expect_err("429");
    assert_eq!(err.kind(), ErrorKind::Busy);

    let err = fetcher.get_json(&server.url("/broken")).expect_err("500");
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.message(), Some("http status 500"));
    Ok(())
}

#[test]
fn http_fetcher_rejects_invalid_json() -> TestResult<()> {
    let server = StubServer::start(vec![("/bad", 200, "{not json".to_string())])?;
    let err = get_json(&server.url("/bad")).expect_err("corrupt");
    assert_eq!(err.kind(), ErrorKind::Corrupt);
    Ok(())
}

#[test]
fn http_fetcher_reports_transport_failure() -> TestResult<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    let err = get_json(&format!("http://{addr}/gone")).expect_err("refused");
    assert_eq!(err.kind(), ErrorKind::Io);
    Ok(())
}

#[test]
fn org_client_lists_public_repos() -> TestResult<()> {
    let server = StubServer::start(vec![
        (
            "/orgs/google",
            200,
            org_payload("{base}/orgs/google/repos").to_string(),
        ),
        ("/orgs/google/repos", 200, repos_payload().to_string()),
    ])?;
    let client =
        GithubOrgClient::new("google", HttpFetcher::default()).with_api_base(&server.base_url);

    assert_eq!(
        client.public_repos_url()?,
        server.url("/orgs/google/repos")
    );
    assert_eq!(
        client.public_repos(None)?,
        vec!["episodes.dart", "cpp-netlib", "dagger", "ios-webkit-debug-proxy"]
    );
    assert_eq!(client.public_repos(Some("apache-2.0"))?, vec!["dagger"]);
    assert_eq!(client.public_repos(Some("bsl-1.0"))?, vec!["cpp-netlib"]);

    let paths: Vec<String> = server.seen().into_iter().map(|req| req.path).collect();
    assert_eq!(paths, vec!["/orgs/google", "/orgs/google/repos"]);
    Ok(())
}

#[test]
fn token_is_withheld_from_foreign_repos_host() -> TestResult<()> {
    let foreign = StubServer::start(vec![("/collect", 200, repos_payload().to_string())])?;
    let api = StubServer::start(vec![(
        "/orgs/google",
        200,
        org_payload(&foreign.url("/collect")).to_string(),
    )])?;
    let fetcher = HttpFetcher::new(
        FetchConfig::default()
            .with_token("s3cret")
            .with_token_scope(&api.base_url),
    );
    let client = GithubOrgClient::new("google", fetcher).with_api_base(&api.base_url);

    assert_eq!(client.public_repos(Some("apache-2.0"))?, vec!["dagger"]);

    let api_seen = api.seen();
    assert_eq!(api_seen.len(), 1);
    assert_eq!(
        api_seen[0].headers.get("authorization").map(String::as_str),
        Some("Bearer s3cret")
    );
    let foreign_seen = foreign.seen();
    assert_eq!(foreign_seen.len(), 1);
    assert_eq!(foreign_seen[0].path, "/collect");
    assert!(!foreign_seen[0].headers.contains_key("authorization"));
    Ok(())
}

#[test]
fn org_client_rejects_path_like_org_name() -> TestResult<()> {
    let server = StubServer::start(Vec::new())?;
    let client = GithubOrgClient::new("../users/octocat", HttpFetcher::default())
        .with_api_base(&server.base_url);
    let err = client.public_repos(None).expect_err("invalid org");
    assert_eq!(err.kind(), ErrorKind::Usage);
    assert!(server.seen().is_empty());
    Ok(())
}

#[test]
fn org_client_surfaces_missing_org() -> TestResult<()> {
    let server = StubServer::start(Vec::new())?;
    let client =
        GithubOrgClient::new("nobody", HttpFetcher::default()).with_api_base(&server.base_url);
    let err = client.public_repos(None).expect_err("missing org");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.url(), Some(server.url("/orgs/nobody").as_str()));
    Ok(())
}
