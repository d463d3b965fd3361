//! Purpose: Hold top-level CLI command dispatch for `ghorg`.
//! Exports: `dispatch_command`, `Settings`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Each command emits exactly one JSON value on success.

use super::*;
use ghorg::api::{GithubOrgClient, HttpFetcher, JsonFetcher, access_nested_map};

pub(super) struct Settings {
    pub(super) api_base: String,
    pub(super) fetch: FetchConfig,
}

pub(super) fn dispatch_command(command: Command, settings: &Settings) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "ghorg", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Get { keys, json, file } => {
            let document = read_document(json, file)?;
            let found = access_nested_map(&document, &keys)?;
            emit_json(found);
            Ok(RunOutcome::ok())
        }
        Command::Fetch { url, keys } => {
            let fetcher = HttpFetcher::new(settings.fetch.clone());
            let document = fetcher.get_json(&url)?;
            let found = access_nested_map(&document, &keys).map_err(|err| {
                Error::from(err).with_url(url.as_str())
            })?;
            emit_json(found);
            Ok(RunOutcome::ok())
        }
        Command::Repos { org, license } => {
            let fetcher = HttpFetcher::new(settings.fetch.clone());
            let client = GithubOrgClient::new(org, fetcher).with_api_base(&settings.api_base);
            let names = client.public_repos(license.as_deref())?;
            emit_json(&json!(names));
            Ok(RunOutcome::ok())
        }
    }
}
