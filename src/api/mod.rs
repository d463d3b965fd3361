//! Purpose: Define the public Rust API boundary for ghorg.
//! Exports: Nested access, memoization, JSON fetching, and the GitHub org client.
//! Role: Public, additive-only surface used by the CLI and library callers.
//! Invariants: The CLI only reaches core behavior through this module.

mod fetch;
mod github;

pub use crate::core::access::{MissingKey, NestedMap, access_nested_map};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::memo::Memo;
pub use crate::core::nested::Nested;
pub use fetch::{FetchConfig, HttpFetcher, JsonFetcher, get_json};
pub use github::{DEFAULT_API_BASE, GithubOrgClient, ORG_URL};
