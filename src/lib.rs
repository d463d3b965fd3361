//! Purpose: Shared library crate used by the `ghorg` CLI and tests.
//! Exports: `api` (public surface), `core` (nested access, memoization, errors).
//! Role: Library backing the binary; `api` is the stable entrypoint for callers.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
//! Invariants: Nothing in `core` performs I/O.
pub mod api;
pub mod core;
#[doc(hidden)]
pub mod json;
