// Core modules: nested access, per-instance memoization, and error modeling.
pub mod access;
pub mod error;
pub mod memo;
pub mod nested;
