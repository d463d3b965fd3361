//! Purpose: Lazily computed, per-instance cached values.
//! Exports: `Memo`.
//! Role: Explicit cache field embedded in the owning struct; no global storage.
//! Invariants: The initializer runs at most once per successful computation.
//! Invariants: A failed fallible initializer leaves the cell empty so later calls retry.
//! Invariants: Not `Sync`; owners sharing across threads must add their own locking.

use std::cell::OnceCell;
use std::fmt;

pub struct Memo<T> {
    cell: OnceCell<T>,
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Returns the cached value, computing it with `init` on first use.
    ///
    /// `init` runs outside the cell, so it may read this memo again. If it
    /// stores a value reentrantly, that value wins and the outer result is
    /// dropped.
    pub fn get_or_init<F>(&self, init: F) -> &T
    where
        F: FnOnce() -> T,
    {
        if let Some(value) = self.cell.get() {
            return value;
        }
        tracing::trace!("memo: computing value");
        let value = init();
        self.cell.get_or_init(|| value)
    }

    pub fn get_or_try_init<F, E>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }
        tracing::trace!("memo: computing value");
        let value = init()?;
        Ok(self.cell.get_or_init(|| value))
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Memo").field(value).finish(),
            None => f.write_str("Memo(<pending>)"),
        }
    }
}
