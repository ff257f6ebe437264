//! Interface of the InterSystems IRIS embedded Python runtime.
//!
//! The runtime itself is vendor-supplied and opaque. This crate declares its
//! surface ([`EmbeddedRuntime`] and friends) plus a few helpers written purely
//! against that surface: a transaction scope and a lock guard.

pub mod api;
pub mod error;
pub mod value;

use std::time::Duration;

pub use api::{
    ClassRef, EmbeddedRuntime, GlobalRef, LockMode, NodeData, PreparedQuery, RowSet, Rows,
};
pub use error::{Result, RuntimeError};
pub use value::{Arg, IrisRef, Value};

/// Run `f` inside a transaction level: commit on `Ok`, roll back this level on `Err`.
pub fn with_transaction<R, T, F>(rt: &R, f: F) -> Result<T>
where
    R: EmbeddedRuntime + ?Sized,
    F: FnOnce(&R) -> Result<T>,
{
    rt.tstart()?;
    match f(rt) {
        Ok(v) => {
            rt.tcommit()?;
            Ok(v)
        }
        Err(e) => {
            if let Err(rb) = rt.trollbackone() {
                tracing::error!("rollback failed after {}: {}", e, rb);
            }
            Err(e)
        }
    }
}

/// Held locks; released on drop.
pub struct LockGuard<'a, R: EmbeddedRuntime + ?Sized> {
    rt: &'a R,
    names: Vec<String>,
    mode: LockMode,
}

impl<'a, R: EmbeddedRuntime + ?Sized> LockGuard<'a, R> {
    /// `Ok(None)` when the locks could not be taken within `timeout`.
    pub fn acquire(
        rt: &'a R,
        names: &[&str],
        timeout: Option<Duration>,
        mode: LockMode,
    ) -> Result<Option<Self>> {
        if !rt.lock(names, timeout, mode)? {
            return Ok(None);
        }
        Ok(Some(Self {
            rt,
            names: names.iter().map(|s| s.to_string()).collect(),
            mode,
        }))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl<R: EmbeddedRuntime + ?Sized> Drop for LockGuard<'_, R> {
    fn drop(&mut self) {
        let names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        if let Err(e) = self.rt.unlock(&names, self.mode) {
            tracing::warn!("unlock {:?} failed: {}", self.names, e);
        }
    }
}
