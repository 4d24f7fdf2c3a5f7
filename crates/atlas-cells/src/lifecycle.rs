//! Capabilities whose use is tied to the lifetime of a screen.
//!
//! A [`Scope`] is owned by whatever hosts the capability (a screen or
//! controller). Handles created from it keep working until the scope is
//! closed or dropped; after that every access fails with
//! [`Error::Unavailable`] instead of reaching a torn-down host.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::{Error, Result};

/// Owner of a lifetime.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    open: Arc<AtomicBool>,
}

impl Scope {
    /// Opens a scope. `name` appears in [`Error::Unavailable`].
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Wraps `value` in a handle valid for this scope.
    #[must_use]
    pub fn handle<T>(&self, value: T) -> ScopedHandle<T> {
        ScopedHandle {
            name: self.name,
            value: Arc::new(value),
            open: Arc::clone(&self.open),
        }
    }

    /// Returns `true` until the scope is closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Closes the scope, invalidating every handle.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            debug!(scope = self.name, "Scope closed");
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.close();
    }
}

/// A capability usable only while its [`Scope`] is open.
#[derive(Debug)]
pub struct ScopedHandle<T> {
    name: &'static str,
    value: Arc<T>,
    open: Arc<AtomicBool>,
}

impl<T> Clone for ScopedHandle<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            value: Arc::clone(&self.value),
            open: Arc::clone(&self.open),
        }
    }
}

impl<T> ScopedHandle<T> {
    /// Returns `true` while the scope is open.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Fails if the scope has closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unavailable`] once the scope is closed.
    pub fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(Error::Unavailable(self.name))
        }
    }

    /// Returns the capability.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unavailable`] once the scope is closed.
    pub fn get(&self) -> Result<Arc<T>> {
        self.ensure_available()?;
        Ok(Arc::clone(&self.value))
    }
}
