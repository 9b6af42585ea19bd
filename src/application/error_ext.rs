//! Error conversion helpers for store operations
//!
//! Provides an extension trait for cleaner error handling with context.

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::StoreResult;

/// Extension trait for converting `StoreResult` to `ApplicationResult` with context.
pub trait StoreResultExt<T> {
    /// Add context to a store error.
    ///
    /// # Example
    /// ```ignore
    /// self.store.find_patient(id).with_context("load patient")?;
    /// ```
    fn with_context(self, action: &str) -> ApplicationResult<T>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn with_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::persistence(action, e))
    }
}
