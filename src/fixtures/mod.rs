//! Equatable, identifiable errors for tests.
//!
//! [`AnyError`] stands in for "some error" wherever a test needs to check
//! that a specific error travelled through the code under test unchanged.
//! Every fresh value carries a process-unique id, so two independently
//! created errors never compare equal while a value always equals its copies.
//!
//! # Example
//!
//! ```rust
//! use tddkit::AnyError;
//!
//! let error = AnyError::new();
//! let copy = error;
//!
//! assert_eq!(error, copy);
//! assert_ne!(error, AnyError::new());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// An error identified only by its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnyError {
    id: u64,
}

impl AnyError {
    /// Create an error with a fresh process-unique id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Create an error with an explicit id.
    ///
    /// Ids chosen here are not reserved; they may collide with ids handed
    /// out by [`AnyError::new`].
    #[must_use]
    pub const fn with_id(id: u64) -> Self {
        Self { id }
    }

    /// The identifier of this error.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl Default for AnyError {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyError #{}", self.id)
    }
}

impl std::error::Error for AnyError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fresh_errors_differ() {
        let ids: HashSet<_> = (0..100).map(|_| AnyError::new()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_copies_are_equal() {
        let error = AnyError::new();
        let copy = error;
        assert_eq!(error, copy);
        assert_eq!(error.id(), copy.id());
    }

    #[test]
    fn test_with_id() {
        assert_eq!(AnyError::with_id(7), AnyError::with_id(7));
        assert_eq!(AnyError::with_id(7).to_string(), "AnyError #7");
    }

    #[test]
    fn test_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..50).map(|_| AnyError::new().id()).collect::<Vec<_>>()))
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id));
            }
        }
        assert_eq!(ids.len(), 200);
    }
}
