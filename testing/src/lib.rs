//! # Artisan Studio Testing
//!
//! Testing utilities for the Artisan Studio client core.
//!
//! This crate provides:
//! - Mock implementations of environment traits ([`FixedClock`])
//! - An in-memory marketplace backend with scripted failures
//! - Helpers for building fragmented byte sources
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```
//! use artisan_studio_testing::{InMemoryMarketplace, Operation, test_clock};
//! use artisan_studio_workflow::{WorkflowConfig, WorkflowOrchestrator};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let marketplace = Arc::new(InMemoryMarketplace::new());
//! let workflow = WorkflowOrchestrator::new(
//!     marketplace.clone(),
//!     Arc::new(test_clock()),
//!     &WorkflowConfig::default(),
//! );
//!
//! workflow
//!     .update_draft(|draft| draft.title = "Blue Pottery Vase".to_string())
//!     .unwrap();
//! let outcome = workflow.generate_story().await.unwrap();
//!
//! assert!(outcome.is_completed());
//! assert_eq!(marketplace.calls_to(Operation::UpsertProduct).len(), 1);
//! # }
//! ```

use artisan_studio_core::environment::Clock;
use chrono::{DateTime, Utc};

pub mod marketplace;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making derived ids reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use artisan_studio_testing::mocks::FixedClock;
    /// use artisan_studio_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use futures::stream::{self, Stream};
    use std::convert::Infallible;

    /// Split `bytes` at the given offsets.
    ///
    /// Offsets outside `1..bytes.len()` and duplicates are ignored, so any
    /// input yields a valid partition that concatenates back to `bytes`.
    #[must_use]
    pub fn split_at_points(bytes: &[u8], points: &[usize]) -> Vec<Vec<u8>> {
        let mut points: Vec<usize> = points
            .iter()
            .copied()
            .filter(|p| *p > 0 && *p < bytes.len())
            .collect();
        points.sort_unstable();
        points.dedup();

        let mut parts = Vec::with_capacity(points.len() + 1);
        let mut start = 0;
        for point in points {
            parts.push(bytes[start..point].to_vec());
            start = point;
        }
        parts.push(bytes[start..].to_vec());
        parts
    }

    /// Infallible byte source yielding `chunks` in order.
    pub fn byte_source(
        chunks: Vec<Vec<u8>>,
    ) -> impl Stream<Item = Result<Vec<u8>, Infallible>> + Send + 'static {
        stream::iter(chunks.into_iter().map(Ok))
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Up to `max` split offsets into a buffer of `len` bytes.
    pub fn split_points(len: usize, max: usize) -> impl Strategy<Value = Vec<usize>> {
        proptest::collection::vec(0..=len, 0..=max)
    }

    /// Catalog size and page size pairs.
    pub fn catalog_shape() -> impl Strategy<Value = (usize, u32)> {
        (0usize..40, 1u32..10)
    }
}

// Re-export commonly used items
pub use marketplace::{InMemoryMarketplace, Operation, RecordedCall, product};
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now().timestamp(), 1_735_689_600);
    }

    #[test]
    fn test_split_at_points_partitions() {
        let parts = helpers::split_at_points(b"abcdef", &[4, 0, 2, 2, 99]);
        assert_eq!(parts, vec![b"ab".to_vec(), b"cd".to_vec(), b"ef".to_vec()]);
        assert_eq!(parts.concat(), b"abcdef");
    }
}
