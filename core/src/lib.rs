//! # Artisan Studio Core
//!
//! Domain types shared by the Artisan Studio marketplace client.
//!
//! This crate holds no I/O. It describes the data that flows between the
//! request pipeline, the stream decoder and the product creation workflow:
//!
//! - **Draft**: the in-memory, unsaved product being created ([`draft`])
//! - **Stage**: one independently failable workflow step ([`stage`])
//! - **Cursor**: the continuation token for catalog paging ([`catalog`])
//! - **Stream event**: one decoded record of a streamed response ([`event`])
//! - **Pending mutation**: an optimistic local change awaiting confirmation ([`mutation`])
//!
//! ## Example
//!
//! ```
//! use artisan_studio_core::draft::ProductDraft;
//!
//! let mut draft = ProductDraft::new();
//! draft.title = "Blue Pottery Vase".to_string();
//! draft.category = "Pottery".to_string();
//! draft.add_image("/placeholder-640x360.png");
//!
//! let payload = draft.to_payload("blue-pottery-vase");
//! assert!(payload.images.is_none());
//! ```

pub use chrono::{DateTime, Utc};

pub mod catalog;
pub mod compose;
pub mod draft;
pub mod event;
pub mod mutation;
pub mod stage;

pub use catalog::{Cursor, ProductPage, ProductRecord, ProductSummary};
pub use draft::{DraftError, ProductDraft, ProductPayload, PLACEHOLDER_IMAGE};
pub use event::StreamEvent;
pub use mutation::{ConfirmationState, Identified, PendingMutation};
pub use stage::{GenerationStage, StageKind};

/// Environment module - injected dependencies
///
/// External effects the domain needs (currently only time) are abstracted
/// behind traits so tests can substitute deterministic implementations.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Used when a product name yields no usable slug and the draft id has
    /// to fall back to a timestamp.
    ///
    /// # Examples
    ///
    /// ```
    /// use artisan_studio_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock implementation backed by [`Utc::now`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
