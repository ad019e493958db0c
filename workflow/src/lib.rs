//! # Artisan Studio Workflow
//!
//! Client-side orchestration for the Artisan Studio marketplace:
//!
//! - [`WorkflowOrchestrator`]: the multi-stage product creation session
//! - [`OptimisticMutationManager`]: local removals with rollback
//! - [`CatalogPager`]: cursor-based catalog paging
//!
//! All three talk to the marketplace through [`MarketplaceBackend`];
//! [`HttpMarketplace`] is the production implementation.
//!
//! ## Example
//!
//! ```no_run
//! use artisan_studio_http::RequestClient;
//! use artisan_studio_workflow::{CatalogPager, HttpMarketplace, WorkflowConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorkflowConfig::from_env()?;
//!     let backend = Arc::new(HttpMarketplace::new(RequestClient::from_env()?));
//!
//!     let mut pager = CatalogPager::new(backend, config.page_size);
//!     pager.load_first().await?;
//!     while !pager.is_exhausted() {
//!         pager.load_more().await?;
//!     }
//!     println!("{} products", pager.items().len());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod http_backend;
pub mod optimistic;
pub mod orchestrator;
pub mod pagination;
pub mod session;
pub mod upload;

// Re-export main types for convenience
pub use backend::{
    BackendFuture, GenerateRequest, GenerateResponse, GeneratedItem, MarketingPostItem,
    MarketingSuggestion, MarketplaceBackend, PostOptions, PostResponse, QuickTextMode,
    QuickTextRequest, QuickTextResponse, SignedUpload, SuggestRequest, TaglineRequest,
};
pub use config::WorkflowConfig;
pub use error::WorkflowError;
pub use http_backend::HttpMarketplace;
pub use optimistic::OptimisticMutationManager;
pub use orchestrator::{MarketingCopy, StageOutcome, WorkflowOrchestrator};
pub use pagination::{CatalogPager, PageLoad};
pub use session::{SessionState, StageTicket, WorkflowSession};
pub use upload::LocalFile;
