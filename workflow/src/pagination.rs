//! Cursor-based catalog paging.
//!
//! Exhaustion is decided solely by the absence of `next` in a response; an
//! empty page with a cursor is not the end.

use crate::backend::MarketplaceBackend;
use crate::optimistic::OptimisticMutationManager;
use artisan_studio_core::{Cursor, ProductSummary};
use artisan_studio_http::ApiError;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of one page load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLoad {
    /// Items the load added to the list
    pub items: Vec<ProductSummary>,
    /// Cursor for the next page; `None` when exhausted
    pub next: Option<Cursor>,
}

/// The catalog list plus its continuation cursor.
pub struct CatalogPager {
    backend: Arc<dyn MarketplaceBackend>,
    optimistic: OptimisticMutationManager,
    page_size: u32,
    items: Vec<ProductSummary>,
    next: Option<Cursor>,
    loaded: bool,
}

impl CatalogPager {
    /// Empty pager
    #[must_use]
    pub fn new(backend: Arc<dyn MarketplaceBackend>, page_size: u32) -> Self {
        Self {
            optimistic: OptimisticMutationManager::new(Arc::clone(&backend)),
            backend,
            page_size: page_size.max(1),
            items: Vec::new(),
            next: None,
            loaded: false,
        }
    }

    /// Load one page.
    ///
    /// Without a cursor the list is replaced; with one the page is appended,
    /// skipping ids already present. The list is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns the backend error
    pub async fn load_page(&mut self, cursor: Option<Cursor>) -> Result<PageLoad, ApiError> {
        let fresh = cursor.is_none();
        let page = self.backend.list_products(self.page_size, cursor).await?;

        let mut items: Vec<ProductSummary> = page.items.iter().map(ProductSummary::from).collect();
        if fresh {
            self.items.clone_from(&items);
        } else {
            let mut seen: HashSet<String> = self.items.iter().map(|i| i.id.clone()).collect();
            items.retain(|item| seen.insert(item.id.clone()));
            self.items.extend(items.iter().cloned());
        }

        self.next = match page.next {
            Some(next) if next.is_complete() => Some(next),
            Some(next) => {
                tracing::warn!(
                    ts = %next.ts,
                    id = %next.id,
                    "incomplete cursor; treating catalog as exhausted"
                );
                None
            }
            None => None,
        };
        self.loaded = true;

        tracing::debug!(
            added = items.len(),
            total = self.items.len(),
            exhausted = self.next.is_none(),
            "catalog page loaded"
        );
        Ok(PageLoad {
            items,
            next: self.next.clone(),
        })
    }

    /// Reload from the first page
    ///
    /// # Errors
    ///
    /// Returns the backend error
    pub async fn load_first(&mut self) -> Result<PageLoad, ApiError> {
        self.load_page(None).await
    }

    /// Load the page after the stored cursor.
    ///
    /// Loads the first page if nothing was loaded yet; a no-op once the
    /// catalog is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the backend error
    pub async fn load_more(&mut self) -> Result<PageLoad, ApiError> {
        if !self.loaded {
            return self.load_first().await;
        }
        match self.next.clone() {
            Some(cursor) => self.load_page(Some(cursor)).await,
            None => Ok(PageLoad {
                items: Vec::new(),
                next: None,
            }),
        }
    }

    /// Whether a load happened and no next page exists
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.loaded && self.next.is_none()
    }

    /// Current list
    #[must_use]
    pub fn items(&self) -> &[ProductSummary] {
        &self.items
    }

    /// Stored continuation cursor
    #[must_use]
    pub const fn next_cursor(&self) -> Option<&Cursor> {
        self.next.as_ref()
    }

    /// Configured page size
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Soft-delete `id` optimistically.
    ///
    /// # Errors
    ///
    /// Returns the backend error after the list has been restored
    pub async fn remove(&mut self, id: &str) -> Result<bool, ApiError> {
        self.optimistic.remove(&mut self.items, id).await
    }
}
