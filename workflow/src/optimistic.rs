//! Optimistic catalog mutations.
//!
//! A removal is applied to the local list immediately and confirmed with
//! the server afterwards. If confirmation fails the list is restored to the
//! exact snapshot taken before the removal (contents and order).

use crate::backend::MarketplaceBackend;
use artisan_studio_core::{ConfirmationState, Identified, PendingMutation};
use artisan_studio_http::ApiError;
use std::sync::Arc;

/// Applies local removals ahead of the server and reconciles afterwards.
#[derive(Clone)]
pub struct OptimisticMutationManager {
    backend: Arc<dyn MarketplaceBackend>,
}

impl OptimisticMutationManager {
    /// Manager confirming against `backend`
    #[must_use]
    pub fn new(backend: Arc<dyn MarketplaceBackend>) -> Self {
        Self { backend }
    }

    /// Remove `id` from `view` locally.
    ///
    /// Returns `None` (and leaves `view` untouched) when `id` is not present.
    pub fn apply_removal<T>(view: &mut Vec<T>, id: &str) -> Option<PendingMutation<T>>
    where
        T: Identified + Clone,
    {
        if !view.iter().any(|item| item.id() == id) {
            return None;
        }
        let previous = view.clone();
        view.retain(|item| item.id() != id);

        Some(PendingMutation {
            target_id: id.to_string(),
            previous,
            current: view.clone(),
            state: ConfirmationState::Unconfirmed,
        })
    }

    /// The server accepted the mutation.
    pub fn confirm<T>(mutation: &mut PendingMutation<T>) {
        mutation.state = ConfirmationState::Confirmed;
    }

    /// The server rejected the mutation: restore the snapshot.
    pub fn rollback<T: Clone>(view: &mut Vec<T>, mutation: &mut PendingMutation<T>) {
        view.clone_from(&mutation.previous);
        mutation.state = ConfirmationState::RolledBack;
    }

    /// Soft-delete `id`: remove it locally, then `PATCH {is_active: false}`.
    ///
    /// Returns `Ok(false)` if `id` was not in `view` (no request is made).
    ///
    /// # Errors
    ///
    /// Returns the backend error after `view` has been rolled back
    pub async fn remove<T>(&self, view: &mut Vec<T>, id: &str) -> Result<bool, ApiError>
    where
        T: Identified + Clone,
    {
        let Some(mut mutation) = Self::apply_removal(view, id) else {
            return Ok(false);
        };

        match self.backend.set_active(id.to_string(), false).await {
            Ok(()) => {
                Self::confirm(&mut mutation);
                tracing::debug!(product_id = %id, "removal confirmed");
                Ok(true)
            }
            Err(err) => {
                Self::rollback(view, &mut mutation);
                tracing::warn!(product_id = %id, error = %err, "removal rolled back");
                Err(err)
            }
        }
    }
}
