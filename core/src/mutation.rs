//! Optimistic local mutations awaiting server confirmation.

use crate::catalog::ProductSummary;

/// Items addressable by a stable id.
pub trait Identified {
    /// Stable id
    fn id(&self) -> &str;
}

impl Identified for ProductSummary {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Where a pending mutation stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfirmationState {
    /// Applied locally, remote call outstanding
    #[default]
    Unconfirmed,
    /// Remote call succeeded
    Confirmed,
    /// Remote call failed; the snapshot was restored
    RolledBack,
}

/// A local change applied ahead of the server, with the snapshot needed to
/// undo it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingMutation<T> {
    /// Id of the item the mutation targets
    pub target_id: String,
    /// View before the mutation was applied
    pub previous: Vec<T>,
    /// View after the mutation was applied
    pub current: Vec<T>,
    /// Confirmation state
    pub state: ConfirmationState,
}

impl<T> PendingMutation<T> {
    /// Whether the mutation is still awaiting the server.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == ConfirmationState::Unconfirmed
    }
}
