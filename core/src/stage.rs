//! Workflow stages and their per-stage status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One independently failable step of the product creation workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Image upload (signed URL + PUT)
    Upload,
    /// Description / quick text generation
    Description,
    /// Story generation
    Story,
    /// Marketing post generation
    MarketingPost,
    /// Final save
    Save,
}

impl StageKind {
    /// Every stage, in workflow order.
    pub const ALL: [Self; 5] = [
        Self::Upload,
        Self::Description,
        Self::Story,
        Self::MarketingPost,
        Self::Save,
    ];

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Description => "description",
            Self::Story => "story",
            Self::MarketingPost => "marketing post",
            Self::Save => "save",
        }
    }

    /// Text appended to the affected field when this stage fails, if any.
    #[must_use]
    pub const fn failure_marker(self) -> Option<&'static str> {
        match self {
            Self::Story => Some("[Story failed]"),
            Self::MarketingPost => Some("[Marketing failed]"),
            Self::Upload | Self::Description | Self::Save => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status of a single stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum GenerationStage {
    /// Not started
    #[default]
    Idle,
    /// In flight
    Running,
    /// Finished; carries a short result note
    Succeeded(String),
    /// Failed; carries the reason
    Failed(String),
}

impl GenerationStage {
    /// Whether the stage is in flight.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether the stage finished (either way).
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    /// Failure reason, if the stage failed.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
