use tracing::info;

use crate::error::{LabelbaseError, Result};

/// Caller-owned selection of the "current" labelbase.
///
/// Operations that accept an optional labelbase id fall back to this
/// selection. An explicit id always wins, and empty ids count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    current_labelbase_id: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session with `labelbase_id` already selected.
    pub fn with_labelbase(labelbase_id: impl Into<String>) -> Self {
        Self {
            current_labelbase_id: Some(labelbase_id.into()),
        }
    }

    pub fn current_labelbase_id(&self) -> Option<&str> {
        self.current_labelbase_id.as_deref()
    }

    /// Overwrite the current selection. The id is not checked remotely.
    pub fn select(&mut self, labelbase_id: impl Into<String>) {
        let labelbase_id = labelbase_id.into();
        info!(labelbase_id = %labelbase_id, "current labelbase changed");
        self.current_labelbase_id = Some(labelbase_id);
    }

    pub fn clear(&mut self) {
        self.current_labelbase_id = None;
    }

    /// Pick the labelbase id an operation should target.
    pub fn resolve<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        explicit
            .filter(|id| !id.is_empty())
            .or_else(|| self.current_labelbase_id().filter(|id| !id.is_empty()))
            .ok_or(LabelbaseError::MissingLabelbaseSelection)
    }
}
