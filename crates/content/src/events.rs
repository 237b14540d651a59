//! Model lifecycle events
//!
//! Listeners return `true` to let the operation continue. Returning `false`
//! from a `*ing` event vetoes the operation; the veto is not an error, the
//! operation simply reports that nothing happened.

use std::fmt;
use std::str::FromStr;

use crate::model::Model;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelEvent {
    Creating,
    Created,
    Saving,
    Saved,
    Updating,
    Updated,
    Deleting,
    Deleted,
    Restoring,
    Restored,
}

impl ModelEvent {
    pub const ALL: [ModelEvent; 10] = [
        ModelEvent::Creating,
        ModelEvent::Created,
        ModelEvent::Saving,
        ModelEvent::Saved,
        ModelEvent::Updating,
        ModelEvent::Updated,
        ModelEvent::Deleting,
        ModelEvent::Deleted,
        ModelEvent::Restoring,
        ModelEvent::Restored,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelEvent::Creating => "creating",
            ModelEvent::Created => "created",
            ModelEvent::Saving => "saving",
            ModelEvent::Saved => "saved",
            ModelEvent::Updating => "updating",
            ModelEvent::Updated => "updated",
            ModelEvent::Deleting => "deleting",
            ModelEvent::Deleted => "deleted",
            ModelEvent::Restoring => "restoring",
            ModelEvent::Restored => "restored",
        }
    }

    /// Whether a `false` from a listener aborts the surrounding operation
    pub fn can_veto(&self) -> bool {
        matches!(
            self,
            ModelEvent::Creating
                | ModelEvent::Saving
                | ModelEvent::Updating
                | ModelEvent::Deleting
                | ModelEvent::Restoring
        )
    }
}

impl fmt::Display for ModelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelEvent::ALL
            .iter()
            .copied()
            .find(|event| event.name() == s)
            .ok_or_else(|| format!("Unknown model event: {}", s))
    }
}

/// Observer receiving every lifecycle event of one model
///
/// All hooks default to letting the operation through.
pub trait ModelObserver: Send + Sync {
    fn creating(&self, _model: &mut Model) -> bool {
        true
    }

    fn created(&self, _model: &mut Model) -> bool {
        true
    }

    fn saving(&self, _model: &mut Model) -> bool {
        true
    }

    fn saved(&self, _model: &mut Model) -> bool {
        true
    }

    fn updating(&self, _model: &mut Model) -> bool {
        true
    }

    fn updated(&self, _model: &mut Model) -> bool {
        true
    }

    fn deleting(&self, _model: &mut Model) -> bool {
        true
    }

    fn deleted(&self, _model: &mut Model) -> bool {
        true
    }

    fn restoring(&self, _model: &mut Model) -> bool {
        true
    }

    fn restored(&self, _model: &mut Model) -> bool {
        true
    }

    /// Dispatch by event
    fn handle(&self, event: ModelEvent, model: &mut Model) -> bool {
        match event {
            ModelEvent::Creating => self.creating(model),
            ModelEvent::Created => self.created(model),
            ModelEvent::Saving => self.saving(model),
            ModelEvent::Saved => self.saved(model),
            ModelEvent::Updating => self.updating(model),
            ModelEvent::Updated => self.updated(model),
            ModelEvent::Deleting => self.deleting(model),
            ModelEvent::Deleted => self.deleted(model),
            ModelEvent::Restoring => self.restoring(model),
            ModelEvent::Restored => self.restored(model),
        }
    }
}
