//! Typed failures returned by the control operations.

use thiserror::Error;

use crate::plant::PlantId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The referenced plant is not in the store.
    #[error("plant {0} not found")]
    NotFound(PlantId),

    /// A percentage argument was outside 0..=100 and is not clamped.
    #[error("{field} {value} out of range [0, 100]")]
    InvalidRange { field: &'static str, value: i32 },

    #[error("plant name is empty")]
    EmptyName,

    /// Id generator handed out an id that is already present.
    #[error("plant {0} already exists")]
    DuplicateId(PlantId),
}

pub type ControlResult<T> = Result<T, ControlError>;
