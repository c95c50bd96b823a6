use thiserror::Error;

use crate::protocol::EntityId;
use crate::registry::EntityKind;

/// A state-stream message that could not be turned into a snapshot.
///
/// Always recoverable: the message is dropped and the scene stays as it was.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("message is not valid JSON for the state stream: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message is empty")]
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} {id} is already registered")]
    Duplicate { kind: EntityKind, id: EntityId },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("world_extent must be a positive finite number, got {0}")]
    WorldExtent(f64),

    #[error("smoothing must be in (0, 1], got {0}")]
    Smoothing(f32),

    #[error("viewport must have positive width and height, got {width}x{height}")]
    Viewport { width: f32, height: f32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid colour {0:?}: expected #rrggbb or #rrggbbaa")]
pub struct ParseRgbaError(pub String);
