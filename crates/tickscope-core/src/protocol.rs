//! Wire shapes of the state stream: one JSON object per message.
//!
//! ```json
//! { "tick": 12,
//!   "updated":   [ { "id": 1, "type": "agent", "x": 3.0, "z": 4.5, "rotation": 1.57,
//!                    "path": [ { "x": 5.0, "z": 5.0 } ], "noPath": false } ],
//!   "obstacles": [ { "id": "a1", "type": "obstacle",
//!                    "minX": 1.0, "minZ": 1.0, "maxX": 2.0, "maxZ": 3.0 } ] }
//! ```

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::math::SimPoint;

/// Stable identity of one logical entity, as assigned by the producer.
///
/// Producers send either integers or strings (UUIDs); both are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(id) => write!(f, "{id}"),
            EntityId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Int(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Text(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::Text(value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateMessage {
    pub tick: u64,
    pub updated: Vec<WireEntity>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub obstacles: Vec<WireEntity>,
}

/// One array entry, discriminated by its `type` field.
///
/// Kinds this client does not know decode to [`WireEntity::Unknown`] and are skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireEntity {
    Agent(AgentRecord),
    Obstacle(ObstacleRecord),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub id: EntityId,
    pub x: f64,
    pub z: f64,
    pub rotation: f64,
    #[serde(default)]
    pub path: Option<Vec<WirePoint>>,
    #[serde(default)]
    pub no_path: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleRecord {
    pub id: EntityId,
    pub min_x: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_z: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WirePoint {
    pub x: f64,
    pub z: f64,
}

impl From<WirePoint> for SimPoint {
    fn from(value: WirePoint) -> Self {
        SimPoint::new(value.x, value.z)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_accept_numbers_and_strings() {
        let ids: Vec<EntityId> = serde_json::from_str(r#"[7, "7", "b3c1"]"#).unwrap();
        assert_eq!(ids[0], EntityId::Int(7));
        assert_eq!(ids[1], EntityId::Text("7".into()));
        assert_ne!(ids[0], ids[1]);
        assert_eq!(ids[2].to_string(), "b3c1");
    }

    #[test]
    fn unknown_entry_kinds_decode_as_unknown() {
        let entry: WireEntity =
            serde_json::from_str(r#"{"type": "projectile", "id": 1, "speed": 9}"#).unwrap();
        assert!(matches!(entry, WireEntity::Unknown));
    }

    #[test]
    fn null_obstacles_are_empty() {
        let msg: StateMessage =
            serde_json::from_str(r#"{"tick": 1, "updated": [], "obstacles": null}"#).unwrap();
        assert!(msg.obstacles.is_empty());
    }
}
