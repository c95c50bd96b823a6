use crate::error::DecodeError;
use crate::math::SimPoint;
use crate::protocol::{AgentRecord, EntityId, ObstacleRecord, StateMessage, WireEntity};

/// One decoded state-stream message. Immutable once built; dropped after reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub entities: Vec<EntityDelta>,
    /// Entries skipped because their kind is unknown or does not belong to the array they were in.
    pub ignored: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityDelta {
    Agent(AgentDelta),
    Obstacle(ObstacleDelta),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentDelta {
    pub id: EntityId,
    pub position: SimPoint,
    /// Radians, applied as-is to the glyph rotation.
    pub heading: f64,
    /// Remaining route. `None` when the message carried no path (or `null`).
    pub path: Option<Vec<SimPoint>>,
    /// The producer could not find a route for this agent.
    pub stalled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleDelta {
    pub id: EntityId,
    /// Corners as sent; not necessarily ordered per axis.
    pub bounds_min: SimPoint,
    pub bounds_max: SimPoint,
}

impl WorldSnapshot {
    /// Decodes one message. Nothing is returned unless the whole message is well-formed.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DecodeError::Empty);
        }
        let message: StateMessage = serde_json::from_str(text)?;
        Ok(Self::from(message))
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentDelta> {
        self.entities.iter().filter_map(|delta| match delta {
            EntityDelta::Agent(agent) => Some(agent),
            EntityDelta::Obstacle(_) => None,
        })
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &ObstacleDelta> {
        self.entities.iter().filter_map(|delta| match delta {
            EntityDelta::Obstacle(obstacle) => Some(obstacle),
            EntityDelta::Agent(_) => None,
        })
    }
}

impl From<StateMessage> for WorldSnapshot {
    fn from(message: StateMessage) -> Self {
        let mut entities = Vec::with_capacity(message.updated.len() + message.obstacles.len());
        let mut ignored = 0;

        for entry in message.updated {
            match entry {
                WireEntity::Agent(record) => entities.push(EntityDelta::Agent(record.into())),
                _ => ignored += 1,
            }
        }
        for entry in message.obstacles {
            match entry {
                WireEntity::Obstacle(record) => {
                    entities.push(EntityDelta::Obstacle(record.into()))
                }
                _ => ignored += 1,
            }
        }

        Self {
            tick: message.tick,
            entities,
            ignored,
        }
    }
}

impl From<AgentRecord> for AgentDelta {
    fn from(record: AgentRecord) -> Self {
        Self {
            id: record.id,
            position: SimPoint::new(record.x, record.z),
            heading: record.rotation,
            path: record
                .path
                .map(|points| points.into_iter().map(SimPoint::from).collect()),
            stalled: record.no_path,
        }
    }
}

impl From<ObstacleRecord> for ObstacleDelta {
    fn from(record: ObstacleRecord) -> Self {
        Self {
            id: record.id,
            bounds_min: SimPoint::new(record.min_x, record.min_z),
            bounds_max: SimPoint::new(record.max_x, record.max_z),
        }
    }
}
