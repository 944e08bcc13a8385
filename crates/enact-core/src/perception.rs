//! Perception
//!
//! Perception handlers turn what an agent currently sees into a context
//! string. Agents with a handler wrap their interactions in that context,
//! so `Step Succeed` seen facing a wall two cells away becomes
//! `Step Succeed [wall:2]`.

use std::fmt;

use crate::world::{EntityId, EntityKind, GridWorld};

/// Context reported when nothing is in sight
pub const NOTHING_SEEN: &str = "nothing";

pub trait PerceptionHandler: fmt::Debug + Send + Sync {
    fn compute(&self, world: &GridWorld, agent: EntityId) -> String;
}

/// Looks straight ahead and reports the first non-agent entity and its
/// distance, e.g. `wall:3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicPerceptionHandler {
    /// Maximum distance looked at; `None` looks to the edge of the grid
    pub range: Option<u32>,
}

impl BasicPerceptionHandler {
    pub fn with_range(range: u32) -> Self {
        Self { range: Some(range) }
    }
}

impl PerceptionHandler for BasicPerceptionHandler {
    fn compute(&self, world: &GridWorld, agent: EntityId) -> String {
        let (Some(origin), Some(rotation)) = (world.position(agent), world.rotation(agent)) else {
            return NOTHING_SEEN.to_string();
        };
        let (dx, dy) = rotation.move_delta();

        let mut distance = 1;
        let mut cell = origin.offset(dx, dy);
        while world.in_bounds(cell) && self.range.map_or(true, |range| distance <= range) {
            let seen = world
                .entities_at(cell)
                .into_iter()
                .filter_map(|id| world.kind(id))
                .find(|kind| *kind != EntityKind::Agent);

            if let Some(kind) = seen {
                return format!("{}:{}", kind.as_str(), distance);
            }

            distance += 1;
            cell = cell.offset(dx, dy);
        }

        NOTHING_SEEN.to_string()
    }
}
