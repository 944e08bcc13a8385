//! Enact Logic
//!
//! Environment logic shared by the experiments. Each factory captures the
//! success and fail variants of one primitive and returns the callback the
//! world invokes when an agent attempts it. Callbacks re-check entity
//! presence and fall back to the fail variant when a reference is stale.

use std::collections::BTreeMap;

use tracing::warn;

use crate::agent::AgentState;
use crate::interaction::InteractionId;
use crate::setup::map::ENERGY;
use crate::world::{EntityId, EntityKind, GridWorld, Position};

fn add_energy(world: &mut GridWorld, agent: EntityId, delta: f64) {
    if delta == 0.0 {
        return;
    }
    if let Some(mut state) = world.get_mut::<AgentState>(agent) {
        state.add_to_homeostatic_value(ENERGY, delta);
    }
}

/// Step forward when the facing cell is free; a successful step changes
/// energy by `energy_cost`
pub fn step(
    success: InteractionId,
    fail: InteractionId,
    energy_cost: f64,
) -> impl Fn(&mut GridWorld, EntityId, InteractionId) -> InteractionId + Send + Sync + 'static {
    move |world, agent, _attempted| {
        if world.step(agent) {
            add_energy(world, agent, energy_cost);
            success
        } else {
            fail
        }
    }
}

/// Rotate in place; always succeeds while the agent exists
pub fn turn(
    enacted: InteractionId,
    degrees: i32,
) -> impl Fn(&mut GridWorld, EntityId, InteractionId) -> InteractionId + Send + Sync + 'static {
    move |world, agent, attempted| {
        if world.add_rotation(agent, degrees) {
            enacted
        } else {
            attempted
        }
    }
}

/// Feel the facing cell: succeeds when it cannot be stepped into
pub fn feel(
    success: InteractionId,
    fail: InteractionId,
) -> impl Fn(&mut GridWorld, EntityId, InteractionId) -> InteractionId + Send + Sync + 'static {
    move |world, agent, _attempted| {
        if world.contains(agent) && !world.can_step(agent) {
            success
        } else {
            fail
        }
    }
}

/// Eat food in the agent's own cell, gaining `energy_gain`
pub fn eat(
    success: InteractionId,
    fail: InteractionId,
    energy_gain: f64,
) -> impl Fn(&mut GridWorld, EntityId, InteractionId) -> InteractionId + Send + Sync + 'static {
    move |world, agent, _attempted| {
        let Some(position) = world.position(agent) else {
            return fail;
        };
        let food = world
            .entities_at(position)
            .into_iter()
            .find(|&id| world.kind(id) == Some(EntityKind::Food));

        match food {
            Some(food) if world.remove_entity(food) => {
                add_energy(world, agent, energy_gain);
                success
            }
            _ => fail,
        }
    }
}

/// Break the block in front of the agent, leaving food in its place
pub fn destroy(
    success: InteractionId,
    fail: InteractionId,
) -> impl Fn(&mut GridWorld, EntityId, InteractionId) -> InteractionId + Send + Sync + 'static {
    move |world, agent, _attempted| {
        let Some(block) = world.facing_entity(agent, EntityKind::Block) else {
            return fail;
        };
        let Some(position) = world.position(block) else {
            return fail;
        };
        if !world.remove_entity(block) {
            return fail;
        }
        world.add_entity(EntityKind::Food, position);
        success
    }
}

/// Push the block in front of the agent one cell further
pub fn push(
    success: InteractionId,
    fail: InteractionId,
) -> impl Fn(&mut GridWorld, EntityId, InteractionId) -> InteractionId + Send + Sync + 'static {
    move |world, agent, _attempted| {
        let (Some(block), Some(rotation)) = (world.facing_entity(agent, EntityKind::Block), world.rotation(agent))
        else {
            return fail;
        };
        let Some(position) = world.position(block) else {
            return fail;
        };

        let (dx, dy) = rotation.move_delta();
        let target = position.offset(dx, dy);
        if world.is_free(target) && world.set_position(block, target) {
            success
        } else {
            fail
        }
    }
}

/// Succeeds when another agent shares the agent's cell
pub fn cuddle(
    success: InteractionId,
    fail: InteractionId,
) -> impl Fn(&mut GridWorld, EntityId, InteractionId) -> InteractionId + Send + Sync + 'static {
    move |world, agent, _attempted| {
        let Some(position) = world.position(agent) else {
            return fail;
        };
        let partner = world
            .entities_at(position)
            .into_iter()
            .any(|id| id != agent && world.kind(id) == Some(EntityKind::Agent));

        if partner {
            success
        } else {
            fail
        }
    }
}

/// Two agents destroying the same block together.
///
/// Resolution runs in two phases. First every participant is grouped by the
/// block in the cell it faces. Then, block by block in id order, the first
/// two agents (by id) standing on distinct cells succeed: the block is
/// removed and food appears at its position and in the cell below it, when
/// that cell is on the grid. Everyone else gets `fail`.
pub fn collaborative_destroy(
    success: InteractionId,
    fail: InteractionId,
) -> impl Fn(&mut GridWorld, &BTreeMap<EntityId, InteractionId>) -> BTreeMap<EntityId, InteractionId>
       + Send
       + Sync
       + 'static {
    move |world, attempts| {
        let mut enacted: BTreeMap<EntityId, InteractionId> =
            attempts.keys().map(|&agent| (agent, fail)).collect();

        let mut engaged: BTreeMap<EntityId, Vec<EntityId>> = BTreeMap::new();
        for &agent in attempts.keys() {
            if let Some(block) = world.facing_entity(agent, EntityKind::Block) {
                engaged.entry(block).or_default().push(agent);
            }
        }

        for (block, agents) in engaged {
            let mut partners: Vec<(EntityId, Position)> = Vec::with_capacity(2);
            for agent in agents {
                let Some(at) = world.position(agent) else {
                    continue;
                };
                if partners.iter().all(|&(_, other)| other != at) {
                    partners.push((agent, at));
                }
                if partners.len() == 2 {
                    break;
                }
            }
            if partners.len() < 2 {
                continue;
            }

            let Some(position) = world.position(block) else {
                warn!(block = %block, "block vanished before collaborative destroy");
                continue;
            };
            if !world.remove_entity(block) {
                warn!(block = %block, "block vanished before collaborative destroy");
                continue;
            }

            world.add_entity(EntityKind::Food, position);
            let below = position.offset(0, 1);
            if world.in_bounds(below) {
                world.add_entity(EntityKind::Food, below);
            }

            for (agent, _) in partners {
                enacted.insert(agent, success);
            }
        }

        enacted
    }
}
