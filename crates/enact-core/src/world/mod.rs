//! Grid World
//!
//! Spatial bookkeeping for the simulation: a width x height grid holding
//! walls, blocks, food and agents. Entities are stored in a bevy ECS world;
//! every entity also carries a creation-order [`EntityId`] so iteration is
//! deterministic regardless of archetype layout.

mod enact;

pub use enact::{ComplexEnactFn, EnactFn, EnactLogic, Logic, Outcome};

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::agent::{Agent, AgentState};
use crate::interaction::InteractionRegistry;
use crate::memory::InteractionMemory;

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

/// Component: creation-order identity of an entity
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity_{:04}", self.0)
    }
}

impl EntityId {
    /// Label used for agents in traces, e.g. `agent_0003`
    pub fn agent_label(&self) -> String {
        format!("agent_{:04}", self.0)
    }
}

/// Component: grid cell of an entity. `y` grows downward.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Component: facing in degrees, 0 east, 90 north, 180 west, 270 south
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rotation(i32);

impl Rotation {
    pub const EAST: Rotation = Rotation(0);
    pub const NORTH: Rotation = Rotation(90);
    pub const WEST: Rotation = Rotation(180);
    pub const SOUTH: Rotation = Rotation(270);

    pub fn new(degrees: i32) -> Self {
        Self(degrees.rem_euclid(360))
    }

    pub fn degrees(&self) -> i32 {
        self.0
    }

    pub fn rotated(&self, degrees: i32) -> Self {
        Self::new(self.0 + degrees)
    }

    /// Cell offset of one step forward
    pub fn move_delta(&self) -> (i32, i32) {
        let radians = (self.0 as f64).to_radians();
        (radians.cos().round() as i32, -(radians.sin().round() as i32))
    }
}

/// Component: what an entity is
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Agent,
    Wall,
    Block,
    Food,
}

impl EntityKind {
    /// Solid entities block stepping into their cell
    pub fn is_solid(&self) -> bool {
        matches!(self, EntityKind::Wall | EntityKind::Block)
    }

    pub fn is_structure(&self) -> bool {
        !matches!(self, EntityKind::Agent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Agent => "agent",
            EntityKind::Wall => "wall",
            EntityKind::Block => "block",
            EntityKind::Food => "food",
        }
    }
}

#[derive(Bundle)]
struct StructureBundle {
    id: EntityId,
    kind: EntityKind,
    position: Position,
}

#[derive(Bundle)]
struct AgentBundle {
    id: EntityId,
    kind: EntityKind,
    position: Position,
    rotation: Rotation,
    state: AgentState,
    memory: InteractionMemory,
    agent: Agent,
}

/// The simulated world: grid, entities, interactions and enact logic
pub struct GridWorld {
    ecs: World,
    width: i32,
    height: i32,
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
    interactions: InteractionRegistry,
    logic: EnactLogic,
    exploration_rate: f64,
}

impl GridWorld {
    pub fn new(width: i32, height: i32) -> Self {
        let mut ecs = World::new();
        ecs.insert_resource(SimRng(SmallRng::seed_from_u64(0)));

        Self {
            ecs,
            width: width.max(0),
            height: height.max(0),
            entities: BTreeMap::new(),
            next_id: 0,
            interactions: InteractionRegistry::new(),
            logic: EnactLogic::default(),
            exploration_rate: 0.0,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn set_size(&mut self, width: i32, height: i32) {
        self.width = width.max(0);
        self.height = height.max(0);
    }

    /// Reseed the world's random number generator
    pub fn seed(&mut self, seed: u64) {
        self.ecs.insert_resource(SimRng(SmallRng::seed_from_u64(seed)));
    }

    /// Chance, per agent and tick, of attempting a random action instead
    /// of the best anticipated one
    pub fn set_exploration_rate(&mut self, rate: f64) {
        self.exploration_rate = rate.clamp(0.0, 1.0);
    }

    pub fn interactions(&self) -> &InteractionRegistry {
        &self.interactions
    }

    pub fn interactions_mut(&mut self) -> &mut InteractionRegistry {
        &mut self.interactions
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.width && position.y < self.height
    }

    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a structure (wall, block, food) at a position
    pub fn add_entity(&mut self, kind: EntityKind, position: Position) -> EntityId {
        if kind == EntityKind::Agent {
            return self.add_agent(position, Rotation::default());
        }

        let id = self.next_entity_id();
        let entity = self.ecs.spawn(StructureBundle { id, kind, position }).id();
        self.entities.insert(id, entity);
        id
    }

    /// Add an agent with empty memory and no configured interactions
    pub fn add_agent(&mut self, position: Position, rotation: Rotation) -> EntityId {
        let id = self.next_entity_id();
        let entity = self
            .ecs
            .spawn(AgentBundle {
                id,
                kind: EntityKind::Agent,
                position,
                rotation,
                state: AgentState::default(),
                memory: InteractionMemory::default(),
                agent: Agent::default(),
            })
            .id();
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity; false if it was already gone
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        match self.entities.remove(&id) {
            Some(entity) => self.ecs.despawn(entity),
            None => false,
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// All entities in creation order
    pub fn entities(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// All agents in creation order
    pub fn agents(&self) -> Vec<EntityId> {
        self.entities
            .keys()
            .copied()
            .filter(|&id| self.kind(id) == Some(EntityKind::Agent))
            .collect()
    }

    /// Entities occupying a cell, in creation order
    pub fn entities_at(&self, position: Position) -> Vec<EntityId> {
        self.entities
            .keys()
            .copied()
            .filter(|&id| self.position(id) == Some(position))
            .collect()
    }

    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        let entity = *self.entities.get(&id)?;
        self.ecs.get::<C>(entity)
    }

    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Option<Mut<'_, C>> {
        let entity = *self.entities.get(&id)?;
        self.ecs.get_mut::<C>(entity)
    }

    /// Insert or replace a component on an entity; false if it is gone
    pub fn insert<C: Component>(&mut self, id: EntityId, component: C) -> bool {
        let Some(&entity) = self.entities.get(&id) else {
            return false;
        };
        match self.ecs.get_entity_mut(entity) {
            Some(mut entity) => {
                entity.insert(component);
                true
            }
            None => false,
        }
    }

    pub fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.get::<EntityKind>(id).copied()
    }

    pub fn position(&self, id: EntityId) -> Option<Position> {
        self.get::<Position>(id).copied()
    }

    pub fn set_position(&mut self, id: EntityId, position: Position) -> bool {
        match self.get_mut::<Position>(id) {
            Some(mut current) => {
                *current = position;
                true
            }
            None => false,
        }
    }

    pub fn rotation(&self, id: EntityId) -> Option<Rotation> {
        self.get::<Rotation>(id).copied()
    }

    pub fn set_rotation(&mut self, id: EntityId, rotation: Rotation) -> bool {
        self.insert(id, rotation)
    }

    pub fn add_rotation(&mut self, id: EntityId, degrees: i32) -> bool {
        match self.get_mut::<Rotation>(id) {
            Some(mut rotation) => {
                *rotation = rotation.rotated(degrees);
                true
            }
            None => false,
        }
    }

    /// The cell an entity is facing; `None` for entities without rotation
    pub fn front_of(&self, id: EntityId) -> Option<Position> {
        let position = self.position(id)?;
        let (dx, dy) = self.rotation(id)?.move_delta();
        Some(position.offset(dx, dy))
    }

    /// First entity of `kind` in the cell in front of `id`
    pub fn facing_entity(&self, id: EntityId, kind: EntityKind) -> Option<EntityId> {
        let front = self.front_of(id)?;
        self.entities_at(front)
            .into_iter()
            .find(|&other| self.kind(other) == Some(kind))
    }

    /// Whether a cell is inside the grid and free of solid entities
    pub fn is_free(&self, position: Position) -> bool {
        self.in_bounds(position)
            && self
                .entities_at(position)
                .into_iter()
                .all(|id| !self.kind(id).is_some_and(|kind| kind.is_solid()))
    }

    /// Whether the agent can step into the cell it is facing
    pub fn can_step(&self, agent: EntityId) -> bool {
        self.front_of(agent).is_some_and(|front| self.is_free(front))
    }

    /// Move the agent one cell forward if it can step
    pub fn step(&mut self, agent: EntityId) -> bool {
        if !self.can_step(agent) {
            return false;
        }
        match self.front_of(agent) {
            Some(front) => self.set_position(agent, front),
            None => false,
        }
    }
}

impl fmt::Debug for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridWorld")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("entities", &self.entities.len())
            .field("interactions", &self.interactions.len())
            .field("logic", &self.logic)
            .finish()
    }
}
