//! Agents
//!
//! Agent components: homeostatic state, the interaction repertoire and the
//! valuation pipeline (motivation, then boredom) used to pick what to
//! attempt each tick.

use bevy_ecs::prelude::*;
use rand::Rng;
use std::collections::BTreeMap;

use crate::boredom::{BoredomHandler, PassthroughBoredomHandler};
use crate::error::{SimError, SimResult};
use crate::interaction::{InteractionId, InteractionRegistry, SUCCEED};
use crate::memory::InteractionMemory;
use crate::motivation::MotivationTable;
use crate::perception::PerceptionHandler;
use crate::world::EntityId;

/// Component: homeostatic values such as `energy`
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct AgentState {
    homeostasis: BTreeMap<String, f64>,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Homeostatic value by name, 0 if never set
    pub fn homeostatic_value(&self, name: &str) -> f64 {
        self.homeostasis.get(name).copied().unwrap_or(0.0)
    }

    pub fn set_homeostatic_value(&mut self, name: impl Into<String>, value: f64) {
        self.homeostasis.insert(name.into(), value);
    }

    pub fn add_to_homeostatic_value(&mut self, name: &str, delta: f64) {
        *self.homeostasis.entry(name.to_string()).or_insert(0.0) += delta;
    }
}

/// Component: what an agent can do and how it values it
#[derive(Component, Debug)]
pub struct Agent {
    primitives: Vec<InteractionId>,
    motivation: MotivationTable,
    boredom: Box<dyn BoredomHandler>,
    perception: Option<Box<dyn PerceptionHandler>>,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            primitives: Vec::new(),
            motivation: MotivationTable::default(),
            boredom: Box::new(PassthroughBoredomHandler),
            perception: None,
        }
    }
}

/// An interaction an agent intends to enact this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    pub agent: EntityId,
    pub interaction: InteractionId,
    /// Boredom-discounted valence the agent expects
    pub valence: f64,
}

impl Agent {
    /// Primitives the agent knows, success and fail variants alike
    pub fn primitives(&self) -> &[InteractionId] {
        &self.primitives
    }

    pub fn set_primitives(&mut self, primitives: Vec<InteractionId>) {
        self.primitives = primitives;
    }

    pub fn motivation(&self) -> &MotivationTable {
        &self.motivation
    }

    pub fn set_motivation(&mut self, motivation: MotivationTable) {
        self.motivation = motivation;
    }

    pub fn boredom(&self) -> &dyn BoredomHandler {
        self.boredom.as_ref()
    }

    pub fn set_boredom(&mut self, boredom: Box<dyn BoredomHandler>) {
        self.boredom = boredom;
    }

    pub fn perception(&self) -> Option<&dyn PerceptionHandler> {
        self.perception.as_deref()
    }

    pub fn set_perception(&mut self, perception: Box<dyn PerceptionHandler>) {
        self.perception = Some(perception);
    }

    /// Motivation of an interaction discounted by boredom
    pub fn valuate(
        &self,
        registry: &InteractionRegistry,
        state: &AgentState,
        memory: &InteractionMemory,
        interaction: InteractionId,
    ) -> SimResult<f64> {
        let raw = self.motivation.evaluate(registry, interaction, state)?;
        Ok(self.boredom.process_boredom(registry, memory, interaction, raw))
    }

    /// Valence the agent anticipates from attempting `primitive`.
    ///
    /// Every variant of the primitive's action that memory holds for this
    /// context contributes its boredom-discounted valence, weighted by its
    /// share of the action's weight. An action never enacted in the
    /// context is valued as the attempt itself.
    pub fn anticipate(
        &self,
        registry: &mut InteractionRegistry,
        state: &AgentState,
        memory: &InteractionMemory,
        primitive: InteractionId,
        context: Option<&str>,
    ) -> SimResult<f64> {
        let variants: Vec<InteractionId> = {
            let action = registry.action(primitive);
            self.primitives
                .iter()
                .copied()
                .filter(|&variant| registry.action(variant) == action)
                .collect()
        };

        let mut seen = Vec::with_capacity(variants.len());
        for variant in variants {
            let variant = in_context(registry, variant, context);
            let weight = memory.weight(variant);
            if weight > 0 {
                seen.push((variant, weight));
            }
        }

        let total: u64 = seen.iter().map(|&(_, weight)| weight).sum();
        if total == 0 {
            let attempt = in_context(registry, primitive, context);
            return self.valuate(registry, state, memory, attempt);
        }

        let mut anticipated = 0.0;
        for (variant, weight) in seen {
            let share = weight as f64 / total as f64;
            anticipated += share * self.valuate(registry, state, memory, variant)?;
        }
        Ok(anticipated)
    }

    /// Pick the action with the highest anticipated valence and propose its
    /// succeed variant.
    ///
    /// With a perceptual context every candidate is wrapped in it first.
    /// With probability `exploration` a uniformly random action is proposed
    /// instead. Ties go to the earliest primitive.
    pub fn choose<R: Rng>(
        &self,
        id: EntityId,
        registry: &mut InteractionRegistry,
        state: &AgentState,
        memory: &InteractionMemory,
        context: Option<&str>,
        exploration: f64,
        rng: &mut R,
    ) -> SimResult<Proposal> {
        let mut candidates = Vec::new();
        for &primitive in &self.primitives {
            if registry.result(primitive) != Some(SUCCEED) {
                continue;
            }
            let valence = self.anticipate(registry, state, memory, primitive, context)?;
            candidates.push(Proposal {
                agent: id,
                interaction: in_context(registry, primitive, context),
                valence,
            });
        }

        if candidates.is_empty() {
            return Err(SimError::NoCandidates(id));
        }

        if exploration > 0.0 && rng.gen::<f64>() < exploration {
            return Ok(candidates[rng.gen_range(0..candidates.len())]);
        }

        let mut best = candidates[0];
        for candidate in candidates.into_iter().skip(1) {
            if candidate.valence > best.valence {
                best = candidate;
            }
        }
        Ok(best)
    }
}

fn in_context(registry: &mut InteractionRegistry, primitive: InteractionId, context: Option<&str>) -> InteractionId {
    match context {
        Some(context) => registry.perception(primitive, context).unwrap_or(primitive),
        None => primitive,
    }
}
