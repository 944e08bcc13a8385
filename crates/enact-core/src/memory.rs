//! Interaction Memory
//!
//! Per-agent ledger of interaction weights and the full history of enacted
//! interactions. Weights only grow during a run and history is append-only.

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use crate::interaction::InteractionId;

/// Component: an agent's interaction memory
#[derive(Component, Debug, Clone, Default)]
pub struct InteractionMemory {
    weights: HashMap<InteractionId, u64>,
    history: Vec<InteractionId>,
    /// Sum over every directly-weighted entry, kept in step with `weights`
    total_weight: u64,
}

impl InteractionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight of an interaction, 0 if it was never weighted
    pub fn weight(&self, interaction: InteractionId) -> u64 {
        self.weights.get(&interaction).copied().unwrap_or(0)
    }

    pub fn increment_weight(&mut self, interaction: InteractionId) {
        *self.weights.entry(interaction).or_insert(0) += 1;
        self.total_weight += 1;
    }

    pub fn set_weight(&mut self, interaction: InteractionId, weight: u64) {
        let previous = self.weights.insert(interaction, weight).unwrap_or(0);
        self.total_weight = self.total_weight - previous + weight;
    }

    /// Sum of the weights of every interaction weighted directly in this
    /// memory. Composites count once with their own weight; their
    /// sub-interactions are not expanded.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Every interaction ever enacted, oldest first
    pub fn history(&self) -> &[InteractionId] {
        &self.history
    }

    /// The last `count` enacted interactions (fewer if history is shorter)
    pub fn recent(&self, count: usize) -> &[InteractionId] {
        let start = self.history.len().saturating_sub(count);
        &self.history[start..]
    }

    pub fn append_history(&mut self, interaction: InteractionId) {
        self.history.push(interaction);
    }

    /// Weight increment plus history append, applied after an enaction
    pub fn record_enaction(&mut self, interaction: InteractionId) {
        self.increment_weight(interaction);
        self.append_history(interaction);
    }

    pub fn weighted(&self) -> impl Iterator<Item = (InteractionId, u64)> + '_ {
        self.weights.iter().map(|(&id, &weight)| (id, weight))
    }
}
