//! Boredom Handlers
//!
//! Strategies that discount the raw valence of a proposed interaction based
//! on what the agent has already done. All handlers only read the memory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::interaction::{InteractionId, InteractionRegistry};
use crate::memory::InteractionMemory;

/// Number of recent history entries the repetitive handler compares against
pub const HISTORY_CONSIDER_SIZE: usize = 15;

/// Maps a raw valence to a boredom-discounted valence
pub trait BoredomHandler: fmt::Debug + Send + Sync {
    fn process_boredom(
        &self,
        registry: &InteractionRegistry,
        memory: &InteractionMemory,
        interaction: InteractionId,
        raw_valence: f64,
    ) -> f64;
}

/// No boredom: the raw valence is returned unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughBoredomHandler;

impl BoredomHandler for PassthroughBoredomHandler {
    fn process_boredom(
        &self,
        _registry: &InteractionRegistry,
        _memory: &InteractionMemory,
        _interaction: InteractionId,
        raw_valence: f64,
    ) -> f64 {
        raw_valence
    }
}

/// Discounts interactions whose hierarchical weight dominates the memory.
///
/// Only positive valences are discounted. With no weight recorded at all
/// (`total_weight == 0`) there is nothing to compare against and the raw
/// valence is returned. The weight ratio is clamped to `[0, 1]`, so the
/// result always lies in `[0, raw_valence]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightBoredomHandler;

impl WeightBoredomHandler {
    /// Own weight plus, for composites, the hierarchical weight of both
    /// halves: `w(<i1, i2>) = weight(<i1, i2>) + w(i1) + w(i2)`
    pub fn hierarchical_weight(
        &self,
        registry: &InteractionRegistry,
        memory: &InteractionMemory,
        interaction: InteractionId,
    ) -> u64 {
        let own = memory.weight(interaction);
        match (registry.pre(interaction), registry.post(interaction)) {
            (Some(pre), Some(post)) => {
                own + self.hierarchical_weight(registry, memory, pre)
                    + self.hierarchical_weight(registry, memory, post)
            }
            _ => own,
        }
    }
}

impl BoredomHandler for WeightBoredomHandler {
    fn process_boredom(
        &self,
        registry: &InteractionRegistry,
        memory: &InteractionMemory,
        interaction: InteractionId,
        raw_valence: f64,
    ) -> f64 {
        if raw_valence <= 0.0 {
            return raw_valence;
        }

        let total = memory.total_weight();
        if total == 0 {
            return raw_valence;
        }

        let weight = self.hierarchical_weight(registry, memory, interaction);
        let ratio = (weight as f64 / total as f64).clamp(0.0, 1.0);
        raw_valence * (1.0 - ratio)
    }
}

/// Discounts interactions that resemble the agent's recent history.
///
/// Recent history and the proposed interaction's primitive sequence are
/// counted per primitive name, and the cosine similarity of the two counts
/// scales the valence by `1 - similarity`. An empty history has similarity
/// -1, doubling the valence.
#[derive(Debug, Clone, Copy)]
pub struct RepetitiveBoredomHandler {
    history_size: usize,
}

impl Default for RepetitiveBoredomHandler {
    fn default() -> Self {
        Self {
            history_size: HISTORY_CONSIDER_SIZE,
        }
    }
}

impl RepetitiveBoredomHandler {
    pub fn with_history_size(history_size: usize) -> Self {
        Self { history_size }
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }

    /// Count primitive occurrences by name. Composites are flattened and
    /// perception interactions count as their wrapped primitive.
    pub fn count_interactions<'r>(
        &self,
        registry: &'r InteractionRegistry,
        sequence: impl IntoIterator<Item = InteractionId>,
    ) -> BTreeMap<&'r str, u32> {
        let mut count = BTreeMap::new();
        for interaction in sequence {
            for leaf in registry.unwrap(interaction) {
                let name = match registry.dispatch_name(leaf) {
                    Some(name) => name,
                    None => registry.name(leaf),
                };
                *count.entry(name).or_insert(0) += 1;
            }
        }
        count
    }

    /// Cosine similarity of two counts; -1 when `history` is empty
    pub fn similarity(&self, history: &BTreeMap<&str, u32>, proposed: &BTreeMap<&str, u32>) -> f64 {
        let mut dot = 0.0;
        let mut history_len_squared = 0.0;
        for (name, &count) in history {
            let count = count as f64;
            dot += count * proposed.get(name).copied().unwrap_or(0) as f64;
            history_len_squared += count * count;
        }

        let proposed_len_squared: f64 = proposed.values().map(|&c| (c as f64) * (c as f64)).sum();

        if history_len_squared == 0.0 {
            return -1.0;
        }
        if proposed_len_squared == 0.0 {
            return 0.0;
        }
        dot / (history_len_squared.sqrt() * proposed_len_squared.sqrt())
    }
}

impl BoredomHandler for RepetitiveBoredomHandler {
    fn process_boredom(
        &self,
        registry: &InteractionRegistry,
        memory: &InteractionMemory,
        interaction: InteractionId,
        raw_valence: f64,
    ) -> f64 {
        let history = self.count_interactions(registry, memory.recent(self.history_size).iter().copied());
        let proposed = self.count_interactions(registry, [interaction]);

        let similarity = self.similarity(&history, &proposed);
        raw_valence * (1.0 - similarity)
    }
}

/// Mean of the weight and repetitive handlers on the same raw valence
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightRepetitiveBoredomHandler {
    weight: WeightBoredomHandler,
    repetitive: RepetitiveBoredomHandler,
}

impl WeightRepetitiveBoredomHandler {
    pub fn with_history_size(history_size: usize) -> Self {
        Self {
            weight: WeightBoredomHandler,
            repetitive: RepetitiveBoredomHandler::with_history_size(history_size),
        }
    }
}

impl BoredomHandler for WeightRepetitiveBoredomHandler {
    fn process_boredom(
        &self,
        registry: &InteractionRegistry,
        memory: &InteractionMemory,
        interaction: InteractionId,
        raw_valence: f64,
    ) -> f64 {
        let weighted = self.weight.process_boredom(registry, memory, interaction, raw_valence);
        let repetitive = self.repetitive.process_boredom(registry, memory, interaction, raw_valence);
        (weighted + repetitive) / 2.0
    }
}

/// Selects a boredom handler from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum BoredomStrategy {
    Passthrough,
    Weight,
    Repetitive,
    #[default]
    WeightRepetitive,
}

impl BoredomStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoredomStrategy::Passthrough => "passthrough",
            BoredomStrategy::Weight => "weight",
            BoredomStrategy::Repetitive => "repetitive",
            BoredomStrategy::WeightRepetitive => "weight_repetitive",
        }
    }

    pub fn build(self, history_size: usize) -> Box<dyn BoredomHandler> {
        match self {
            BoredomStrategy::Passthrough => Box::new(PassthroughBoredomHandler),
            BoredomStrategy::Weight => Box::new(WeightBoredomHandler),
            BoredomStrategy::Repetitive => {
                Box::new(RepetitiveBoredomHandler::with_history_size(history_size))
            }
            BoredomStrategy::WeightRepetitive => {
                Box::new(WeightRepetitiveBoredomHandler::with_history_size(history_size))
            }
        }
    }
}
