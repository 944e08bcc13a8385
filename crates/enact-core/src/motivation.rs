//! Motivation Tables
//!
//! Intrinsic (raw) valence of interactions, before any boredom discount.
//! An entry is either a constant or a function of the agent's state, and
//! both are read through [`MotivationTable::evaluate`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::agent::AgentState;
use crate::error::{SimError, SimResult};
use crate::interaction::{Interaction, InteractionId, InteractionRegistry};

pub type DerivedMotivation = Arc<dyn Fn(&AgentState) -> f64 + Send + Sync>;

#[derive(Clone)]
pub enum Motivation {
    Constant(f64),
    /// Depends on dynamic agent state, e.g. a homeostatic energy level
    Derived(DerivedMotivation),
}

impl Motivation {
    pub fn derived(f: impl Fn(&AgentState) -> f64 + Send + Sync + 'static) -> Self {
        Motivation::Derived(Arc::new(f))
    }

    pub fn value(&self, agent: &AgentState) -> f64 {
        match self {
            Motivation::Constant(value) => *value,
            Motivation::Derived(f) => f(agent),
        }
    }
}

impl From<f64> for Motivation {
    fn from(value: f64) -> Self {
        Motivation::Constant(value)
    }
}

impl fmt::Debug for Motivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Motivation::Constant(value) => write!(f, "Constant({})", value),
            Motivation::Derived(_) => write!(f, "Derived(..)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MotivationTable {
    entries: HashMap<InteractionId, Motivation>,
}

impl MotivationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, interaction: InteractionId, motivation: impl Into<Motivation>) {
        self.entries.insert(interaction, motivation.into());
    }

    pub fn with(mut self, interaction: InteractionId, motivation: impl Into<Motivation>) -> Self {
        self.set(interaction, motivation);
        self
    }

    pub fn get(&self, interaction: InteractionId) -> Option<&Motivation> {
        self.entries.get(&interaction)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw valence of an interaction for the given agent.
    ///
    /// A perception interaction without its own entry falls back to its
    /// primitive. A composite without its own entry is the sum over its
    /// primitive sequence.
    pub fn evaluate(
        &self,
        registry: &InteractionRegistry,
        interaction: InteractionId,
        agent: &AgentState,
    ) -> SimResult<f64> {
        if let Some(motivation) = self.entries.get(&interaction) {
            return Ok(motivation.value(agent));
        }

        match registry.get(interaction) {
            Interaction::Primitive { .. } => {
                Err(SimError::MissingMotivation(registry.name(interaction).to_string()))
            }
            Interaction::Perception { primitive, .. } => self.evaluate(registry, *primitive, agent),
            Interaction::Composite { .. } => registry
                .unwrap(interaction)
                .map(|leaf| self.evaluate(registry, leaf, agent))
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{FAIL, SUCCEED};

    #[test]
    fn test_constant_and_derived_share_accessor() {
        let mut registry = InteractionRegistry::new();
        let step = registry.primitive("Step", SUCCEED);
        let fail = registry.primitive("Step", FAIL);

        let table = MotivationTable::new()
            .with(step, Motivation::derived(|agent| agent.homeostatic_value("energy") * 0.1))
            .with(fail, -10.0);

        let mut agent = AgentState::default();
        agent.set_homeostatic_value("energy", 100.0);

        assert_eq!(table.evaluate(&registry, step, &agent).unwrap(), 10.0);
        assert_eq!(table.evaluate(&registry, fail, &agent).unwrap(), -10.0);

        agent.add_to_homeostatic_value("energy", -50.0);
        assert_eq!(table.evaluate(&registry, step, &agent).unwrap(), 5.0);
    }

    #[test]
    fn test_missing_primitive_is_error() {
        let mut registry = InteractionRegistry::new();
        let feel = registry.primitive("Feel", SUCCEED);
        let table = MotivationTable::new();

        let err = table.evaluate(&registry, feel, &AgentState::default()).unwrap_err();
        assert!(matches!(err, SimError::MissingMotivation(name) if name == "Feel Succeed"));
    }

    #[test]
    fn test_composite_sums_primitives() {
        let mut registry = InteractionRegistry::new();
        let step = registry.primitive("Step", SUCCEED);
        let turn = registry.primitive("Turn Left", SUCCEED);
        let pair = registry.composite(step, turn);
        let table = MotivationTable::new().with(step, 1.0).with(turn, -2.0);

        let value = table.evaluate(&registry, pair, &AgentState::default()).unwrap();
        assert_eq!(value, -1.0);
    }

    #[test]
    fn test_perception_falls_back_to_primitive() {
        let mut registry = InteractionRegistry::new();
        let step = registry.primitive("Step", SUCCEED);
        let seen = registry.perception(step, "wall:3").unwrap();
        let mut table = MotivationTable::new().with(step, 25.0);

        assert_eq!(table.evaluate(&registry, seen, &AgentState::default()).unwrap(), 25.0);

        table.set(seen, 3.0);
        assert_eq!(table.evaluate(&registry, seen, &AgentState::default()).unwrap(), 3.0);
    }
}
