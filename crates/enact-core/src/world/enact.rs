//! Enactment
//!
//! Environment logic is registered per interaction name. Single-agent logic
//! resolves one agent's attempt; complex logic resolves every attempt at the
//! same interaction in a tick jointly. A tick first dispatches every
//! proposal, failing fast on unregistered names before touching the world,
//! then resolves complex groups (in order of first proposal) and finally
//! single-agent attempts in agent order.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::Mut;
use tracing::debug;

use crate::agent::{Agent, AgentState, Proposal};
use crate::error::{SimError, SimResult};
use crate::interaction::{Interaction, InteractionId};
use crate::memory::InteractionMemory;
use crate::world::{EntityId, GridWorld, SimRng};

/// `(world, agent, attempted) -> enacted`
pub type EnactFn = Arc<dyn Fn(&mut GridWorld, EntityId, InteractionId) -> InteractionId + Send + Sync>;

/// `(world, {agent -> attempted}) -> {agent -> enacted}`
pub type ComplexEnactFn = Arc<
    dyn Fn(&mut GridWorld, &BTreeMap<EntityId, InteractionId>) -> BTreeMap<EntityId, InteractionId>
        + Send
        + Sync,
>;

/// Registered logic for one interaction name
#[derive(Clone)]
pub enum Logic {
    Single(EnactFn),
    Complex(ComplexEnactFn),
}

/// Enact logic tables keyed by interaction name
#[derive(Clone, Default)]
pub struct EnactLogic {
    single: HashMap<String, EnactFn>,
    complex: HashMap<String, ComplexEnactFn>,
}

impl EnactLogic {
    fn is_registered(&self, name: &str) -> bool {
        self.single.contains_key(name) || self.complex.contains_key(name)
    }

    pub fn register(&mut self, name: impl Into<String>, logic: EnactFn) -> SimResult<()> {
        let name = name.into();
        if self.is_registered(&name) {
            return Err(SimError::DuplicateRegistration(name));
        }
        self.single.insert(name, logic);
        Ok(())
    }

    pub fn register_complex(&mut self, name: impl Into<String>, logic: ComplexEnactFn) -> SimResult<()> {
        let name = name.into();
        if self.is_registered(&name) {
            return Err(SimError::DuplicateRegistration(name));
        }
        self.complex.insert(name, logic);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> SimResult<Logic> {
        if let Some(logic) = self.single.get(name) {
            return Ok(Logic::Single(Arc::clone(logic)));
        }
        if let Some(logic) = self.complex.get(name) {
            return Ok(Logic::Complex(Arc::clone(logic)));
        }
        Err(SimError::UnregisteredInteraction(name.to_string()))
    }
}

impl fmt::Debug for EnactLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut single: Vec<&str> = self.single.keys().map(String::as_str).collect();
        let mut complex: Vec<&str> = self.complex.keys().map(String::as_str).collect();
        single.sort_unstable();
        complex.sort_unstable();
        f.debug_struct("EnactLogic")
            .field("single", &single)
            .field("complex", &complex)
            .finish()
    }
}

/// Result of one agent's tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub agent: EntityId,
    pub attempted: InteractionId,
    pub enacted: InteractionId,
    /// Intrinsic valence of the enacted interaction
    pub valence: f64,
}

struct ComplexGroup<'p> {
    name: String,
    logic: ComplexEnactFn,
    attempts: BTreeMap<EntityId, InteractionId>,
    proposals: Vec<&'p Proposal>,
}

impl GridWorld {
    /// Register single-agent logic under an interaction name
    pub fn register_enact_logic(
        &mut self,
        name: impl Into<String>,
        logic: impl Fn(&mut GridWorld, EntityId, InteractionId) -> InteractionId + Send + Sync + 'static,
    ) -> SimResult<()> {
        self.logic.register(name, Arc::new(logic))
    }

    /// Register multi-agent logic under an interaction name
    pub fn register_complex_enact_logic(
        &mut self,
        name: impl Into<String>,
        logic: impl Fn(&mut GridWorld, &BTreeMap<EntityId, InteractionId>) -> BTreeMap<EntityId, InteractionId>
            + Send
            + Sync
            + 'static,
    ) -> SimResult<()> {
        self.logic.register_complex(name, Arc::new(logic))
    }

    pub fn enact_logic(&self) -> &EnactLogic {
        &self.logic
    }

    /// Let an agent pick the interaction it will attempt this tick
    pub fn propose(&mut self, agent: EntityId) -> SimResult<Proposal> {
        let entity = *self.entities.get(&agent).ok_or(SimError::NotAnAgent(agent))?;

        let context = match self.ecs.get::<Agent>(entity) {
            Some(component) => component.perception().map(|handler| handler.compute(self, agent)),
            None => return Err(SimError::NotAnAgent(agent)),
        };

        let exploration = self.exploration_rate;
        let registry = &mut self.interactions;
        self.ecs.resource_scope(|ecs, mut rng: Mut<SimRng>| {
            let (Some(component), Some(state), Some(memory)) = (
                ecs.get::<Agent>(entity),
                ecs.get::<AgentState>(entity),
                ecs.get::<InteractionMemory>(entity),
            ) else {
                return Err(SimError::NotAnAgent(agent));
            };
            component.choose(agent, registry, state, memory, context.as_deref(), exploration, &mut rng.0)
        })
    }

    /// Resolve every proposal of a tick into enacted interactions and
    /// update each agent's memory as soon as its attempt is resolved.
    ///
    /// Outcomes are returned in agent order.
    pub fn resolve(&mut self, proposals: &[Proposal]) -> SimResult<Vec<Outcome>> {
        let mut singles: Vec<(&Proposal, InteractionId, EnactFn)> = Vec::new();
        let mut groups: Vec<ComplexGroup<'_>> = Vec::new();

        for proposal in proposals {
            let (Some(name), Some(attempted)) = (
                self.interactions.dispatch_name(proposal.interaction),
                self.interactions.primitive_of(proposal.interaction),
            ) else {
                return Err(SimError::NotDispatchable(
                    self.interactions.name(proposal.interaction).to_string(),
                ));
            };

            match self.logic.lookup(name)? {
                Logic::Single(logic) => singles.push((proposal, attempted, logic)),
                Logic::Complex(logic) => match groups.iter_mut().find(|group| group.name == name) {
                    Some(group) => {
                        group.attempts.insert(proposal.agent, attempted);
                        group.proposals.push(proposal);
                    }
                    None => groups.push(ComplexGroup {
                        name: name.to_string(),
                        logic,
                        attempts: BTreeMap::from([(proposal.agent, attempted)]),
                        proposals: vec![proposal],
                    }),
                },
            }
        }

        let mut outcomes = Vec::with_capacity(proposals.len());

        for group in groups {
            debug!(interaction = %group.name, participants = group.attempts.len(), "resolving complex interaction");
            let enacted = (group.logic)(self, &group.attempts);
            for proposal in group.proposals {
                let result = enacted.get(&proposal.agent).copied().ok_or_else(|| {
                    SimError::IncompleteResolution {
                        name: group.name.clone(),
                        agent: proposal.agent,
                    }
                })?;
                outcomes.push(self.complete(proposal, result)?);
            }
        }

        for (proposal, attempted, logic) in singles {
            let enacted = logic(self, proposal.agent, attempted);
            outcomes.push(self.complete(proposal, enacted)?);
        }

        outcomes.sort_by_key(|outcome| outcome.agent);
        Ok(outcomes)
    }

    /// Re-wrap the enacted primitive in the proposal's perceptual context,
    /// then record it in the agent's memory
    fn complete(&mut self, proposal: &Proposal, enacted: InteractionId) -> SimResult<Outcome> {
        let enacted = match self.interactions.get(proposal.interaction) {
            Interaction::Perception { context, .. } => {
                let context = context.clone();
                self.interactions.perception(enacted, &context).unwrap_or(enacted)
            }
            _ => enacted,
        };

        let valence = self.record_enaction(proposal.agent, enacted)?;

        debug!(
            agent = %proposal.agent,
            attempted = self.interactions.name(proposal.interaction),
            enacted = self.interactions.name(enacted),
            valence,
            "enacted interaction"
        );

        Ok(Outcome {
            agent: proposal.agent,
            attempted: proposal.interaction,
            enacted,
            valence,
        })
    }

    /// Weight increment and history append for an enacted interaction.
    /// Returns the interaction's intrinsic valence for the agent.
    pub fn record_enaction(&mut self, agent: EntityId, enacted: InteractionId) -> SimResult<f64> {
        let entity = *self.entities.get(&agent).ok_or(SimError::NotAnAgent(agent))?;

        let (Some(component), Some(state)) = (self.ecs.get::<Agent>(entity), self.ecs.get::<AgentState>(entity)) else {
            return Err(SimError::NotAnAgent(agent));
        };
        let valence = component.motivation().evaluate(&self.interactions, enacted, state)?;

        let mut memory = self
            .ecs
            .get_mut::<InteractionMemory>(entity)
            .ok_or(SimError::NotAnAgent(agent))?;
        memory.record_enaction(enacted);

        Ok(valence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{FAIL, SUCCEED};
    use crate::motivation::MotivationTable;
    use crate::setup::logic;
    use crate::world::{EntityKind, Position, Rotation};

    struct Fixture {
        world: GridWorld,
        agent: EntityId,
        step: InteractionId,
        step_fail: InteractionId,
    }

    fn fixture() -> Fixture {
        let mut world = GridWorld::new(3, 1);
        let step = world.interactions_mut().primitive("Step", SUCCEED);
        let step_fail = world.interactions_mut().primitive("Step", FAIL);
        let agent = world.add_agent(Position::new(0, 0), Rotation::EAST);

        if let Some(mut component) = world.get_mut::<Agent>(agent) {
            component.set_primitives(vec![step, step_fail]);
            component.set_motivation(MotivationTable::new().with(step, 1.0).with(step_fail, -10.0));
        }

        world
            .register_enact_logic("Step Succeed", move |world, agent, _attempted| {
                if world.step(agent) {
                    step
                } else {
                    step_fail
                }
            })
            .unwrap();

        Fixture { world, agent, step, step_fail }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut f = fixture();
        let err = f
            .world
            .register_complex_enact_logic("Step Succeed", |_, attempts| attempts.clone())
            .unwrap_err();
        assert!(matches!(err, SimError::DuplicateRegistration(name) if name == "Step Succeed"));

        let err = f
            .world
            .register_enact_logic("Step Succeed", |_, _, attempted| attempted)
            .unwrap_err();
        assert!(matches!(err, SimError::DuplicateRegistration(_)));
    }

    #[test]
    fn test_single_agent_enactment_updates_memory() {
        let mut f = fixture();

        let proposal = f.world.propose(f.agent).unwrap();
        assert_eq!(proposal.interaction, f.step);

        let outcomes = f.world.resolve(&[proposal]).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].enacted, f.step);
        assert_eq!(outcomes[0].valence, 1.0);
        assert_eq!(f.world.position(f.agent), Some(Position::new(1, 0)));

        // Second step succeeds, third bumps into the edge
        f.world.resolve(&[proposal]).unwrap();
        let outcomes = f.world.resolve(&[proposal]).unwrap();
        assert_eq!(outcomes[0].attempted, f.step);
        assert_eq!(outcomes[0].enacted, f.step_fail);
        assert_eq!(outcomes[0].valence, -10.0);

        let memory = f.world.get::<InteractionMemory>(f.agent).unwrap();
        assert_eq!(memory.history(), &[f.step, f.step, f.step_fail]);
        assert_eq!(memory.weight(f.step), 2);
        assert_eq!(memory.total_weight(), 3);
    }

    #[test]
    fn test_unregistered_interaction_fails_before_mutation() {
        let mut f = fixture();
        let feel = f.world.interactions_mut().primitive("Feel", SUCCEED);
        let proposals = [
            Proposal { agent: f.agent, interaction: f.step, valence: 1.0 },
            Proposal { agent: f.agent, interaction: feel, valence: 0.0 },
        ];

        let err = f.world.resolve(&proposals).unwrap_err();
        assert!(matches!(err, SimError::UnregisteredInteraction(name) if name == "Feel Succeed"));
        assert_eq!(f.world.position(f.agent), Some(Position::new(0, 0)));
        assert!(f.world.get::<InteractionMemory>(f.agent).unwrap().history().is_empty());
    }

    #[test]
    fn test_composite_is_not_dispatchable() {
        let mut f = fixture();
        let pair = f.world.interactions_mut().composite(f.step, f.step);
        let proposal = Proposal { agent: f.agent, interaction: pair, valence: 2.0 };

        let err = f.world.resolve(&[proposal]).unwrap_err();
        assert!(matches!(err, SimError::NotDispatchable(_)));
    }

    #[test]
    fn test_perception_context_survives_enactment() {
        let mut f = fixture();
        let seen = f.world.interactions_mut().perception(f.step, "nothing").unwrap();
        let proposal = Proposal { agent: f.agent, interaction: seen, valence: 1.0 };

        let outcomes = f.world.resolve(&[proposal]).unwrap();
        assert_eq!(f.world.interactions().name(outcomes[0].enacted), "Step Succeed [nothing]");
        assert_eq!(f.world.interactions().primitive_of(outcomes[0].enacted), Some(f.step));
    }

    #[test]
    fn test_second_destroy_on_same_block_fails() {
        let mut world = GridWorld::new(3, 1);
        let destroy = world.interactions_mut().primitive("Destroy", SUCCEED);
        let destroy_fail = world.interactions_mut().primitive("Destroy", FAIL);
        let first = world.add_agent(Position::new(0, 0), Rotation::EAST);
        world.add_entity(EntityKind::Block, Position::new(1, 0));
        let second = world.add_agent(Position::new(2, 0), Rotation::WEST);

        for agent in [first, second] {
            if let Some(mut component) = world.get_mut::<Agent>(agent) {
                component.set_primitives(vec![destroy, destroy_fail]);
                component.set_motivation(MotivationTable::new().with(destroy, 30.0).with(destroy_fail, -2.0));
            }
        }
        world
            .register_enact_logic("Destroy Succeed", logic::destroy(destroy, destroy_fail))
            .unwrap();

        let proposals = [
            Proposal { agent: first, interaction: destroy, valence: 30.0 },
            Proposal { agent: second, interaction: destroy, valence: 30.0 },
        ];
        let outcomes = world.resolve(&proposals).unwrap();

        assert_eq!(outcomes[0].enacted, destroy);
        assert_eq!(outcomes[1].enacted, destroy_fail);
        assert_eq!(outcomes[1].valence, -2.0);

        let kinds: Vec<_> = world.entities().into_iter().filter_map(|id| world.kind(id)).collect();
        assert_eq!(kinds.iter().filter(|&&kind| kind == EntityKind::Food).count(), 1);
        assert!(!kinds.contains(&EntityKind::Block));
    }

    #[test]
    fn test_incomplete_complex_resolution() {
        let mut world = GridWorld::new(2, 1);
        let push = world.interactions_mut().primitive("Push", SUCCEED);
        let agent = world.add_agent(Position::new(0, 0), Rotation::EAST);
        world
            .register_complex_enact_logic("Push Succeed", |_, _| BTreeMap::new())
            .unwrap();

        let err = world
            .resolve(&[Proposal { agent, interaction: push, valence: 0.0 }])
            .unwrap_err();
        assert!(matches!(err, SimError::IncompleteResolution { agent: a, .. } if a == agent));
    }
}
