//! Collaborative destroy resolution through the world's enactment protocol.

use enact_core::setup::logic;
use enact_core::{
    Agent, EntityId, EntityKind, GridWorld, InteractionId, InteractionMemory, MotivationTable,
    Position, Proposal, Rotation, FAIL, SUCCEED,
};

struct Fixture {
    world: GridWorld,
    destroy: InteractionId,
    destroy_fail: InteractionId,
    step: InteractionId,
}

fn fixture(width: i32, height: i32) -> Fixture {
    let mut world = GridWorld::new(width, height);
    let registry = world.interactions_mut();
    let destroy = registry.primitive("Collaborative Destroy", SUCCEED);
    let destroy_fail = registry.primitive("Collaborative Destroy", FAIL);
    let step = registry.primitive("Step", SUCCEED);
    let step_fail = registry.primitive("Step", FAIL);

    world
        .register_complex_enact_logic("Collaborative Destroy Succeed", logic::collaborative_destroy(destroy, destroy_fail))
        .unwrap();
    world
        .register_enact_logic("Step Succeed", logic::step(step, step_fail, 0.0))
        .unwrap();

    Fixture { world, destroy, destroy_fail, step }
}

impl Fixture {
    fn agent(&mut self, position: Position, rotation: Rotation) -> EntityId {
        let agent = self.world.add_agent(position, rotation);
        let step_fail = self.world.interactions().find_primitive("Step", FAIL).unwrap();
        let mut component = self.world.get_mut::<Agent>(agent).unwrap();
        component.set_primitives(vec![self.destroy, self.destroy_fail, self.step, step_fail]);
        component.set_motivation(
            MotivationTable::new()
                .with(self.destroy, 50.0)
                .with(self.destroy_fail, -1.0)
                .with(self.step, -1.0)
                .with(step_fail, -10.0),
        );
        agent
    }

    fn attempt(&self, agent: EntityId, interaction: InteractionId) -> Proposal {
        Proposal { agent, interaction, valence: 0.0 }
    }

    fn kinds_at(&self, position: Position) -> Vec<EntityKind> {
        self.world
            .entities_at(position)
            .into_iter()
            .filter_map(|id| self.world.kind(id))
            .collect()
    }
}

#[test]
fn test_two_agents_destroy_block() {
    let mut f = fixture(3, 3);
    let block = f.world.add_entity(EntityKind::Block, Position::new(1, 1));
    let a = f.agent(Position::new(1, 0), Rotation::SOUTH);
    let b = f.agent(Position::new(1, 2), Rotation::NORTH);

    let proposals = [f.attempt(a, f.destroy), f.attempt(b, f.destroy)];
    let outcomes = f.world.resolve(&proposals).unwrap();

    assert_eq!(outcomes.len(), 2);
    for outcome in &outcomes {
        assert_eq!(outcome.enacted, f.destroy);
        assert_eq!(outcome.valence, 50.0);
    }

    assert!(!f.world.contains(block));
    assert_eq!(f.kinds_at(Position::new(1, 1)), vec![EntityKind::Food]);
    assert_eq!(f.kinds_at(Position::new(1, 2)), vec![EntityKind::Agent, EntityKind::Food]);

    for agent in [a, b] {
        let memory = f.world.get::<InteractionMemory>(agent).unwrap();
        assert_eq!(memory.history(), &[f.destroy]);
        assert_eq!(memory.weight(f.destroy), 1);
    }
}

#[test]
fn test_single_agent_fails_and_world_unchanged() {
    let mut f = fixture(3, 3);
    f.world.add_entity(EntityKind::Block, Position::new(1, 1));
    let a = f.agent(Position::new(1, 0), Rotation::SOUTH);
    let before: Vec<_> = f
        .world
        .entities()
        .into_iter()
        .map(|id| (id, f.world.kind(id), f.world.position(id)))
        .collect();

    let outcomes = f.world.resolve(&[f.attempt(a, f.destroy)]).unwrap();

    assert_eq!(outcomes[0].enacted, f.destroy_fail);
    assert_eq!(outcomes[0].valence, -1.0);
    let after: Vec<_> = f
        .world
        .entities()
        .into_iter()
        .map(|id| (id, f.world.kind(id), f.world.position(id)))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_first_two_agents_win_a_contested_block() {
    let mut f = fixture(3, 3);
    f.world.add_entity(EntityKind::Block, Position::new(1, 1));
    let a = f.agent(Position::new(1, 0), Rotation::SOUTH);
    let b = f.agent(Position::new(0, 1), Rotation::EAST);
    let c = f.agent(Position::new(1, 2), Rotation::NORTH);

    // Proposal order does not matter, agent order does
    let proposals = [f.attempt(c, f.destroy), f.attempt(b, f.destroy), f.attempt(a, f.destroy)];
    let outcomes = f.world.resolve(&proposals).unwrap();

    let enacted: Vec<_> = outcomes.iter().map(|o| (o.agent, o.enacted)).collect();
    assert_eq!(enacted, vec![(a, f.destroy), (b, f.destroy), (c, f.destroy_fail)]);

    let food = f
        .world
        .entities()
        .into_iter()
        .filter(|&id| f.world.kind(id) == Some(EntityKind::Food))
        .count();
    assert_eq!(food, 2, "a block is destroyed at most once");
}

#[test]
fn test_agent_facing_nothing_fails_alongside_a_success() {
    let mut f = fixture(4, 3);
    f.world.add_entity(EntityKind::Block, Position::new(1, 1));
    let a = f.agent(Position::new(1, 0), Rotation::SOUTH);
    let b = f.agent(Position::new(1, 2), Rotation::NORTH);
    let c = f.agent(Position::new(3, 0), Rotation::SOUTH);

    let proposals = [f.attempt(a, f.destroy), f.attempt(b, f.destroy), f.attempt(c, f.destroy)];
    let outcomes = f.world.resolve(&proposals).unwrap();

    assert_eq!(outcomes[0].enacted, f.destroy);
    assert_eq!(outcomes[1].enacted, f.destroy);
    assert_eq!(outcomes[2].enacted, f.destroy_fail);
}

#[test]
fn test_complex_resolves_before_single_agent_logic() {
    let mut f = fixture(3, 4);
    f.world.add_entity(EntityKind::Block, Position::new(1, 1));
    let a = f.agent(Position::new(1, 0), Rotation::SOUTH);
    let b = f.agent(Position::new(1, 2), Rotation::NORTH);
    // Would walk into the block's cell if single-agent logic ran first
    let c = f.agent(Position::new(0, 1), Rotation::EAST);

    let proposals = [f.attempt(c, f.step), f.attempt(a, f.destroy), f.attempt(b, f.destroy)];
    let outcomes = f.world.resolve(&proposals).unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[2].agent, c);
    assert_eq!(outcomes[2].enacted, f.step);
    assert_eq!(f.world.position(c), Some(Position::new(1, 1)));
}
