//! Behavioural tests over whole experiments
//!
//! Enacted outcomes feed back into the next decision: agents give up on
//! attempts that keep failing, the boredom strategy changes what they do,
//! and collaborating agents eventually break their block.

use enact_core::{BoredomStrategy, EntityKind, Experiment, SimConfig, Simulation};

fn config(experiment: Experiment, strategy: BoredomStrategy, exploration: f64) -> SimConfig {
    let mut config = SimConfig::default();
    config.simulation.experiment = experiment;
    config.simulation.seed = 42;
    config.boredom.strategy = strategy;
    config.agents.exploration_rate = exploration;
    config
}

/// Names of the interactions enacted by the first agent, tick by tick
fn enacted_names(sim: &mut Simulation, ticks: u64) -> Vec<String> {
    (0..ticks)
        .map(|_| {
            let report = sim.step().unwrap();
            let enacted = report.outcomes[0].enacted;
            sim.world().interactions().name(enacted).to_string()
        })
        .collect()
}

fn blocks(sim: &Simulation) -> usize {
    let world = sim.world();
    world
        .entities()
        .into_iter()
        .filter(|&id| world.kind(id) == Some(EntityKind::Block))
        .count()
}

/// Test that a greedy agent stops walking into the wall after bumping it
#[test]
fn test_bump_is_not_retried() {
    let config = config(Experiment::Basic, BoredomStrategy::WeightRepetitive, 0.0);
    let mut sim = Simulation::from_config(&config).unwrap();
    let enacted = enacted_names(&mut sim, 60);

    assert_eq!(enacted[0], "Step Succeed");
    assert_eq!(enacted[1], "Step Fail");
    assert!(
        enacted[2..].iter().all(|name| !name.starts_with("Step")),
        "kept stepping into the wall: {:?}",
        &enacted[..10]
    );
}

/// Test that an exploring agent turns away and rarely bumps
#[test]
fn test_exploring_agent_turns_and_rarely_bumps() {
    let config = config(Experiment::Basic, BoredomStrategy::WeightRepetitive, 0.1);
    let mut sim = Simulation::from_config(&config).unwrap();
    let enacted = enacted_names(&mut sim, 300);

    let bumps = enacted.iter().filter(|name| *name == "Step Fail").count();
    assert!(bumps < enacted.len() / 2, "{} bumps in {} ticks", bumps, enacted.len());
    assert!(enacted.iter().any(|name| name.starts_with("Turn")));
}

/// Test that the boredom strategy changes what the agent does
#[test]
fn test_boredom_strategy_changes_behaviour() {
    let run = |strategy| {
        let config = config(Experiment::HomeostaticVision, strategy, 0.0);
        let mut sim = Simulation::from_config(&config).unwrap();
        enacted_names(&mut sim, 20)
    };

    let passthrough = run(BoredomStrategy::Passthrough);
    let bored = run(BoredomStrategy::WeightRepetitive);

    // Both try destroying the wall, stepping into it and eating nothing first
    assert_eq!(passthrough[..3], bored[..3]);
    assert_ne!(passthrough, bored);
}

/// Test that the collaborative preset breaks its block
#[test]
fn test_collaborators_destroy_block() {
    let config = config(Experiment::CollaborativeDestroy, BoredomStrategy::WeightRepetitive, 0.1);
    let mut sim = Simulation::from_config(&config).unwrap();
    assert_eq!(blocks(&sim), 1);

    let mut destroyed_at = None;
    for tick in 0..3000 {
        let report = sim.step().unwrap();
        if blocks(&sim) == 0 {
            let names: Vec<&str> = report
                .outcomes
                .iter()
                .map(|outcome| sim.world().interactions().name(outcome.enacted))
                .collect();
            assert!(names.iter().all(|name| name.starts_with("Collaborative Destroy Succeed")), "{:?}", names);
            destroyed_at = Some(tick);
            break;
        }
    }
    assert!(destroyed_at.is_some(), "block still standing after 3000 ticks");
}
