//! Experiments
//!
//! Each experiment is a map, a set of primitives with their environment
//! logic, and the motivation table every agent in the map is given.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::{Agent, AgentState};
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::interaction::{InteractionId, FAIL, SUCCEED};
use crate::motivation::{Motivation, MotivationTable};
use crate::perception::BasicPerceptionHandler;
use crate::setup::logic;
use crate::setup::map::{default_mapper, parse_world, ENERGY};
use crate::world::{EntityId, GridWorld};

const BASIC_MAP: &[&str] = &[
    "wwwwwwwwwwwwwww",
    "w.............w",
    "w.wwwwwww.....w",
    "w.......wwwww.w",
    "w.wwwww.......w",
    "w.w.......w...w",
    "w.w.wwwww.w...w",
    "w.w.w...w.ww..w",
    "w.www.....w...w",
    "w.....wwwww.a.w",
    "wwwwwwwwwwwwwww",
];

const HOMEOSTATIC_MAP: &[&str] = &[
    "wwwwwwwwwwwwwww",
    "w.............w",
    "w.wwwwwww.....w",
    "w.......wwwww.w",
    "w.wwwww.......w",
    "w.w.......w...w",
    "w.w.wwwww.w...w",
    "w.w.w...w.ww.ww",
    "w.www.....w...w",
    "w.....wwwww.h.w",
    "wwwwwwwwwwwwwww",
];

const COEXISTENCE_MAP: &[&str] = &[
    "wwwww",
    "w..aw",
    "w.w.w",
    "w.w.w",
    "wa..w",
    "wwwww",
];

const VISION_MAP: &[&str] = &[
    "wwwwwwwwwwwwwww",
    "w....p........w",
    "wwwwwwwwwwwwwww",
];

const HOMEOSTATIC_VISION_MAP: &[&str] = &[
    "wwwwwwww",
    "w.f....w",
    "w...w..w",
    "w.b.w..w",
    "w...w.fw",
    "w...w..w",
    "w..ww..w",
    "w..w.b.w",
    "w.....hw",
    "wwwwwwww",
];

const VISION_PUSH_MAP: &[&str] = &[
    "wwwwwwwwwwwwwww",
    "w.......b....pw",
    "wwwwwwwwwwwwwww",
];

const COLLABORATIVE_DESTROY_MAP: &[&str] = &[
    "wwwww",
    "wpbpw",
    "ww.ww",
    "wwwww",
];

/// Experiment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Experiment {
    /// Single agent in a maze: step, turn, feel
    #[default]
    Basic,
    /// Maze agent whose drive to walk follows its energy
    Homeostatic,
    /// Two agents rewarded for sharing a cell
    Coexistence,
    /// Perceiving agent in a corridor
    Vision,
    /// Perceiving, homeostatic agent that eats food and breaks blocks
    HomeostaticVision,
    /// Perceiving agent rewarded for pushing a block
    VisionPush,
    /// Two perceiving agents walled in on either side of a block they can
    /// only break together
    CollaborativeDestroy,
}

impl Experiment {
    pub fn all() -> &'static [Experiment] {
        &[
            Experiment::Basic,
            Experiment::Homeostatic,
            Experiment::Coexistence,
            Experiment::Vision,
            Experiment::HomeostaticVision,
            Experiment::VisionPush,
            Experiment::CollaborativeDestroy,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Experiment::Basic => "basic",
            Experiment::Homeostatic => "homeostatic",
            Experiment::Coexistence => "coexistence",
            Experiment::Vision => "vision",
            Experiment::HomeostaticVision => "homeostatic_vision",
            Experiment::VisionPush => "vision_push",
            Experiment::CollaborativeDestroy => "collaborative_destroy",
        }
    }

    pub fn map(&self) -> &'static [&'static str] {
        match self {
            Experiment::Basic => BASIC_MAP,
            Experiment::Homeostatic => HOMEOSTATIC_MAP,
            Experiment::Coexistence => COEXISTENCE_MAP,
            Experiment::Vision => VISION_MAP,
            Experiment::HomeostaticVision => HOMEOSTATIC_VISION_MAP,
            Experiment::VisionPush => VISION_PUSH_MAP,
            Experiment::CollaborativeDestroy => COLLABORATIVE_DESTROY_MAP,
        }
    }

    /// Build the experiment's world with every agent configured
    pub fn build(self, config: &SimConfig) -> SimResult<GridWorld> {
        let mut world = parse_world(self.map(), default_mapper);
        world.seed(config.simulation.seed);
        world.set_exploration_rate(config.agents.exploration_rate);

        let repertoire = match self {
            Experiment::Basic => basic(&mut world, false)?,
            Experiment::Homeostatic => basic(&mut world, true)?,
            Experiment::Coexistence => coexistence(&mut world)?,
            Experiment::Vision => vision(&mut world)?,
            Experiment::HomeostaticVision => homeostatic_vision(&mut world)?,
            Experiment::VisionPush => vision_push(&mut world)?,
            Experiment::CollaborativeDestroy => collaborative_destroy(&mut world)?,
        };

        for agent in world.agents() {
            let Some(mut component) = world.get_mut::<Agent>(agent) else {
                continue;
            };
            component.set_primitives(repertoire.primitives.clone());
            component.set_motivation(repertoire.motivation.clone());
            component.set_boredom(
                config
                    .boredom
                    .strategy
                    .build(config.boredom.history_consider_size),
            );
        }

        info!(
            experiment = self.as_str(),
            width = world.width(),
            height = world.height(),
            agents = world.agents().len(),
            "built experiment"
        );
        Ok(world)
    }
}

/// Primitives known to every agent of an experiment and their motivation
struct Repertoire {
    primitives: Vec<InteractionId>,
    motivation: MotivationTable,
}

impl Repertoire {
    fn new() -> Self {
        Self {
            primitives: Vec::new(),
            motivation: MotivationTable::new(),
        }
    }

    fn learn(&mut self, interaction: InteractionId, motivation: impl Into<Motivation>) {
        self.primitives.push(interaction);
        self.motivation.set(interaction, motivation);
    }
}

fn energy_drive(state: &AgentState) -> f64 {
    state.homeostatic_value(ENERGY) * 0.1
}

fn primitive_pair(world: &mut GridWorld, action: &str) -> (InteractionId, InteractionId) {
    let registry = world.interactions_mut();
    (registry.primitive(action, SUCCEED), registry.primitive(action, FAIL))
}

/// Register single-agent logic under the name of its success variant
fn register(
    world: &mut GridWorld,
    success: InteractionId,
    logic: impl Fn(&mut GridWorld, EntityId, InteractionId) -> InteractionId + Send + Sync + 'static,
) -> SimResult<()> {
    let name = world.interactions().name(success).to_string();
    world.register_enact_logic(name, logic)
}

/// Step and both turns. `step_value` is the motivation of a successful
/// step; `energy_cost` is applied to energy on every successful step.
fn movement(
    world: &mut GridWorld,
    repertoire: &mut Repertoire,
    step_value: Motivation,
    energy_cost: f64,
) -> SimResult<()> {
    let (step, step_fail) = primitive_pair(world, "Step");
    let turn_right = world.interactions_mut().primitive("Turn Right", SUCCEED);
    let turn_left = world.interactions_mut().primitive("Turn Left", SUCCEED);

    register(world, step, logic::step(step, step_fail, energy_cost))?;
    register(world, turn_right, logic::turn(turn_right, -90))?;
    register(world, turn_left, logic::turn(turn_left, 90))?;

    repertoire.learn(step, step_value);
    repertoire.learn(step_fail, -10.0);
    repertoire.learn(turn_right, -2.0);
    repertoire.learn(turn_left, -2.0);
    Ok(())
}

fn feeling(world: &mut GridWorld, repertoire: &mut Repertoire) -> SimResult<()> {
    let (feel, feel_fail) = primitive_pair(world, "Feel");
    register(world, feel, logic::feel(feel, feel_fail))?;

    repertoire.learn(feel, 0.0);
    repertoire.learn(feel_fail, -1.0);
    Ok(())
}

fn basic(world: &mut GridWorld, homeostatic: bool) -> SimResult<Repertoire> {
    let mut repertoire = Repertoire::new();
    if homeostatic {
        movement(world, &mut repertoire, Motivation::derived(energy_drive), -0.1)?;
    } else {
        movement(world, &mut repertoire, Motivation::Constant(1.0), 0.0)?;
    }
    feeling(world, &mut repertoire)?;
    Ok(repertoire)
}

fn coexistence(world: &mut GridWorld) -> SimResult<Repertoire> {
    let mut repertoire = basic(world, false)?;

    let (cuddle, cuddle_fail) = primitive_pair(world, "Cuddle");
    register(world, cuddle, logic::cuddle(cuddle, cuddle_fail))?;
    repertoire.learn(cuddle, 50.0);
    repertoire.learn(cuddle_fail, -1.0);
    Ok(repertoire)
}

fn vision(world: &mut GridWorld) -> SimResult<Repertoire> {
    let mut repertoire = Repertoire::new();
    movement(world, &mut repertoire, Motivation::Constant(25.0), 0.0)?;
    Ok(repertoire)
}

fn homeostatic_vision(world: &mut GridWorld) -> SimResult<Repertoire> {
    let mut repertoire = Repertoire::new();
    movement(world, &mut repertoire, Motivation::derived(energy_drive), -0.1)?;

    let (eat, eat_fail) = primitive_pair(world, "Eat");
    register(world, eat, logic::eat(eat, eat_fail, 10.0))?;
    repertoire.learn(eat, Motivation::derived(|state| 10.0 - energy_drive(state)));
    repertoire.learn(eat_fail, -20.0);

    let (destroy, destroy_fail) = primitive_pair(world, "Destroy");
    register(world, destroy, logic::destroy(destroy, destroy_fail))?;
    repertoire.learn(destroy, 30.0);
    repertoire.learn(destroy_fail, -2.0);

    for agent in world.agents() {
        if let Some(mut component) = world.get_mut::<Agent>(agent) {
            component.set_perception(Box::new(BasicPerceptionHandler::default()));
        }
    }
    Ok(repertoire)
}

fn vision_push(world: &mut GridWorld) -> SimResult<Repertoire> {
    let mut repertoire = Repertoire::new();
    movement(world, &mut repertoire, Motivation::Constant(-1.0), 0.0)?;

    let (push, push_fail) = primitive_pair(world, "Push");
    register(world, push, logic::push(push, push_fail))?;
    repertoire.learn(push, 500.0);
    repertoire.learn(push_fail, -1.0);
    Ok(repertoire)
}

fn collaborative_destroy(world: &mut GridWorld) -> SimResult<Repertoire> {
    let mut repertoire = Repertoire::new();
    movement(world, &mut repertoire, Motivation::Constant(-1.0), 0.0)?;

    let (eat, eat_fail) = primitive_pair(world, "Eat");
    register(world, eat, logic::eat(eat, eat_fail, 0.0))?;
    repertoire.learn(eat, 20.0);
    repertoire.learn(eat_fail, -2.0);

    let (destroy, destroy_fail) = primitive_pair(world, "Collaborative Destroy");
    let name = world.interactions().name(destroy).to_string();
    world.register_complex_enact_logic(name, logic::collaborative_destroy(destroy, destroy_fail))?;
    repertoire.learn(destroy, 50.0);
    repertoire.learn(destroy_fail, -1.0);
    Ok(repertoire)
}
