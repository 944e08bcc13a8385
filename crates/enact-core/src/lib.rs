//! Enactive agents: interactions, memory, boredom and a grid world that
//! enacts what agents attempt.

pub mod agent;
pub mod boredom;
pub mod config;
pub mod error;
pub mod interaction;
pub mod memory;
pub mod motivation;
pub mod perception;
pub mod setup;
pub mod simulation;
pub mod world;

pub use agent::{Agent, AgentState, Proposal};
pub use boredom::{
    BoredomHandler, BoredomStrategy, PassthroughBoredomHandler, RepetitiveBoredomHandler,
    WeightBoredomHandler, WeightRepetitiveBoredomHandler,
};
pub use config::{ConfigError, SimConfig};
pub use error::{SimError, SimResult};
pub use interaction::{Interaction, InteractionId, InteractionRegistry, FAIL, SUCCEED};
pub use memory::InteractionMemory;
pub use motivation::{Motivation, MotivationTable};
pub use perception::{BasicPerceptionHandler, PerceptionHandler};
pub use setup::Experiment;
pub use simulation::{RunSummary, Simulation, TickReport};
pub use world::{EntityId, EntityKind, GridWorld, Outcome, Position, Rotation, SimRng};
