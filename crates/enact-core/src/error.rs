use thiserror::Error;

use crate::world::EntityId;

/// Errors raised by the simulation core.
///
/// Everything except `Trace` and `Io` is a configuration error: the world or
/// an agent was wired up inconsistently, and the tick that hit it is aborted.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no enact logic registered for interaction `{0}`")]
    UnregisteredInteraction(String),

    #[error("enact logic for interaction `{0}` is already registered")]
    DuplicateRegistration(String),

    #[error("interaction `{0}` cannot be dispatched to the world")]
    NotDispatchable(String),

    #[error("no motivation value for interaction `{0}`")]
    MissingMotivation(String),

    #[error("complex logic for `{name}` returned no outcome for {agent}")]
    IncompleteResolution { name: String, agent: EntityId },

    #[error("{0} is not an agent")]
    NotAnAgent(EntityId),

    #[error("{0} has no interaction it can attempt")]
    NoCandidates(EntityId),

    #[error("trace error: {0}")]
    Trace(#[from] enact_events::TraceError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
