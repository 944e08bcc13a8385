//! Event Types
//!
//! Every tick an agent produces one preparation event (the interaction it
//! intends to enact, with its boredom-discounted valence) and one enaction
//! event (the interaction the world actually enacted, with its valence).

use serde::{Deserialize, Serialize};

/// Phase of an agent's tick an event was emitted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    /// The agent picked an interaction to attempt
    Preparation,
    /// The world resolved the attempt into an enacted interaction
    Enaction,
}

impl EventPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPhase::Preparation => "preparation",
            EventPhase::Enaction => "enaction",
        }
    }

    /// Returns all phase variants in tick order.
    pub fn all() -> &'static [EventPhase] {
        &[EventPhase::Preparation, EventPhase::Enaction]
    }
}

/// A single observed agent event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    /// Unique identifier, assigned by the logger (`evt_00000001`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event_id: String,
    pub tick: u64,
    pub phase: EventPhase,
    /// Agent label, e.g. `agent_0003`
    pub agent: String,
    /// Interaction name, e.g. `Step Succeed`
    pub interaction: String,
    pub valence: f64,
}

impl AgentEvent {
    pub fn preparation(
        tick: u64,
        agent: impl Into<String>,
        interaction: impl Into<String>,
        valence: f64,
    ) -> Self {
        Self::new(tick, EventPhase::Preparation, agent, interaction, valence)
    }

    pub fn enaction(
        tick: u64,
        agent: impl Into<String>,
        interaction: impl Into<String>,
        valence: f64,
    ) -> Self {
        Self::new(tick, EventPhase::Enaction, agent, interaction, valence)
    }

    fn new(
        tick: u64,
        phase: EventPhase,
        agent: impl Into<String>,
        interaction: impl Into<String>,
        valence: f64,
    ) -> Self {
        Self {
            event_id: String::new(),
            tick,
            phase,
            agent: agent.into(),
            interaction: interaction.into(),
            valence,
        }
    }

    pub fn with_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = event_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serializes_snake_case() {
        let json = serde_json::to_string(&EventPhase::Preparation).unwrap();
        assert_eq!(json, "\"preparation\"");
        assert_eq!(EventPhase::Enaction.as_str(), "enaction");
    }

    #[test]
    fn test_event_without_id_omits_field() {
        let event = AgentEvent::enaction(3, "agent_0001", "Step Fail", -10.0);
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("event_id"));

        let parsed: AgentEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
