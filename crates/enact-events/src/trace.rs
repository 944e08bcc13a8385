//! Agent Traces
//!
//! Rolling per-agent windows of recent preparation and enaction events,
//! written as one JSON document keyed by agent label:
//!
//! ```json
//! {"agent_0001": {"preparation": [["Step Succeed", 1.0]], "enaction": [["Step Fail", -10.0]]}}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::event::{AgentEvent, EventPhase};

/// Number of entries kept per agent and phase
pub const TRACE_WINDOW: usize = 20;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One `(interaction, valence)` pair, serialized as a two-element array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry(pub String, pub f64);

/// Recent events of a single agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentTrace {
    pub preparation: VecDeque<TraceEntry>,
    pub enaction: VecDeque<TraceEntry>,
}

impl AgentTrace {
    fn phase_mut(&mut self, phase: EventPhase) -> &mut VecDeque<TraceEntry> {
        match phase {
            EventPhase::Preparation => &mut self.preparation,
            EventPhase::Enaction => &mut self.enaction,
        }
    }
}

/// Observer keeping the last `window` events per agent and phase
#[derive(Debug, Clone)]
pub struct TraceRecorder {
    window: usize,
    agents: BTreeMap<String, AgentTrace>,
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new(TRACE_WINDOW)
    }
}

impl TraceRecorder {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            agents: BTreeMap::new(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Record an event, evicting the oldest entry once the window is full
    pub fn record(&mut self, event: &AgentEvent) {
        let entries = self
            .agents
            .entry(event.agent.clone())
            .or_default()
            .phase_mut(event.phase);

        entries.push_back(TraceEntry(event.interaction.clone(), event.valence));
        while entries.len() > self.window {
            entries.pop_front();
        }
    }

    pub fn get(&self, agent: &str) -> Option<&AgentTrace> {
        self.agents.get(agent)
    }

    pub fn agents(&self) -> impl Iterator<Item = (&str, &AgentTrace)> {
        self.agents.iter().map(|(agent, trace)| (agent.as_str(), trace))
    }

    pub fn to_json(&self) -> Result<String, TraceError> {
        Ok(serde_json::to_string(&self.agents)?)
    }

    /// Write the traces as JSON to any writer
    pub fn write<W: Write>(&self, writer: W) -> Result<(), TraceError> {
        serde_json::to_writer(writer, &self.agents)?;
        Ok(())
    }

    /// Write the traces to a file, creating parent directories as needed
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), TraceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_evicts_oldest() {
        let mut recorder = TraceRecorder::new(3);
        for tick in 0..5 {
            recorder.record(&AgentEvent::enaction(tick, "agent_0001", format!("i{}", tick), 1.0));
        }

        let trace = recorder.get("agent_0001").unwrap();
        let names: Vec<&str> = trace.enaction.iter().map(|e| e.0.as_str()).collect();
        assert_eq!(names, vec!["i2", "i3", "i4"]);
        assert!(trace.preparation.is_empty());
    }

    #[test]
    fn test_phases_are_kept_apart() {
        let mut recorder = TraceRecorder::default();
        recorder.record(&AgentEvent::preparation(1, "a", "Step Succeed", 1.0));
        recorder.record(&AgentEvent::enaction(1, "a", "Step Fail", -10.0));

        let trace = recorder.get("a").unwrap();
        assert_eq!(trace.preparation.len(), 1);
        assert_eq!(trace.enaction[0], TraceEntry("Step Fail".into(), -10.0));
    }

    #[test]
    fn test_json_shape() {
        let mut recorder = TraceRecorder::default();
        recorder.record(&AgentEvent::enaction(1, "agent_0001", "Step Succeed", 1.0));

        let value: serde_json::Value = serde_json::from_str(&recorder.to_json().unwrap()).unwrap();
        assert_eq!(value["agent_0001"]["enaction"][0][0], "Step Succeed");
        assert_eq!(value["agent_0001"]["enaction"][0][1], 1.0);
        assert!(value["agent_0001"]["preparation"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_write_to_path_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("traces.json");

        let mut recorder = TraceRecorder::default();
        recorder.record(&AgentEvent::preparation(1, "a", "Feel Succeed", 0.0));
        recorder.write_to_path(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Feel Succeed"));
    }
}
