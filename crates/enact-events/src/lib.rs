//! Shared event types and trace serialization for enactive agent runs.
//!
//! This crate contains pure data structures with no simulation logic.
//! The simulation crate emits [`AgentEvent`]s; the types here only observe
//! them, either as a rolling per-agent trace or as an append-only log.

pub mod event;
pub mod logger;
pub mod trace;

pub use event::{AgentEvent, EventPhase};
pub use logger::EventLogger;
pub use trace::{AgentTrace, TraceEntry, TraceError, TraceRecorder, TRACE_WINDOW};
