//! Simulation Loop
//!
//! Drives a [`GridWorld`] tick by tick: every agent proposes, the world
//! resolves all proposals, and both phases are reported to the trace
//! recorder and the event log.

use std::path::Path;

use enact_events::{AgentEvent, EventLogger, TraceRecorder};
use tracing::{debug, info};

use crate::agent::Proposal;
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::world::{GridWorld, Outcome};

/// What happened in one tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub proposals: Vec<Proposal>,
    pub outcomes: Vec<Outcome>,
}

impl TickReport {
    /// Agents whose enacted interaction differs from the attempted one
    pub fn surprises(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.attempted != outcome.enacted)
            .count()
    }
}

/// Totals over a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub enactions: u64,
    /// Enactions that differed from the attempt
    pub surprises: u64,
    pub total_valence: f64,
}

impl RunSummary {
    pub fn mean_valence(&self) -> f64 {
        if self.enactions == 0 {
            0.0
        } else {
            self.total_valence / self.enactions as f64
        }
    }
}

pub struct Simulation {
    world: GridWorld,
    tick: u64,
    recorder: TraceRecorder,
    logger: EventLogger,
}

impl Simulation {
    /// Simulation over a prepared world with the default trace window and
    /// no event log
    pub fn new(world: GridWorld) -> Self {
        Self {
            world,
            tick: 0,
            recorder: TraceRecorder::default(),
            logger: EventLogger::null(),
        }
    }

    /// Build the configured experiment and open the configured event log
    pub fn from_config(config: &SimConfig) -> SimResult<Self> {
        let world = config.simulation.experiment.build(config)?;
        let logger = match &config.trace.events_path {
            Some(path) => EventLogger::new(path)?,
            None => EventLogger::null(),
        };

        Ok(Self {
            world,
            tick: 0,
            recorder: TraceRecorder::new(config.trace.window),
            logger,
        })
    }

    pub fn with_logger(mut self, logger: EventLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_trace_window(mut self, window: usize) -> Self {
        self.recorder = TraceRecorder::new(window);
        self
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut GridWorld {
        &mut self.world
    }

    /// Ticks run so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn recorder(&self) -> &TraceRecorder {
        &self.recorder
    }

    pub fn events_logged(&self) -> u64 {
        self.logger.event_count()
    }

    fn emit(&mut self, event: AgentEvent) -> SimResult<()> {
        let event = self.logger.log(event)?;
        self.recorder.record(&event);
        Ok(())
    }

    /// Run one tick
    pub fn step(&mut self) -> SimResult<TickReport> {
        let tick = self.tick;

        let mut proposals = Vec::new();
        for agent in self.world.agents() {
            let proposal = self.world.propose(agent)?;
            let name = self.world.interactions().name(proposal.interaction).to_string();
            self.emit(AgentEvent::preparation(tick, agent.agent_label(), name, proposal.valence))?;
            proposals.push(proposal);
        }

        let outcomes = self.world.resolve(&proposals)?;
        for outcome in &outcomes {
            let name = self.world.interactions().name(outcome.enacted).to_string();
            self.emit(AgentEvent::enaction(tick, outcome.agent.agent_label(), name, outcome.valence))?;
        }

        self.tick += 1;
        let report = TickReport { tick, proposals, outcomes };
        debug!(tick, agents = report.outcomes.len(), surprises = report.surprises(), "tick complete");
        Ok(report)
    }

    /// Run `ticks` ticks and flush the event log
    pub fn run(&mut self, ticks: u64) -> SimResult<RunSummary> {
        info!(
            ticks,
            agents = self.world.agents().len(),
            start_tick = self.tick,
            "starting run"
        );

        let mut summary = RunSummary::default();
        for _ in 0..ticks {
            let report = self.step()?;
            summary.ticks += 1;
            summary.enactions += report.outcomes.len() as u64;
            summary.surprises += report.surprises() as u64;
            summary.total_valence += report.outcomes.iter().map(|outcome| outcome.valence).sum::<f64>();
        }
        self.logger.flush()?;

        info!(
            ticks = summary.ticks,
            enactions = summary.enactions,
            mean_valence = summary.mean_valence(),
            "run complete"
        );
        Ok(summary)
    }

    /// Write the rolling per-agent traces as JSON
    pub fn write_traces(&self, path: impl AsRef<Path>) -> SimResult<()> {
        self.recorder.write_to_path(path.as_ref())?;
        info!(path = %path.as_ref().display(), "wrote traces");
        Ok(())
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("world", &self.world)
            .field("logger", &self.logger)
            .finish()
    }
}
