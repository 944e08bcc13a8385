//! World Setup
//!
//! Map parsing, the environment logic shared by experiments, and the
//! experiment presets themselves.

pub mod experiments;
pub mod logic;
pub mod map;

pub use experiments::Experiment;
pub use map::{default_mapper, parse_world, MapSymbol, ENERGY, START_ENERGY};
