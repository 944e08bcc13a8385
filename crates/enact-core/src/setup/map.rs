//! Map Parsing
//!
//! Builds a grid world from rows of symbols, one character per cell.

use crate::agent::{Agent, AgentState};
use crate::perception::BasicPerceptionHandler;
use crate::world::{EntityKind, GridWorld, Position, Rotation};

/// Homeostatic value driven by eating and walking
pub const ENERGY: &str = "energy";

/// Energy a homeostatic agent starts with
pub const START_ENERGY: f64 = 100.0;

/// What a map symbol places in its cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSymbol {
    Empty,
    Structure(EntityKind),
    Agent,
    /// Agent starting with [`START_ENERGY`]
    HomeostaticAgent,
    /// Agent with a [`BasicPerceptionHandler`]
    PerceivingAgent,
}

/// `w` wall, `b` block, `f` food, `a` agent, `h` homeostatic agent,
/// `p` perceiving agent; anything else is an empty cell
pub fn default_mapper(symbol: char) -> MapSymbol {
    match symbol {
        'w' => MapSymbol::Structure(EntityKind::Wall),
        'b' => MapSymbol::Structure(EntityKind::Block),
        'f' => MapSymbol::Structure(EntityKind::Food),
        'a' => MapSymbol::Agent,
        'h' => MapSymbol::HomeostaticAgent,
        'p' => MapSymbol::PerceivingAgent,
        _ => MapSymbol::Empty,
    }
}

/// Parse rows of symbols into a world.
///
/// Width is the longest row, height the number of rows. Agents face east.
pub fn parse_world<S: AsRef<str>>(lines: &[S], mapper: impl Fn(char) -> MapSymbol) -> GridWorld {
    let width = lines
        .iter()
        .map(|line| line.as_ref().chars().count())
        .max()
        .unwrap_or(0);
    let mut world = GridWorld::new(width as i32, lines.len() as i32);

    for (y, line) in lines.iter().enumerate() {
        for (x, symbol) in line.as_ref().chars().enumerate() {
            let position = Position::new(x as i32, y as i32);
            match mapper(symbol) {
                MapSymbol::Empty => {}
                MapSymbol::Structure(kind) => {
                    world.add_entity(kind, position);
                }
                MapSymbol::Agent => {
                    world.add_agent(position, Rotation::EAST);
                }
                MapSymbol::HomeostaticAgent => {
                    let agent = world.add_agent(position, Rotation::EAST);
                    if let Some(mut state) = world.get_mut::<AgentState>(agent) {
                        state.set_homeostatic_value(ENERGY, START_ENERGY);
                    }
                }
                MapSymbol::PerceivingAgent => {
                    let agent = world.add_agent(position, Rotation::EAST);
                    if let Some(mut component) = world.get_mut::<Agent>(agent) {
                        component.set_perception(Box::new(BasicPerceptionHandler::default()));
                    }
                }
            }
        }
    }

    world
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions_and_entities() {
        let world = parse_world(&["wwww", "w.a", "wbfw", "wwwww"], default_mapper);

        assert_eq!(world.width(), 5);
        assert_eq!(world.height(), 4);

        let agents = world.agents();
        assert_eq!(agents.len(), 1);
        assert_eq!(world.position(agents[0]), Some(Position::new(2, 1)));
        assert_eq!(world.rotation(agents[0]), Some(Rotation::EAST));

        let at_block = world.entities_at(Position::new(1, 2));
        assert_eq!(at_block.len(), 1);
        assert_eq!(world.kind(at_block[0]), Some(EntityKind::Block));
        assert_eq!(world.kind(world.entities_at(Position::new(2, 2))[0]), Some(EntityKind::Food));
        assert!(world.entities_at(Position::new(1, 1)).is_empty());
    }

    #[test]
    fn test_agent_symbols() {
        let world = parse_world(&["ahp"], default_mapper);
        let agents = world.agents();
        assert_eq!(agents.len(), 3);

        let energy = |id| world.get::<AgentState>(id).map(|s| s.homeostatic_value(ENERGY));
        assert_eq!(energy(agents[0]), Some(0.0));
        assert_eq!(energy(agents[1]), Some(START_ENERGY));

        let perceives = |id| world.get::<Agent>(id).is_some_and(|a| a.perception().is_some());
        assert!(!perceives(agents[0]));
        assert!(perceives(agents[2]));
    }

    #[test]
    fn test_custom_mapper() {
        let world = parse_world(&["#.#"], |symbol| match symbol {
            '#' => MapSymbol::Structure(EntityKind::Wall),
            _ => MapSymbol::Empty,
        });
        assert_eq!(world.entities().len(), 2);
    }
}
