//! Interactions
//!
//! An interaction is an attempted or enacted action together with its
//! outcome. Interactions are interned in an [`InteractionRegistry`] and
//! addressed by [`InteractionId`] handles, so the same logical interaction
//! is one key everywhere: memories, motivation tables and histories.

use std::collections::HashMap;
use std::fmt;

/// Result label of a successful primitive
pub const SUCCEED: &str = "Succeed";
/// Result label of a failed primitive
pub const FAIL: &str = "Fail";

/// Handle to an interned interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractionId(u32);

impl InteractionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of interaction shapes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Interaction {
    /// An (action, result) pair, e.g. ("Step", "Succeed")
    Primitive { action: String, result: String },
    /// `pre` was enacted, then `post` was enacted
    Composite {
        pre: InteractionId,
        post: InteractionId,
    },
    /// A primitive enacted while perceiving `context`
    Perception {
        primitive: InteractionId,
        context: String,
    },
}

impl Interaction {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Interaction::Primitive { .. })
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Interaction::Composite { .. })
    }

    pub fn is_perception(&self) -> bool {
        matches!(self, Interaction::Perception { .. })
    }
}

/// Arena of canonical interactions.
///
/// Interning the same primitive labels, the same `(pre, post)` pair or the
/// same `(primitive, context)` pair twice returns the handle minted the
/// first time. Handles are only valid for the registry that created them.
#[derive(Debug, Clone, Default)]
pub struct InteractionRegistry {
    interactions: Vec<Interaction>,
    names: Vec<String>,
    index: HashMap<Interaction, InteractionId>,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, interaction: Interaction) -> InteractionId {
        if let Some(&id) = self.index.get(&interaction) {
            return id;
        }

        let id = InteractionId(self.interactions.len() as u32);
        let name = match &interaction {
            Interaction::Primitive { action, result } => format!("{} {}", action, result),
            Interaction::Composite { pre, post } => {
                format!("<{}, {}>", self.name(*pre), self.name(*post))
            }
            Interaction::Perception { primitive, context } => {
                format!("{} [{}]", self.name(*primitive), context)
            }
        };

        self.names.push(name);
        self.index.insert(interaction.clone(), id);
        self.interactions.push(interaction);
        id
    }

    /// Intern the primitive `(action, result)`
    pub fn primitive(&mut self, action: &str, result: &str) -> InteractionId {
        self.intern(Interaction::Primitive {
            action: action.to_string(),
            result: result.to_string(),
        })
    }

    /// Intern the composite "`pre`, then `post`"
    pub fn composite(&mut self, pre: InteractionId, post: InteractionId) -> InteractionId {
        self.intern(Interaction::Composite { pre, post })
    }

    /// Wrap a primitive with a perceptual context.
    ///
    /// A perception interaction is re-wrapped around its own primitive.
    /// Returns `None` for composites, which carry no single primitive.
    pub fn perception(&mut self, interaction: InteractionId, context: &str) -> Option<InteractionId> {
        let primitive = self.primitive_of(interaction)?;
        Some(self.intern(Interaction::Perception {
            primitive,
            context: context.to_string(),
        }))
    }

    pub fn get(&self, id: InteractionId) -> &Interaction {
        &self.interactions[id.index()]
    }

    pub fn find_primitive(&self, action: &str, result: &str) -> Option<InteractionId> {
        self.index
            .get(&Interaction::Primitive {
                action: action.to_string(),
                result: result.to_string(),
            })
            .copied()
    }

    /// Stable display name, also the dispatch key of a primitive
    pub fn name(&self, id: InteractionId) -> &str {
        &self.names[id.index()]
    }

    /// Key the world dispatches on: the name of the underlying primitive
    pub fn dispatch_name(&self, id: InteractionId) -> Option<&str> {
        self.primitive_of(id).map(|primitive| self.name(primitive))
    }

    /// The primitive an interaction stands for; `None` for composites
    pub fn primitive_of(&self, id: InteractionId) -> Option<InteractionId> {
        match self.get(id) {
            Interaction::Primitive { .. } => Some(id),
            Interaction::Perception { primitive, .. } => Some(*primitive),
            Interaction::Composite { .. } => None,
        }
    }

    pub fn pre(&self, id: InteractionId) -> Option<InteractionId> {
        match self.get(id) {
            Interaction::Composite { pre, .. } => Some(*pre),
            _ => None,
        }
    }

    pub fn post(&self, id: InteractionId) -> Option<InteractionId> {
        match self.get(id) {
            Interaction::Composite { post, .. } => Some(*post),
            _ => None,
        }
    }

    pub fn action(&self, id: InteractionId) -> Option<&str> {
        match self.get(self.primitive_of(id)?) {
            Interaction::Primitive { action, .. } => Some(action),
            _ => None,
        }
    }

    pub fn result(&self, id: InteractionId) -> Option<&str> {
        match self.get(self.primitive_of(id)?) {
            Interaction::Primitive { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Flatten an interaction into its primitive sequence, depth-first and
    /// left to right. Primitive and perception interactions yield themselves.
    pub fn unwrap(&self, id: InteractionId) -> Unwrap<'_> {
        Unwrap {
            registry: self,
            stack: vec![id],
        }
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}

/// Lazy depth-first flattening of a composite interaction.
///
/// A clone continues from the same point; call
/// [`InteractionRegistry::unwrap`] again to start over.
#[derive(Debug, Clone)]
pub struct Unwrap<'a> {
    registry: &'a InteractionRegistry,
    stack: Vec<InteractionId>,
}

impl Iterator for Unwrap<'_> {
    type Item = InteractionId;

    fn next(&mut self) -> Option<InteractionId> {
        while let Some(id) = self.stack.pop() {
            match self.registry.get(id) {
                Interaction::Composite { pre, post } => {
                    self.stack.push(*post);
                    self.stack.push(*pre);
                }
                _ => return Some(id),
            }
        }
        None
    }
}
