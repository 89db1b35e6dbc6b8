use std::collections::BTreeMap;

use compact_str::CompactString;
use im::OrdSet;

use crate::classical::action::ActionSchema;
use crate::classical::state::{Atom, State};

/// The root of every type hierarchy. Untyped names in typed lists default to
/// it, and the subtype walk stops when it is reached.
pub const OBJECT_TYPE: &str = "object";

/// A lifted PDDL domain: type hierarchy, predicate signatures, typed
/// constants and action schemas.
#[derive(Clone, Debug, Default)]
pub struct Domain {
    pub name: CompactString,
    /// Requirement flags, captured verbatim and not interpreted.
    pub requirements: Vec<CompactString>,
    /// `type → parent`. Root types point at [`OBJECT_TYPE`], which itself has
    /// no entry.
    pub types: BTreeMap<CompactString, CompactString>,
    /// `predicate → parameter types`.
    pub predicates: BTreeMap<CompactString, Vec<CompactString>>,
    /// `constant → type`.
    pub constants: BTreeMap<CompactString, CompactString>,
    /// Schemas in declaration order; grounding preserves this order.
    pub schemas: Vec<ActionSchema>,
}

impl Domain {
    /// Ancestor walk through the type table. Every type is a subtype of
    /// itself. The walk is guarded against cyclic parent declarations.
    pub fn is_subtype(&self, subtype: &str, supertype: &str) -> bool {
        let mut current = subtype;
        let mut steps = 0;
        loop {
            if current == supertype {
                return true;
            }
            match self.types.get(current) {
                Some(parent) if steps <= self.types.len() => {
                    current = parent;
                    steps += 1;
                }
                _ => return false,
            }
        }
    }
}

/// A lifted PDDL problem: objects, initial atoms and the goal conjunction,
/// referring to its domain by name.
#[derive(Clone, Debug, Default)]
pub struct Problem {
    pub name: CompactString,
    pub domain: CompactString,
    /// `object → type`, ordered by name.
    pub objects: BTreeMap<CompactString, CompactString>,
    pub init: State,
    pub goal: OrdSet<Atom>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain_with_types(pairs: &[(&str, &str)]) -> Domain {
        Domain {
            types: pairs
                .iter()
                .map(|(t, p)| (CompactString::from(*t), CompactString::from(*p)))
                .collect(),
            ..Domain::default()
        }
    }

    #[test]
    fn subtype_walk() {
        let d = domain_with_types(&[("block", "physical"), ("physical", "object"), ("ball", "physical")]);
        assert!(d.is_subtype("block", "block"));
        assert!(d.is_subtype("block", "physical"));
        assert!(d.is_subtype("block", "object"));
        assert!(!d.is_subtype("physical", "block"));
        assert!(!d.is_subtype("block", "ball"));
    }

    #[test]
    fn cyclic_hierarchy_terminates() {
        let d = domain_with_types(&[("a", "b"), ("b", "a")]);
        assert!(!d.is_subtype("a", "object"));
        assert!(d.is_subtype("a", "b"));
    }
}
