use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};

use compact_str::CompactString;
use im::OrdSet;

use crate::classical::canonical;
use crate::classical::state::{Atom, State};
use crate::errors::Error;

/// A lifted predicate application: a predicate name and the symbols it is
/// applied to. Each symbol is either one of the owning schema's parameter
/// variables (a `?`-prefixed name) or a constant; the distinction is resolved
/// against the binding when the schema is grounded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Literal {
    pub predicate: CompactString,
    pub args: Vec<CompactString>,
}

impl Literal {
    pub fn new(predicate: impl Into<CompactString>, args: Vec<CompactString>) -> Literal {
        Literal {
            predicate: predicate.into(),
            args,
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", canonical(&self.predicate, &self.args))
    }
}

/// A lifted, parameterized action schema.
#[derive(Clone, Debug)]
pub struct ActionSchema {
    pub name: CompactString,
    /// Ordered `(variable, type)` pairs. The order fixes the argument order
    /// of every grounded instance.
    pub parameters: Vec<(CompactString, CompactString)>,
    pub preconditions: Vec<Literal>,
    pub add_effects: Vec<Literal>,
    pub del_effects: Vec<Literal>,
}

impl ActionSchema {
    /// Instantiates the schema with one object per parameter, in parameter
    /// order. Fails when a literal still references a variable that is not a
    /// parameter of the schema; callers drop such bindings.
    pub fn ground<S: AsRef<str>>(&self, objects: &[S]) -> Result<Action, Error> {
        debug_assert_eq!(objects.len(), self.parameters.len());
        let binding: HashMap<&str, &str> = self
            .parameters
            .iter()
            .zip(objects.iter())
            .map(|((var, _), obj)| (var.as_str(), obj.as_ref()))
            .collect();

        let substitute = |lits: &[Literal]| -> Result<OrdSet<Atom>, Error> {
            let mut out = OrdSet::new();
            for lit in lits {
                let mut args = Vec::with_capacity(lit.args.len());
                for arg in &lit.args {
                    match binding.get(arg.as_str()) {
                        Some(obj) => args.push(CompactString::from(*obj)),
                        None if arg.starts_with('?') => {
                            return Err(Error::Grounding(format!(
                                "unbound variable `{arg}` in schema `{}`",
                                self.name
                            )))
                        }
                        None => args.push(arg.clone()),
                    }
                }
                out.insert(Atom::new(&lit.predicate, &args));
            }
            Ok(out)
        };

        Ok(Action {
            name: canonical(&self.name, objects),
            schema: self.name.clone(),
            preconditions: substitute(&self.preconditions)?,
            add_effects: substitute(&self.add_effects)?,
            del_effects: substitute(&self.del_effects)?,
        })
    }
}

/// A grounded action: three immutable atom sets under a canonical name
/// `schema(arg1,…,argN)` that preserves schema parameter order.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Action {
    pub name: CompactString,
    pub schema: CompactString,
    pub preconditions: OrdSet<Atom>,
    pub add_effects: OrdSet<Atom>,
    pub del_effects: OrdSet<Atom>,
}

impl Action {
    /// An action is applicable in `state` iff its preconditions all hold.
    pub fn applicable(&self, state: &State) -> bool {
        state.satisfies(&self.preconditions)
    }

    /// The deterministic result of executing the action:
    /// `(S ∪ adds) \ dels`.
    pub fn apply(&self, state: &State) -> State {
        state.apply(&self.add_effects, &self.del_effects)
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Debug for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One step of a serialized plan.
#[derive(Clone, Debug, serde::Serialize)]
pub struct PlanStep {
    pub action: String,
    pub preconditions: Vec<Atom>,
    pub add_effects: Vec<Atom>,
    pub del_effects: Vec<Atom>,
}

impl From<&Action> for PlanStep {
    fn from(action: &Action) -> PlanStep {
        PlanStep {
            action: action.name.to_string(),
            preconditions: action.preconditions.iter().cloned().collect(),
            add_effects: action.add_effects.iter().cloned().collect(),
            del_effects: action.del_effects.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(predicate: &str, args: &[&str]) -> Literal {
        Literal::new(predicate, args.iter().map(|a| CompactString::from(*a)).collect())
    }

    fn pick_up() -> ActionSchema {
        ActionSchema {
            name: "pick-up".into(),
            parameters: vec![("?x".into(), "block".into())],
            preconditions: vec![lit("clear", &["?x"]), lit("on-table", &["?x"]), lit("hand-empty", &[])],
            add_effects: vec![lit("holding", &["?x"])],
            del_effects: vec![lit("on-table", &["?x"]), lit("clear", &["?x"]), lit("hand-empty", &[])],
        }
    }

    #[test]
    fn grounding_substitutes_parameters() {
        let action = pick_up().ground(&["a"]).unwrap();
        assert_eq!(action.name, "pick-up(a)");
        assert_eq!(action.schema, "pick-up");
        assert!(action.preconditions.contains(&Atom::from("clear(a)")));
        assert!(action.preconditions.contains(&Atom::from("hand-empty")));
        assert!(action.add_effects.contains(&Atom::from("holding(a)")));
        assert!(action.del_effects.contains(&Atom::from("on-table(a)")));
    }

    #[test]
    fn grounding_keeps_constants() {
        let mut schema = pick_up();
        schema.preconditions.push(lit("at", &["?x", "home"]));
        let action = schema.ground(&["a"]).unwrap();
        assert!(action.preconditions.contains(&Atom::from("at(a,home)")));
    }

    #[test]
    fn grounding_rejects_free_variables() {
        let mut schema = pick_up();
        schema.add_effects.push(lit("above", &["?x", "?y"]));
        assert!(schema.ground(&["a"]).is_err());
    }

    #[test]
    fn apply_follows_effects() {
        let action = pick_up().ground(&["a"]).unwrap();
        let state = State::new([
            Atom::from("clear(a)"),
            Atom::from("on-table(a)"),
            Atom::from("hand-empty"),
        ]);
        assert!(action.applicable(&state));
        let next = action.apply(&state);
        assert_eq!(next, State::new([Atom::from("holding(a)")]));
        assert!(!action.applicable(&next));
    }
}
