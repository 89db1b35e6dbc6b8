use std::collections::hash_map::DefaultHasher;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

use compact_str::CompactString;
use im::OrdSet;
use serde::{Serialize, Serializer};

use crate::classical::canonical;

/// A grounded, positive predicate instance in canonical string form:
/// `name(arg1,arg2,…)`, or the bare `name` at arity zero.
///
/// The canonical form is the equality key; two atoms are the same predicate
/// instance exactly when their strings match.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Atom(CompactString);

impl Atom {
    pub fn new<S: AsRef<str>>(predicate: &str, args: &[S]) -> Atom {
        Atom(canonical(predicate, args))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<CompactString> for Atom {
    fn from(s: CompactString) -> Atom {
        Atom(s)
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Atom {
        Atom(CompactString::from(s))
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable set of atoms.
///
/// Two states holding the same atoms are equal and hash identically
/// regardless of construction order. States are never mutated in place:
/// [`State::apply`] produces the successor `(S ∪ add) \ del` and leaves the
/// receiver untouched. The backing persistent set makes that step share
/// structure with its parent.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct State {
    atoms: OrdSet<Atom>,
}

impl State {
    pub fn new(atoms: impl IntoIterator<Item = Atom>) -> State {
        State {
            atoms: atoms.into_iter().collect(),
        }
    }

    pub fn contains(&self, atom: &Atom) -> bool {
        self.atoms.contains(atom)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// True iff every atom of `condition` holds in this state.
    pub fn satisfies(&self, condition: &OrdSet<Atom>) -> bool {
        condition.is_subset(&self.atoms)
    }

    /// The deterministic successor `(S ∪ add) \ del`.
    pub fn apply(&self, add: &OrdSet<Atom>, del: &OrdSet<Atom>) -> State {
        State {
            atoms: self.atoms.clone().union(add.clone()).relative_complement(del.clone()),
        }
    }

    /// Atoms in ascending canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter()
    }

    pub fn atoms(&self) -> &OrdSet<Atom> {
        &self.atoms
    }

    /// Sorted snapshot of the state, stable across runs.
    pub fn snapshot(&self) -> Vec<Atom> {
        self.atoms.iter().cloned().collect()
    }

    /// Order-independent digest: atoms are hashed in canonical order, so the
    /// digest only depends on set membership. Used as memoization key and as
    /// the `state_hash` of tree payloads.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for atom in &self.atoms {
            atom.hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl FromIterator<Atom> for State {
    fn from_iter<T: IntoIterator<Item = Atom>>(iter: T) -> State {
        State::new(iter)
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.atoms.iter())
    }
}

impl Debug for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.atoms.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(s: &str) -> Atom {
        Atom::from(s)
    }

    fn set(atoms: &[&str]) -> OrdSet<Atom> {
        atoms.iter().map(|a| atom(a)).collect()
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = State::new([atom("p"), atom("q(x)"), atom("r(x,y)")]);
        let b = State::new([atom("r(x,y)"), atom("p"), atom("q(x)")]);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn apply_is_pure() {
        let s = State::new([atom("p"), atom("q")]);
        let succ = s.apply(&set(&["r"]), &set(&["p"]));
        assert_eq!(succ, State::new([atom("q"), atom("r")]));
        // the receiver is untouched
        assert_eq!(s, State::new([atom("p"), atom("q")]));
    }

    #[test]
    fn add_wins_over_existing_del_of_other_atom() {
        let s = State::new([atom("p")]);
        // adding an atom already present and deleting an absent one are no-ops
        let succ = s.apply(&set(&["p"]), &set(&["missing"]));
        assert_eq!(succ, s);
    }

    #[test]
    fn satisfies_is_subset() {
        let s = State::new([atom("p"), atom("q"), atom("r")]);
        assert!(s.satisfies(&set(&["p", "r"])));
        assert!(s.satisfies(&set(&[])));
        assert!(!s.satisfies(&set(&["p", "z"])));
    }

    #[test]
    fn snapshot_is_sorted() {
        let s = State::new([atom("z"), atom("a"), atom("m")]);
        let snap: Vec<String> = s.snapshot().iter().map(|a| a.to_string()).collect();
        assert_eq!(snap, vec!["a", "m", "z"]);
    }
}
