//! PDDL front end: an s-expression reader and the domain/problem
//! recognizers built on top of it.

pub mod pddl;
pub mod sexpr;

pub use pddl::{find_domain_of, parse_domain, parse_problem};
