use compact_str::CompactString;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::classical::action::{Action, ActionSchema};
use crate::classical::domain::{Domain, Problem};
use crate::classical::task::Task;
use crate::errors::Error;

/// Instantiates every schema of `domain` over the object universe of
/// `problem` and assembles the grounded [`Task`].
///
/// No pruning: every type-consistent binding is emitted and applicability is
/// left to search. The emission order is schema-declaration order crossed
/// with lexicographic binding order, which fixes tie-breaking downstream.
pub fn ground(domain: &Domain, problem: &Problem) -> Result<Task, Error> {
    if problem.domain != domain.name {
        return Err(Error::Grounding(format!(
            "problem `{}` references domain `{}` but `{}` was supplied",
            problem.name, problem.domain, domain.name
        )));
    }

    let mut actions = Vec::new();
    for schema in &domain.schemas {
        let before = actions.len();
        ground_schema(schema, domain, problem, &mut actions);
        debug!(
            schema = schema.name.as_str(),
            count = actions.len() - before,
            "grounded schema"
        );
    }
    debug!(actions = actions.len(), objects = problem.objects.len(), "grounded task");

    Ok(Task {
        name: problem.name.clone(),
        domain: domain.name.clone(),
        objects: problem.objects.clone(),
        init: problem.init.clone(),
        goal: problem.goal.clone(),
        actions,
    })
}

fn ground_schema(schema: &ActionSchema, domain: &Domain, problem: &Problem, out: &mut Vec<Action>) {
    if schema.parameters.is_empty() {
        // parameterless schemas produce exactly one grounded action
        match schema.ground::<&str>(&[]) {
            Ok(action) => out.push(action),
            Err(e) => trace!(schema = schema.name.as_str(), "dropped binding: {e}"),
        }
        return;
    }

    let candidates: Vec<Vec<CompactString>> = schema
        .parameters
        .iter()
        .map(|(_, tpe)| instances_of_type(domain, problem, tpe))
        .collect();

    for binding in candidates.into_iter().multi_cartesian_product() {
        match schema.ground(&binding) {
            Ok(action) => out.push(action),
            Err(e) => trace!(schema = schema.name.as_str(), "dropped binding: {e}"),
        }
    }
}

/// All objects and constants whose declared type is `tpe` or a transitive
/// subtype of it, sorted lexicographically.
fn instances_of_type(domain: &Domain, problem: &Problem, tpe: &str) -> Vec<CompactString> {
    let mut instances: Vec<CompactString> = problem
        .objects
        .iter()
        .chain(domain.constants.iter())
        .filter(|(_, declared)| domain.is_subtype(declared, tpe))
        .map(|(name, _)| name.clone())
        .collect();
    instances.sort();
    instances
}
