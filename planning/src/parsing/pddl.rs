use std::path::{Path, PathBuf};

use compact_str::CompactString;
use regex::Regex;

use crate::classical::domain::OBJECT_TYPE;
use crate::classical::{ActionSchema, Atom, Domain, Literal, Problem};
use crate::errors::{Error, ParseError};
use crate::parsing::sexpr::{parse, ListIter, SExpr};

/// Reads `(define (domain NAME) …)` into a lifted [`Domain`].
pub fn parse_domain(text: &str) -> Result<Domain, Error> {
    let expr = parse(text)?;
    Ok(read_domain(&expr)?)
}

/// Reads `(define (problem NAME) …)` into a lifted [`Problem`].
pub fn parse_problem(text: &str) -> Result<Problem, Error> {
    let expr = parse(text)?;
    Ok(read_problem(&expr)?)
}

/// Attempts to find the domain file that goes with the given problem file.
///
/// Looks for `domain.pddl` in the problem's directory and its parent, and
/// additionally understands the `XXX.pb.pddl → XXX.dom.pddl` and
/// `XXX.pddl → XXX-domain.pddl` naming conventions.
pub fn find_domain_of(problem_file: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::with_capacity(3);
    candidates.push(match problem_file.extension() {
        Some(ext) => Path::new("domain").with_extension(ext),
        None => Path::new("domain.pddl").to_path_buf(),
    });

    let filename = problem_file.file_name()?.to_str()?;
    let re = Regex::new(r"([^\.]+)(\.[^\.]+)?\.pb\.([hp]ddl)").unwrap();
    for m in re.captures_iter(filename) {
        candidates.push(format!("{}.dom.{}", &m[1], &m[3]).into());
    }
    let re = Regex::new(r"([^\.]+)\.([hp]ddl)").unwrap();
    for m in re.captures_iter(filename) {
        candidates.push(format!("{}-domain.{}", &m[1], &m[2]).into());
    }

    let mut directories = Vec::with_capacity(2);
    if let Some(current) = problem_file.parent() {
        directories.push(current);
        if let Some(parent) = current.parent() {
            directories.push(parent);
        }
    }

    for candidate in &candidates {
        for &dir in &directories {
            let path = dir.join(candidate);
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

/// Consumes a typed list of symbols:
///  - `(a - loc b - loc c)`: `a` and `b` of type `loc`, `c` of type `object`
///  - `(a b c - loc)`: `a`, `b` and `c` of type `loc`
///
/// A `-` binds the preceding run of names to the symbol that follows it;
/// trailing unbound names default to `object`.
fn consume_typed_symbols(input: &mut ListIter) -> Result<Vec<(CompactString, CompactString)>, ParseError> {
    let mut out = Vec::with_capacity(input.len() / 3);
    let mut untyped: Vec<CompactString> = Vec::new();
    while !input.is_empty() {
        let next = input.pop_atom()?;
        if next.as_str() == "-" {
            if input.is_empty() {
                return Err(next.invalid("Typed list ends with `-`"));
            }
            let tpe = input.pop_atom()?.canonical();
            untyped.drain(..).for_each(|name| out.push((name, tpe.clone())));
        } else {
            untyped.push(next.canonical());
        }
    }
    untyped
        .drain(..)
        .for_each(|name| out.push((name, CompactString::from(OBJECT_TYPE))));
    Ok(out)
}

/// Reads one predicate application `(pred a b …)` into a lifted literal.
fn read_literal(mut items: ListIter) -> Result<Literal, ParseError> {
    let predicate = items.pop_atom()?.canonical();
    let mut args = Vec::with_capacity(items.len());
    for arg in items {
        let atom = arg.as_atom().ok_or_else(|| arg.invalid("Expected an atom"))?;
        args.push(atom.canonical());
    }
    Ok(Literal::new(predicate, args))
}

/// Collects the positive literals of a precondition or goal formula.
///
/// `(and F…)` recurses on each subform; `(not …)` and `(= …)` are silently
/// dropped (negative preconditions and equality are out of scope), and so is
/// anything that is not a list.
fn collect_literals(expr: &SExpr, out: &mut Vec<Literal>) -> Result<(), ParseError> {
    let Some(list) = expr.as_list() else { return Ok(()) };
    let mut items = list.iter();
    let Some(head) = items.peek() else { return Ok(()) };
    match head.as_atom().map(|a| a.as_str()) {
        Some("and") => {
            let _ = items.next();
            for sub in items {
                collect_literals(sub, out)?;
            }
            Ok(())
        }
        Some("not") | Some("=") => Ok(()),
        Some(_) => {
            out.push(read_literal(list.iter())?);
            Ok(())
        }
        None => Err(head.invalid("Expected an atom")),
    }
}

/// Splits an effect formula into its add and delete literals: positive
/// literals reached under `and` are adds, literals under `not` are deletes.
fn collect_effects(expr: &SExpr, adds: &mut Vec<Literal>, dels: &mut Vec<Literal>) -> Result<(), ParseError> {
    let Some(list) = expr.as_list() else { return Ok(()) };
    let mut items = list.iter();
    let Some(head) = items.peek() else { return Ok(()) };
    match head.as_atom().map(|a| a.as_str()) {
        Some("and") => {
            let _ = items.next();
            for sub in items {
                collect_effects(sub, adds, dels)?;
            }
            Ok(())
        }
        Some("not") => {
            let _ = items.next();
            for inner in items {
                if let Some(inner_list) = inner.as_list() {
                    dels.push(read_literal(inner_list.iter())?);
                }
            }
            Ok(())
        }
        Some("=") => Ok(()),
        Some(_) => {
            adds.push(read_literal(list.iter())?);
            Ok(())
        }
        None => Err(head.invalid("Expected an atom")),
    }
}

fn read_domain(expr: &SExpr) -> Result<Domain, ParseError> {
    let mut body = expr.as_list_iter().ok_or_else(|| expr.invalid("Expected a list"))?;
    body.pop_known_atom("define")?;

    // the name declaration, of the form `(domain NAME)`
    let mut name_decl = body.pop_list()?.iter();
    name_decl.pop_known_atom("domain")?;
    let name = name_decl.pop_atom()?.canonical();

    let mut res = Domain {
        name,
        ..Domain::default()
    };

    for current in body {
        // every recognized section is a list starting with a `:keyword`;
        // anything else is tolerated and skipped
        let Some(mut section) = current.as_list_iter() else { continue };
        let Some(keyword) = section.next().and_then(SExpr::as_atom) else {
            continue;
        };
        match keyword.as_str() {
            ":requirements" => {
                for flag in section {
                    if let Some(flag) = flag.as_atom() {
                        res.requirements.push(flag.canonical());
                    }
                }
            }
            ":types" => {
                for (tpe, parent) in consume_typed_symbols(&mut section)? {
                    res.types.insert(tpe, parent);
                }
            }
            ":constants" => {
                for (constant, tpe) in consume_typed_symbols(&mut section)? {
                    res.constants.insert(constant, tpe);
                }
            }
            ":predicates" => {
                for pred in section {
                    let mut decl = pred
                        .as_list_iter()
                        .ok_or_else(|| pred.invalid("Expected a predicate declaration"))?;
                    let pred_name = decl.pop_atom()?.canonical();
                    let params = consume_typed_symbols(&mut decl)?;
                    res.predicates
                        .insert(pred_name, params.into_iter().map(|(_, tpe)| tpe).collect());
                }
            }
            ":action" => res.schemas.push(read_action(&mut section)?),
            _ => {}
        }
    }
    Ok(res)
}

fn read_action(property: &mut ListIter) -> Result<ActionSchema, ParseError> {
    let name = property.pop_atom()?.canonical();
    let mut parameters = Vec::new();
    let mut preconditions = Vec::new();
    let mut add_effects = Vec::new();
    let mut del_effects = Vec::new();

    while !property.is_empty() {
        let key = property.pop_atom()?;
        let value = property
            .pop()
            .map_err(|_| key.invalid(format!("No value associated to `{key}`")))?;
        match key.as_str() {
            ":parameters" => {
                let mut list = value
                    .as_list_iter()
                    .ok_or_else(|| value.invalid("Expected a parameter list"))?;
                parameters = consume_typed_symbols(&mut list)?;
            }
            ":precondition" => collect_literals(value, &mut preconditions)?,
            ":effect" => collect_effects(value, &mut add_effects, &mut del_effects)?,
            _ => {}
        }
    }

    Ok(ActionSchema {
        name,
        parameters,
        preconditions,
        add_effects,
        del_effects,
    })
}

fn read_problem(expr: &SExpr) -> Result<Problem, ParseError> {
    let mut body = expr.as_list_iter().ok_or_else(|| expr.invalid("Expected a list"))?;
    body.pop_known_atom("define")?;

    let mut name_decl = body.pop_list()?.iter();
    name_decl.pop_known_atom("problem")?;
    let name = name_decl.pop_atom()?.canonical();

    let mut res = Problem {
        name,
        ..Problem::default()
    };

    for current in body {
        let Some(mut section) = current.as_list_iter() else { continue };
        let Some(keyword) = section.next().and_then(SExpr::as_atom) else {
            continue;
        };
        match keyword.as_str() {
            ":domain" => res.domain = section.pop_atom()?.canonical(),
            ":objects" => {
                for (object, tpe) in consume_typed_symbols(&mut section)? {
                    res.objects.insert(object, tpe);
                }
            }
            ":init" => {
                // ground atoms only; anything else (numeric fluents, bare
                // tokens) is tolerated and skipped
                let atoms = section.filter_map(|fact| {
                    let list = fact.as_list()?;
                    read_literal(list.iter())
                        .ok()
                        .filter(|lit| lit.predicate != "=" && lit.predicate != "not")
                        .map(|lit| Atom::new(&lit.predicate, &lit.args))
                });
                res.init = atoms.collect();
            }
            ":goal" => {
                let form = section.pop()?;
                let mut literals = Vec::new();
                collect_literals(form, &mut literals)?;
                res.goal = literals
                    .iter()
                    .map(|lit| Atom::new(&lit.predicate, &lit.args))
                    .collect();
            }
            _ => {}
        }
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    static DOMAIN: &str = "
        (define (domain blocksworld)
          (:requirements :strips :typing)
          (:types block - object)
          (:constants table - block)
          (:predicates (on ?x - block ?y - block)
                       (on-table ?x - block)
                       (clear ?x - block)
                       (holding ?x - block)
                       (hand-empty))
          ; picking a block up empties nothing but the hand
          (:action pick-up
            :parameters (?x - block)
            :precondition (and (clear ?x) (on-table ?x) (hand-empty) (not (holding ?x)) (= ?x ?x))
            :effect (and (not (on-table ?x)) (not (clear ?x)) (not (hand-empty)) (holding ?x)))
          (:unsupported-section whatever)
        )";

    static PROBLEM: &str = "
        (define (problem tower)
          (:domain blocksworld)
          (:objects a b - block)
          (:init (clear a) (on-table a) (hand-empty) ignored-token)
          (:goal (and (holding a))))";

    #[test]
    fn domain_structure() {
        let dom = parse_domain(DOMAIN).unwrap();
        assert_eq!(dom.name, "blocksworld");
        assert_eq!(dom.requirements, vec![":strips", ":typing"]);
        assert_eq!(dom.types.get("block").map(|t| t.as_str()), Some("object"));
        assert_eq!(dom.constants.get("table").map(|t| t.as_str()), Some("block"));
        assert_eq!(dom.predicates.len(), 5);
        assert_eq!(dom.predicates["on"], vec!["block", "block"]);
        assert!(dom.predicates["hand-empty"].is_empty());
        assert_eq!(dom.schemas.len(), 1);
    }

    #[test]
    fn negative_preconditions_and_equality_are_dropped() {
        let dom = parse_domain(DOMAIN).unwrap();
        let schema = &dom.schemas[0];
        assert_eq!(
            schema.parameters,
            vec![(CompactString::from("?x"), CompactString::from("block"))]
        );
        let pre: Vec<String> = schema.preconditions.iter().map(|l| l.to_string()).collect();
        assert_eq!(pre, vec!["clear(?x)", "on-table(?x)", "hand-empty"]);
        let adds: Vec<String> = schema.add_effects.iter().map(|l| l.to_string()).collect();
        assert_eq!(adds, vec!["holding(?x)"]);
        let dels: Vec<String> = schema.del_effects.iter().map(|l| l.to_string()).collect();
        assert_eq!(dels, vec!["on-table(?x)", "clear(?x)", "hand-empty"]);
    }

    #[test]
    fn problem_structure() {
        let pb = parse_problem(PROBLEM).unwrap();
        assert_eq!(pb.name, "tower");
        assert_eq!(pb.domain, "blocksworld");
        assert_eq!(pb.objects.len(), 2);
        assert_eq!(pb.objects.get("a").map(|t| t.as_str()), Some("block"));
        let init: Vec<String> = pb.init.iter().map(|a| a.to_string()).collect();
        assert_eq!(init, vec!["clear(a)", "hand-empty", "on-table(a)"]);
        assert!(pb.goal.contains(&Atom::from("holding(a)")));
        assert_eq!(pb.goal.len(), 1);
    }

    #[test]
    fn parsing_is_reproducible() {
        let a = parse_domain(DOMAIN).unwrap();
        let b = parse_domain(DOMAIN).unwrap();
        assert_eq!(a.name, b.name);
        assert_eq!(a.types, b.types);
        assert_eq!(a.predicates, b.predicates);
        assert_eq!(a.constants, b.constants);
        assert_eq!(a.schemas.len(), b.schemas.len());
    }

    #[test]
    fn typed_list_defaults() {
        let dom = parse_domain("(define (domain d) (:types truck plane - vehicle depot))").unwrap();
        assert_eq!(dom.types.get("truck").map(|t| t.as_str()), Some("vehicle"));
        assert_eq!(dom.types.get("plane").map(|t| t.as_str()), Some("vehicle"));
        assert_eq!(dom.types.get("depot").map(|t| t.as_str()), Some("object"));
    }

    #[test]
    fn malformed_inputs() {
        assert!(parse_domain("(domain d)").is_err());
        assert!(parse_domain("(define (domain d)").is_err());
        assert!(parse_domain("(define (domain d) (:types a -))").is_err());
        assert!(parse_problem("(define (domain d))").is_err());
    }

    #[test]
    fn zero_arity_init_atom() {
        let pb = parse_problem("(define (problem p) (:domain d) (:init (hand-empty)) (:goal (hand-empty)))").unwrap();
        assert!(pb.init.contains(&Atom::from("hand-empty")));
        assert!(pb.goal.contains(&Atom::from("hand-empty")));
    }

    #[test]
    fn numeric_init_entries_are_skipped() {
        let pb = parse_problem("(define (problem p) (:domain d) (:init (p a) (= (total-cost) 0)) (:goal (p a)))").unwrap();
        let init: Vec<String> = pb.init.iter().map(|a| a.to_string()).collect();
        assert_eq!(init, vec!["p(a)"]);
    }

    #[test]
    fn find_domain_next_to_problem() {
        let dir = std::env::temp_dir().join("peregrine-find-domain-test");
        std::fs::create_dir_all(&dir).unwrap();
        let domain = dir.join("domain.pddl");
        std::fs::write(&domain, "(define (domain d))").unwrap();
        let problem = dir.join("p01.pddl");
        std::fs::write(&problem, "(define (problem p) (:domain d))").unwrap();
        assert_eq!(find_domain_of(&problem), Some(domain));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
