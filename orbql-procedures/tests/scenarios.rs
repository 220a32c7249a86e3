//! End-to-end scenarios exercising the full dataflow: parse, walk, schedule,
//! execute against the bundled math procedures, and evaluate the final query.

use orbql_core::registry::Registry;
use orbql_core::{engine::QueryExecution, OrbqlError};
use spareval::QueryResults;

const MATH: &str = "http://www.orbql.example/procedures/math/";
const INPUT: &str = "http://www.orbql.example/input";
const OUTPUT: &str = "http://www.orbql.example/output";
const AUTHOR: &str = "http://www.orbql.example/author";

fn math_registry() -> Registry {
    let mut registry = Registry::new();
    orbql_procedures::math::register(&mut registry).unwrap();
    registry
}

/// Pulls the lexical value out of a literal's `Display` form (`"1.5"^^<...>` or
/// plain `"1.5"`) without depending on which datatype IRI the literal carries.
fn numeric_value(term_text: &str) -> f64 {
    let text = match term_text.strip_prefix('"') {
        Some(rest) => rest.split('"').next().unwrap(),
        None => term_text,
    };
    text.parse().unwrap_or_else(|_| panic!("{text:?} is not numeric"))
}

fn solutions_as_f64(results: QueryResults, var: &str) -> Vec<f64> {
    let QueryResults::Solutions(solutions) = results else {
        panic!("expected a solutions result");
    };
    solutions
        .map(|s| {
            let s = s.unwrap();
            let term = s.get(var).unwrap_or_else(|| panic!("?{var} is unbound"));
            numeric_value(&term.to_string())
        })
        .collect()
}

/// S1 — a single call with constant inputs produces a single row.
#[test]
fn constant_input_procedure() {
    let registry = math_registry();
    let query = format!(
        "SELECT ?v WHERE {{ <{MATH}absolute?c1> <{INPUT}> \"-3.5\" . <{MATH}absolute?c1> <{OUTPUT}> ?v }}"
    );
    let execution = QueryExecution::new(&registry, &query).unwrap();
    let results = execution.run().unwrap();
    let values = solutions_as_f64(results, "v");
    assert_eq!(values, vec![3.5]);
}

/// S2 — a VALUES block drives repeated invocation of the same procedure.
#[test]
fn values_driven_invocation() {
    let registry = math_registry();
    let query = format!(
        "SELECT ?r WHERE {{ VALUES ?x {{ \"1\" \"4\" \"9\" }} \
         <{MATH}sqrt?c1> <{INPUT}> ?x . <{MATH}sqrt?c1> <{OUTPUT}> ?r }}"
    );
    let execution = QueryExecution::new(&registry, &query).unwrap();
    let results = execution.run().unwrap();
    let mut values = solutions_as_f64(results, "r");
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(values, vec![1.0, 2.0, 3.0]);
}

/// S3 — the scheduler must run the producer of a shared variable before its consumer.
#[test]
fn chained_procedures() {
    let registry = math_registry();
    let query = format!(
        "SELECT ?z WHERE {{ \
         <{MATH}add?c1> <{INPUT}?x> \"2\" . <{MATH}add?c1> <{INPUT}?y> \"2\" . <{MATH}add?c1> <{OUTPUT}?result> ?y . \
         <{MATH}sqrt?c2> <{INPUT}> ?y . <{MATH}sqrt?c2> <{OUTPUT}> ?z }}"
    );
    let execution = QueryExecution::new(&registry, &query).unwrap();
    let results = execution.run().unwrap();
    let values = solutions_as_f64(results, "z");
    assert_eq!(values, vec![2.0]);
}

/// S4 — a variable procedure subject dispatches to each distinct bound PAU.
#[test]
fn variable_subject_dispatch() {
    let registry = math_registry();
    let query = format!(
        "SELECT ?proc ?r WHERE {{ VALUES ?proc {{ <{MATH}sqrt> <{MATH}absolute> }} \
         ?proc <{INPUT}> \"-4\" . ?proc <{OUTPUT}> ?r }}"
    );
    let execution = QueryExecution::new(&registry, &query).unwrap();
    let results = execution.run().unwrap();
    let QueryResults::Solutions(solutions) = results else {
        panic!("expected a solutions result");
    };
    let rows: Vec<_> = solutions.map(|s| s.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    let absolute_row = rows
        .iter()
        .find(|r| r.get("proc").unwrap().to_string().contains("absolute"))
        .expect("absolute row present");
    let r = absolute_row.get("r").unwrap().to_string();
    assert!(r.contains('4'));
}

/// S5 — the orb-description graph lists the registered author for every procedure.
#[test]
fn orb_description() {
    let registry = math_registry();
    let query = format!(
        "SELECT ?p ?a WHERE {{ GRAPH <http://www.orbql.example/orb_description> {{ ?p <{AUTHOR}> ?a }} }}"
    );
    let execution = QueryExecution::new(&registry, &query).unwrap();
    let results = execution.run().unwrap();
    let QueryResults::Solutions(solutions) = results else {
        panic!("expected a solutions result");
    };
    let rows: Vec<_> = solutions.map(|s| s.unwrap()).collect();
    assert_eq!(rows.len(), 8); // one per bundled math procedure
    for row in &rows {
        assert_eq!(row.get("a").unwrap().to_string(), "\"orbql\"");
    }
}

/// S6 — a circular variable dependency between two calls is rejected before execution.
#[test]
fn cycle_detection() {
    let registry = math_registry();
    let query = format!(
        "SELECT ?a ?b WHERE {{ \
         <{MATH}add?c1> <{INPUT}> ?b . <{MATH}add?c1> <{OUTPUT}> ?a . \
         <{MATH}add?c2> <{INPUT}> ?a . <{MATH}add?c2> <{OUTPUT}> ?b }}"
    );
    let err = QueryExecution::new(&registry, &query).unwrap_err();
    assert!(matches!(err, OrbqlError::DependencyCycle(_)));
}
