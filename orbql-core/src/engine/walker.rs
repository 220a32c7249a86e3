//! Reduces a parsed SPARQL algebra tree into the flat handler arena the scheduler runs.

use std::collections::{HashMap, HashSet};

use oxrdf::{GraphName, NamedNode, Quad, Term, Variable};
use spargebra::algebra::GraphPattern;
use spargebra::term::{NamedNodePattern, TermPattern};

use crate::engine::handler::{BindHandler, CallHandler, Handler, OrbHandler, Slot, ValuesHandler};
use crate::engine::BindingRow;
use crate::error::OrbqlError;
use crate::namespace;
use crate::pau;
use crate::registry::Registry;

struct WalkState {
    handlers: Vec<Handler>,
    call_index: HashMap<NamedNode, usize>,
    varsub_index: HashMap<Variable, usize>,
    orb_materialized: bool,
}

/// Walks `pattern`, producing the handler arena. `registry` resolves reserved
/// predicates to procedures; `dataset` receives the service self-description the
/// first time it is needed (either through a bare `orb` subject or an
/// `orb_description` graph block).
pub fn walk(
    pattern: &GraphPattern,
    registry: &Registry,
    dataset: &mut oxrdf::Dataset,
) -> Result<Vec<Handler>, OrbqlError> {
    let mut state = WalkState {
        handlers: Vec::new(),
        call_index: HashMap::new(),
        varsub_index: HashMap::new(),
        orb_materialized: false,
    };
    walk_into(pattern, registry, dataset, &mut state)?;
    Ok(state.handlers)
}

/// Materializes the service self-description once, under both the default graph (so a
/// bare `<orb> <predicate> ?x` triple pattern resolves it directly) and the reserved
/// `orb_description` named graph (so `GRAPH <orb_description> { ... }` resolves it
/// too) — the two access patterns the protocol supports for the same data.
fn ensure_orb_materialized(registry: &Registry, dataset: &mut oxrdf::Dataset, state: &mut WalkState) {
    if state.orb_materialized {
        return;
    }
    let orb_description_graph = GraphName::NamedNode(NamedNode::new_unchecked(namespace::ORB_DESCRIPTION.as_str()));
    for triple in registry.describe_all() {
        dataset.insert(&Quad::new(
            triple.subject.clone(),
            triple.predicate.clone(),
            triple.object.clone(),
            GraphName::DefaultGraph,
        ));
        dataset.insert(&Quad::new(
            triple.subject,
            triple.predicate,
            triple.object,
            orb_description_graph.clone(),
        ));
    }
    state.orb_materialized = true;
}

fn term_pattern_to_slot(term: &TermPattern) -> Option<Slot> {
    match term {
        TermPattern::Variable(v) => Some(Slot::Var(v.clone())),
        TermPattern::NamedNode(n) => Some(Slot::Fixed(Term::NamedNode(n.clone()))),
        TermPattern::Literal(l) => Some(Slot::Fixed(Term::Literal(l.clone()))),
        TermPattern::BlankNode(b) => Some(Slot::Fixed(Term::BlankNode(b.clone()))),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

fn call_handler_mut<'a>(state: &'a mut WalkState, pau: &NamedNode) -> &'a mut CallHandler {
    let idx = *state.call_index.entry(pau.clone()).or_insert_with(|| {
        state.handlers.push(Handler::Call(CallHandler::new(pau.clone())));
        state.handlers.len() - 1
    });
    match &mut state.handlers[idx] {
        Handler::Call(h) => h,
        _ => unreachable!(),
    }
}

fn varsub_handler_mut<'a>(state: &'a mut WalkState, subject: &Variable) -> &'a mut crate::engine::handler::VarSubCallHandler {
    let idx = *state.varsub_index.entry(subject.clone()).or_insert_with(|| {
        state
            .handlers
            .push(Handler::VarSubCall(crate::engine::handler::VarSubCallHandler::new(subject.clone())));
        state.handlers.len() - 1
    });
    match &mut state.handlers[idx] {
        Handler::VarSubCall(h) => h,
        _ => unreachable!(),
    }
}

/// Routes one triple pattern of a BGP to the handler it belongs to, per the predicate
/// routing rules: subject kind selects Call vs. VarSubCall, predicate base selects
/// input/output/description.
fn route_triple(
    triple: &spargebra::term::TriplePattern,
    registry: &Registry,
    dataset: &mut oxrdf::Dataset,
    state: &mut WalkState,
) -> Result<(), OrbqlError> {
    let NamedNodePattern::NamedNode(predicate) = &triple.predicate else {
        return Err(OrbqlError::ParseError(
            "protocol predicates must not be variables".to_string(),
        ));
    };
    let (pred_base, specifier) = pau::split_specifier(predicate.as_str());
    let specifier = specifier.map(str::to_string);

    if let TermPattern::NamedNode(subject) = &triple.subject {
        if subject.as_str() == namespace::ORB.as_str() {
            ensure_orb_materialized(registry, dataset, state);
            return Ok(());
        }
    }

    let Some(slot) = term_pattern_to_slot(&triple.object) else {
        return Err(OrbqlError::ParseError("unsupported object term".to_string()));
    };

    match pred_base {
        b if b == namespace::INPUT.as_str() => match &triple.subject {
            TermPattern::NamedNode(pau) => {
                let base = pau::base_of(pau);
                if registry.get(&base).is_none() {
                    return Err(OrbqlError::UnknownProcedure(base));
                }
                call_handler_mut(state, pau).add_input(specifier, slot);
            }
            TermPattern::Variable(v) => varsub_handler_mut(state, v).add_input(specifier, slot),
            _ => return Err(OrbqlError::ParseError("unsupported subject term".to_string())),
        },
        b if b == namespace::OUTPUT.as_str() => match &triple.subject {
            TermPattern::NamedNode(pau) => {
                let base = pau::base_of(pau);
                if registry.get(&base).is_none() {
                    return Err(OrbqlError::UnknownProcedure(base));
                }
                call_handler_mut(state, pau).add_output(specifier, slot);
            }
            TermPattern::Variable(v) => varsub_handler_mut(state, v).add_output(specifier, slot),
            _ => return Err(OrbqlError::ParseError("unsupported subject term".to_string())),
        },
        b if [
            namespace::AUTHOR.as_str(),
            namespace::DESCRIPTION.as_str(),
            namespace::PROVENANCE.as_str(),
            namespace::VERSION.as_str(),
        ]
        .contains(&b) =>
        {
            let predicate = NamedNode::new_unchecked(b);
            match &triple.subject {
                TermPattern::NamedNode(pau) => {
                    let base = pau::base_of(pau);
                    if registry.get(&base).is_none() {
                        return Err(OrbqlError::UnknownProcedure(base));
                    }
                    call_handler_mut(state, pau).add_description(predicate, slot);
                }
                TermPattern::Variable(v) => varsub_handler_mut(state, v).add_description(predicate, slot),
                _ => return Err(OrbqlError::ParseError("unsupported subject term".to_string())),
            }
        }
        _ => {
            // Predicate outside the reserved namespace: not synthesized by this layer.
        }
    }
    Ok(())
}

fn ground_term_to_term(term: &spargebra::term::GroundTerm) -> Term {
    match term {
        spargebra::term::GroundTerm::NamedNode(n) => Term::NamedNode(n.clone()),
        spargebra::term::GroundTerm::Literal(l) => Term::Literal(l.clone()),
        #[allow(unreachable_patterns)]
        _ => Term::Literal(oxrdf::Literal::new_simple_literal("")),
    }
}

fn pattern_variables(pattern: &GraphPattern, out: &mut HashSet<Variable>) {
    match pattern {
        GraphPattern::Bgp { patterns } => {
            for t in patterns {
                if let TermPattern::Variable(v) = &t.subject {
                    out.insert(v.clone());
                }
                if let NamedNodePattern::Variable(v) = &t.predicate {
                    out.insert(v.clone());
                }
                if let TermPattern::Variable(v) = &t.object {
                    out.insert(v.clone());
                }
            }
        }
        GraphPattern::Join { left, right } | GraphPattern::Union { left, right } | GraphPattern::Minus { left, right } => {
            pattern_variables(left, out);
            pattern_variables(right, out);
        }
        GraphPattern::LeftJoin { left, right, .. } => {
            pattern_variables(left, out);
            pattern_variables(right, out);
        }
        GraphPattern::Filter { inner, .. }
        | GraphPattern::Project { inner, .. }
        | GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. }
        | GraphPattern::OrderBy { inner, .. }
        | GraphPattern::Group { inner, .. }
        | GraphPattern::Graph { inner, .. } => pattern_variables(inner, out),
        GraphPattern::Extend { inner, variable, .. } => {
            pattern_variables(inner, out);
            out.insert(variable.clone());
        }
        GraphPattern::Values { variables, .. } => out.extend(variables.iter().cloned()),
        _ => {}
    }
}

fn walk_into(
    pattern: &GraphPattern,
    registry: &Registry,
    dataset: &mut oxrdf::Dataset,
    state: &mut WalkState,
) -> Result<(), OrbqlError> {
    match pattern {
        GraphPattern::Bgp { patterns } => {
            for triple in patterns {
                route_triple(triple, registry, dataset, state)?;
            }
            Ok(())
        }
        GraphPattern::Values { variables, bindings } => {
            let rows = bindings
                .iter()
                .map(|row| {
                    variables
                        .iter()
                        .zip(row.iter())
                        .filter_map(|(v, value)| value.as_ref().map(|t| (v.clone(), ground_term_to_term(t))))
                        .collect::<BindingRow>()
                })
                .collect();
            state.handlers.push(Handler::Values(ValuesHandler::new(variables, rows)));
            Ok(())
        }
        GraphPattern::Extend { inner, variable, expression } => {
            walk_into(inner, registry, dataset, state)?;
            state
                .handlers
                .push(Handler::Bind(BindHandler::new(variable.clone(), expression.clone())));
            Ok(())
        }
        GraphPattern::Graph { name, inner } => {
            if let NamedNodePattern::NamedNode(n) = name {
                if n.as_str() == namespace::ORB_DESCRIPTION.as_str() {
                    let mut nested_vars = HashSet::new();
                    pattern_variables(inner, &mut nested_vars);
                    if matches!(**inner, GraphPattern::Values { .. } | GraphPattern::Extend { .. }) {
                        return Err(OrbqlError::ParseError(
                            "VALUES/BIND are not supported nested inside an orb description block".to_string(),
                        ));
                    }
                    ensure_orb_materialized(registry, dataset, state);
                    let query = spargebra::Query::parse(
                        &format!(
                            "SELECT DISTINCT {} WHERE {{ {} }}",
                            nested_vars.iter().map(|v| format!("?{v} ")).collect::<String>(),
                            describe_inner_as_sparql(inner)
                        ),
                        None,
                    )
                    .map_err(|e| OrbqlError::ParseError(e.to_string()))?;
                    let dataset_snapshot = dataset.clone();
                    let rows = match spareval::QueryEvaluator::new().execute(&dataset_snapshot, &query)? {
                        spareval::QueryResults::Solutions(solutions) => solutions
                            .map(|s| {
                                let s = s?;
                                Ok::<_, OrbqlError>(
                                    nested_vars
                                        .iter()
                                        .filter_map(|v| s.get(v.as_str()).map(|t| (v.clone(), t.clone())))
                                        .collect::<BindingRow>(),
                                )
                            })
                            .collect::<Result<Vec<_>, _>>()?,
                        _ => vec![],
                    };
                    state.handlers.push(Handler::Orb(OrbHandler::new(nested_vars, rows)));
                    return Ok(());
                }
            }
            walk_into(inner, registry, dataset, state)
        }
        GraphPattern::Join { left, right } | GraphPattern::Union { left, right } | GraphPattern::Minus { left, right } => {
            walk_into(left, registry, dataset, state)?;
            walk_into(right, registry, dataset, state)
        }
        GraphPattern::LeftJoin { left, right, .. } => {
            walk_into(left, registry, dataset, state)?;
            walk_into(right, registry, dataset, state)
        }
        GraphPattern::Filter { inner, .. }
        | GraphPattern::Project { inner, .. }
        | GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. }
        | GraphPattern::OrderBy { inner, .. }
        | GraphPattern::Group { inner, .. } => walk_into(inner, registry, dataset, state),
        GraphPattern::Path { .. } | GraphPattern::Service { .. } => Ok(()),
    }
}

/// Reuses the algebra's own `Display` implementation to re-embed a sub-pattern inside
/// a one-shot query text sent to the evaluator, rather than building a second
/// text-to-algebra bridge.
fn describe_inner_as_sparql(inner: &GraphPattern) -> String {
    inner.to_string()
}
