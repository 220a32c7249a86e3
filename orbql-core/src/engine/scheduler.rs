//! Dependency wiring and execution-order resolution over the handler arena.

use std::collections::{HashMap, HashSet};

use oxrdf::Variable;

use crate::engine::handler::{Handler, HandlerOps};
use crate::error::OrbqlError;

/// Wires every handler's `dependencies` from the variable-to-producer index built over
/// the whole arena. Call once, after every handler has been constructed by the walker.
pub fn wire_dependencies(handlers: &mut [Handler]) -> Result<(), OrbqlError> {
    let mut producers: HashMap<Variable, HashSet<usize>> = HashMap::new();
    for (i, handler) in handlers.iter().enumerate() {
        for v in handler.output_vars() {
            producers.entry(v.clone()).or_default().insert(i);
        }
    }
    for handler in handlers.iter_mut() {
        let mut deps = HashSet::new();
        for v in handler.input_vars().clone() {
            let Some(producer_set) = producers.get(&v) else {
                return Err(OrbqlError::UnresolvedVariable(v));
            };
            deps.extend(producer_set.iter().copied());
        }
        handler.set_dependencies(deps);
    }
    Ok(())
}

/// Runs `handlers[target]`'s full dependency chain, depth-first, then `target` itself.
/// Detects cycles by checking whether `target` is already present on `path`.
fn get_independent_handler(
    handlers: &mut [Handler],
    target: usize,
    path: &mut Vec<usize>,
    run: &mut impl FnMut(&mut [Handler], usize) -> Result<(), OrbqlError>,
) -> Result<(), OrbqlError> {
    if handlers[target].executed() {
        return Ok(());
    }
    if path.contains(&target) {
        return Err(OrbqlError::DependencyCycle(target));
    }
    path.push(target);
    let deps: Vec<usize> = handlers[target].dependencies().iter().copied().collect();
    for dep in deps {
        get_independent_handler(handlers, dep, path, run)?;
    }
    path.pop();
    run(handlers, target)
}

/// Executes every handler in the arena, in dependency order.
pub fn execute_all(
    handlers: &mut [Handler],
    mut run: impl FnMut(&mut [Handler], usize) -> Result<(), OrbqlError>,
) -> Result<(), OrbqlError> {
    for i in 0..handlers.len() {
        let mut path = Vec::new();
        get_independent_handler(handlers, i, &mut path, &mut run)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::handler::{CallHandler, Handler};
    use oxrdf::NamedNode;

    #[test]
    fn unresolved_variable_is_an_error() {
        let mut handlers = vec![Handler::Call({
            let mut h = CallHandler::new(NamedNode::new("http://ex/p?x").unwrap());
            h.add_input(None, crate::engine::handler::Slot::Var(Variable::new_unchecked("missing")));
            h
        })];
        assert!(wire_dependencies(&mut handlers).is_err());
    }
}
