//! A small library of scalar math procedures, one registered IRI per function.
//!
//! Each procedure accepts one or two named scalar arguments and generates a single
//! `result`. Mirrors the shape of a `ValueProc` wrapping a numeric function: the
//! callable receives already-resolved [`orbql_core::registry::ProcedureInputs`] and
//! returns a [`ProcResult::Scalar`].

use orbql_core::registry::{Argument, ProcResult, Procedure, Registry};
use orbql_core::OrbqlError;
use oxrdf::{Literal, NamedNode, Term};

const BASE: &str = "http://www.orbql.example/procedures/math/";

fn as_f64(term: &Term) -> Result<f64, OrbqlError> {
    let Term::Literal(lit) = term else {
        return Err(OrbqlError::RequestMalformed("expected a numeric literal".to_string()));
    };
    lit.value()
        .parse()
        .map_err(|_| OrbqlError::RequestMalformed(format!("{} is not a number", lit.value())))
}

fn unary(name: &str, f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Procedure {
    let x = Argument::new("x");
    let result = Argument::new("result");
    Procedure::new(NamedNode::new_unchecked(format!("{BASE}{name}")), move |inputs, _outputs, _q| {
        let x = as_f64(inputs.get("x").ok_or_else(|| OrbqlError::RequestMalformed("missing x".to_string()))?)?;
        Ok(ProcResult::Scalar(Literal::from(f(x)).into()))
    })
    .with_accepts([x.clone()])
    .with_requires([x])
    .with_generates([result])
    .with_author("orbql")
    .with_description(format!("computes {name}(x)"))
}

fn binary(name: &str, f: impl Fn(f64, f64) -> f64 + Send + Sync + 'static) -> Procedure {
    let x = Argument::new("x");
    let y = Argument::new("y");
    let result = Argument::new("result");
    Procedure::new(NamedNode::new_unchecked(format!("{BASE}{name}")), move |inputs, _outputs, _q| {
        let x = as_f64(inputs.get("x").ok_or_else(|| OrbqlError::RequestMalformed("missing x".to_string()))?)?;
        let y = as_f64(inputs.get("y").ok_or_else(|| OrbqlError::RequestMalformed("missing y".to_string()))?)?;
        Ok(ProcResult::Scalar(Literal::from(f(x, y)).into()))
    })
    .with_accepts([x.clone(), y.clone()])
    .with_requires([x, y])
    .with_generates([result])
    .with_author("orbql")
    .with_description(format!("computes {name}(x, y)"))
}

/// Registers the bundled math procedures under `http://www.orbql.example/procedures/math/`.
pub fn register(registry: &mut Registry) -> Result<(), OrbqlError> {
    registry.register(unary("absolute", f64::abs))?;
    registry.register(unary("sqrt", f64::sqrt))?;
    registry.register(unary("arccosine", f64::acos))?;
    registry.register(unary("arcsine", f64::asin))?;
    registry.register(unary("natural_log", f64::ln))?;
    registry.register(binary("add", |a, b| a + b))?;
    registry.register(binary("multiply", |a, b| a * b))?;
    registry.register(binary("power", f64::powf))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_without_conflicts() {
        let mut registry = Registry::new();
        register(&mut registry).unwrap();
        assert!(registry
            .get(&NamedNode::new(format!("{BASE}sqrt")).unwrap())
            .is_some());
    }

    #[test]
    fn sqrt_computes_default_input_and_output() {
        let mut registry = Registry::new();
        register(&mut registry).unwrap();
        let procedure = registry.get(&NamedNode::new(format!("{BASE}sqrt")).unwrap()).unwrap();
        let mut inputs = orbql_core::registry::ProcedureInputs::default();
        inputs.insert("x", Literal::from(9.0).into());
        let query = orbql_core::registry::ProcedureQuery::new();
        match procedure.call(&inputs, &["result".to_string()], &query).unwrap() {
            ProcResult::Scalar(Term::Literal(l)) => assert_eq!(l.value(), "3"),
            _ => panic!("expected a scalar result"),
        }
    }
}
