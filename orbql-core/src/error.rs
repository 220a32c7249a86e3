use oxrdf::{NamedNode, Variable};
use thiserror::Error;

/// Every failure mode the service layer can surface.
///
/// Flat by design: at the HTTP boundary every variant maps onto a single status
/// code, so there is no benefit in nesting these into a nominal hierarchy.
#[derive(Error, Debug)]
pub enum OrbqlError {
    #[error("client is not permitted to query this service")]
    AccessDenied,
    #[error("malformed request: {0}")]
    RequestMalformed(String),
    #[error("no supported response format matches the Accept header")]
    ResponseUnacceptable,
    #[error("failed to parse query: {0}")]
    ParseError(String),
    #[error("no procedure is registered under <{0}>")]
    UnknownProcedure(NamedNode),
    #[error("predicate specifier {specifier:?} on <{base}> does not resolve to an argument")]
    BadSpecifier { base: NamedNode, specifier: String },
    #[error("variable {0} is consumed but never produced")]
    UnresolvedVariable(Variable),
    #[error("dependency cycle detected while scheduling handler {0}")]
    DependencyCycle(usize),
    #[error("procedure <{0}> returned a value that cannot be normalized into bindings")]
    InvalidReturn(NamedNode),
    #[error("registry is invalid: {0}")]
    RegistryInvalid(String),
    #[error("query evaluation failed: {0}")]
    Evaluation(#[from] spareval::QueryEvaluationError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
