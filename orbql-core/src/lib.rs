//! orbql-core implements a SPARQL-compatible service layer that synthesizes RDF
//! triples on the fly by invoking registered procedures through predicates in a
//! reserved namespace, materializes the results into an in-memory [`oxrdf::Dataset`],
//! and evaluates the original query against that dataset.
//!
//! The crate does not implement a SPARQL parser or evaluator of its own: parsing is
//! delegated to [`spargebra`] and final query evaluation to [`spareval`]. What this
//! crate owns is the dataflow scheduler that sits between them: it walks the parsed
//! algebra, reduces triple patterns into context handlers, resolves the dependency
//! graph between them, and runs each handler in dependency order.
//!
//! ```
//! use orbql_core::registry::{Argument, Procedure, Registry, ProcResult};
//! use orbql_core::engine::QueryExecution;
//! use oxrdf::{Literal, NamedNode, Term};
//!
//! let mut registry = Registry::new();
//! let uri = NamedNode::new("http://example.com/double").unwrap();
//! let x = Argument::new("x");
//! let proc = Procedure::new(uri.clone(), move |inputs, _outputs, _q| {
//!     let Term::Literal(n) = inputs.get("x").unwrap() else { unreachable!() };
//!     let v: f64 = n.value().parse().unwrap();
//!     Ok(ProcResult::Scalar(Literal::from(v * 2.0).into()))
//! })
//! .with_accepts([x.clone()])
//! .with_requires([x])
//! .with_generates([Argument::new("result")]);
//! registry.register(proc).unwrap();
//!
//! let query = format!(
//!     "SELECT ?r WHERE {{ <{0}?x> <http://www.orbql.example/input> 21 . \
//!      <{0}?x> <http://www.orbql.example/output> ?r }}",
//!     uri.as_str()
//! );
//! let exec = QueryExecution::new(&registry, &query).unwrap();
//! let _results = exec.run().unwrap();
//! ```
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_qualifications
)]
#![warn(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::checked_conversions,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::filter_map_next,
    clippy::flat_map_option,
    clippy::from_iter_instead_of_collect,
    clippy::if_not_else,
    clippy::implicit_clone,
    clippy::inefficient_to_string,
    clippy::items_after_statements,
    clippy::manual_ok_or,
    clippy::map_unwrap_or,
    clippy::match_same_arms,
    clippy::match_wildcard_for_single_variants,
    clippy::needless_continue,
    clippy::needless_pass_by_value,
    clippy::redundant_closure_for_method_calls,
    clippy::redundant_else,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::unnecessary_wraps,
    clippy::unnested_or_patterns,
    clippy::used_underscore_binding,
    clippy::wrong_self_convention
)]

pub mod engine;
mod error;
pub mod namespace;
pub mod pau;
pub mod registry;

pub use error::OrbqlError;
