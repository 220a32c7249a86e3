//! Ties the walker, scheduler, and final evaluator together for one query.

use oxrdf::Dataset;
use spareval::{QueryEvaluator, QueryResults};
use spargebra::Query;

use crate::engine::handler::{ExecCtx, Handler, HandlerOps};
use crate::engine::{scheduler, walker};
use crate::error::OrbqlError;
use crate::registry::{ProcedureQuery, Registry};

/// One SPARQL query's worth of synthesis state: its parsed query, handler arena, and
/// the conjunctive graph its handlers populate.
pub struct QueryExecution<'a> {
    registry: &'a Registry,
    query: Query,
    handlers: Vec<Handler>,
    dataset: Dataset,
    procedure_query: ProcedureQuery,
}

impl<'a> QueryExecution<'a> {
    pub fn new(registry: &'a Registry, query_text: &str) -> Result<Self, OrbqlError> {
        let query = Query::parse(query_text, None).map_err(|e| OrbqlError::ParseError(e.to_string()))?;
        let pattern = match &query {
            Query::Select { pattern, .. } | Query::Ask { pattern, .. } => pattern.clone(),
            Query::Construct { pattern, .. } => pattern.clone(),
            Query::Describe { pattern, .. } => pattern.clone(),
        };
        let mut dataset = Dataset::new();
        let mut handlers = walker::walk(&pattern, registry, &mut dataset)?;
        scheduler::wire_dependencies(&mut handlers)?;
        Ok(Self {
            registry,
            query,
            handlers,
            dataset,
            procedure_query: ProcedureQuery::new(),
        })
    }

    /// Executes every handler in dependency order, then evaluates the original query
    /// against the populated dataset.
    pub fn run(&mut self) -> Result<QueryResults<'_>, OrbqlError> {
        let registry = self.registry;
        let procedure_query = &self.procedure_query;
        let dataset = &mut self.dataset;
        scheduler::execute_all(&mut self.handlers, |handlers, idx| {
            // Bindings are cloned out of the arena rather than borrowed: `idx` and its
            // dependencies alias the same slice, and the scheduler's acyclicity
            // guarantee that keeps that safe isn't visible to the borrow checker.
            let dependency_bindings: Vec<Vec<_>> = handlers[idx]
                .dependencies()
                .iter()
                .map(|&d| handlers[d].bindings().to_vec())
                .collect();
            let mut ctx = ExecCtx {
                registry,
                dataset: &mut *dataset,
                procedure_query,
                dependency_bindings,
            };
            handlers[idx].execute(&mut ctx)
        })?;

        Ok(QueryEvaluator::new().execute(&self.dataset, &self.query)?)
    }
}
