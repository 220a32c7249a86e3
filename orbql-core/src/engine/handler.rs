//! Context handlers: the unit of scheduled execution.

use std::collections::{HashMap, HashSet};

use oxrdf::{BlankNode, GraphName, NamedNode, Quad, Term, Variable};
use spargebra::algebra::{Expression, GraphPattern};

use crate::engine::merge::merge_and_filter;
use crate::engine::BindingRow;
use crate::error::OrbqlError;
use crate::namespace;
use crate::pau;
use crate::registry::{ProcResult, Procedure, ProcedureInputs, ProcedureQuery, Registry};

/// A value bound either to a fixed term or to a query variable, as it appears in a
/// routed protocol triple's object position.
#[derive(Debug, Clone)]
pub enum Slot {
    Fixed(Term),
    Var(Variable),
}

impl Slot {
    fn variable(&self) -> Option<&Variable> {
        match self {
            Slot::Fixed(_) => None,
            Slot::Var(v) => Some(v),
        }
    }

    fn resolve(&self, row: &BindingRow) -> Option<Term> {
        match self {
            Slot::Fixed(t) => Some(t.clone()),
            Slot::Var(v) => row.get(v).cloned(),
        }
    }
}

/// A single `<pau> <input|output>?<spec> <slot>` or description triple, stripped of
/// everything but what the handlers need to re-emit it.
#[derive(Debug, Clone)]
pub struct RoutedTriple {
    pub specifier: Option<String>,
    pub slot: Slot,
}

/// Resources an executing handler needs beyond its own state.
///
/// `dependency_bindings` is an owned copy of each dependency's binding rows rather
/// than a borrow into the handler arena: the target handler being executed and its
/// dependencies both live in the same arena slice, and the scheduler's own
/// acyclicity guarantee (a handler is never its own dependency) is not something the
/// borrow checker can see.
pub struct ExecCtx<'a> {
    pub registry: &'a Registry,
    pub dataset: &'a mut oxrdf::Dataset,
    pub procedure_query: &'a ProcedureQuery,
    pub dependency_bindings: Vec<Vec<BindingRow>>,
}

impl ExecCtx<'_> {
    fn dependency_slices(&self) -> Vec<&[BindingRow]> {
        self.dependency_bindings.iter().map(Vec::as_slice).collect()
    }
}

pub trait HandlerOps {
    fn input_vars(&self) -> &HashSet<Variable>;
    fn output_vars(&self) -> &HashSet<Variable>;
    fn dependencies(&self) -> &HashSet<usize>;
    fn set_dependencies(&mut self, deps: HashSet<usize>);
    fn executed(&self) -> bool;
    fn bindings(&self) -> &[BindingRow];
    fn execute(&mut self, ctx: &mut ExecCtx<'_>) -> Result<(), OrbqlError>;

    fn bound_vars(&self) -> HashSet<Variable> {
        self.input_vars().union(self.output_vars()).cloned().collect()
    }
}

pub enum Handler {
    Call(CallHandler),
    VarSubCall(VarSubCallHandler),
    Orb(OrbHandler),
    Values(ValuesHandler),
    Bind(BindHandler),
}

impl HandlerOps for Handler {
    fn input_vars(&self) -> &HashSet<Variable> {
        match self {
            Handler::Call(h) => h.input_vars(),
            Handler::VarSubCall(h) => h.input_vars(),
            Handler::Orb(h) => h.input_vars(),
            Handler::Values(h) => h.input_vars(),
            Handler::Bind(h) => h.input_vars(),
        }
    }

    fn output_vars(&self) -> &HashSet<Variable> {
        match self {
            Handler::Call(h) => h.output_vars(),
            Handler::VarSubCall(h) => h.output_vars(),
            Handler::Orb(h) => h.output_vars(),
            Handler::Values(h) => h.output_vars(),
            Handler::Bind(h) => h.output_vars(),
        }
    }

    fn dependencies(&self) -> &HashSet<usize> {
        match self {
            Handler::Call(h) => h.dependencies(),
            Handler::VarSubCall(h) => h.dependencies(),
            Handler::Orb(h) => h.dependencies(),
            Handler::Values(h) => h.dependencies(),
            Handler::Bind(h) => h.dependencies(),
        }
    }

    fn set_dependencies(&mut self, deps: HashSet<usize>) {
        match self {
            Handler::Call(h) => h.set_dependencies(deps),
            Handler::VarSubCall(h) => h.set_dependencies(deps),
            Handler::Orb(h) => h.set_dependencies(deps),
            Handler::Values(h) => h.set_dependencies(deps),
            Handler::Bind(h) => h.set_dependencies(deps),
        }
    }

    fn executed(&self) -> bool {
        match self {
            Handler::Call(h) => h.executed(),
            Handler::VarSubCall(h) => h.executed(),
            Handler::Orb(h) => h.executed(),
            Handler::Values(h) => h.executed(),
            Handler::Bind(h) => h.executed(),
        }
    }

    fn bindings(&self) -> &[BindingRow] {
        match self {
            Handler::Call(h) => h.bindings(),
            Handler::VarSubCall(h) => h.bindings(),
            Handler::Orb(h) => h.bindings(),
            Handler::Values(h) => h.bindings(),
            Handler::Bind(h) => h.bindings(),
        }
    }

    fn execute(&mut self, ctx: &mut ExecCtx<'_>) -> Result<(), OrbqlError> {
        match self {
            Handler::Call(h) => h.execute(ctx),
            Handler::VarSubCall(h) => h.execute(ctx),
            Handler::Orb(h) => h.execute(ctx),
            Handler::Values(h) => h.execute(ctx),
            Handler::Bind(h) => h.execute(ctx),
        }
    }
}

/// Computes an argument-id-keyed table from a routed-triple list, resolving `None`
/// (empty or `_`) specifiers against the procedure's default for that role.
fn specifier_table<'a>(
    triples: &'a [RoutedTriple],
    default: Option<&str>,
    base: &NamedNode,
) -> Result<HashMap<String, &'a RoutedTriple>, OrbqlError> {
    let mut table = HashMap::new();
    for triple in triples {
        let id = match &triple.specifier {
            Some(spec) => spec.clone(),
            None => default
                .ok_or_else(|| OrbqlError::BadSpecifier {
                    base: base.clone(),
                    specifier: String::new(),
                })?
                .to_string(),
        };
        table.insert(id, triple);
    }
    Ok(table)
}

fn normalize_result(
    result: ProcResult,
    default_output: Option<&str>,
    base: &NamedNode,
) -> Result<Vec<BindingRow>, OrbqlError> {
    match result {
        ProcResult::Many(rows) => Ok(rows),
        ProcResult::One(row) => Ok(vec![row]),
        ProcResult::Scalar(term) => {
            let output = default_output
                .ok_or_else(|| OrbqlError::InvalidReturn(base.clone()))?;
            let mut row = BindingRow::new();
            row.insert(Variable::new_unchecked(output), term);
            Ok(vec![row])
        }
        ProcResult::Empty => Ok(vec![]),
    }
}

fn description_literal(attr: &str, value: Option<&str>) -> Term {
    match value {
        Some(v) => oxrdf::Literal::new_simple_literal(v).into(),
        None => oxrdf::Literal::new_simple_literal(format!("This procedure has no <{attr}> specified.")).into(),
    }
}

/// Looks up the registered value for one of the four description predicates directly
/// on the procedure, rather than on the triple's own stated object — the object
/// position of a description triple names the variable (or constraint) the caller
/// wants bound to that attribute, not the attribute's value itself.
fn procedure_attribute_value(procedure: &Procedure, predicate: &NamedNode) -> Term {
    let (attr, value) = match predicate.as_str() {
        p if p == namespace::AUTHOR.as_str() => ("author", procedure.author.as_deref()),
        p if p == namespace::DESCRIPTION.as_str() => ("description", procedure.description.as_deref()),
        p if p == namespace::PROVENANCE.as_str() => ("provenance", procedure.provenance.as_deref()),
        p if p == namespace::VERSION.as_str() => ("version", procedure.version.as_deref()),
        _ => ("attr", None),
    };
    description_literal(attr, value)
}

/// Inserts a synthesized quad into both the solution's own blank-node subgraph and the
/// default graph. `spareval` does not union named graphs into the default graph the
/// way the original's `ConjunctiveGraph` does, so an unqualified triple pattern in the
/// final query would otherwise never see these quads; mirrors
/// `walker::ensure_orb_materialized`'s dual-graph materialization.
fn emit(dataset: &mut oxrdf::Dataset, subject: &NamedNode, predicate: NamedNode, object: Term, graph_name: &GraphName) {
    dataset.insert(&Quad::new(subject.clone(), predicate.clone(), object.clone(), graph_name.clone()));
    dataset.insert(&Quad::new(subject.clone(), predicate, object, GraphName::DefaultGraph));
}

/// One invocation of one procedure at one fixed PAU.
pub struct CallHandler {
    pau: NamedNode,
    base: NamedNode,
    inputs: Vec<RoutedTriple>,
    outputs: Vec<RoutedTriple>,
    descriptions: Vec<(NamedNode, RoutedTriple)>,
    input_vars: HashSet<Variable>,
    output_vars: HashSet<Variable>,
    dependencies: HashSet<usize>,
    executed: bool,
    bindings: Vec<BindingRow>,
}

impl CallHandler {
    pub fn new(pau: NamedNode) -> Self {
        let base = pau::base_of(&pau);
        Self {
            pau,
            base,
            inputs: Vec::new(),
            outputs: Vec::new(),
            descriptions: Vec::new(),
            input_vars: HashSet::new(),
            output_vars: HashSet::new(),
            dependencies: HashSet::new(),
            executed: false,
            bindings: Vec::new(),
        }
    }

    pub fn base(&self) -> &NamedNode {
        &self.base
    }

    pub fn add_input(&mut self, specifier: Option<String>, slot: Slot) {
        if let Some(v) = slot.variable() {
            self.input_vars.insert(v.clone());
        }
        self.inputs.push(RoutedTriple { specifier, slot });
    }

    pub fn add_output(&mut self, specifier: Option<String>, slot: Slot) {
        if let Some(v) = slot.variable() {
            self.output_vars.insert(v.clone());
        }
        self.outputs.push(RoutedTriple { specifier, slot });
    }

    pub fn add_description(&mut self, predicate: NamedNode, slot: Slot) {
        if let Some(v) = slot.variable() {
            self.output_vars.insert(v.clone());
        }
        self.descriptions.push((predicate, RoutedTriple { specifier: None, slot }));
    }

    fn run(
        &mut self,
        ctx: &mut ExecCtx<'_>,
        pau: &NamedNode,
        row_filter: impl Fn(&BindingRow) -> bool,
    ) -> Result<(), OrbqlError> {
        let procedure = ctx
            .registry
            .get(&self.base)
            .ok_or_else(|| OrbqlError::UnknownProcedure(self.base.clone()))?
            .clone();
        let default_input = procedure.default_input.as_ref().map(|a| a.id_string.as_str());
        let default_output = procedure.default_output.as_ref().map(|a| a.id_string.as_str());

        let known_inputs: Vec<_> = self.inputs.iter().filter(|t| t.slot.variable().is_none()).collect();
        let var_inputs: Vec<_> = self.inputs.iter().filter(|t| t.slot.variable().is_some()).collect();
        let var_outputs = specifier_table(&self.outputs, default_output, &self.base)?;

        let var_triples: Vec<RoutedTriple> = var_inputs.iter().map(|t| (*t).clone()).collect();
        let var_rows: Vec<BindingRow> = merge_and_filter(&ctx.dependency_slices())
            .into_iter()
            .filter(|r| row_filter(r))
            .collect();

        let rows: Vec<BindingRow> = if var_triples.is_empty() {
            vec![BindingRow::new()]
        } else {
            var_rows
        };

        for row in &rows {
            let mut inputs = ProcedureInputs::default();
            for triple in &known_inputs {
                let id = triple
                    .specifier
                    .clone()
                    .or_else(|| default_input.map(String::from))
                    .ok_or_else(|| OrbqlError::BadSpecifier {
                        base: self.base.clone(),
                        specifier: String::new(),
                    })?;
                let value = triple.slot.resolve(row).expect("fixed slot always resolves");
                inputs.insert(id, value);
            }
            for triple in &var_inputs {
                let id = triple
                    .specifier
                    .clone()
                    .or_else(|| default_input.map(String::from))
                    .ok_or_else(|| OrbqlError::BadSpecifier {
                        base: self.base.clone(),
                        specifier: String::new(),
                    })?;
                if let Some(value) = triple.slot.resolve(row) {
                    inputs.insert(id, value);
                }
            }
            let output_ids: Vec<String> = var_outputs.keys().cloned().collect();
            let result = procedure.call(&inputs, &output_ids, ctx.procedure_query)?;
            let solutions = normalize_result(result, default_output, &self.base)?;

            for solution in &solutions {
                let graph_name = GraphName::BlankNode(BlankNode::default());
                for triple in &known_inputs {
                    emit(
                        ctx.dataset,
                        pau,
                        NamedNode::new_unchecked(format!(
                            "{}input{}",
                            namespace::BASE,
                            triple
                                .specifier
                                .as_ref()
                                .map(|s| format!("?{s}"))
                                .unwrap_or_default()
                        )),
                        triple.slot.resolve(row).expect("fixed"),
                        &graph_name,
                    );
                }
                for triple in &var_inputs {
                    if let Some(value) = triple.slot.resolve(row) {
                        emit(
                            ctx.dataset,
                            pau,
                            NamedNode::new_unchecked(format!(
                                "{}input{}",
                                namespace::BASE,
                                triple
                                    .specifier
                                    .as_ref()
                                    .map(|s| format!("?{s}"))
                                    .unwrap_or_default()
                            )),
                            value,
                            &graph_name,
                        );
                    }
                }
                for (id, triple) in &var_outputs {
                    if let Some(value) = solution
                        .get(&Variable::new_unchecked(id.as_str()))
                        .cloned()
                        .or_else(|| triple.slot.resolve(row))
                    {
                        emit(
                            ctx.dataset,
                            pau,
                            NamedNode::new_unchecked(format!("{}output?{id}", namespace::BASE)),
                            value,
                            &graph_name,
                        );
                    }
                }
                let mut description_values: HashMap<Variable, Term> = HashMap::new();
                for (predicate, triple) in &self.descriptions {
                    let value = procedure_attribute_value(&procedure, predicate);
                    emit(ctx.dataset, pau, predicate.clone(), value.clone(), &graph_name);
                    if let Some(v) = triple.slot.variable() {
                        description_values.insert(v.clone(), value);
                    }
                }

                let mut binding = BindingRow::new();
                for v in &self.input_vars {
                    if let Some(value) = row.get(v) {
                        binding.insert(v.clone(), value.clone());
                    }
                }
                for v in &self.output_vars {
                    if let Some(value) = solution.get(v).cloned().or_else(|| description_values.get(v).cloned()) {
                        binding.insert(v.clone(), value);
                    }
                }
                self.bindings.push(binding);
            }

            if solutions.is_empty() && self.inputs.is_empty() && self.outputs.is_empty() {
                let graph_name = GraphName::BlankNode(BlankNode::default());
                let mut binding = BindingRow::new();
                for (predicate, triple) in &self.descriptions {
                    let value = procedure_attribute_value(&procedure, predicate);
                    emit(ctx.dataset, pau, predicate.clone(), value.clone(), &graph_name);
                    if let Some(v) = triple.slot.variable() {
                        binding.insert(v.clone(), value);
                    }
                }
                self.bindings.push(binding);
            }
        }
        Ok(())
    }
}

impl HandlerOps for CallHandler {
    fn input_vars(&self) -> &HashSet<Variable> {
        &self.input_vars
    }

    fn output_vars(&self) -> &HashSet<Variable> {
        &self.output_vars
    }

    fn dependencies(&self) -> &HashSet<usize> {
        &self.dependencies
    }

    fn set_dependencies(&mut self, deps: HashSet<usize>) {
        self.dependencies = deps;
    }

    fn executed(&self) -> bool {
        self.executed
    }

    fn bindings(&self) -> &[BindingRow] {
        &self.bindings
    }

    fn execute(&mut self, ctx: &mut ExecCtx<'_>) -> Result<(), OrbqlError> {
        let pau = self.pau.clone();
        self.run(ctx, &pau, |_| true)?;
        self.executed = true;
        Ok(())
    }
}

/// One handler covering every procedure invocation whose PAU is carried by a variable.
pub struct VarSubCallHandler {
    subject: Variable,
    inner: CallHandler,
}

impl VarSubCallHandler {
    pub fn new(subject: Variable) -> Self {
        let mut inner = CallHandler::new(NamedNode::new_unchecked(namespace::ORB.as_str()));
        inner.input_vars.insert(subject.clone());
        Self { subject, inner }
    }

    pub fn add_input(&mut self, specifier: Option<String>, slot: Slot) {
        self.inner.add_input(specifier, slot);
    }

    pub fn add_output(&mut self, specifier: Option<String>, slot: Slot) {
        self.inner.add_output(specifier, slot);
    }

    pub fn add_description(&mut self, predicate: NamedNode, slot: Slot) {
        self.inner.add_description(predicate, slot);
    }
}

impl HandlerOps for VarSubCallHandler {
    fn input_vars(&self) -> &HashSet<Variable> {
        &self.inner.input_vars
    }

    fn output_vars(&self) -> &HashSet<Variable> {
        &self.inner.output_vars
    }

    fn dependencies(&self) -> &HashSet<usize> {
        &self.inner.dependencies
    }

    fn set_dependencies(&mut self, deps: HashSet<usize>) {
        self.inner.dependencies = deps;
    }

    fn executed(&self) -> bool {
        self.inner.executed
    }

    fn bindings(&self) -> &[BindingRow] {
        &self.inner.bindings
    }

    fn execute(&mut self, ctx: &mut ExecCtx<'_>) -> Result<(), OrbqlError> {
        let rows = merge_and_filter(&ctx.dependency_slices());
        let mut paus: Vec<Term> = rows
            .iter()
            .filter_map(|r| r.get(&self.subject).cloned())
            .collect();
        paus.sort_by_key(|t| t.to_string());
        paus.dedup();

        for pau_term in paus {
            let Term::NamedNode(pau) = &pau_term else {
                continue;
            };
            self.inner.base = pau::base_of(pau);
            let subject = self.subject.clone();
            let pau_term = pau_term.clone();
            self.inner.run(ctx, pau, move |row| {
                row.get(&subject).map(|v| *v == pau_term).unwrap_or(false)
            })?;
        }
        self.inner.executed = true;
        Ok(())
    }
}

/// A `VALUES` block: materialized inline, never deferred.
pub struct ValuesHandler {
    output_vars: HashSet<Variable>,
    bindings: Vec<BindingRow>,
    empty: HashSet<usize>,
}

impl ValuesHandler {
    pub fn new(variables: &[Variable], rows: Vec<BindingRow>) -> Self {
        Self {
            output_vars: variables.iter().cloned().collect(),
            bindings: rows,
            empty: HashSet::new(),
        }
    }
}

impl HandlerOps for ValuesHandler {
    fn input_vars(&self) -> &HashSet<Variable> {
        static EMPTY: std::sync::OnceLock<HashSet<Variable>> = std::sync::OnceLock::new();
        EMPTY.get_or_init(HashSet::new)
    }

    fn output_vars(&self) -> &HashSet<Variable> {
        &self.output_vars
    }

    fn dependencies(&self) -> &HashSet<usize> {
        &self.empty
    }

    fn set_dependencies(&mut self, _deps: HashSet<usize>) {}

    fn executed(&self) -> bool {
        true
    }

    fn bindings(&self) -> &[BindingRow] {
        &self.bindings
    }

    fn execute(&mut self, _ctx: &mut ExecCtx<'_>) -> Result<(), OrbqlError> {
        Ok(())
    }
}

/// A `GRAPH <orb_description> { ... }` block.
pub struct OrbHandler {
    output_vars: HashSet<Variable>,
    bindings: Vec<BindingRow>,
    empty: HashSet<usize>,
}

impl OrbHandler {
    pub fn new(output_vars: HashSet<Variable>, bindings: Vec<BindingRow>) -> Self {
        Self {
            output_vars,
            bindings,
            empty: HashSet::new(),
        }
    }
}

impl HandlerOps for OrbHandler {
    fn input_vars(&self) -> &HashSet<Variable> {
        static EMPTY: std::sync::OnceLock<HashSet<Variable>> = std::sync::OnceLock::new();
        EMPTY.get_or_init(HashSet::new)
    }

    fn output_vars(&self) -> &HashSet<Variable> {
        &self.output_vars
    }

    fn dependencies(&self) -> &HashSet<usize> {
        &self.empty
    }

    fn set_dependencies(&mut self, _deps: HashSet<usize>) {}

    fn executed(&self) -> bool {
        true
    }

    fn bindings(&self) -> &[BindingRow] {
        &self.bindings
    }

    fn execute(&mut self, _ctx: &mut ExecCtx<'_>) -> Result<(), OrbqlError> {
        Ok(())
    }
}

/// A `BIND(expr AS ?v)` node, deferred until its free variables are all bound.
pub struct BindHandler {
    variable: Variable,
    expression: Expression,
    input_vars: HashSet<Variable>,
    output_vars: HashSet<Variable>,
    dependencies: HashSet<usize>,
    executed: bool,
    bindings: Vec<BindingRow>,
}

impl BindHandler {
    pub fn new(variable: Variable, expression: Expression) -> Self {
        let mut input_vars = HashSet::new();
        collect_expression_vars(&expression, &mut input_vars);
        let immediate = input_vars.is_empty();
        let mut handler = Self {
            variable: variable.clone(),
            expression,
            input_vars,
            output_vars: [variable].into_iter().collect(),
            dependencies: HashSet::new(),
            executed: false,
            bindings: Vec::new(),
        };
        if immediate {
            // No free variables: evaluate against a single empty row right away.
            let row = BindingRow::new();
            if let Ok(value) = eval_expression(&handler.expression, &row) {
                let mut out = BindingRow::new();
                out.insert(handler.variable.clone(), value);
                handler.bindings.push(out);
            }
            handler.executed = true;
        }
        handler
    }
}

impl HandlerOps for BindHandler {
    fn input_vars(&self) -> &HashSet<Variable> {
        &self.input_vars
    }

    fn output_vars(&self) -> &HashSet<Variable> {
        &self.output_vars
    }

    fn dependencies(&self) -> &HashSet<usize> {
        &self.dependencies
    }

    fn set_dependencies(&mut self, deps: HashSet<usize>) {
        self.dependencies = deps;
    }

    fn executed(&self) -> bool {
        self.executed
    }

    fn bindings(&self) -> &[BindingRow] {
        &self.bindings
    }

    fn execute(&mut self, ctx: &mut ExecCtx<'_>) -> Result<(), OrbqlError> {
        if self.executed {
            return Ok(());
        }
        let rows = merge_and_filter(&ctx.dependency_slices());
        for row in rows {
            let value = eval_expression(&self.expression, &row)?;
            let mut out = row;
            out.insert(self.variable.clone(), value);
            self.bindings.push(out);
        }
        self.executed = true;
        Ok(())
    }
}

fn collect_expression_vars(expr: &Expression, out: &mut HashSet<Variable>) {
    use Expression::*;
    match expr {
        Variable(v) => {
            out.insert(v.clone());
        }
        NamedNode(_) | Literal(_) => {}
        Or(l, r) | And(l, r) | Equal(l, r) | SameTerm(l, r) | Greater(l, r) | GreaterOrEqual(l, r)
        | Less(l, r) | LessOrEqual(l, r) | Add(l, r) | Subtract(l, r) | Multiply(l, r) | Divide(l, r) => {
            collect_expression_vars(l, out);
            collect_expression_vars(r, out);
        }
        UnaryPlus(e) | UnaryMinus(e) | Not(e) => collect_expression_vars(e, out),
        FunctionCall(_, args) => {
            for a in args {
                collect_expression_vars(a, out);
            }
        }
        If(a, b, c) => {
            collect_expression_vars(a, out);
            collect_expression_vars(b, out);
            collect_expression_vars(c, out);
        }
        Coalesce(args) => {
            for a in args {
                collect_expression_vars(a, out);
            }
        }
        _ => {}
    }
}

/// Evaluates a scalar expression against one binding row by delegating to the same
/// SPARQL evaluator used for the final query, rather than reimplementing SPARQL's
/// function library here.
fn eval_expression(expression: &Expression, row: &BindingRow) -> Result<Term, OrbqlError> {
    let variables: Vec<Variable> = row.keys().cloned().collect();
    let select_vars: String = variables
        .iter()
        .map(|v| format!("?{v} "))
        .collect::<String>();
    let values_clause = if variables.is_empty() {
        String::new()
    } else {
        let header = variables
            .iter()
            .map(|v| format!("?{v}"))
            .collect::<Vec<_>>()
            .join(" ");
        let values = variables
            .iter()
            .map(|v| {
                row.get(v)
                    .map(term_to_sparql)
                    .unwrap_or_else(|| "UNDEF".to_string())
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!("VALUES ({header}) {{ ({values}) }}")
    };
    let text = format!(
        "SELECT ({} AS ?__bind_value) WHERE {{ {} }}",
        expression_to_sparql(expression),
        values_clause
    );
    let _ = select_vars;
    let query = spargebra::Query::parse(&text, None)
        .map_err(|e| OrbqlError::ParseError(e.to_string()))?;
    let dataset = oxrdf::Dataset::new();
    match spareval::QueryEvaluator::new().execute(&dataset, &query)? {
        spareval::QueryResults::Solutions(mut solutions) => {
            let solution = solutions
                .next()
                .ok_or_else(|| OrbqlError::ParseError("BIND expression produced no solution".into()))??;
            solution
                .get("__bind_value")
                .cloned()
                .ok_or_else(|| OrbqlError::ParseError("BIND expression is unbound".into()))
        }
        _ => Err(OrbqlError::ParseError("BIND expression did not select".into())),
    }
}

fn term_to_sparql(term: &Term) -> String {
    match term {
        Term::NamedNode(n) => format!("<{}>", n.as_str()),
        Term::Literal(l) => l.to_string(),
        Term::BlankNode(b) => format!("_:{}", b.as_str()),
        Term::Triple(_) => "_:unsupported".to_string(),
    }
}

/// Renders a `spargebra` expression back to SPARQL syntax so it can be delegated to
/// the evaluator as a one-shot `SELECT`. `spargebra::algebra::Expression` implements
/// `Display` producing exactly this syntax.
fn expression_to_sparql(expression: &Expression) -> String {
    expression.to_string()
}
