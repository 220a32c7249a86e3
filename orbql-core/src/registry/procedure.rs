use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use oxrdf::{NamedNode, Term, Triple};

use crate::engine::BindingRow;
use crate::error::OrbqlError;
use crate::namespace;
use crate::registry::Argument;

/// Resolved argument-id to value map handed to a procedure at call time.
#[derive(Debug, Clone, Default)]
pub struct ProcedureInputs(pub(crate) BTreeMap<String, Term>);

impl ProcedureInputs {
    pub fn get(&self, id: &str) -> Option<&Term> {
        self.0.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, value: Term) {
        self.0.insert(id.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Per-query context handed to a procedure, exposing resources scoped to the
/// lifetime of the enclosing HTTP request rather than to a single call.
pub struct ProcedureQuery {
    temp_dirs: std::sync::Mutex<Vec<tempfile::TempDir>>,
}

impl ProcedureQuery {
    pub fn new() -> Self {
        Self {
            temp_dirs: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Allocates a fresh temporary directory scoped to this query; removed recursively
    /// when the query execution finishes, success or failure.
    pub fn get_temp_dir(&self) -> Result<std::path::PathBuf, OrbqlError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().to_path_buf();
        self.temp_dirs.lock().unwrap_or_else(|e| e.into_inner()).push(dir);
        Ok(path)
    }
}

impl Default for ProcedureQuery {
    fn default() -> Self {
        Self::new()
    }
}

/// The shape a procedure may return. Rust's static typing lets this replace the
/// original's duck-typed return sniffing with an exhaustive match at the call site.
pub enum ProcResult {
    /// Several solution rows, one subgraph per row.
    Many(Vec<BindingRow>),
    /// A single solution row.
    One(BindingRow),
    /// A single scalar bound to the procedure's default output.
    Scalar(Term),
    /// No answer for this invocation; not an error.
    Empty,
}

type Callable = dyn Fn(&ProcedureInputs, &[String], &ProcedureQuery) -> Result<ProcResult, OrbqlError>
    + Send
    + Sync;

/// A registered computation, addressable through its base IRI.
#[derive(Clone)]
pub struct Procedure {
    pub uri: NamedNode,
    pub(crate) callable: Arc<Callable>,
    pub accepts: BTreeSet<Argument>,
    pub requires: BTreeSet<Argument>,
    pub generates: BTreeSet<Argument>,
    pub default_input: Option<Argument>,
    pub default_output: Option<Argument>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub provenance: Option<String>,
    pub version: Option<String>,
}

impl Procedure {
    pub fn new(
        uri: NamedNode,
        callable: impl Fn(&ProcedureInputs, &[String], &ProcedureQuery) -> Result<ProcResult, OrbqlError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            uri,
            callable: Arc::new(callable),
            accepts: BTreeSet::new(),
            requires: BTreeSet::new(),
            generates: BTreeSet::new(),
            default_input: None,
            default_output: None,
            author: None,
            description: None,
            provenance: None,
            version: None,
        }
    }

    #[must_use]
    pub fn with_accepts(mut self, args: impl IntoIterator<Item = Argument>) -> Self {
        self.accepts.extend(args);
        self
    }

    #[must_use]
    pub fn with_requires(mut self, args: impl IntoIterator<Item = Argument>) -> Self {
        self.requires.extend(args);
        self
    }

    #[must_use]
    pub fn with_generates(mut self, args: impl IntoIterator<Item = Argument>) -> Self {
        self.generates.extend(args);
        self
    }

    #[must_use]
    pub fn with_default_input(mut self, arg: Argument) -> Self {
        self.default_input = Some(arg);
        self
    }

    #[must_use]
    pub fn with_default_output(mut self, arg: Argument) -> Self {
        self.default_output = Some(arg);
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_provenance(mut self, provenance: impl Into<String>) -> Self {
        self.provenance = Some(provenance.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn call(
        &self,
        inputs: &ProcedureInputs,
        outputs: &[String],
        query: &ProcedureQuery,
    ) -> Result<ProcResult, OrbqlError> {
        (self.callable)(inputs, outputs, query)
    }

    /// Validates the descriptor invariants and fills in `default_input`/`default_output`
    /// when they were left unset and a single candidate exists.
    pub(crate) fn finalize(mut self) -> Result<Self, OrbqlError> {
        if !self.requires.is_subset(&self.accepts) {
            return Err(OrbqlError::RegistryInvalid(format!(
                "<{}>: requires must be a subset of accepts",
                self.uri
            )));
        }
        let mut ids = BTreeSet::new();
        for arg in self.accepts.iter().chain(self.generates.iter()) {
            if !ids.insert(&arg.id_string) {
                return Err(OrbqlError::RegistryInvalid(format!(
                    "<{}>: argument id {:?} is not unique across accepts and generates",
                    self.uri, arg.id_string
                )));
            }
        }
        if let Some(default_input) = &self.default_input {
            if !self.accepts.contains(default_input) {
                return Err(OrbqlError::RegistryInvalid(format!(
                    "<{}>: default input must be a member of accepts",
                    self.uri
                )));
            }
        } else if self.requires.len() == 1 {
            self.default_input = self.requires.iter().next().cloned();
        } else if self.accepts.len() == 1 {
            self.default_input = self.accepts.iter().next().cloned();
        }
        if let Some(default_output) = &self.default_output {
            if !self.generates.contains(default_output) {
                return Err(OrbqlError::RegistryInvalid(format!(
                    "<{}>: default output must be a member of generates",
                    self.uri
                )));
            }
        } else if self.generates.len() == 1 {
            self.default_output = self.generates.iter().next().cloned();
        }
        Ok(self)
    }

    /// Builds the self-description subgraph for this procedure, rooted at its own IRI.
    pub(crate) fn describe(&self) -> Vec<Triple> {
        let mut triples = Vec::new();
        let fallback = |s: &Option<String>| {
            s.clone()
                .unwrap_or_else(|| "This procedure has no <attr> specified.".to_string())
        };
        triples.push(Triple::new(
            self.uri.clone(),
            namespace::AUTHOR,
            oxrdf::Literal::new_simple_literal(fallback(&self.author)),
        ));
        triples.push(Triple::new(
            self.uri.clone(),
            namespace::DESCRIPTION,
            oxrdf::Literal::new_simple_literal(fallback(&self.description)),
        ));
        triples.push(Triple::new(
            self.uri.clone(),
            namespace::PROVENANCE,
            oxrdf::Literal::new_simple_literal(fallback(&self.provenance)),
        ));
        triples.push(Triple::new(
            self.uri.clone(),
            namespace::VERSION,
            oxrdf::Literal::new_simple_literal(fallback(&self.version)),
        ));
        for arg in &self.accepts {
            let (node, mut arg_triples) = arg.describe();
            triples.push(Triple::new(
                self.uri.clone(),
                NamedNode::new_unchecked(format!("{}accepted_input", namespace::BASE)),
                node,
            ));
            triples.append(&mut arg_triples);
        }
        for arg in &self.requires {
            triples.push(Triple::new(
                self.uri.clone(),
                NamedNode::new_unchecked(format!("{}required_input", namespace::BASE)),
                oxrdf::Literal::new_simple_literal(&arg.id_string),
            ));
        }
        for arg in &self.generates {
            let (node, mut arg_triples) = arg.describe();
            triples.push(Triple::new(
                self.uri.clone(),
                NamedNode::new_unchecked(format!("{}generates_output", namespace::BASE)),
                node,
            ));
            triples.append(&mut arg_triples);
        }
        if let Some(default_input) = &self.default_input {
            triples.push(Triple::new(
                self.uri.clone(),
                NamedNode::new_unchecked(format!("{}default_input", namespace::BASE)),
                oxrdf::Literal::new_simple_literal(&default_input.id_string),
            ));
        }
        if let Some(default_output) = &self.default_output {
            triples.push(Triple::new(
                self.uri.clone(),
                NamedNode::new_unchecked(format!("{}default_output", namespace::BASE)),
                oxrdf::Literal::new_simple_literal(&default_output.id_string),
            ));
        }
        triples
    }
}
