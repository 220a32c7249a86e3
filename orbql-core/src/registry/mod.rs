//! The procedure registry: the in-memory mapping from a base IRI to a callable
//! computation plus its argument descriptors, populated once at startup and shared
//! read-only for the lifetime of the process.

mod argument;
mod procedure;

pub use argument::Argument;
pub use procedure::{ProcResult, Procedure, ProcedureInputs, ProcedureQuery};

use std::collections::HashMap;

use oxrdf::{NamedNode, Triple};

use crate::error::OrbqlError;
use crate::namespace;

/// The service-wide self-description attached to the `orb` sentinel, as opposed to a
/// single procedure's own description. Populated from process configuration.
#[derive(Debug, Clone)]
pub struct ServiceDescription {
    pub author: String,
    pub description: String,
    pub provenance: String,
    pub version: String,
}

impl Default for ServiceDescription {
    fn default() -> Self {
        Self {
            author: "This service has no <author> specified.".to_string(),
            description: "This service has no <description> specified.".to_string(),
            provenance: "This service has no <provenance> specified.".to_string(),
            version: "This service has no <version> specified.".to_string(),
        }
    }
}

#[derive(Default)]
pub struct Registry {
    procedures: HashMap<NamedNode, Procedure>,
    service_description: ServiceDescription,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service-wide self-description returned under the `orb` sentinel.
    pub fn set_service_description(&mut self, description: ServiceDescription) {
        self.service_description = description;
    }

    /// Validates `procedure`'s descriptor and inserts it, rejecting a second
    /// registration under an already-used base IRI.
    pub fn register(&mut self, procedure: Procedure) -> Result<(), OrbqlError> {
        let procedure = procedure.finalize()?;
        if self.procedures.contains_key(&procedure.uri) {
            return Err(OrbqlError::RegistryInvalid(format!(
                "<{}> is already registered",
                procedure.uri
            )));
        }
        self.procedures.insert(procedure.uri.clone(), procedure);
        Ok(())
    }

    pub fn get(&self, base: &NamedNode) -> Option<&Procedure> {
        self.procedures.get(base)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Procedure> {
        self.procedures.values()
    }

    /// Builds the full self-description graph: the service's own author/description/
    /// provenance/version attached to the `orb` sentinel, plus one subgraph per
    /// registered procedure.
    pub fn describe_all(&self) -> Vec<Triple> {
        let d = &self.service_description;
        let mut triples = vec![
            Triple::new(namespace::ORB, namespace::AUTHOR, oxrdf::Literal::new_simple_literal(&d.author)),
            Triple::new(
                namespace::ORB,
                namespace::DESCRIPTION,
                oxrdf::Literal::new_simple_literal(&d.description),
            ),
            Triple::new(
                namespace::ORB,
                namespace::PROVENANCE,
                oxrdf::Literal::new_simple_literal(&d.provenance),
            ),
            Triple::new(namespace::ORB, namespace::VERSION, oxrdf::Literal::new_simple_literal(&d.version)),
        ];
        for procedure in self.procedures.values() {
            triples.extend(procedure.describe());
        }
        triples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc(uri: &str) -> Procedure {
        Procedure::new(NamedNode::new(uri).unwrap(), |_, _, _| Ok(ProcResult::Empty))
    }

    #[test]
    fn rejects_duplicate_uri() {
        let mut registry = Registry::new();
        registry.register(proc("http://ex/p")).unwrap();
        assert!(registry.register(proc("http://ex/p")).is_err());
    }

    #[test]
    fn single_required_argument_becomes_default_input() {
        let mut registry = Registry::new();
        let x = Argument::new("x");
        let p = proc("http://ex/p")
            .with_accepts([x.clone()])
            .with_requires([x.clone()]);
        registry.register(p).unwrap();
        assert_eq!(
            registry
                .get(&NamedNode::new("http://ex/p").unwrap())
                .unwrap()
                .default_input,
            Some(x)
        );
    }

    #[test]
    fn requires_must_be_subset_of_accepts() {
        let mut registry = Registry::new();
        let p = proc("http://ex/p").with_requires([Argument::new("x")]);
        assert!(registry.register(p).is_err());
    }
}
