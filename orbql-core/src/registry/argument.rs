use oxrdf::{BlankNode, Literal, NamedNode, Triple};

use crate::namespace;

/// Describes one named argument a procedure accepts or generates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Argument {
    pub id_string: String,
    pub uri: Option<NamedNode>,
    pub description: Option<String>,
}

impl Argument {
    /// Creates an argument with the given id string. Panics if `id` is empty or `"_"`,
    /// both of which are reserved to mean "use the default argument".
    pub fn new(id: impl Into<String>) -> Self {
        let id_string = id.into();
        assert!(
            !id_string.is_empty() && id_string != "_",
            "argument id must not be empty or \"_\""
        );
        Self {
            id_string,
            uri: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_uri(mut self, uri: NamedNode) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Builds the self-description triples for this argument, rooted at a fresh blank node,
    /// plus that blank node so the caller can link it into the enclosing description.
    pub(crate) fn describe(&self) -> (BlankNode, Vec<Triple>) {
        let subject = BlankNode::default();
        let mut triples = vec![Triple::new(
            subject.clone(),
            namespace::DESCRIPTION,
            Literal::new_simple_literal(
                self.description
                    .as_deref()
                    .unwrap_or("This argument has no <description> specified."),
            ),
        )];
        if let Some(uri) = &self.uri {
            triples.push(Triple::new(
                subject.clone(),
                namespace::PROVENANCE,
                uri.clone(),
            ));
        }
        (subject, triples)
    }
}
