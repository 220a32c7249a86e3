//! Parsing of Procedure-Associated URIs (PAUs) and predicate specifiers.
//!
//! A protocol predicate has the shape `<base>?<specifier>`. The base identifies a
//! registered procedure (or, for description predicates, still addresses the
//! procedure the triple describes); the specifier names one of its arguments.
//! An empty specifier or the literal string `_` both mean "use the default".

use oxrdf::NamedNode;

/// Splits a full predicate or subject IRI into its base and optional specifier.
///
/// `"http://ex/proc?x"` splits into `("http://ex/proc", Some("x"))`.
/// `"http://ex/proc?_"` and `"http://ex/proc?"` both split into `("http://ex/proc", None)`.
/// `"http://ex/proc"` (no `?` at all) splits into `("http://ex/proc", None)`.
pub fn split_specifier(iri: &str) -> (&str, Option<&str>) {
    match iri.split_once('?') {
        None => (iri, None),
        Some((base, "")) | Some((base, "_")) => (base, None),
        Some((base, spec)) => (base, Some(spec)),
    }
}

/// The registration key a PAU resolves to: the base IRI with any `?specifier` suffix removed.
pub fn base_of(node: &NamedNode) -> NamedNode {
    let (base, _) = split_specifier(node.as_str());
    NamedNode::new_unchecked(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_explicit_specifier() {
        assert_eq!(
            split_specifier("http://ex/proc?x"),
            ("http://ex/proc", Some("x"))
        );
    }

    #[test]
    fn underscore_and_empty_mean_default() {
        assert_eq!(split_specifier("http://ex/proc?_"), ("http://ex/proc", None));
        assert_eq!(split_specifier("http://ex/proc?"), ("http://ex/proc", None));
    }

    #[test]
    fn no_question_mark_means_default() {
        assert_eq!(split_specifier("http://ex/proc"), ("http://ex/proc", None));
    }
}
