//! Response format selection: a fixed, priority-ordered table matched against the
//! request's `Accept` header, exactly as wide as the original's two supported formats.

use sparesults::QueryResultsFormat;

pub const SUPPORTED_FORMATS: &[(&str, QueryResultsFormat)] = &[
    ("application/sparql-results+xml", QueryResultsFormat::Xml),
    ("text/csv", QueryResultsFormat::Csv),
];

/// Picks the first supported format that appears anywhere in `accept`, in table order.
/// An empty or missing `Accept` header is treated as accepting everything, returning
/// the first (highest-priority) supported format.
pub fn negotiate(accept: Option<&str>) -> Option<QueryResultsFormat> {
    match accept {
        None => Some(SUPPORTED_FORMATS[0].1),
        Some(accept) => SUPPORTED_FORMATS
            .iter()
            .find(|(mime, _)| accept.contains(mime) || accept.contains("*/*"))
            .map(|(_, format)| *format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_matching_supported_format() {
        assert_eq!(
            negotiate(Some("text/csv, application/sparql-results+xml")),
            Some(QueryResultsFormat::Xml)
        );
    }

    #[test]
    fn no_match_is_none() {
        assert_eq!(negotiate(Some("application/json")), None);
    }
}
