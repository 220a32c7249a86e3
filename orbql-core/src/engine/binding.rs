use std::collections::BTreeMap;

use oxrdf::{Term, Variable};

/// One solution row: a map from variable to bound term.
///
/// A `BTreeMap` rather than a `HashMap` so the dedup-by-entry-set check in
/// [`crate::engine::merge::merge_and_filter`] is cheap and deterministic without
/// requiring `Term` to implement `Hash`.
pub type BindingRow = BTreeMap<Variable, Term>;
