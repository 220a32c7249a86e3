//! Hash-join merging of binding-row lists produced by independent handlers.

use std::collections::{BTreeSet, HashMap, HashSet};

use oxrdf::Variable;

use crate::engine::BindingRow;

fn schema(rows: &[BindingRow]) -> BTreeSet<Variable> {
    rows.first().map(|r| r.keys().cloned().collect()).unwrap_or_default()
}

fn dedup(rows: Vec<BindingRow>) -> Vec<BindingRow> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter().filter(|r| seen.insert(r.clone())).collect()
}

fn merge_two(a: &[BindingRow], b: &[BindingRow]) -> Vec<BindingRow> {
    let shared: Vec<Variable> = schema(a).intersection(&schema(b)).cloned().collect();
    let mut index: HashMap<Vec<oxrdf::Term>, Vec<&BindingRow>> = HashMap::new();
    for row in b {
        let key: Vec<_> = shared.iter().filter_map(|v| row.get(v).cloned()).collect();
        index.entry(key).or_default().push(row);
    }
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for a_row in a {
        let key: Vec<_> = shared.iter().filter_map(|v| a_row.get(v).cloned()).collect();
        if key.len() != shared.len() {
            continue;
        }
        if let Some(matches) = index.get(&key) {
            for b_row in matches {
                let mut merged = a_row.clone();
                for (k, v) in b_row.iter() {
                    merged.insert(k.clone(), v.clone());
                }
                if seen.insert(merged.clone()) {
                    out.push(merged);
                }
            }
        }
    }
    out
}

/// Merges several independently-produced binding-row lists into one consistent list.
///
/// An empty slice of producer lists yields a single empty row, so a handler with no
/// variable-bound dependencies still runs its body exactly once. Any individual
/// producer list being empty propagates as an empty result — a consumer of an
/// unsatisfied producer simply yields nothing, which is not treated as an error.
pub fn merge_and_filter(producer_lists: &[&[BindingRow]]) -> Vec<BindingRow> {
    if producer_lists.is_empty() {
        return vec![BindingRow::new()];
    }
    if producer_lists.iter().any(|rows| rows.is_empty()) {
        return vec![];
    }
    if producer_lists.len() == 1 {
        return dedup(producer_lists[0].to_vec());
    }
    let mut working: Vec<Vec<BindingRow>> = producer_lists.iter().map(|l| l.to_vec()).collect();
    while working.len() > 1 {
        let mut best: Option<(usize, usize, usize)> = None;
        for i in 0..working.len() {
            for j in (i + 1)..working.len() {
                let shared = schema(&working[i]).intersection(&schema(&working[j])).count();
                if best.map(|(_, _, b)| shared > b).unwrap_or(true) {
                    best = Some((i, j, shared));
                }
            }
        }
        let (i, j, _) = best.expect("working has at least two lists");
        let b = working.remove(j);
        let a = working.remove(i);
        working.push(merge_two(&a, &b));
    }
    working.into_iter().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::Literal;

    fn row(pairs: &[(&str, &str)]) -> BindingRow {
        pairs
            .iter()
            .map(|(k, v)| (Variable::new_unchecked(*k), Literal::new_simple_literal(*v).into()))
            .collect()
    }

    #[test]
    fn empty_producer_list_propagates_as_empty() {
        let a = vec![row(&[("x", "1")])];
        let b: Vec<BindingRow> = vec![];
        assert!(merge_and_filter(&[&a, &b]).is_empty());
    }

    #[test]
    fn no_producer_lists_yields_one_empty_row() {
        let result = merge_and_filter(&[]);
        assert_eq!(result, vec![BindingRow::new()]);
    }

    #[test]
    fn single_list_is_deduplicated() {
        let a = vec![row(&[("x", "1")]), row(&[("x", "1")])];
        assert_eq!(merge_and_filter(&[&a]).len(), 1);
    }

    #[test]
    fn join_keeps_only_consistent_rows() {
        let a = vec![row(&[("x", "1")]), row(&[("x", "2")])];
        let b = vec![row(&[("x", "1"), ("y", "9")])];
        let merged = merge_and_filter(&[&a, &b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0].get(&Variable::new_unchecked("y")),
            Some(&Literal::new_simple_literal("9").into())
        );
    }
}
