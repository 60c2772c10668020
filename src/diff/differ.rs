//! Structural differ: lowers a pair of Value trees into marked lines.
//!
//! The output is what a line-oriented diff of two pretty-printed trees would
//! produce. Maps are walked in key order. Lists are aligned on the longest
//! common subsequence of equal elements; inside each unaligned gap, elements
//! are paired by position and walked recursively when both are collections of
//! the same kind, so that one changed field inside a list element shows up as
//! one modified line rather than a replaced element.

use super::line::{ChangeMarker, StructuralLine};
use crate::value::{Map, Value};

/// Diffs `live` against `desired` and returns the marked lines.
pub fn diff_values(live: &Value, desired: &Value) -> Vec<StructuralLine> {
    let mut w = LineWriter::default();
    w.walk(None, live, desired);
    w.lines
}

/// Renders a single tree as unmarked lines.
pub fn lines_of(value: &Value) -> Vec<StructuralLine> {
    let mut w = LineWriter::default();
    w.subtree(None, value, ChangeMarker::None);
    w.lines
}

#[derive(Default)]
struct LineWriter {
    lines: Vec<StructuralLine>,
}

impl LineWriter {
    fn walk(&mut self, name: Option<&str>, live: &Value, desired: &Value) {
        match (live, desired) {
            (Value::Map(a), Value::Map(b)) => {
                self.lines
                    .push(StructuralLine::open(ChangeMarker::None, name, "{"));
                self.walk_map(a, b);
                self.lines.push(StructuralLine::close(ChangeMarker::None, "}"));
            }
            (Value::List(a), Value::List(b)) => {
                self.lines
                    .push(StructuralLine::open(ChangeMarker::None, name, "["));
                self.walk_list(a, b);
                self.lines.push(StructuralLine::close(ChangeMarker::None, "]"));
            }
            (a, b) if a == b => self.subtree(name, a, ChangeMarker::None),
            (a, b) => {
                self.subtree(name, a, ChangeMarker::Removed);
                self.subtree(name, b, ChangeMarker::Added);
            }
        }
    }

    fn walk_map(&mut self, live: &Map, desired: &Map) {
        for key in live.union_keys(desired) {
            match (live.get(key), desired.get(key)) {
                (Some(a), Some(b)) => self.walk(Some(key.as_str()), a, b),
                (Some(a), None) => self.subtree(Some(key.as_str()), a, ChangeMarker::Removed),
                // Unset on the live side and empty on the desired side: nothing to say.
                (None, Some(b)) if b.is_logically_empty() => {}
                (None, Some(b)) => self.subtree(Some(key.as_str()), b, ChangeMarker::Added),
                (None, None) => {}
            }
        }
    }

    fn walk_list(&mut self, live: &[Value], desired: &[Value]) {
        let pairs = common_subsequence(live, desired);

        let (mut i, mut j) = (0, 0);
        for (mi, mj) in pairs.into_iter().chain(std::iter::once((live.len(), desired.len()))) {
            self.walk_gap(&live[i..mi], &desired[j..mj]);
            if mi < live.len() && mj < desired.len() {
                self.subtree(None, &live[mi], ChangeMarker::None);
            }
            i = mi + 1;
            j = mj + 1;
        }
    }

    fn walk_gap(&mut self, removed: &[Value], added: &[Value]) {
        for k in 0..removed.len().max(added.len()) {
            match (removed.get(k), added.get(k)) {
                (Some(a), Some(b)) if a.same_collection_kind(b) => self.walk(None, a, b),
                (a, b) => {
                    if let Some(a) = a {
                        self.subtree(None, a, ChangeMarker::Removed);
                    }
                    if let Some(b) = b {
                        self.subtree(None, b, ChangeMarker::Added);
                    }
                }
            }
        }
    }

    fn subtree(&mut self, name: Option<&str>, value: &Value, marker: ChangeMarker) {
        match value {
            Value::Map(m) => {
                self.lines.push(StructuralLine::open(marker, name, "{"));
                for (k, v) in m.iter() {
                    self.subtree(Some(k.as_str()), v, marker);
                }
                self.lines.push(StructuralLine::close(marker, "}"));
            }
            Value::List(items) => {
                self.lines.push(StructuralLine::open(marker, name, "["));
                for v in items {
                    self.subtree(None, v, marker);
                }
                self.lines.push(StructuralLine::close(marker, "]"));
            }
            scalar => self
                .lines
                .push(StructuralLine::plain(marker, name, scalar.token())),
        }
    }
}

/// Returns index pairs of a longest common subsequence of equal elements.
fn common_subsequence(a: &[Value], b: &[Value]) -> Vec<(usize, usize)> {
    let (n, m) = (a.len(), b.len());
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(table[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::line::LineRole;
    use crate::value::from_yaml;

    fn markers(lines: &[StructuralLine]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_identical_trees_are_unmarked() {
        let v = from_yaml("a: 1\nb: [x, y]\nc: {d: true}\n").unwrap();
        let lines = diff_values(&v, &v);
        assert!(lines.iter().all(|l| l.marker == ChangeMarker::None));
        assert_eq!(lines, lines_of(&v));
    }

    #[test]
    fn test_scalar_change_is_removal_then_addition() {
        let live = from_yaml("replicas: 3\n").unwrap();
        let desired = from_yaml("replicas: 4\n").unwrap();
        assert_eq!(
            markers(&diff_values(&live, &desired)),
            vec![" {", "-replicas: 3", "+replicas: 4", " }"]
        );
    }

    #[test]
    fn test_list_alignment_isolates_removed_element() {
        let live = from_yaml("[a, b, c]").unwrap();
        let desired = from_yaml("[a, c]").unwrap();
        assert_eq!(
            markers(&diff_values(&live, &desired)),
            vec![" [", " \"a\"", "-\"b\"", " \"c\"", " ]"]
        );
    }

    #[test]
    fn test_changed_list_element_is_walked() {
        let live = from_yaml("- name: es\n  image: v1\n").unwrap();
        let desired = from_yaml("- name: es\n  image: v2\n").unwrap();
        let lines = diff_values(&live, &desired);
        let changed: Vec<_> = lines
            .iter()
            .filter(|l| l.marker != ChangeMarker::None)
            .collect();
        assert_eq!(changed.len(), 2);
        assert!(changed.iter().all(|l| l.role == LineRole::Plain));
        assert_eq!(changed[0].name.as_deref(), Some("image"));
    }

    #[test]
    fn test_empty_desired_only_fields_are_skipped() {
        let live = from_yaml("name: es\n").unwrap();
        let desired = from_yaml("name: es\nimage: \"\"\nlabels: {}\nports: []\nreplicas: 0\n").unwrap();
        assert_eq!(
            markers(&diff_values(&live, &desired)),
            vec![" {", " name: \"es\"", " }"]
        );
    }

    #[test]
    fn test_removed_subtree_is_fully_marked() {
        let live = from_yaml("status: {ready: 1}\n").unwrap();
        let desired = from_yaml("{}").unwrap();
        assert_eq!(
            markers(&diff_values(&live, &desired)),
            vec![" {", "-status: {", "-ready: 1", "-}", " }"]
        );
    }
}
