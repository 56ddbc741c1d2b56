//! Shared helpers for snapshot assertions and scenario fixtures.

use std::fmt::Write;

pub mod scenario;

/// One line per node of a canonical snapshot, for readable diffs.
///
/// Input that is not a JSON array is returned as a single line.
pub fn snapshot_lines(snapshot: &str) -> Vec<String> {
    match serde_json::from_str::<serde_json::Value>(snapshot) {
        Ok(serde_json::Value::Array(nodes)) => nodes.iter().map(|node| node.to_string()).collect(),
        _ => vec![snapshot.to_string()],
    }
}

pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    let missing = "<missing>";
    let mut out = String::new();
    let first = (0..max).find(|&i| expected.get(i) != actual.get(i));
    if let Some(i) = first {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at node {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for line_idx in start..end {
            let left = expected.get(line_idx).map_or(missing, String::as_str);
            let right = actual.get(line_idx).map_or(missing, String::as_str);
            let marker = if line_idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {left}", line_idx + 1);
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {right}", line_idx + 1);
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} nodes, actual {} nodes",
        expected.len(),
        actual.len()
    );
    out
}

#[track_caller]
pub fn assert_snapshot_eq(expected: &str, actual: &str) {
    if expected != actual {
        let diff = diff_lines(&snapshot_lines(expected), &snapshot_lines(actual));
        panic!("snapshot mismatch\n{diff}");
    }
}
