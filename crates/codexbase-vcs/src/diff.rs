//! Whole-file text diff between two branches' file sets.

use crate::CommitFile;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

/// Computes a human-readable diff between two file sets.
///
/// This is a coarse, content-equality diff with no line-level hunking. In
/// source order, files absent from the target produce a "New file" block
/// with their full content and files whose content differs produce a
/// "Modified file" block with both versions. Then, in target order, files
/// absent from the source produce a "Deleted file" block. Files with
/// identical content produce no output, so identical sets yield the empty
/// string.
pub fn compute_diff(source: &[CommitFile], target: &[CommitFile]) -> String {
    let target_by_name: HashMap<&str, &str> = target
        .iter()
        .map(|f| (f.name.as_str(), f.content.as_str()))
        .collect();

    let mut out = String::new();

    for file in source {
        match target_by_name.get(file.name.as_str()) {
            None => {
                let _ = writeln!(out, "New file: {}", file.name);
                let _ = writeln!(out, "{}", file.content);
                out.push('\n');
            }
            Some(old) if *old != file.content => {
                let _ = writeln!(out, "Modified file: {}", file.name);
                out.push_str("--- old\n");
                let _ = writeln!(out, "{}", old);
                out.push_str("+++ new\n");
                let _ = writeln!(out, "{}", file.content);
                out.push('\n');
            }
            Some(_) => {}
        }
    }

    let source_names: HashSet<&str> = source.iter().map(|f| f.name.as_str()).collect();

    for file in target {
        if !source_names.contains(file.name.as_str()) {
            let _ = writeln!(out, "Deleted file: {}", file.name);
            let _ = writeln!(out, "{}", file.content);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn files(entries: &[(&str, &str)]) -> Vec<CommitFile> {
        entries
            .iter()
            .map(|(n, c)| CommitFile::new(*n, *c))
            .collect()
    }

    #[test]
    fn identical_sets_produce_empty_diff() {
        let set = files(&[("a.txt", "1"), ("b.txt", "2")]);
        assert_eq!(compute_diff(&set, &set), "");
    }

    #[test]
    fn empty_sets_produce_empty_diff() {
        assert_eq!(compute_diff(&[], &[]), "");
    }

    #[test]
    fn new_file_block() {
        let diff = compute_diff(&files(&[("a.txt", "hello")]), &[]);
        assert_eq!(diff, "New file: a.txt\nhello\n\n");
    }

    #[test]
    fn deleted_file_block() {
        let diff = compute_diff(&[], &files(&[("a.txt", "hello")]));
        assert_eq!(diff, "Deleted file: a.txt\nhello\n\n");
    }

    #[test]
    fn modified_file_block_contains_both_versions() {
        let diff = compute_diff(&files(&[("a.txt", "new")]), &files(&[("a.txt", "old")]));
        assert_eq!(
            diff,
            "Modified file: a.txt\n--- old\nold\n+++ new\nnew\n\n"
        );
    }

    #[test]
    fn mixed_diff_is_complete_and_nothing_more() {
        // Source {a: "1", b: "2"}, target {b: "3", c: "4"}.
        let source = files(&[("a", "1"), ("b", "2")]);
        let target = files(&[("b", "3"), ("c", "4")]);

        let diff = compute_diff(&source, &target);

        assert!(diff.contains("New file: a\n1\n"));
        assert!(diff.contains("Modified file: b\n--- old\n3\n+++ new\n2\n"));
        assert!(diff.contains("Deleted file: c\n4\n"));

        // Exactly three blocks, no more.
        assert_eq!(diff.matches("New file:").count(), 1);
        assert_eq!(diff.matches("Modified file:").count(), 1);
        assert_eq!(diff.matches("Deleted file:").count(), 1);
    }

    #[test]
    fn blocks_follow_source_then_target_order() {
        let source = files(&[("z", "1"), ("a", "2")]);
        let target = files(&[("m", "3")]);

        let diff = compute_diff(&source, &target);

        let z = diff.find("New file: z").unwrap();
        let a = diff.find("New file: a").unwrap();
        let m = diff.find("Deleted file: m").unwrap();
        assert!(z < a, "new/modified blocks keep source order");
        assert!(a < m, "deleted blocks come last");
    }

    #[test]
    fn unchanged_files_emit_nothing() {
        let source = files(&[("same.txt", "x"), ("new.txt", "y")]);
        let target = files(&[("same.txt", "x")]);

        let diff = compute_diff(&source, &target);
        assert!(!diff.contains("same.txt"));
        assert!(diff.contains("New file: new.txt"));
    }

    proptest! {
        #[test]
        fn diff_of_set_against_itself_is_empty(
            entries in proptest::collection::btree_map("[a-z]{1,8}", ".{0,40}", 0..8)
        ) {
            let set: Vec<CommitFile> = entries
                .into_iter()
                .map(|(n, c)| CommitFile::new(n, c))
                .collect();
            prop_assert_eq!(compute_diff(&set, &set), "");
        }

        #[test]
        fn every_source_only_name_appears_as_new(
            entries in proptest::collection::btree_map("[a-z]{1,8}", ".{0,40}", 1..8)
        ) {
            let set: Vec<CommitFile> = entries
                .into_iter()
                .map(|(n, c)| CommitFile::new(n, c))
                .collect();
            let diff = compute_diff(&set, &[]);
            for file in &set {
                let expected = format!("New file: {}", file.name);
                prop_assert!(diff.contains(&expected));
            }
            prop_assert!(!diff.contains("Deleted file:"));
            prop_assert!(!diff.contains("Modified file:"));
        }
    }
}
