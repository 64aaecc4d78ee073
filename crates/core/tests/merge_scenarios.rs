//! End-to-end merge tests through the public engine API, including
//! configuration loaded from disk.

use std::io::Write;

use memdiff_core::config::EngineConfig;
use memdiff_core::engine::{self, DiffEngine};
use memdiff_core::output::ConflictRegion;
use memdiff_core::{DiffOptions, RangeKind};

// ===========================================================================
// Helpers
// ===========================================================================

fn default_engine() -> DiffEngine {
    DiffEngine::new(EngineConfig::default()).unwrap()
}

fn merged(engine: &DiffEngine, o: &str, m: &str, l: &str) -> (String, Vec<ConflictRegion>) {
    let outcome = engine.merge(o.as_bytes(), m.as_bytes(), l.as_bytes()).unwrap();
    (
        String::from_utf8(outcome.content).unwrap(),
        outcome.summary.conflicts,
    )
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn test_latest_only_change_is_taken() {
    let (text, conflicts) = merged(&default_engine(), "1\n2\n3\n", "1\n2\n3\n", "1\nZ\n3\n");
    assert_eq!(text, "1\nZ\n3\n");
    assert!(conflicts.is_empty());
}

#[test]
fn test_disjoint_edits_both_survive() {
    let original = "fn a() {}\n\nfn b() {}\n\nfn c() {}\n";
    let modified = "fn a() { 1 }\n\nfn b() {}\n\nfn c() {}\n";
    let latest = "fn a() {}\n\nfn b() {}\n\nfn c() { 3 }\n";

    let (text, conflicts) = merged(&default_engine(), original, modified, latest);
    assert_eq!(text, "fn a() { 1 }\n\nfn b() {}\n\nfn c() { 3 }\n");
    assert!(conflicts.is_empty());
}

#[test]
fn test_overlapping_edits_make_one_conflict() {
    let (text, conflicts) = merged(&default_engine(), "a\n", "b\n", "c\n");
    assert_eq!(text, "<<<<<<< (modified)\nb\n=======\nc\n>>>>>>> (latest)\n");
    assert_eq!(conflicts, vec![ConflictRegion { start_line: 1, end_line: 5 }]);
}

#[test]
fn test_identical_changes_do_not_conflict() {
    let (text, conflicts) = merged(
        &default_engine(),
        "keep\nold\nkeep\n",
        "keep\nnew\nkeep\n",
        "keep\nnew\nkeep\n",
    );
    assert_eq!(text, "keep\nnew\nkeep\n");
    assert!(conflicts.is_empty());
}

#[test]
fn test_conflicts_are_counted_in_order() {
    let original = "1\n2\n3\n4\n5\n6\n7\n";
    let modified = "1\nM2\n3\n4\n5\nM6\n7\n";
    let latest = "1\nL2\n3\n4\n5\nL6\n7\n";

    let (text, conflicts) = merged(&default_engine(), original, modified, latest);
    assert_eq!(
        conflicts,
        vec![
            ConflictRegion { start_line: 2, end_line: 6 },
            ConflictRegion { start_line: 10, end_line: 14 },
        ]
    );
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[1], "<<<<<<< (modified)");
    assert_eq!(lines[5], ">>>>>>> (latest)");
    assert_eq!(lines[9], "<<<<<<< (modified)");
    assert_eq!(lines[13], ">>>>>>> (latest)");
}

#[test]
fn test_diff3_ranges_cover_every_source() {
    let o = b"a\nb\nc\nd\ne\nf\n";
    let m = b"a\nB\nc\nd\ne\nf\ng\n";
    let l = b"a\nb\nc\nD\ne\n";
    let diff = engine::diff3(o, m, l, &DiffOptions::default());

    let total = |f: fn(&memdiff_core::DiffRange) -> usize| -> usize {
        diff.ranges().iter().map(f).sum()
    };
    assert_eq!(total(|r| r.original.len), 6);
    assert_eq!(total(|r| r.modified.len), 7);
    assert_eq!(total(|r| r.latest.len), 5);
    assert!(diff.ranges().iter().any(|r| r.kind == RangeKind::DiffModified));
    assert!(diff.ranges().iter().any(|r| r.kind == RangeKind::DiffLatest));
}

#[test]
fn test_four_way_merge_uses_ancestor() {
    let engine = default_engine();
    let original = b"x\nnew-base\nz\n";
    let modified = b"x\nold-base\nz\n";
    let latest = b"x\nupstream\nz\n";
    let ancestor = b"x\nold-base\nz\n";

    assert!(engine.merge(original, modified, latest).unwrap().has_conflicts());

    let outcome = engine
        .merge_with_ancestor(original, modified, latest, ancestor)
        .unwrap();
    assert!(!outcome.has_conflicts());
    assert_eq!(outcome.content, b"x\nupstream\nz\n");
}

#[test]
fn test_config_from_disk_drives_merge() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[diff]
ignore_space = "change"

[merge]
show_original_in_conflict = true

[merge.markers]
modified = "<<<<<<< .mine"
original = "||||||| .r1"
latest = ">>>>>>> .r2"
"#
    )
    .unwrap();

    let config = EngineConfig::load_and_validate(file.path()).unwrap();
    let engine = DiffEngine::new(config).unwrap();

    // Whitespace-only differences in latest are not a change.
    let (text, conflicts) = merged(&engine, "a b\n", "a b\n", "a   b\n");
    assert_eq!(text, "a b\n");
    assert!(conflicts.is_empty());

    let (text, _) = merged(&engine, "base\n", "mine\n", "theirs\n");
    assert_eq!(
        text,
        "<<<<<<< .mine\nmine\n||||||| .r1\nbase\n=======\ntheirs\n>>>>>>> .r2\n"
    );
}

#[test]
fn test_resolved_conflicts_from_config() {
    let mut config = EngineConfig::default();
    config.merge.resolve_conflicts = true;
    let engine = DiffEngine::new(config).unwrap();

    let (text, conflicts) = merged(
        &engine,
        "start\nold\nend\n",
        "start\nshared\nmine\nend\n",
        "start\nshared\ntheirs\nend\n",
    );
    assert_eq!(
        text,
        "start\nshared\n<<<<<<< (modified)\nmine\n=======\ntheirs\n>>>>>>> (latest)\nend\n"
    );
    assert_eq!(conflicts, vec![ConflictRegion { start_line: 3, end_line: 7 }]);
}
