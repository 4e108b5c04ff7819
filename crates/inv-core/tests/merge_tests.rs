//! Merge engine tests
//!
//! Record preservation, conflict reporting and order independence.

use inv_core::{DirectoryInventory, merge};
use inv_test_utils::directory;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn disjoint_inventories_merge_without_conflicts() {
    let inputs = vec![
        directory("", &[("cover.jpg", b"cover")]),
        directory("2019", &[("a.jpg", b"a"), ("b.jpg", b"b")]),
        directory("2019/trip", &[("c.jpg", b"c")]),
    ];
    let outcome = merge("photos", &inputs);

    let expected: usize = inputs.iter().map(DirectoryInventory::len).sum();
    assert_eq!(outcome.inventory.len(), expected);
    assert!(outcome.conflicts.is_empty());
    assert_eq!(
        outcome.inventory.paths().collect::<Vec<_>>(),
        vec!["2019/a.jpg", "2019/b.jpg", "2019/trip/c.jpg", "cover.jpg"]
    );
}

#[test]
fn colliding_path_yields_one_conflict_and_keeps_the_rest() {
    let inputs = vec![
        directory("", &[("2019/a.jpg", b"first"), ("x.jpg", b"x")]),
        directory("2019", &[("a.jpg", b"second"), ("y.jpg", b"y")]),
    ];
    let outcome = merge("photos", &inputs);

    assert_eq!(outcome.conflicts.len(), 1);
    let conflict = &outcome.conflicts[0];
    assert_eq!(conflict.path, "2019/a.jpg");
    assert_eq!(conflict.claims.len(), 2);
    assert_ne!(conflict.claims[0].record.checksum, conflict.claims[1].record.checksum);

    assert_eq!(
        outcome.inventory.paths().collect::<Vec<_>>(),
        vec!["2019/y.jpg", "x.jpg"]
    );
}

#[test]
fn identical_claims_still_conflict() {
    let inputs = vec![
        directory("", &[("2019/a.jpg", b"same")]),
        directory("2019", &[("a.jpg", b"same")]),
    ];
    let outcome = merge("photos", &inputs);
    assert_eq!(outcome.conflicts.len(), 1);
    assert!(outcome.inventory.is_empty());
}

#[test]
fn empty_input_gives_empty_snapshot() {
    let outcome = merge("photos", std::iter::empty::<&DirectoryInventory>());
    assert!(outcome.inventory.is_empty());
    assert!(outcome.is_clean());
}

proptest! {
    #[test]
    fn merge_is_order_independent(
        files in prop::collection::btree_map("[a-d]{1,2}/[a-c]\\.jpg", any::<u8>(), 0..12),
        rotate in 0usize..6,
    ) {
        // Group files by directory and also list one file at the root
        // level so some inputs collide.
        let mut by_dir: std::collections::BTreeMap<String, Vec<(String, u8)>> = Default::default();
        for (path, byte) in &files {
            let (dir, name) = path.rsplit_once('/').unwrap();
            by_dir.entry(dir.to_string()).or_default().push((name.to_string(), *byte));
        }
        let mut inputs: Vec<DirectoryInventory> = by_dir
            .iter()
            .map(|(dir, entries)| {
                let owned: Vec<(&str, [u8; 1])> = entries.iter().map(|(n, b)| (n.as_str(), [*b])).collect();
                let refs: Vec<(&str, &[u8])> = owned.iter().map(|(n, b)| (*n, &b[..])).collect();
                directory(dir, &refs)
            })
            .collect();
        if let Some((path, byte)) = files.iter().next() {
            inputs.push(directory("", &[(path.as_str(), &[byte.wrapping_add(1)])]));
        }

        let forward = merge("t", &inputs);
        let len = inputs.len().max(1);
        inputs.rotate_left(rotate % len);
        inputs.reverse();
        let backward = merge("t", &inputs);

        prop_assert_eq!(forward.inventory.records().collect::<Vec<_>>(), backward.inventory.records().collect::<Vec<_>>());
        prop_assert_eq!(forward.conflicts, backward.conflicts);
    }
}
