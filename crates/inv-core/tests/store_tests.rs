//! Inventory persistence tests against real temporary trees

use inv_core::store::{build_merged, load_directory_inventory, load_merged, load_tree, save_directory_inventory, save_merged};
use inv_core::{CoverageWarning, Error, InventoryFormat, ValidationOptions};
use inv_fs::NormalizedPath;
use inv_test_utils::{TestTree, directory, snapshot};
use pretty_assertions::assert_eq;

const INVENTORY: &str = "inventory.json";

fn save(tree: &TestTree, dir: &str, files: &[(&str, &[u8])]) {
    let inventory = directory(dir, files);
    let path = tree.normalized().join(dir).join(INVENTORY);
    save_directory_inventory(&inventory, &path).unwrap();
}

#[test]
fn directory_inventory_round_trips() {
    let tree = TestTree::new();
    let original = directory("2019", &[("a.jpg", b"a"), ("b.jpg", b"bb")]);
    let path = tree.normalized().join("2019/inventory.json");

    save_directory_inventory(&original, &path).unwrap();
    let loaded = load_directory_inventory(&path, "2019", ValidationOptions::default()).unwrap();

    assert_eq!(loaded, original);
    tree.assert_file_contains("2019/inventory.json", "\"a.jpg\": {");
}

#[test]
fn legacy_file_is_rewritten_in_keyed_form() {
    let tree = TestTree::new();
    let digest = inv_test_utils::record("", b"x").checksum;
    tree.file(INVENTORY, format!(r#"[["x.jpg", 1, "{digest}"]]"#).as_bytes());
    let path = tree.normalized().join(INVENTORY);

    let legacy = load_directory_inventory(&path, "", ValidationOptions::default()).unwrap();
    assert_eq!(legacy.format(), InventoryFormat::Legacy);

    save_directory_inventory(&legacy, &path).unwrap();
    let keyed = load_directory_inventory(&path, "", ValidationOptions::default()).unwrap();
    assert_eq!(keyed.format(), InventoryFormat::Keyed);
    assert_eq!(keyed.records().collect::<Vec<_>>(), legacy.records().collect::<Vec<_>>());
}

#[test]
fn tree_load_survives_a_broken_inventory() {
    let tree = TestTree::new();
    tree.file("a/1.jpg", b"1").file("b/2.jpg", b"2").file("c/3.jpg", b"3");
    save(&tree, "a", &[("1.jpg", b"1")]);
    save(&tree, "c", &[("3.jpg", b"3")]);
    tree.file("b/inventory.json", br#"{"2.jpg": {"size": -1, "checksum": "zz"}}"#);

    let load = load_tree(&tree.normalized(), INVENTORY, ValidationOptions::default()).unwrap();

    let dirs: Vec<&str> = load.inventories.iter().map(|i| i.directory()).collect();
    assert_eq!(dirs, vec!["a", "c"]);
    assert_eq!(load.failures.len(), 1);
    assert_eq!(load.failures[0].directory, "b");
    assert!(load.failures[0].message.contains("negative size -1"));
    assert!(load.failures[0].message.contains("malformed checksum 'zz'"));
}

#[test]
fn build_merged_reports_directories_without_inventory() {
    let tree = TestTree::new();
    tree.file("top.jpg", b"t")
        .file("2019/a.jpg", b"a")
        .file("2020/b.jpg", b"b")
        .dir("empty");
    save(&tree, "", &[("top.jpg", b"t")]);
    save(&tree, "2019", &[("a.jpg", b"a")]);
    tree.file(".hidden/x.jpg", b"hidden");

    let outcome = build_merged(&tree.normalized(), INVENTORY, ValidationOptions::default()).unwrap();

    assert_eq!(
        outcome.inventory.paths().collect::<Vec<_>>(),
        vec!["2019/a.jpg", "top.jpg"]
    );
    assert_eq!(
        outcome.coverage,
        vec![CoverageWarning::MissingInventory {
            directory: "2020".into()
        }]
    );
    assert!(outcome.conflicts.is_empty());
    assert!(outcome.failures.is_empty());
}

#[test]
fn merged_inventory_round_trips() {
    let tree = TestTree::new();
    let merged = snapshot(&[("a.jpg", b"a"), ("x/b.jpg", b"b")]);
    let path = tree.normalized().join("merged-inventory.json");

    save_merged(&merged, &path).unwrap();
    tree.assert_file_contains("merged-inventory.json", "\"format\": \"merged-v1\"");

    let loaded = load_merged(&path, ValidationOptions::default()).unwrap();
    assert_eq!(loaded, merged);
}

#[test]
fn merged_inventory_in_list_form_is_read() {
    let tree = TestTree::new();
    let a = inv_core::Checksum::of_bytes(b"a");
    let b = inv_core::Checksum::of_bytes(b"bb");
    let content = format!(r#"[["2019/a.jpg", 1, "{a}"], ["2020/trip/b.jpg", 2, "{b}"]]"#);
    tree.file("photos/merged.json", content.as_bytes());
    let path = tree.normalized().join("photos/merged.json");

    let loaded = load_merged(&path, ValidationOptions::default()).unwrap();

    assert_eq!(loaded.tree_root(), tree.normalized().join("photos").as_str());
    assert_eq!(loaded.paths().collect::<Vec<_>>(), vec!["2019/a.jpg", "2020/trip/b.jpg"]);
    assert_eq!(loaded.get("2020/trip/b.jpg").unwrap().checksum, b);
    assert_eq!(loaded.total_bytes(), 3);
}

#[test]
fn list_form_merged_inventory_is_still_validated() {
    let tree = TestTree::new();
    tree.file("merged.json", br#"[["a.jpg", -1, "nothex"]]"#);
    let result = load_merged(&tree.normalized().join("merged.json"), ValidationOptions::default());
    assert!(matches!(result, Err(Error::MalformedInventory { .. })));
}

#[test]
fn directory_inventory_is_not_a_merged_one() {
    let tree = TestTree::new();
    save(&tree, "2019", &[("a.jpg", b"a")]);
    let result = load_merged(&tree.normalized().join("2019").join(INVENTORY), ValidationOptions::default());
    assert!(matches!(result, Err(Error::Fs(_))));
}

#[test]
fn unknown_merged_format_is_rejected() {
    let tree = TestTree::new();
    tree.file(
        "merged.json",
        br#"{"format": "merged-v9", "tree_root": "t", "generated_at": "2024-01-01T00:00:00Z", "records": {}}"#,
    );
    let result = load_merged(&tree.normalized().join("merged.json"), ValidationOptions::default());
    assert!(matches!(result, Err(Error::UnsupportedMergedFormat { format }) if format == "merged-v9"));
}

#[test]
fn missing_root_is_an_error() {
    let result = load_tree(
        &NormalizedPath::new("/definitely/not/here"),
        INVENTORY,
        ValidationOptions::default(),
    );
    assert!(matches!(result, Err(Error::Fs(_))));
}
