use inv_fs::{DocumentFormat, DocumentStore, Error, NormalizedPath};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tempfile::TempDir;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    workers: usize,
    tags: BTreeMap<String, u64>,
}

fn sample() -> Sample {
    Sample {
        name: "photos".into(),
        workers: 3,
        tags: BTreeMap::from([("a.jpg".into(), 10), ("b.jpg".into(), 20)]),
    }
}

#[rstest]
#[case("settings.toml", DocumentFormat::Toml)]
#[case("inventory.json", DocumentFormat::Json)]
#[case("INVENTORY.JSON", DocumentFormat::Json)]
fn test_detect_format(#[case] file: &str, #[case] expected: DocumentFormat) {
    assert_eq!(DocumentFormat::detect(&NormalizedPath::new(file)).unwrap(), expected);
}

#[test]
fn test_detect_rejects_unknown_extension() {
    let err = DocumentFormat::detect(&NormalizedPath::new("inventory.yaml")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { extension } if extension == "yaml"));
}

#[rstest]
#[case("doc.json")]
#[case("doc.toml")]
fn test_save_then_load(#[case] file: &str) {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(file));
    let store = DocumentStore::new();

    store.save(&path, &sample()).unwrap();
    let loaded: Sample = store.load(&path).unwrap();

    assert_eq!(loaded, sample());
}

#[test]
fn test_json_output_is_pretty_with_trailing_newline() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("doc.json"));

    DocumentStore::new().save(&path, &sample()).unwrap();

    let text = std::fs::read_to_string(path.to_native()).unwrap();
    assert!(text.starts_with("{\n  \"name\""));
    assert!(text.ends_with("}\n"));
}

#[test]
fn test_load_optional_missing_is_none() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("missing.toml"));
    let loaded: Option<Sample> = DocumentStore::new().load_optional(&path).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn test_parse_error_names_path_and_format() {
    let path = NormalizedPath::new("/photos/inventory.json");
    let err = DocumentStore::new()
        .parse::<Sample>(&path, DocumentFormat::Json, "{ not json")
        .unwrap_err();

    match err {
        Error::DocumentParse { path, format, .. } => {
            assert_eq!(path, std::path::PathBuf::from("/photos/inventory.json"));
            assert_eq!(format, "JSON");
        }
        other => panic!("unexpected error: {other}"),
    }
}
