use inv_fs::path::dotted_extension;
use inv_fs::{NormalizedPath, PathIssue, check_relative, join_relative, parent_of};
use rstest::rstest;

#[rstest]
#[case("a.jpg")]
#[case("2019/trip/IMG_0001.JPG")]
#[case("with space/and-dash_underscore.jpg")]
#[case(".hidden/x.jpg")]
fn test_check_relative_accepts_clean_paths(#[case] input: &str) {
    assert_eq!(check_relative(input), Ok(()));
}

#[rstest]
#[case("", PathIssue::Empty)]
#[case("/abs/a.jpg", PathIssue::Absolute)]
#[case("C:/photos/a.jpg", PathIssue::Absolute)]
#[case("a\\b.jpg", PathIssue::Backslash)]
#[case("a/../b.jpg", PathIssue::DotSegment)]
#[case("./a.jpg", PathIssue::DotSegment)]
#[case("a//b.jpg", PathIssue::EmptySegment)]
#[case("a/", PathIssue::EmptySegment)]
fn test_check_relative_rejects(#[case] input: &str, #[case] expected: PathIssue) {
    assert_eq!(check_relative(input), Err(expected));
}

#[rstest]
#[case("", "")]
#[case("a.jpg", "")]
#[case("2019/a.jpg", "2019")]
#[case("2019/trip/a.jpg", "2019/trip")]
fn test_parent_of(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(parent_of(input), expected);
}

#[test]
fn test_join_relative_round_trips_parent() {
    let joined = join_relative("2019/trip", "a.jpg");
    assert_eq!(joined, "2019/trip/a.jpg");
    assert_eq!(parent_of(&joined), "2019/trip");
}

#[rstest]
#[case("IMG_0001.JPG", Some(".jpg"))]
#[case("archive.tar.GZ", Some(".gz"))]
#[case("README", None)]
#[case(".DS_Store", None)]
fn test_dotted_extension(#[case] input: &str, #[case] expected: Option<&str>) {
    assert_eq!(dotted_extension(input).as_deref(), expected);
}

#[test]
fn test_normalized_path_uses_forward_slashes() {
    let path = NormalizedPath::new("photos\\2019\\trip\\");
    assert_eq!(path.as_str(), "photos/2019/trip");
    assert_eq!(path.file_name(), Some("trip"));
    assert_eq!(path.parent().map(|p| p.as_str().to_string()).as_deref(), Some("photos/2019"));
}

#[test]
fn test_normalized_path_join_skips_empty_segment() {
    let root = NormalizedPath::new("/photos");
    assert_eq!(root.join(""), root);
    assert_eq!(root.join("2019/a.jpg").as_str(), "/photos/2019/a.jpg");
}
