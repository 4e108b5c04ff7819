//! Shell rendering of plans and removal lists
//!
//! The output is text for an external executor to review and run. Paths
//! with characters outside a conservative set are never rendered, so the
//! result can be pasted into a shell without quoting surprises.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use inv_fs::parent_of;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use super::{Operation, Plan};
use crate::dedupe::RemovalSuggestion;
use crate::model::Side;

static SAFE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w /:.-]+$").unwrap());

/// True when `path` can be rendered into a command.
pub fn is_safe_name(path: &str) -> bool {
    SAFE_NAME.is_match(path)
}

/// Rendered shell lines plus the paths that were left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedScript {
    pub lines: Vec<String>,
    /// Offending paths, in the order met
    pub skipped: Vec<String>,
}

impl RenderedScript {
    /// Script text, one command per line.
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}

fn rooted(root: &str, path: &str) -> String {
    if root.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", root.trim_end_matches('/'), path)
}

struct Renderer<'a> {
    left_root: &'a str,
    right_root: &'a str,
    made_dirs: BTreeSet<String>,
    script: RenderedScript,
}

impl<'a> Renderer<'a> {
    fn new(left_root: &'a str, right_root: &'a str) -> Self {
        Self {
            left_root,
            right_root,
            made_dirs: BTreeSet::new(),
            script: RenderedScript::default(),
        }
    }

    fn root(&self, side: Side) -> &'a str {
        match side {
            Side::Left => self.left_root,
            Side::Right => self.right_root,
        }
    }

    /// All rendered paths must be safe, or the whole operation is skipped.
    fn check(&mut self, paths: &[&str]) -> bool {
        match paths.iter().find(|p| !is_safe_name(p)) {
            Some(bad) => {
                warn!(path = %bad, "not rendering command for suspicious file name");
                self.script.skipped.push(bad.to_string());
                false
            }
            None => true,
        }
    }

    fn ensure_parent(&mut self, side: Side, relative: &str) {
        let parent = parent_of(relative);
        if parent.is_empty() {
            return;
        }
        let dir = rooted(self.root(side), parent);
        if self.made_dirs.insert(dir.clone()) {
            self.script.lines.push(format!("mkdir -p \"{dir}\""));
        }
    }

    fn render(&mut self, operation: &Operation) {
        match operation {
            Operation::Copy { from, path } => {
                let src = rooted(self.root(*from), path);
                let dst = rooted(self.root(from.other()), path);
                if self.check(&[src.as_str(), dst.as_str()]) {
                    self.ensure_parent(from.other(), path);
                    self.script.lines.push(format!("cp \"{src}\" \"{dst}\""));
                }
            }
            Operation::LocalCopy { side, from, to } => {
                let src = rooted(self.root(*side), from);
                let dst = rooted(self.root(*side), to);
                if self.check(&[src.as_str(), dst.as_str()]) {
                    self.ensure_parent(*side, to);
                    self.script.lines.push(format!("cp \"{src}\" \"{dst}\""));
                }
            }
            Operation::Rename { side, from, to } => {
                let src = rooted(self.root(*side), from);
                let dst = rooted(self.root(*side), to);
                if self.check(&[src.as_str(), dst.as_str()]) {
                    self.ensure_parent(*side, to);
                    self.script.lines.push(format!("mv \"{src}\" \"{dst}\""));
                }
            }
            Operation::Delete { side, path } => {
                let target = rooted(self.root(*side), path);
                if self.check(&[target.as_str()]) {
                    self.script.lines.push(format!("rm \"{target}\""));
                }
            }
        }
    }
}

/// Render a plan as `mkdir -p`, `cp`, `mv` and `rm` lines.
pub fn render_script(plan: &Plan, left_root: &str, right_root: &str) -> RenderedScript {
    let mut renderer = Renderer::new(left_root, right_root);
    for planned in &plan.operations {
        renderer.render(&planned.operation);
    }
    renderer.script
}

/// Render dedupe removal suggestions as `rm -f` lines.
pub fn render_removals(removals: &[RemovalSuggestion], root: &str) -> RenderedScript {
    let mut script = RenderedScript::default();
    for removal in removals {
        let target = rooted(root, &removal.path);
        if is_safe_name(&target) {
            script.lines.push(format!("rm -f \"{target}\""));
        } else {
            warn!(path = %target, "do not clean up strange file name");
            script.skipped.push(target);
        }
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/photos/2019/IMG_0001.JPG", true)]
    #[case("C:/photos/summer trip/a-b.c.jpg", true)]
    #[case("/photos/Ääkkönen.jpg", true)]
    #[case("/photos/$(rm -rf).jpg", false)]
    #[case("/photos/quote\".jpg", false)]
    #[case("/photos/back`tick`.jpg", false)]
    #[case("", false)]
    fn safe_names(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_safe_name(path), expected);
    }

    #[test]
    fn rooted_handles_empty_and_trailing_slash() {
        assert_eq!(rooted("", "a.jpg"), "a.jpg");
        assert_eq!(rooted("/mnt/a/", "x/a.jpg"), "/mnt/a/x/a.jpg");
        assert_eq!(rooted("/", "a.jpg"), "/a.jpg");
    }

    #[test]
    fn empty_script_has_no_text() {
        assert_eq!(RenderedScript::default().to_text(), "");
    }
}
