//! Survivor selection policies

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::InventoryRecord;
use crate::{Error, Result};

/// Picks which record of a duplicate group is kept.
///
/// `compare` must be a total order over distinct paths; the minimum
/// survives.
pub trait SurvivorPolicy {
    fn compare(&self, a: &InventoryRecord, b: &InventoryRecord) -> Ordering;

    fn name(&self) -> &'static str;

    /// Whether `survivor` beat `runner_up` on the policy's own criterion
    /// rather than on a fallback ordering.
    fn is_decisive(&self, _survivor: &InventoryRecord, _runner_up: &InventoryRecord) -> bool {
        true
    }
}

/// Shorter path wins, then the lexicographically smaller one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestPath;

impl ShortestPath {
    /// The comparator on bare paths, shared with move detection.
    pub fn compare_paths(a: &str, b: &str) -> Ordering {
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

impl SurvivorPolicy for ShortestPath {
    fn compare(&self, a: &InventoryRecord, b: &InventoryRecord) -> Ordering {
        Self::compare_paths(&a.path, &b.path)
    }

    fn name(&self) -> &'static str {
        "shortest-path"
    }
}

static LOWER_CAMERA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(img|mvi)_\d+\.(jpg|avi)$").unwrap());
static UPPER_CAMERA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(IMG|MVI)_\d+\.(JPG|AVI)$").unwrap());
static MIXED_CAMERA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(IMG|MVI)_\d+\.(jpg|avi)$").unwrap());

/// How far a file name has moved from the camera default; higher means a
/// person probably chose it.
pub fn filename_score(path: &str) -> u8 {
    let name = path.rsplit('/').next().unwrap_or(path);
    if LOWER_CAMERA.is_match(name) {
        1
    } else if UPPER_CAMERA.is_match(name) {
        2
    } else if MIXED_CAMERA.is_match(name) {
        3
    } else {
        4
    }
}

/// Prefers renamed files over camera-default names; ties fall back to
/// [`ShortestPath`] and are reported as not decisive.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraNameScore;

impl SurvivorPolicy for CameraNameScore {
    fn compare(&self, a: &InventoryRecord, b: &InventoryRecord) -> Ordering {
        filename_score(&b.path)
            .cmp(&filename_score(&a.path))
            .then_with(|| ShortestPath::compare_paths(&a.path, &b.path))
    }

    fn name(&self) -> &'static str {
        "camera-name"
    }

    fn is_decisive(&self, survivor: &InventoryRecord, runner_up: &InventoryRecord) -> bool {
        filename_score(&survivor.path) != filename_score(&runner_up.path)
    }
}

/// Policy names as used in settings and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurvivorPolicyKind {
    #[default]
    ShortestPath,
    CameraName,
}

impl SurvivorPolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShortestPath => "shortest-path",
            Self::CameraName => "camera-name",
        }
    }

    pub fn policy(self) -> Box<dyn SurvivorPolicy> {
        match self {
            Self::ShortestPath => Box::new(ShortestPath),
            Self::CameraName => Box::new(CameraNameScore),
        }
    }
}

impl FromStr for SurvivorPolicyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "shortest-path" => Ok(Self::ShortestPath),
            "camera-name" => Ok(Self::CameraName),
            other => Err(Error::UnknownPolicy {
                kind: "survivor",
                name: other.to_string(),
            }),
        }
    }
}
