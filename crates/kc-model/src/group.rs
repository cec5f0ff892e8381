//! Group domain model.
//!
//! Groups form a forest: a group either sits at the top level or points
//! at its parent. Mappers address groups by path, the `/`-joined names
//! from the root down.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A local group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier.
    pub id: Uuid,
    /// Realm this group belongs to.
    pub realm_id: Uuid,
    /// Name, unique among siblings.
    pub name: String,
    /// Parent group, `None` at the top level.
    pub parent_id: Option<Uuid>,
}

impl Group {
    /// Creates a top-level group.
    #[must_use]
    pub fn new(realm_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            name: name.into(),
            parent_id: None,
        }
    }

    /// Creates a group under `parent_id`.
    #[must_use]
    pub fn new_child(realm_id: Uuid, parent_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::new(realm_id, name)
        }
    }
}

/// A group path, root segment first.
///
/// Segments are trimmed however the path is built, so a configured path
/// and one computed from group names compare equal. The canonical string
/// form has no leading slash: `"org/team"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupPath {
    segments: Vec<String>,
}

impl GroupPath {
    /// Parses `"org/team"` or `"/org/team"`. Blank segments are dropped.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    /// Builds a path from segments ordered root first.
    ///
    /// Blank segments are kept (as empty strings), so a group with a blank
    /// name never takes the path of its parent.
    #[must_use]
    pub fn from_segments(segments: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            segments: segments
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .collect(),
        }
    }

    /// Path segments, root first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Canonical string form.
    #[must_use]
    pub fn to_path_string(&self) -> String {
        self.segments.join("/")
    }

    /// True for a path with no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl std::fmt::Display for GroupPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_path_string())
    }
}
