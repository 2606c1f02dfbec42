use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

/// Root of the on-disk configuration directory.
///
/// Used to recover modification dates for entries whose metadata was never
/// recorded, from the timestamp of the file the entry is stored in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Wraps the given directory. The directory does not need to exist.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a path below the root from its segments.
    #[must_use]
    pub fn path(&self, segments: &[&str]) -> PathBuf {
        segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Modification time of the file at the given segments, `None` if it cannot be read.
    ///
    /// Segments that are empty, contain a separator or `..` never resolve, so
    /// the lookup stays below the root.
    #[must_use]
    pub fn last_modified(&self, segments: &[&str]) -> Option<DateTime<Utc>> {
        if let Some(segment) = segments.iter().find(|s| !is_plain_segment(s)) {
            debug!("Not looking up a modification time for segment {segment:?}");
            return None;
        }
        let path = self.path(segments);
        match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(time) => Some(DateTime::<Utc>::from(time)),
            Err(e) => {
                debug!("No modification time for {}: {e}", path.display());
                None
            }
        }
    }

    /// Modification time of a stored map (layer group) definition.
    #[must_use]
    pub fn map_last_modified(&self, workspace: &str, name: &str) -> Option<DateTime<Utc>> {
        let file = format!("{name}.xml");
        self.last_modified(&["workspaces", workspace, "layergroups", &file])
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(['/', '\\']) && !segment.contains("..")
}
