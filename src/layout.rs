//! Layout versions and the placement policy for newly created panels.
//!
//! The viewer went through four layouts. They differ only in the wire shape
//! of `imgs` they pair with and in where a panel lands the first time its
//! name is seen. Existing panels never move.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which viewer layout is in use. Paired with the server deployment; the
/// client never sniffs the batch shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVersion {
    /// Flat list, panels appended in arrival order.
    V1,
    /// Grouped list, one row container per group index.
    V2,
    /// Grouped list, explicit grid coordinates.
    V3,
    /// Grid with a per-panel auto-refresh toggle.
    #[default]
    V4,
}

impl std::fmt::Display for LayoutVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutVersion::V1 => write!(f, "v1"),
            LayoutVersion::V2 => write!(f, "v2"),
            LayoutVersion::V3 => write!(f, "v3"),
            LayoutVersion::V4 => write!(f, "v4"),
        }
    }
}

/// Wire shape of the `imgs` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchShape {
    Flat,
    Grouped,
}

impl BatchShape {
    pub fn describe(self) -> &'static str {
        match self {
            BatchShape::Flat => "a flat list of images",
            BatchShape::Grouped => "a list of image groups",
        }
    }
}

/// 1-based grid coordinates, assigned once at panel creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub column: usize,
    pub row: usize,
}

/// Where a newly created panel is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Appended directly to the `webimgs` container.
    Append,
    /// Appended to the row container for this group index.
    Row(usize),
    /// Appended to the grid container with fixed coordinates.
    Grid(GridPos),
}

impl LayoutVersion {
    pub fn shape(self) -> BatchShape {
        match self {
            LayoutVersion::V1 => BatchShape::Flat,
            LayoutVersion::V2 | LayoutVersion::V3 | LayoutVersion::V4 => BatchShape::Grouped,
        }
    }

    /// Whether panels carry the pause-refresh checkbox.
    pub fn has_toggle(self) -> bool {
        self == LayoutVersion::V4
    }

    pub fn is_grid(self) -> bool {
        matches!(self, LayoutVersion::V3 | LayoutVersion::V4)
    }

    /// Whether an explicit `version` marker in a message is compatible with
    /// this layout. Marker `1` means flat, `2..=4` means grouped.
    pub fn accepts_version(self, version: u64) -> bool {
        match self.shape() {
            BatchShape::Flat => version == 1,
            BatchShape::Grouped => (2..=4).contains(&version),
        }
    }

    /// Placement of a panel first seen at `group` / `index` (both 0-based
    /// positions in the batch).
    pub fn place(self, group: usize, index: usize) -> Placement {
        match self {
            LayoutVersion::V1 => Placement::Append,
            LayoutVersion::V2 => Placement::Row(group),
            LayoutVersion::V3 | LayoutVersion::V4 => Placement::Grid(GridPos {
                column: group + 1,
                row: index + 1,
            }),
        }
    }
}
