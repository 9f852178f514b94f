//! Wire types for the `/ws` push channel and the frame decoder.
//!
//! The webserver pushes one JSON text frame per processed camera frame:
//!
//! ```json
//! { "type": "update",
//!   "imgs": [[{"name": "detail", "title": "Detail", "desc": "..."}]],
//!   "heat_sources": [[120, 80, 0.52]],
//!   "poi_temp": {"cpu": 41.25} }
//! ```
//!
//! Only `imgs` is required. Its shape (flat or grouped) is fixed by the
//! [`LayoutVersion`] the viewer is deployed with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LiveViewError, Result};
use crate::layout::{BatchShape, LayoutVersion};

/// One auxiliary image announced by the server. `name` is both the identity
/// key and the file basename for `<name>.jpg` / `<name>.tiff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub name: String,
    pub title: String,
    pub desc: String,
}

/// The `imgs` payload of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageBatch {
    Flat(Vec<ImageDescriptor>),
    /// Outer index is the group (column), inner index the position within it.
    Grouped(Vec<Vec<ImageDescriptor>>),
}

impl ImageBatch {
    /// Walk the batch in order, yielding `(group, index, descriptor)`.
    /// A flat batch reports every descriptor in group 0.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (usize, usize, &ImageDescriptor)> + '_> {
        match self {
            ImageBatch::Flat(imgs) => Box::new(imgs.iter().enumerate().map(|(i, d)| (0, i, d))),
            ImageBatch::Grouped(groups) => Box::new(
                groups
                    .iter()
                    .enumerate()
                    .flat_map(|(g, imgs)| imgs.iter().enumerate().map(move |(i, d)| (g, i, d))),
            ),
        }
    }

    /// Total number of descriptors, duplicates included.
    pub fn len(&self) -> usize {
        match self {
            ImageBatch::Flat(imgs) => imgs.len(),
            ImageBatch::Grouped(groups) => groups.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self) -> BatchShape {
        match self {
            ImageBatch::Flat(_) => BatchShape::Flat,
            ImageBatch::Grouped(_) => BatchShape::Grouped,
        }
    }
}

/// A detected heat source: pixel location and the negative Laplacian score.
/// Sent on the wire as a `[x, y, neg_laplacian]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64, f64)", into = "(f64, f64, f64)")]
pub struct HeatSource {
    pub x: f64,
    pub y: f64,
    pub neg_laplacian: f64,
}

impl From<(f64, f64, f64)> for HeatSource {
    fn from((x, y, neg_laplacian): (f64, f64, f64)) -> Self {
        Self { x, y, neg_laplacian }
    }
}

impl From<HeatSource> for (f64, f64, f64) {
    fn from(h: HeatSource) -> Self {
        (h.x, h.y, h.neg_laplacian)
    }
}

/// A fully decoded push message.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateMessage {
    /// The server's `type` tag, `"update"` in practice.
    pub kind: Option<String>,
    /// Optional protocol marker, validated against the layout.
    pub version: Option<u64>,
    pub imgs: ImageBatch,
    pub heat_sources: Vec<HeatSource>,
    /// Point-of-interest name → temperature in °C.
    pub poi_temps: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    version: Option<u64>,
    #[serde(default)]
    imgs: Option<serde_json::Value>,
    #[serde(default)]
    heat_sources: Vec<HeatSource>,
    #[serde(rename = "poi_temp", default)]
    poi_temps: BTreeMap<String, f64>,
}

/// Decode one text frame for a viewer running `layout`.
///
/// # Errors
/// - [`LiveViewError::Json`] when the frame is not a JSON object of the
///   expected form.
/// - [`LiveViewError::MissingField`] when `imgs` is absent or `null`.
/// - [`LiveViewError::VersionMismatch`] when a `version` marker disagrees
///   with `layout`.
/// - [`LiveViewError::Shape`] when `imgs` is not the shape `layout` expects.
pub fn decode(text: &str, layout: LayoutVersion) -> Result<UpdateMessage> {
    let raw: RawMessage = serde_json::from_str(text)?;

    if let Some(found) = raw.version {
        if !layout.accepts_version(found) {
            return Err(LiveViewError::VersionMismatch {
                found,
                layout: layout.to_string(),
            });
        }
    }

    let imgs = match raw.imgs {
        Some(serde_json::Value::Null) | None => return Err(LiveViewError::MissingField("imgs")),
        Some(v) => v,
    };

    let shape = layout.shape();
    let shape_err = |e: serde_json::Error| LiveViewError::Shape {
        expected: shape.describe(),
        detail: e.to_string(),
    };
    let imgs = match shape {
        BatchShape::Flat => ImageBatch::Flat(serde_json::from_value(imgs).map_err(shape_err)?),
        BatchShape::Grouped => {
            ImageBatch::Grouped(serde_json::from_value(imgs).map_err(shape_err)?)
        }
    };

    Ok(UpdateMessage {
        kind: raw.kind,
        version: raw.version,
        imgs,
        heat_sources: raw.heat_sources,
        poi_temps: raw.poi_temps,
    })
}
