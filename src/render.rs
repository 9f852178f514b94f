//! View renderer: reconciles decoded batches against the page model.
//!
//! ## Guarantees
//! - The refresh counter rises by exactly one per applied batch.
//! - A panel is created at most once per name and never moves afterwards.
//! - Captions always show the latest `desc` for their name.
//! - On toggle layouts, an unchecked panel keeps its last image source and
//!   is drawn in grayscale until it is checked again.

use std::collections::HashMap;

use tracing::debug;

use crate::dom::{Page, Panel};
use crate::error::{LiveViewError, Result};
use crate::layout::LayoutVersion;
use crate::protocol::{ImageBatch, UpdateMessage};

/// Primary camera frame served by the webserver.
pub const CAMERA_IMAGE: &str = "thermocam-current.jpg";

/// What one batch did to the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Counter value used for this batch's cache-busting token.
    pub counter: u64,
    pub created: usize,
    pub refreshed: usize,
    /// Panels skipped because their toggle was unchecked.
    pub paused: usize,
}

/// Applies image batches to a [`Page`], keeping the refresh counter.
#[derive(Debug, Clone)]
pub struct Renderer {
    layout: LayoutVersion,
    counter: u64,
    page: Page,
    by_name: HashMap<String, usize>,
}

impl Renderer {
    pub fn new(layout: LayoutVersion) -> Self {
        Self {
            layout,
            counter: 0,
            page: Page::new(layout),
            by_name: HashMap::new(),
        }
    }

    pub fn layout(&self) -> LayoutVersion {
        self.layout
    }

    /// Number of batches applied so far.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn panel(&self, name: &str) -> Option<&Panel> {
        self.by_name.get(name).and_then(|&i| self.page.panel(i))
    }

    /// Apply a full message: the image batch plus the temperature readouts.
    pub fn apply(&mut self, msg: &UpdateMessage) -> RenderSummary {
        self.page.poi_temps = msg.poi_temps.clone();
        self.page.heat_sources = msg.heat_sources.clone();
        self.apply_batch(&msg.imgs)
    }

    pub fn apply_batch(&mut self, batch: &ImageBatch) -> RenderSummary {
        self.counter += 1;
        let c = self.counter;
        self.page.camera.src = Some(format!("{CAMERA_IMAGE}?c={c}"));

        let mut summary = RenderSummary {
            counter: c,
            ..RenderSummary::default()
        };

        for (group, index, desc) in batch.iter() {
            let idx = match self.by_name.get(&desc.name) {
                Some(&idx) => idx,
                None => {
                    let placement = self.layout.place(group, index);
                    let panel = Panel::new(desc, placement, self.layout.has_toggle());
                    let idx = self.page.attach(panel);
                    self.by_name.insert(desc.name.clone(), idx);
                    summary.created += 1;
                    debug!(name = %desc.name, ?placement, "created panel");
                    idx
                }
            };

            let Some(panel) = self.page.panel_mut(idx) else {
                continue;
            };
            panel.caption.clone_from(&desc.desc);
            if panel.refresh_enabled() {
                panel.image.src = Some(format!("{}.jpg?c={c}", desc.name));
                panel.image.grayscale = false;
                summary.refreshed += 1;
            } else {
                panel.image.grayscale = true;
                summary.paused += 1;
            }
        }

        summary
    }

    /// Flip the auto-refresh checkbox of `name`, as a click on its image does.
    ///
    /// Returns the new checked state, or `None` when the layout has no
    /// toggles. Takes effect on the next batch only.
    ///
    /// # Errors
    /// [`LiveViewError::UnknownPanel`] when no panel has that name.
    pub fn toggle(&mut self, name: &str) -> Result<Option<bool>> {
        let idx = *self
            .by_name
            .get(name)
            .ok_or_else(|| LiveViewError::UnknownPanel(name.to_string()))?;
        let panel = self
            .page
            .panel_mut(idx)
            .ok_or_else(|| LiveViewError::UnknownPanel(name.to_string()))?;
        Ok(panel.toggle.as_mut().map(|checked| {
            *checked = !*checked;
            *checked
        }))
    }
}
