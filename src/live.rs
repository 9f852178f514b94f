//! The live view controller: decoder + renderer behind a [`FrameHandler`].

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::connection::FrameHandler;
use crate::error::Result;
use crate::layout::LayoutVersion;
use crate::protocol::decode;
use crate::render::{RenderSummary, Renderer};

/// Decoder and renderer for one viewer, fed one text frame at a time.
pub struct LiveView {
    renderer: Renderer,
    snapshot: Option<PathBuf>,
    last: Option<RenderSummary>,
}

impl LiveView {
    pub fn new(layout: LayoutVersion) -> Self {
        Self {
            renderer: Renderer::new(layout),
            snapshot: None,
            last: None,
        }
    }

    /// Rewrite `path` with the rendered page after every applied frame.
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Summary of the most recently applied frame.
    pub fn last_summary(&self) -> Option<RenderSummary> {
        self.last
    }

    /// A click on the image of panel `name`.
    pub fn click(&mut self, name: &str) -> Result<Option<bool>> {
        let checked = self.renderer.toggle(name)?;
        if let Some(checked) = checked {
            info!(panel = name, refresh = checked, "auto-refresh toggled");
        }
        Ok(checked)
    }

    /// Decode and apply one frame. A rejected frame leaves the page and the
    /// counter untouched. Once a frame is applied it stays applied: a failed
    /// snapshot write is logged and the frame still counts.
    pub fn handle_frame(&mut self, text: &str) -> Result<RenderSummary> {
        let msg = decode(text, self.renderer.layout())?;
        let summary = self.renderer.apply(&msg);
        self.last = Some(summary);
        debug!(
            counter = summary.counter,
            created = summary.created,
            refreshed = summary.refreshed,
            paused = summary.paused,
            "applied batch"
        );
        if let Some(path) = &self.snapshot {
            if let Err(e) = write_atomic(path, &self.renderer.page().to_html()) {
                warn!(error = %e, path = %path.display(), "failed to write snapshot");
            }
        }
        Ok(summary)
    }
}

impl FrameHandler for LiveView {
    fn on_text(&mut self, text: &str) -> Result<()> {
        self.handle_frame(text).map(|_| ())
    }
}

/// Write via a sibling temp file and rename so readers never see a partial
/// document.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LiveViewError;

    #[test]
    fn test_rejected_frame_does_not_bump_counter() {
        let mut live = LiveView::new(LayoutVersion::V1);
        assert!(live.handle_frame("not json").is_err());
        assert_eq!(live.renderer().counter(), 0);
        assert!(live.last_summary().is_none());
        live.handle_frame(r#"{"imgs":[]}"#).unwrap();
        assert_eq!(live.renderer().counter(), 1);
    }

    #[test]
    fn test_click_on_unknown_panel_is_error() {
        let mut live = LiveView::new(LayoutVersion::V4);
        assert!(matches!(live.click("x"), Err(LiveViewError::UnknownPanel(_))));
    }

    #[test]
    fn test_snapshot_written_after_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.html");
        let mut live = LiveView::new(LayoutVersion::V4).with_snapshot(&path);
        live.handle_frame(r#"{"imgs":[[{"name":"a","title":"A","desc":"hot"}]]}"#)
            .unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("thermocam-current.jpg?c=1"));
        assert!(html.contains("a.jpg?c=1"));
        assert!(!dir.path().join("live.html.tmp").exists());
    }

    #[test]
    fn test_snapshot_failure_still_applies_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("live.html");
        let mut live = LiveView::new(LayoutVersion::V1).with_snapshot(&path);
        let summary = live
            .handle_frame(r#"{"imgs":[{"name":"a","title":"A","desc":""}]}"#)
            .unwrap();
        assert_eq!(summary.counter, 1);
        assert_eq!(live.renderer().counter(), 1);
        assert_eq!(live.renderer().page().panels().len(), 1);
        assert_eq!(live.last_summary(), Some(summary));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_atomic_removes_temp_file_when_rename_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("live.html");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        let err = write_atomic(&target, "<html></html>").unwrap_err();
        assert!(matches!(err, LiveViewError::Io(_)), "got {err:?}");
        assert!(!dir.path().join("live.html.tmp").exists());
        assert!(target.is_dir());
    }
}
