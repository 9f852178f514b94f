//! In-memory page model: the primary camera image, the `webimgs` container
//! and one panel per image name.
//!
//! The page owns its panels outright. Lookup by name is the renderer's job;
//! the page only stores panels in container order and renders them as HTML.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::layout::{GridPos, LayoutVersion, Placement};
use crate::protocol::{HeatSource, ImageDescriptor};

/// Element id of the primary camera image.
pub const CAMERA_ID: &str = "camera";
/// Element id of the panel container.
pub const CONTAINER_ID: &str = "webimgs";

/// An `<img>` element. `src` stays `None` until the first refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageElement {
    pub src: Option<String>,
    pub grayscale: bool,
}

/// The subtree for one named image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub name: String,
    /// `title` as it was when the panel was created.
    pub heading: String,
    /// Link target for the raw frame.
    pub raw_href: String,
    pub image: ImageElement,
    pub caption: String,
    /// Auto-refresh checkbox; only present on toggle layouts.
    pub toggle: Option<bool>,
    pub grid: Option<GridPos>,
    /// Group index of the row container holding this panel.
    pub row: Option<usize>,
}

impl Panel {
    pub(crate) fn new(desc: &ImageDescriptor, placement: Placement, with_toggle: bool) -> Self {
        let (grid, row) = match placement {
            Placement::Append => (None, None),
            Placement::Row(group) => (None, Some(group)),
            Placement::Grid(pos) => (Some(pos), None),
        };
        Self {
            name: desc.name.clone(),
            heading: desc.title.clone(),
            raw_href: format!("{}.tiff", desc.name),
            image: ImageElement::default(),
            caption: String::new(),
            toggle: with_toggle.then_some(true),
            grid,
            row,
        }
    }

    /// Whether the next batch should refresh this panel's image. Panels
    /// without a toggle always refresh.
    pub fn refresh_enabled(&self) -> bool {
        self.toggle.unwrap_or(true)
    }
}

/// A v2 row container: panels for one group index, in append order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub group: usize,
    /// Indices into the page's panel list.
    pub panels: Vec<usize>,
}

/// The viewer's page: camera image, panel container and readouts.
#[derive(Debug, Clone)]
pub struct Page {
    layout: LayoutVersion,
    pub camera: ImageElement,
    panels: Vec<Panel>,
    rows: Vec<Row>,
    pub poi_temps: BTreeMap<String, f64>,
    pub heat_sources: Vec<HeatSource>,
}

impl Page {
    pub fn new(layout: LayoutVersion) -> Self {
        Self {
            layout,
            camera: ImageElement::default(),
            panels: Vec::new(),
            rows: Vec::new(),
            poi_temps: BTreeMap::new(),
            heat_sources: Vec::new(),
        }
    }

    pub fn layout(&self) -> LayoutVersion {
        self.layout
    }

    /// All panels in creation order.
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, idx: usize) -> Option<&Panel> {
        self.panels.get(idx)
    }

    pub fn panel_mut(&mut self, idx: usize) -> Option<&mut Panel> {
        self.panels.get_mut(idx)
    }

    /// Row containers in the order they were created.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Attach a panel exactly once and return its index. Panels placed in a
    /// row create that row on first use.
    pub(crate) fn attach(&mut self, panel: Panel) -> usize {
        let idx = self.panels.len();
        if let Some(group) = panel.row {
            let row = match self.rows.iter().position(|r| r.group == group) {
                Some(pos) => pos,
                None => {
                    self.rows.push(Row {
                        group,
                        panels: Vec::new(),
                    });
                    self.rows.len() - 1
                }
            };
            self.rows[row].panels.push(idx);
        }
        self.panels.push(panel);
        idx
    }

    /// Render the page as a standalone HTML document.
    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(1024 + self.panels.len() * 256);
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str("<title>Thermocam</title>\n<style>\n");
        out.push_str("#webimgs.grid { display: grid; gap: 8px; }\n");
        out.push_str(".row { display: flex; gap: 8px; }\n");
        out.push_str("</style>\n</head>\n<body>\n");

        let _ = writeln!(
            out,
            "<img id=\"{CAMERA_ID}\"{}>",
            src_attr(self.camera.src.as_deref())
        );

        let class = if self.layout.is_grid() { " class=\"grid\"" } else { "" };
        let _ = writeln!(out, "<div id=\"{CONTAINER_ID}\"{class}>");
        if self.rows.is_empty() {
            for panel in &self.panels {
                self.write_panel(&mut out, panel);
            }
        } else {
            for row in &self.rows {
                let _ = writeln!(out, "<div class=\"row\" data-group=\"{}\">", row.group);
                for panel in row.panels.iter().filter_map(|&i| self.panels.get(i)) {
                    self.write_panel(&mut out, panel);
                }
                out.push_str("</div>\n");
            }
        }
        out.push_str("</div>\n");

        if !self.poi_temps.is_empty() || !self.heat_sources.is_empty() {
            out.push_str("<pre id=\"temperatures\">");
            for (name, temp) in &self.poi_temps {
                let _ = writeln!(out, "{}={temp:.2}", escape_html(name));
            }
            if !self.heat_sources.is_empty() {
                let list: Vec<String> = self
                    .heat_sources
                    .iter()
                    .map(|h| format!("{},{},{:.2}", h.x, h.y, h.neg_laplacian))
                    .collect();
                let _ = writeln!(out, "heat_sources={}", list.join(";"));
            }
            out.push_str("</pre>\n");
        }

        out.push_str("</body>\n</html>\n");
        out
    }

    fn write_panel(&self, out: &mut String, panel: &Panel) {
        let name = escape_html(&panel.name);
        match panel.grid {
            Some(pos) => {
                let _ = write!(
                    out,
                    "<div id=\"{name}\" style=\"grid-column: {}; grid-row: {}\">",
                    pos.column, pos.row
                );
            }
            None => {
                let _ = write!(out, "<div id=\"{name}\">");
            }
        }
        let _ = write!(
            out,
            "<h3>{}</h3> <a href=\"{}\">raw</a>",
            escape_html(&panel.heading),
            escape_html(&panel.raw_href)
        );
        if let Some(checked) = panel.toggle {
            let _ = write!(
                out,
                "<input type=\"checkbox\"{}>",
                if checked { " checked" } else { "" }
            );
        }
        let style = if panel.image.grayscale {
            " style=\"filter: grayscale(100%)\""
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "<img{}{style}><div>{}</div></div>",
            src_attr(panel.image.src.as_deref()),
            escape_html(&panel.caption)
        );
    }
}

fn src_attr(src: Option<&str>) -> String {
    match src {
        Some(s) => format!(" src=\"{}\"", escape_html(s)),
        None => String::new(),
    }
}

/// Escape text for use in element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str) -> ImageDescriptor {
        ImageDescriptor {
            name: name.to_string(),
            title: format!("Title {name}"),
            desc: String::new(),
        }
    }

    #[test]
    fn test_new_panel_links_raw_tiff() {
        let p = Panel::new(&desc("detail"), Placement::Append, false);
        assert_eq!(p.raw_href, "detail.tiff");
        assert_eq!(p.heading, "Title detail");
        assert_eq!(p.image.src, None);
        assert_eq!(p.toggle, None);
        assert!(p.refresh_enabled());
    }

    #[test]
    fn test_toggle_panel_starts_checked() {
        let p = Panel::new(&desc("a"), Placement::Append, true);
        assert_eq!(p.toggle, Some(true));
    }

    #[test]
    fn test_attach_creates_each_row_once() {
        let mut page = Page::new(LayoutVersion::V2);
        page.attach(Panel::new(&desc("a"), Placement::Row(1), false));
        page.attach(Panel::new(&desc("b"), Placement::Row(0), false));
        page.attach(Panel::new(&desc("c"), Placement::Row(1), false));
        assert_eq!(page.rows().len(), 2);
        assert_eq!(page.rows()[0], Row { group: 1, panels: vec![0, 2] });
        assert_eq!(page.rows()[1], Row { group: 0, panels: vec![1] });
    }

    #[test]
    fn test_html_v2_wraps_panels_in_group_rows() {
        let mut page = Page::new(LayoutVersion::V2);
        page.attach(Panel::new(&desc("a"), Placement::Row(1), false));
        page.attach(Panel::new(&desc("b"), Placement::Row(0), false));
        page.attach(Panel::new(&desc("c"), Placement::Row(1), false));
        let html = page.to_html();

        assert!(html.contains("<div id=\"webimgs\">"));
        let row1 = html.find("<div class=\"row\" data-group=\"1\">").expect("row 1");
        let row0 = html.find("<div class=\"row\" data-group=\"0\">").expect("row 0");
        assert!(row1 < row0, "rows follow creation order");

        let at = |id: &str| html.find(&format!("<div id=\"{id}\">")).unwrap();
        assert!(row1 < at("a") && at("a") < at("c") && at("c") < row0);
        assert!(row0 < at("b"));
        assert_eq!(html.matches("<div class=\"row\"").count(), 2);
    }

    #[test]
    fn test_escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<b class="x">&'</b>"#),
            "&lt;b class=&quot;x&quot;&gt;&amp;&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_html_contains_scaffold_ids() {
        let page = Page::new(LayoutVersion::V1);
        let html = page.to_html();
        assert!(html.contains("<img id=\"camera\">"));
        assert!(html.contains("<div id=\"webimgs\">"));
        assert!(!html.contains("temperatures"));
    }

    #[test]
    fn test_html_grid_panel_has_coordinates_and_grayscale() {
        let mut page = Page::new(LayoutVersion::V4);
        let mut panel = Panel::new(
            &desc("a"),
            Placement::Grid(GridPos { column: 2, row: 1 }),
            true,
        );
        panel.toggle = Some(false);
        panel.image.grayscale = true;
        page.attach(panel);
        let html = page.to_html();
        assert!(html.contains("<div id=\"webimgs\" class=\"grid\">"));
        assert!(html.contains("grid-column: 2; grid-row: 1"));
        assert!(html.contains("filter: grayscale(100%)"));
        assert!(html.contains("<input type=\"checkbox\">"));
    }

    #[test]
    fn test_html_escapes_caption() {
        let mut page = Page::new(LayoutVersion::V1);
        let idx = page.attach(Panel::new(&desc("a"), Placement::Append, false));
        page.panel_mut(idx).unwrap().caption = "<script>".to_string();
        assert!(page.to_html().contains("<div>&lt;script&gt;</div>"));
    }

    #[test]
    fn test_html_lists_point_temperatures() {
        let mut page = Page::new(LayoutVersion::V3);
        page.poi_temps.insert("cpu".to_string(), 41.25);
        page.heat_sources.push(HeatSource { x: 1.0, y: 2.0, neg_laplacian: 0.5 });
        let html = page.to_html();
        assert!(html.contains("cpu=41.25"), "{html}");
        assert!(html.contains("heat_sources=1,2,0.50"), "{html}");
    }
}
