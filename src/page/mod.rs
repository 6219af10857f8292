//! Access to the host page.
//!
//! The overlay engine only talks to [`PageQuery`], so it runs the same against
//! a parsed result page on disk or any other page model.

use crate::overlay::models::Overlay;

pub mod html;

pub use html::HtmlPage;

/// Read/write capability over a page tree.
pub trait PageQuery {
    type Node: Copy;

    /// All elements matching `selector`, searched below `within` or the whole page.
    fn find_all(&self, selector: &str, within: Option<Self::Node>) -> anyhow::Result<Vec<Self::Node>>;

    /// First element below `within` matching `selector`.
    fn find_first(&self, selector: &str, within: Self::Node) -> anyhow::Result<Option<Self::Node>>;

    /// Concatenated text content of `node`.
    fn text(&self, node: Self::Node) -> String;

    /// Drops every overlay under `anchor` and attaches `overlay` in its place.
    fn replace_overlay(&mut self, anchor: Self::Node, overlay: &Overlay) -> anyhow::Result<()>;
}

/// Selectors and labels describing the host site's result list markup.
#[derive(Debug, Clone)]
pub struct Markup {
    pub container: String,
    pub listing: String,
    pub field: String,
    pub label: String,
    pub value: String,
    pub anchor: String,
    pub price_label: String,
    pub area_label: String,
}

impl Default for Markup {
    fn default() -> Self {
        Self {
            container: ".result-list".into(),
            listing: ".result-list__listing".into(),
            field: "dl".into(),
            label: "dt".into(),
            value: "dd".into(),
            anchor: ".slick-list".into(),
            price_label: "Kaufpreis".into(),
            area_label: "Wohnfläche".into(),
        }
    }
}
