use std::path::Path;

use anyhow::Context;
use ego_tree::{NodeId, NodeRef, Tree};
use scraper::{ElementRef, Html, Node, Selector};

use super::PageQuery;
use crate::error::PageError;
use crate::overlay::models::Overlay;

pub const OVERLAY_CLASS: &str = "price-overlay";

const OVERLAY_STYLE: &str = "position: absolute; top: 25px; left: 10px; \
    background-color: rgba(0, 0, 0, 0.5); color: white; padding: 5px; border-radius: 5px";

/// A parsed result page. Overlays and the toolbar are grafted straight into
/// the document tree, so [`HtmlPage::to_html`] yields the annotated page.
pub struct HtmlPage {
    doc: Html,
}

impl HtmlPage {
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let html = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading page {}", path.display()))?;
        Ok(Self::parse(&html))
    }

    pub fn to_html(&self) -> String {
        self.doc.html()
    }

    /// Appends the elements of `fragment` to the end of `<body>`.
    pub fn append_to_body(&mut self, fragment: &str) -> anyhow::Result<()> {
        let body_sel = selector("body")?;
        let body = self
            .doc
            .root_element()
            .select(&body_sel)
            .next()
            .map(|b| b.id())
            .ok_or(PageError::MissingBody)?;

        let fragment = Html::parse_fragment(fragment);
        for child in fragment.root_element().children() {
            graft(&mut self.doc.tree, body, child);
        }

        Ok(())
    }

    /// Detaches every match below `within` (or anywhere) and returns how many went.
    pub fn remove_all(&mut self, selector_text: &str, within: Option<NodeId>) -> anyhow::Result<usize> {
        let matches = self.find_all(selector_text, within)?;
        let count = matches.len();
        for id in matches {
            if let Some(mut node) = self.doc.tree.get_mut(id) {
                node.detach();
            }
        }
        Ok(count)
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.doc.tree.get(id).and_then(ElementRef::wrap)
    }

    /// Rebuilds the element with `position: relative` merged into its style.
    fn set_relative(&mut self, id: NodeId) -> anyhow::Result<()> {
        let Some(el) = self.element(id) else {
            return Ok(());
        };

        let name = el.value().name().to_string();
        let mut attrs = String::new();
        let mut style = None;
        for (key, value) in el.value().attrs() {
            if key == "style" {
                style = Some(value.to_string());
            } else {
                attrs.push_str(&format!(" {key}=\"{}\"", escape_attr(value)));
            }
        }

        let style = merge_position(style.as_deref().unwrap_or(""), "relative");
        let markup = format!("<{name}{attrs} style=\"{}\"></{name}>", escape_attr(&style));
        let fragment = Html::parse_fragment(&markup);
        let replacement = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)
            .ok_or_else(|| PageError::EmptyFragment(markup.clone()))?
            .value()
            .clone();

        if let Some(mut node) = self.doc.tree.get_mut(id) {
            *node.value() = Node::Element(replacement);
        }
        Ok(())
    }
}

impl PageQuery for HtmlPage {
    type Node = NodeId;

    fn find_all(&self, selector_text: &str, within: Option<NodeId>) -> anyhow::Result<Vec<NodeId>> {
        let sel = selector(selector_text)?;
        // Start from the root element: detached nodes stay in the arena and
        // must not match again.
        let scope = match within {
            Some(id) => match self.element(id) {
                Some(el) => el,
                None => return Ok(Vec::new()),
            },
            None => self.doc.root_element(),
        };

        Ok(scope.select(&sel).map(|el| el.id()).collect())
    }

    fn find_first(&self, selector_text: &str, within: NodeId) -> anyhow::Result<Option<NodeId>> {
        let sel = selector(selector_text)?;
        Ok(self
            .element(within)
            .and_then(|el| el.select(&sel).next())
            .map(|el| el.id()))
    }

    fn text(&self, node: NodeId) -> String {
        self.element(node)
            .map(|el| el.text().collect())
            .unwrap_or_default()
    }

    fn replace_overlay(&mut self, anchor: NodeId, overlay: &Overlay) -> anyhow::Result<()> {
        self.remove_all(&format!(".{OVERLAY_CLASS}"), Some(anchor))?;
        self.set_relative(anchor)?;

        let lines: Vec<String> = overlay.lines.iter().map(|l| escape_text(l)).collect();
        let markup = format!(
            "<div class=\"{OVERLAY_CLASS}\" style=\"{OVERLAY_STYLE}\">{}</div>",
            lines.join("<br>")
        );
        let fragment = Html::parse_fragment(&markup);
        for child in fragment.root_element().children() {
            graft(&mut self.doc.tree, anchor, child);
        }

        Ok(())
    }
}

fn selector(text: &str) -> Result<Selector, PageError> {
    Selector::parse(text).map_err(|e| PageError::InvalidSelector {
        selector: text.to_string(),
        reason: e.to_string(),
    })
}

/// Deep-copies `source` (from another document) under `parent`.
fn graft(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) {
    let Some(mut parent) = tree.get_mut(parent) else {
        return;
    };
    let id = parent.append(source.value().clone()).id();

    for child in source.children() {
        graft(tree, id, child);
    }
}

fn merge_position(style: &str, position: &str) -> String {
    let mut decls: Vec<String> = style
        .split(';')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .filter(|d| {
            d.split(':')
                .next()
                .map(|prop| !prop.trim().eq_ignore_ascii_case("position"))
                .unwrap_or(true)
        })
        .map(str::to_string)
        .collect();

    decls.push(format!("position: {position}"));
    decls.join("; ")
}

pub(crate) fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <ul class="result-list">
          <li class="result-list__listing">
            <div class="slick-list" style="height: 200px; position: static"></div>
            <dl><dt> Kaufpreis </dt><dd>453.000 €</dd></dl>
          </li>
        </ul>
    </body></html>"#;

    fn overlay(text: &str) -> Overlay {
        Overlay {
            lines: vec![text.to_string(), "second".to_string()],
        }
    }

    #[test]
    fn finds_nested_elements_and_text() {
        let page = HtmlPage::parse(PAGE);
        let listings = page.find_all(".result-list__listing", None).unwrap();
        assert_eq!(listings.len(), 1);

        let dt = page.find_first("dt", listings[0]).unwrap().unwrap();
        assert_eq!(page.text(dt).trim(), "Kaufpreis");
        assert!(page.find_first(".missing", listings[0]).unwrap().is_none());
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let page = HtmlPage::parse(PAGE);
        assert!(page.find_all("dl[", None).is_err());
    }

    #[test]
    fn replacing_keeps_a_single_overlay() {
        let mut page = HtmlPage::parse(PAGE);
        let anchor = page.find_all(".slick-list", None).unwrap()[0];

        page.replace_overlay(anchor, &overlay("first run")).unwrap();
        page.replace_overlay(anchor, &overlay("second run")).unwrap();

        let overlays = page.find_all(".price-overlay", None).unwrap();
        assert_eq!(overlays.len(), 1);
        assert_eq!(page.text(overlays[0]), "second runsecond");

        let html = page.to_html();
        assert!(!html.contains("first run"));
        assert!(html.contains("second run<br>second"));
    }

    #[test]
    fn anchor_becomes_relatively_positioned() {
        let mut page = HtmlPage::parse(PAGE);
        let anchor = page.find_all(".slick-list", None).unwrap()[0];
        page.replace_overlay(anchor, &overlay("x")).unwrap();

        // same node id, rebuilt element
        let anchors = page.find_all(".slick-list", None).unwrap();
        assert_eq!(anchors, vec![anchor]);
        let html = page.to_html();
        assert!(html.contains(r#"style="height: 200px; position: relative""#));
    }

    #[test]
    fn overlay_text_is_escaped() {
        let mut page = HtmlPage::parse(PAGE);
        let anchor = page.find_all(".slick-list", None).unwrap()[0];
        page.replace_overlay(anchor, &overlay("<b>&</b>")).unwrap();

        let overlays = page.find_all(".price-overlay", None).unwrap();
        assert!(page.text(overlays[0]).starts_with("<b>&</b>"));
        assert!(page.find_all(".price-overlay b", None).unwrap().is_empty());
    }

    #[test]
    fn appends_fragment_to_body() {
        let mut page = HtmlPage::parse(PAGE);
        page.append_to_body(r#"<div id="bar"><button>Go</button></div>"#)
            .unwrap();

        let bar = page.find_all("body > #bar button", None).unwrap();
        assert_eq!(bar.len(), 1);
        assert_eq!(page.text(bar[0]), "Go");
    }

    #[test]
    fn removed_nodes_no_longer_match() {
        let mut page = HtmlPage::parse(PAGE);
        assert_eq!(page.remove_all("dl", None).unwrap(), 1);
        assert!(page.find_all("dt", None).unwrap().is_empty());
        assert!(!page.to_html().contains("Kaufpreis"));
    }

    #[test]
    fn merges_position_into_existing_style() {
        assert_eq!(merge_position("", "relative"), "position: relative");
        assert_eq!(
            merge_position("color: red; Position:absolute;", "relative"),
            "color: red; position: relative"
        );
    }
}
