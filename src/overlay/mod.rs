use tracing::{debug, info, warn};

use crate::overlay::models::{ListingFigures, Parameters, RunSummary};
use crate::page::{Markup, PageQuery};

pub mod compute;
pub mod format;
pub mod models;
pub mod parser;

/// Scans every listing on a page and (re)attaches its affordability overlay.
pub struct OverlayEngine {
    markup: Markup,
}

impl OverlayEngine {
    pub fn new(markup: Markup) -> Self {
        Self { markup }
    }

    pub fn run<P: PageQuery>(&self, page: &mut P, params: &Parameters) -> anyhow::Result<RunSummary> {
        let listings = page.find_all(&self.markup.listing, None)?;
        let mut summary = RunSummary {
            listings: listings.len(),
            ..RunSummary::default()
        };

        info!(count = listings.len(), "Updating overlays");

        for (idx, listing) in listings.into_iter().enumerate() {
            let n = idx + 1;

            let Some(figures) = self.extract(page, listing)? else {
                debug!(listing = n, "Price or area field not found");
                summary.missing_fields += 1;
                continue;
            };

            debug!(
                listing = n,
                price_text = %figures.price_text.trim(),
                area_text = %figures.area_text.trim(),
                price = figures.price,
                area = figures.area,
                "Parsed listing"
            );

            let computed = compute::compute(&figures, params);
            if !computed.is_finite() {
                warn!(listing = n, ?computed, "Non-finite value, rendering as is");
                summary.non_finite += 1;
            }

            debug!(
                listing = n,
                required_monthly = computed.required_monthly,
                price_per_area = computed.price_per_area,
                monthly_mortgage = computed.monthly_mortgage,
                "Computed listing"
            );

            let Some(anchor) = page.find_first(&self.markup.anchor, listing)? else {
                debug!(listing = n, "No carousel to anchor overlay");
                summary.missing_anchor += 1;
                continue;
            };

            let overlay = compute::build_overlay(&computed, params);
            if let Err(e) = page.replace_overlay(anchor, &overlay) {
                warn!(listing = n, error = %e, "Failed to attach overlay");
                summary.failed += 1;
                continue;
            }
            summary.rendered += 1;
        }

        info!(
            listings = summary.listings,
            rendered = summary.rendered,
            missing_fields = summary.missing_fields,
            missing_anchor = summary.missing_anchor,
            failed = summary.failed,
            "Overlay run finished"
        );

        Ok(summary)
    }

    fn extract<P: PageQuery>(&self, page: &P, listing: P::Node) -> anyhow::Result<Option<ListingFigures>> {
        let fields = page.find_all(&self.markup.field, Some(listing))?;

        let mut price_text = None;
        let mut area_text = None;
        for field in fields {
            let Some(label) = page.find_first(&self.markup.label, field)? else {
                continue;
            };
            let label = page.text(label);
            let label = label.trim();

            // first matching field wins
            let slot = if label == self.markup.price_label {
                &mut price_text
            } else if label == self.markup.area_label {
                &mut area_text
            } else {
                continue;
            };
            if slot.is_some() {
                continue;
            }

            // a matching field without a value reads as empty text
            let value = page.find_first(&self.markup.value, field)?;
            *slot = Some(value.map(|v| page.text(v)).unwrap_or_default());
        }

        let (Some(price_text), Some(area_text)) = (price_text, area_text) else {
            return Ok(None);
        };

        Ok(Some(ListingFigures {
            price: parser::parse_price(&price_text),
            area: parser::parse_area(&area_text),
            price_text,
            area_text,
        }))
    }

    /// Whether the page has a listings container to watch.
    pub fn has_container<P: PageQuery>(&self, page: &P) -> anyhow::Result<bool> {
        Ok(!page.find_all(&self.markup.container, None)?.is_empty())
    }
}
