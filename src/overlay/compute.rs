use super::format::{fixed2, format_eur, round2};
use super::models::{Computed, ListingFigures, Overlay, Parameters};

pub fn compute(figures: &ListingFigures, params: &Parameters) -> Computed {
    let price = figures.price;

    Computed {
        required_monthly: round2(price / params.factor / 12.0),
        price_per_area: round2(price / figures.area),
        monthly_mortgage: round2(price * (params.interest_rate + params.clearance_rate) / 12.0),
    }
}

pub fn build_overlay(computed: &Computed, params: &Parameters) -> Overlay {
    Overlay {
        lines: vec![
            format!(
                "Benötigte Miete (Factor {}): {}",
                params.factor,
                format_eur(computed.required_monthly)
            ),
            format!("Price per m²: {} €/m²", fixed2(computed.price_per_area)),
            format!("Monthly mortgage: {}", format_eur(computed.monthly_mortgage)),
        ],
    }
}
