use crate::error::ParameterError;

/// Financing parameters as used by the engine. Rates are fractions
/// (`0.0375` for 3.75 %), the factor is a plain divisor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub interest_rate: f64,
    pub clearance_rate: f64,
    pub factor: f64,
}

impl Parameters {
    pub fn new(interest_rate: f64, clearance_rate: f64, factor: f64) -> Result<Self, ParameterError> {
        if interest_rate.is_nan() || interest_rate < 0.0 {
            return Err(ParameterError::Negative { field: "interestRate", value: interest_rate });
        }
        if clearance_rate.is_nan() || clearance_rate < 0.0 {
            return Err(ParameterError::Negative { field: "clearanceRate", value: clearance_rate });
        }
        if factor.is_nan() || factor <= 0.0 {
            return Err(ParameterError::NonPositiveFactor(factor));
        }

        Ok(Self {
            interest_rate,
            clearance_rate,
            factor,
        })
    }
}

/// Raw and parsed figures scraped from one listing.
#[derive(Debug, Clone)]
pub struct ListingFigures {
    pub price_text: String,
    pub area_text: String,
    pub price: f64,
    pub area: f64,
}

/// Derived values for one listing, each rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Computed {
    pub required_monthly: f64,
    pub price_per_area: f64,
    pub monthly_mortgage: f64,
}

impl Computed {
    pub fn is_finite(&self) -> bool {
        self.required_monthly.is_finite()
            && self.price_per_area.is_finite()
            && self.monthly_mortgage.is_finite()
    }
}

/// Text panel attached to a listing's image carousel.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub lines: Vec<String>,
}

impl Overlay {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub listings: usize,
    pub rendered: usize,
    pub missing_fields: usize,
    pub missing_anchor: usize,
    pub non_finite: usize,
    pub failed: usize,
}
