use regex::Regex;
use std::sync::LazyLock;

static NON_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]").expect("static regex"));

static NON_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.]").expect("static regex"));

/// Listing prices are whole euros with "." grouping ("453.000 €"), so every
/// non-digit is dropped. Returns NaN when no digit is left.
pub fn parse_price(text: &str) -> f64 {
    let digits = NON_DIGIT.replace_all(text, "");
    digits.parse::<f64>().unwrap_or(f64::NAN)
}

/// German decimal notation: "1.024,5 m²" -> 1024.5. Returns NaN when nothing
/// numeric is left.
pub fn parse_area(text: &str) -> f64 {
    let ungrouped = text.replace('.', "");
    let pointed = ungrouped.replacen(',', ".", 1);
    let cleaned = NON_DECIMAL.replace_all(&pointed, "");
    cleaned.parse::<f64>().unwrap_or(f64::NAN)
}
