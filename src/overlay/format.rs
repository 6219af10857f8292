const NBSP: char = '\u{00A0}';

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Two-decimal rendering with the same spelling for non-finite values as a
/// browser would print them (`NaN`, `Infinity`).
pub fn fixed2(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        format!("{:.2}", round2(value))
    }
}

/// de-DE euro formatting: `1.887,50 €` with a non-breaking space before the sign.
pub fn format_eur(value: f64) -> String {
    if value.is_nan() {
        return format!("NaN{NBSP}€");
    }
    if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{sign}∞{NBSP}€");
    }

    let cents = (value.abs() * 100.0).round() as u128;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    let whole = group_thousands(cents / 100);

    format!("{sign}{whole},{:02}{NBSP}€", cents % 100)
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }

    out
}
