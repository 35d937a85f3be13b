//! Display formatting for amounts shown in the fee table.

/// Placeholder for amounts that do not apply (no capacity, no fee).
pub const DASH: &str = "-";

/// `500000` → `"500,000"`.
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Currency amount with grouping and exactly two decimals: `1234.5` → `"1,234.50"`.
pub fn fiat(value: f64) -> String {
    if !value.is_finite() {
        return DASH.to_owned();
    }
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let whole = whole.parse::<u64>().map(group_digits).unwrap_or_else(|_| whole.to_owned());
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{whole}.{cents}")
}

/// Fractional rate as a percentage with at most two decimals: `0.03` → `"3%"`, `0.005` → `"0.5%"`.
pub fn percent(rate: f64) -> String {
    if !rate.is_finite() {
        return DASH.to_owned();
    }
    let fixed = format!("{:.2}", rate * 100.0);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}%")
}
