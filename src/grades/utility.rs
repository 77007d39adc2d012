/// Rounds to three decimal places, ties to even.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round_ties_even() / 1000.0
}

/// Divides `points` by `credits`, rounded to three places. Zero credits yield 0.0.
pub fn weighted_average(points: f64, credits: f64) -> f64 {
    if credits == 0.0 {
        return 0.0;
    }
    round3(points / credits)
}

/// Trims and collapses inner whitespace runs into a single space.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
