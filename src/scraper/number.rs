/// Magnitude suffixes in the order they are tested. The first suffix present
/// in the text whose remainder parses wins, not the longest one.
const MULTIPLIERS: [(&str, f64); 5] = [
    ("k", 1_000.0),
    ("m", 1_000_000.0),
    ("b", 1_000_000_000.0),
    ("万", 10_000.0),
    ("億", 100_000_000.0),
];

/// Parse a human-readable count such as `"1,234"`, `"1.2K"` or `"500万"`.
///
/// Returns 0 when nothing numeric can be recovered.
pub fn parse_count(text: &str) -> u64 {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && *c != ' ')
        .collect::<String>()
        .to_lowercase();

    if cleaned.is_empty() {
        return 0;
    }

    for (suffix, multiplier) in MULTIPLIERS {
        if !cleaned.contains(suffix) {
            continue;
        }
        let number_part = cleaned.replace(suffix, "");
        if let Ok(number) = number_part.parse::<f64>() {
            let value = (number * multiplier).round();
            if value.is_finite() && value >= 0.0 {
                return value as u64;
            }
        }
    }

    let digits: String = cleaned.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<u64>().unwrap_or(0)
}
