use once_cell::sync::Lazy;
use regex::Regex;

/// First `integer(.fraction)?` run in the stripped cell text.
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("number regex must be valid"));

/// Parse a raw bulletin cell into a price.
///
/// Strips currency markers (`B/.`, `$`), whitespace and thousands-separator
/// commas while keeping the decimal point, then parses the first numeric
/// substring. Empty or non-numeric input yields `None`; this never errors.
pub fn clean_price(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // `B/.` must go as a unit so the currency dot is not confused with the
    // decimal separator of the amount itself.
    let stripped: String = trimmed
        .replace("B/.", "")
        .replace("b/.", "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$' && *c != ',')
        .collect();

    let m = NUMBER_RE.find(&stripped)?;
    m.as_str().parse::<f64>().ok().filter(|p| p.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_currency_formatted_cell() {
        assert_eq!(clean_price("B/.1,234.56"), Some(1234.56));
        assert_eq!(clean_price("B/. 1,234.56"), Some(1234.56));
        assert_eq!(clean_price("$ 950.00"), Some(950.0));
    }

    #[test]
    fn parses_plain_numbers() {
        assert_eq!(clean_price("150.00"), Some(150.0));
        assert_eq!(clean_price("150"), Some(150.0));
        assert_eq!(clean_price("  1,050 "), Some(1050.0));
    }

    #[test]
    fn empty_and_non_numeric_yield_none() {
        assert_eq!(clean_price(""), None);
        assert_eq!(clean_price("   "), None);
        assert_eq!(clean_price("N/D"), None);
        assert_eq!(clean_price("sin datos"), None);
    }

    #[test]
    fn takes_first_numeric_run() {
        assert_eq!(clean_price("120.50 - 130.00"), Some(120.5));
    }
}
