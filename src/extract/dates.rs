use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Inclusive date range a bulletin covers. A single-date bulletin has
/// `desde == hasta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub desde: NaiveDate,
    pub hasta: NaiveDate,
}

/// Ordered patterns for free text; first match wins.
static TEXT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "Del 01-03-24 al 07-03-24", also "/" separators
        r"(?i)del\s+(\d{1,2})\s*[-/]\s*(\d{1,2})\s*[-/]\s*(\d{2,4})\s+(?:al|a)\s+(\d{1,2})\s*[-/]\s*(\d{1,2})\s*[-/]\s*(\d{2,4})",
        // bare "01-03-24 al 07-03-24" / "01-03-24 - 07-03-24"
        r"(\d{1,2})\s*[-/]\s*(\d{1,2})\s*[-/]\s*(\d{2,4})\s+(?:al|a|-)\s+(\d{1,2})\s*[-/]\s*(\d{1,2})\s*[-/]\s*(\d{2,4})",
        // "Semana ... 05-03-24" — single date
        r"(?i)semana.*?(\d{1,2})\s*[-/]\s*(\d{1,2})\s*[-/]\s*(\d{2,4})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("date regex must be valid"))
    .collect()
});

/// Filename pattern: "Del DD-MM-YY al DD-MM-YY", with the "Del"/"al" words
/// optional since filenames are often squashed.
static FILENAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:del)?\s*(\d{1,2})-(\d{1,2})-(\d{2,4})\s*(?:al|a|-)?\s*(\d{1,2})-(\d{1,2})-(\d{2,4})",
    )
    .expect("filename date regex must be valid")
});

/// Resolve a date range from free text, trying each pattern in order.
/// Malformed or invalid calendar dates yield `None`, never an error.
pub fn from_text(text: &str) -> Option<DateRange> {
    for re in TEXT_PATTERNS.iter() {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let groups: Vec<&str> = caps
            .iter()
            .skip(1)
            .filter_map(|m| m.map(|m| m.as_str()))
            .collect();
        // A match with an invalid calendar date falls through to the next
        // pattern rather than aborting resolution.
        let range = match groups.as_slice() {
            [d1, m1, y1, d2, m2, y2] => build_date(d1, m1, y1)
                .zip(build_date(d2, m2, y2))
                .map(|(desde, hasta)| DateRange { desde, hasta }),
            [d, m, y] => build_date(d, m, y).map(|date| DateRange {
                desde: date,
                hasta: date,
            }),
            _ => None,
        };
        if let Some(range) = range {
            return Some(range);
        }
    }
    None
}

/// Resolve a date range from a bulletin filename.
pub fn from_filename(filename: &str) -> Option<DateRange> {
    let caps = FILENAME_PATTERN.captures(filename)?;
    let desde = build_date(&caps[1], &caps[2], &caps[3])?;
    let hasta = build_date(&caps[4], &caps[5], &caps[6])?;
    Some(DateRange { desde, hasta })
}

/// Resolve from text first, falling back to the filename.
pub fn resolve(text: &str, filename: &str) -> Option<DateRange> {
    from_text(text).or_else(|| from_filename(filename))
}

fn build_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let mut year: i32 = year.parse().ok()?;
    // Two-digit years are 2000-based.
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
