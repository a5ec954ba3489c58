//! Field normalizers shared by every loader.
//!
//! These are pure functions converting raw cell values into the canonical
//! forms the metadata API expects: titles, dates, media counts, prices and
//! page counts. Identifier canonicalization lives in [`crate::identifiers`].

use std::sync::LazyLock;

use crate::error::ValueError;
use crate::regex::Regex;

static INT_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)").unwrap());

static VIDEO_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,3}) \(vid\)").unwrap());

static AUDIO_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,3}) \(aud\)").unwrap());

static ROMAN_PAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([ivxlcdm]+)\b").unwrap());

static ARABIC_PAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:pages|p\.?)").unwrap());

/// A work title with its optional subtitle and the joined full title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Title {
    pub title: String,
    pub subtitle: Option<String>,
    pub full_title: String,
}

impl Title {
    /// Builds a title from separate title and subtitle values.
    ///
    /// The parts are joined with `": "`, or with a single space when the title
    /// already ends in a question mark. An empty subtitle counts as absent.
    ///
    /// ```
    /// use bibingest::normalize::Title;
    ///
    /// let t = Title::from_parts("Why Read?", Some("A Defence"));
    /// assert_eq!(t.full_title, "Why Read? A Defence");
    /// ```
    #[must_use]
    pub fn from_parts(title: &str, subtitle: Option<&str>) -> Self {
        let title = title.trim();
        let subtitle = subtitle.map(str::trim).filter(|s| !s.is_empty());
        let full_title = match subtitle {
            Some(sub) => {
                let joiner = if title.ends_with('?') { " " } else { ": " };
                format!("{title}{joiner}{sub}")
            }
            None => title.to_string(),
        };
        Title {
            title: title.to_string(),
            subtitle: subtitle.map(String::from),
            full_title,
        }
    }

    /// Splits a combined title on its colon.
    ///
    /// Only a string with exactly one colon is split; anything else is kept
    /// whole as the title with no subtitle. A trailing colon is dropped.
    #[must_use]
    pub fn split(full_title: &str) -> Self {
        let full_title = full_title.trim();
        let parts: Vec<&str> = full_title.split(':').collect();
        match parts.as_slice() {
            [title, subtitle] if !subtitle.trim().is_empty() => Title {
                title: title.trim().to_string(),
                subtitle: Some(subtitle.trim().to_string()),
                full_title: full_title.to_string(),
            },
            // a dangling colon carries no subtitle
            [title, _] => Title::from_parts(title, None),
            _ => {
                if parts.len() > 2 {
                    log::debug!("title has {} colons, not splitting: {full_title}", parts.len() - 1);
                }
                Title {
                    title: full_title.to_string(),
                    subtitle: None,
                    full_title: full_title.to_string(),
                }
            }
        }
    }
}

/// Normalizes a publication date.
///
/// A bare year becomes the first of January, an eight digit `YYYYMMDD` value
/// gets hyphens, and anything else has slashes replaced by hyphens.
pub fn date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    // spreadsheets often export whole numbers as floats
    let raw = raw.strip_suffix(".0").unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }
    let all_digits = raw.chars().all(|c| c.is_ascii_digit());
    if all_digits && raw.len() == 4 {
        return Some(format!("{raw}-01-01"));
    }
    if all_digits && raw.len() == 8 {
        return Some(format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..8]));
    }
    Some(raw.replace('/', "-").trim().to_string())
}

/// Returns `(audio_count, video_count)` from a free-text media cell.
///
/// A bare integer counts as audio. Annotated cells such as `"2 (vid)"` or
/// `"1 (aud)"` route the number to the matching count.
pub fn media(cell: Option<&str>) -> (u32, u32) {
    let Some(cell) = cell.map(str::trim).filter(|c| !c.is_empty()) else {
        return (0, 0);
    };
    if let Ok(count) = cell.parse::<u32>() {
        return (count, 0);
    }
    let capture = |re: &Regex| {
        re.captures(cell)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    (capture(&AUDIO_COUNT), capture(&VIDEO_COUNT))
}

/// Parses a price cell, ignoring currency symbols.
pub fn price(raw: &str) -> Option<f64> {
    raw.replace(['$', '£', '€'], "").trim().parse::<f64>().ok()
}

/// Converts inches to whole millimetres.
#[must_use]
pub fn in_to_mm(inches: f64) -> i32 {
    (inches * 25.4).round() as i32
}

/// Removes line breaks and surrounding whitespace.
pub fn clean(raw: &str) -> String {
    raw.replace(['\n', '\r'], "").trim().to_string()
}

/// Joins first and last page numbers into a page interval.
pub fn page_interval(first: &str, last: &str) -> String {
    format!("{}–{}", first.trim(), last.trim())
}

/// Parses an optional integer cell.
///
/// Empty cells are `None`; values like `"12.0"` are accepted because
/// spreadsheet exports write whole numbers that way.
pub fn int_cell(field: &str, raw: Option<&str>) -> Result<Option<i32>, ValueError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    let digits = raw.strip_suffix(".0").unwrap_or(raw);
    digits
        .parse::<i32>()
        .map(Some)
        .map_err(|_| ValueError::invalid_number(field, raw))
}

/// Leading integer of a cell, ignoring trailing text.
pub fn leading_int(raw: &str) -> Option<i32> {
    INT_PREFIX
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Splits a delimited list cell on any of `separators`, dropping blanks.
pub fn split_list(raw: &str, separators: &[char]) -> Vec<String> {
    raw.split(|c| separators.contains(&c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Converts a lower or upper case roman numeral.
pub fn roman_to_decimal(numeral: &str) -> Option<u32> {
    let value = |c: char| match c.to_ascii_lowercase() {
        'i' => Some(1),
        'v' => Some(5),
        'x' => Some(10),
        'l' => Some(50),
        'c' => Some(100),
        'd' => Some(500),
        'm' => Some(1000),
        _ => None,
    };
    let digits: Option<Vec<u32>> = numeral.chars().map(value).collect();
    let digits = digits.filter(|d| !d.is_empty())?;
    let mut total = 0;
    for (i, d) in digits.iter().enumerate() {
        match digits.get(i + 1) {
            Some(next) if next > d => total -= *d as i64,
            _ => total += *d as i64,
        }
    }
    u32::try_from(total).ok().filter(|t| *t > 0)
}

/// Reads a physical description such as `"xii, 204 pages"`.
///
/// Returns the total page count (front matter plus body) and a breakdown in
/// the `"xii+204"` form.
pub fn page_string(raw: &str) -> (Option<i32>, Option<String>) {
    let arabic = ARABIC_PAGES
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let Some(arabic) = arabic else {
        return (leading_int(raw), None);
    };
    let body: i32 = arabic.parse().unwrap_or(0);
    let roman = ROMAN_PAGES
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|r| roman_to_decimal(r).is_some());
    match roman {
        Some(front) => {
            let front_count = roman_to_decimal(&front).unwrap_or(0) as i32;
            (Some(front_count + body), Some(format!("{front}+{arabic}")))
        }
        None => (Some(body), None),
    }
}
