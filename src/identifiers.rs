//! Identifier canonicalizers: ISBN, ISSN, DOI, ORCID, ROR and plain URLs.
//!
//! Every function here is idempotent: feeding its output back in yields the
//! same value.

use std::str::FromStr;
use std::sync::LazyLock;

use isbn2::Isbn;

use crate::error::ValueError;
use crate::regex::Regex;

static ORCID_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"0000-000(1-[5-9]|2-[0-9]|3-[0-4])\d{3}-\d{3}[\dX]").unwrap()
});

static ISSN_FORM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{3}[\dXx]$").unwrap());

/// Length of a hyphenated ISBN-13, e.g. `978-1-234-56789-7`.
pub const ISBN13_HYPHENATED_LEN: usize = 17;

/// Hyphenates an ISBN-10 or ISBN-13.
///
/// Existing hyphens are dropped and placed again from the range table, so a
/// misplaced hyphen comes out in canonical form. Empty values are `None`.
/// Anything that is not a valid ISBN is an error.
pub fn isbn(raw: &str) -> Result<Option<String>, ValueError> {
    let raw = raw.trim();
    let raw = raw.strip_suffix(".0").unwrap_or(raw);
    if raw.is_empty() {
        return Ok(None);
    }
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if !checksum_ok(&compact) {
        return Err(ValueError::MalformedIsbn(raw.to_string()));
    }
    let parsed =
        Isbn::from_str(&compact).map_err(|_| ValueError::MalformedIsbn(raw.to_string()))?;
    let hyphenated = parsed
        .hyphenate()
        .map_err(|e| {
            log::debug!("cannot hyphenate {raw}: {e:?}");
            ValueError::MalformedIsbn(raw.to_string())
        })?
        .to_string();
    // a registration group the range table does not know leaves too few hyphens
    if hyphenated.matches('-').count() != if compact.len() == 13 { 4 } else { 3 } {
        return Err(ValueError::MalformedIsbn(raw.to_string()));
    }
    Ok(Some(hyphenated))
}

/// Whether a hyphenated ISBN has the full ISBN-13 shape.
pub fn isbn13_len_ok(hyphenated: &str) -> bool {
    hyphenated.len() == ISBN13_HYPHENATED_LEN
}

fn checksum_ok(compact: &str) -> bool {
    let chars: Vec<char> = compact.chars().collect();
    match chars.len() {
        13 => {
            let Some(digits) = chars.iter().map(|c| c.to_digit(10)).collect::<Option<Vec<_>>>()
            else {
                return false;
            };
            let sum: u32 = digits
                .iter()
                .enumerate()
                .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
                .sum();
            sum % 10 == 0
        }
        10 => {
            let mut sum = 0;
            for (i, c) in chars.iter().enumerate() {
                let value = match (i, c) {
                    (9, 'X' | 'x') => 10,
                    _ => match c.to_digit(10) {
                        Some(d) => d,
                        None => return false,
                    },
                };
                sum += value * (10 - i as u32);
            }
            sum % 11 == 0
        }
        _ => false,
    }
}

/// Formats an ISSN as `NNNN-NNNN`.
pub fn issn(raw: &str) -> Result<String, ValueError> {
    let raw = raw.trim();
    if !raw.is_ascii() {
        return Err(ValueError::MalformedIssn(raw.to_string()));
    }
    let formatted = if raw.len() > 4 && !raw.contains('-') {
        format!("{}-{}", &raw[..4], &raw[4..])
    } else {
        raw.to_string()
    };
    if formatted.len() != 9 || !ISSN_FORM.is_match(&formatted) {
        return Err(ValueError::MalformedIssn(raw.to_string()));
    }
    Ok(formatted.to_uppercase())
}

/// Ensures an identifier has the form `https://{domain}.org/{id}`.
///
/// Accepts bare identifiers and ones already prefixed with `http://`,
/// `https://`, `www.` or `dx.`.
pub fn canonical_url(domain: &str, raw: &str) -> Option<String> {
    let host = format!("{domain}.org/");
    let mut id = raw.trim();
    for prefix in ["https://", "http://", "www.", "dx.", host.as_str()] {
        if id.get(..prefix.len()).is_some_and(|p| p.eq_ignore_ascii_case(prefix)) {
            id = &id[prefix.len()..];
        }
    }
    if domain == "doi" && id.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("doi:")) {
        id = id[4..].trim_start();
    }
    if id.is_empty() {
        return None;
    }
    Some(format!("https://{host}{id}"))
}

pub fn doi(raw: &str) -> Option<String> {
    canonical_url("doi", raw)
}

/// Compares DOIs ignoring case and a trailing slash.
pub fn same_doi(a: &str, b: &str) -> bool {
    a.trim_end_matches('/')
        .eq_ignore_ascii_case(b.trim_end_matches('/'))
}

pub fn orcid(raw: &str) -> Option<String> {
    canonical_url("orcid", raw)
}

pub fn ror(raw: &str) -> Option<String> {
    canonical_url("ror", raw)
}

/// Finds a bare ORCID iD anywhere in free text.
pub fn find_orcid(text: &str) -> Option<String> {
    ORCID_ID.find(text).map(|m| m.as_str().to_string())
}

/// Trims a URL and adds `https://` when the scheme is missing.
pub fn url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        Some(raw.to_string())
    } else {
        Some(format!("https://{raw}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("9781234567897", "978-1-234-56789-7")]
    #[case("9783161484100", "978-3-16-148410-0")]
    #[case("978-3-16-148410-0", "978-3-16-148410-0")]
    #[case("97-81234567897", "978-1-234-56789-7")]
    #[case("978-1234-567897", "978-1-234-56789-7")]
    #[case(" 9781234567897 ", "978-1-234-56789-7")]
    fn test_isbn_hyphenation(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(isbn(raw).unwrap().as_deref(), Some(expected));
    }

    #[rstest]
    #[case("9781234567897")]
    #[case("978-1-234-56789-7")]
    #[case("9783161484100")]
    fn test_isbn_idempotent(#[case] raw: &str) {
        let once = isbn(raw).unwrap().unwrap();
        let twice = isbn(&once).unwrap().unwrap();
        assert_eq!(once, twice);
        assert!(isbn13_len_ok(&once));
    }

    #[rstest]
    #[case("9781234567890")]
    #[case("12345")]
    #[case("97812345678ab")]
    #[case("978-x")]
    #[case("978-1-234-56789-0")]
    #[case("978-1-234-56789")]
    fn test_isbn_malformed(#[case] raw: &str) {
        assert!(matches!(isbn(raw), Err(ValueError::MalformedIsbn(_))));
    }

    #[test]
    fn test_isbn_empty() {
        assert_eq!(isbn("  ").unwrap(), None);
    }

    #[rstest]
    #[case("20493250", "2049-3250")]
    #[case("2049-3250", "2049-3250")]
    #[case("1234567x", "1234-567X")]
    fn test_issn_valid(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(issn(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("1234567")]
    #[case("123456789")]
    #[case("1234-56789")]
    #[case("123-45678")]
    #[case("abcd-efgh")]
    #[case("")]
    fn test_issn_malformed(#[case] raw: &str) {
        assert!(matches!(issn(raw), Err(ValueError::MalformedIssn(_))));
    }

    #[rstest]
    #[case("10.11647/obp.0001", "https://doi.org/10.11647/obp.0001")]
    #[case("https://doi.org/10.11647/obp.0001", "https://doi.org/10.11647/obp.0001")]
    #[case("http://dx.doi.org/10.11647/obp.0001", "https://doi.org/10.11647/obp.0001")]
    #[case("doi.org/10.11647/obp.0001", "https://doi.org/10.11647/obp.0001")]
    #[case("doi:10.11647/obp.0001", "https://doi.org/10.11647/obp.0001")]
    fn test_doi(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(doi(raw).as_deref(), Some(expected));
        assert_eq!(doi(expected).as_deref(), Some(expected));
    }

    #[test]
    fn test_orcid_and_ror() {
        assert_eq!(
            orcid("0000-0001-2345-6789").as_deref(),
            Some("https://orcid.org/0000-0001-2345-6789")
        );
        assert_eq!(
            orcid("http://orcid.org/0000-0001-2345-6789").as_deref(),
            Some("https://orcid.org/0000-0001-2345-6789")
        );
        assert_eq!(
            ror("https://ror.org/013meh722").as_deref(),
            Some("https://ror.org/013meh722")
        );
        assert_eq!(ror(""), None);
    }

    #[test]
    fn test_find_orcid() {
        assert_eq!(
            find_orcid("Jane (0000-0002-1825-0097)").as_deref(),
            Some("0000-0002-1825-0097")
        );
        assert_eq!(find_orcid("Jane"), None);
    }

    #[test]
    fn test_url() {
        assert_eq!(url("example.org/book").as_deref(), Some("https://example.org/book"));
        assert_eq!(url("http://example.org").as_deref(), Some("http://example.org"));
        assert_eq!(url(" "), None);
    }
}
