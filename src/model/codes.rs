//! Lookup tables from the labels publishers use to the API enumerations.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{ContributionType, WorkStatus, WorkType};
use crate::error::ValueError;

/// Parses a value that already uses the API's wire name, e.g. `"PAPERBACK"`.
///
/// Case and surrounding whitespace are ignored.
pub fn parse_code<T: DeserializeOwned>(field: &'static str, code: &str) -> Result<T, ValueError> {
    let wire = code.trim().to_ascii_uppercase();
    serde_json::from_value(serde_json::Value::String(wire))
        .map_err(|_| ValueError::unmapped(field, code.trim()))
}

/// The API's wire name for an enumeration value, e.g. `"HAS_CHILD"`.
pub fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => String::new(),
    }
}

impl WorkType {
    pub fn from_label(label: &str) -> Result<Self, ValueError> {
        Ok(match label.trim() {
            "Monograph" | "MONOGRAPH" | "Book" => WorkType::Monograph,
            "Edited book" | "Edited Book" | "EDITED_BOOK" => WorkType::EditedBook,
            "Journal Issue" | "Journal" => WorkType::JournalIssue,
            "Textbook" | "TEXTBOOK" => WorkType::Textbook,
            "Book chapter" | "BOOK_CHAPTER" => WorkType::BookChapter,
            other => return Err(ValueError::unmapped("work type", other)),
        })
    }
}

impl WorkStatus {
    pub fn from_label(label: &str) -> Result<Self, ValueError> {
        Ok(match label.trim() {
            "Active" | "ACTIVE" => WorkStatus::Active,
            "Cancelled" | "CANCELLED" => WorkStatus::Cancelled,
            "Forthcoming" | "FORTHCOMING" => WorkStatus::Forthcoming,
            "Out of print" | "OUT_OF_PRINT" => WorkStatus::OutOfPrint,
            "Withdrawn" | "WITHDRAWN_FROM_SALE" => WorkStatus::WithdrawnFromSale,
            other => return Err(ValueError::unmapped("work status", other)),
        })
    }

    /// ONIX code list 64, publishing status.
    pub fn from_onix(code: &str) -> Result<Self, ValueError> {
        Ok(match code.trim() {
            "00" => WorkStatus::Unspecified,
            "01" => WorkStatus::Cancelled,
            "02" => WorkStatus::Forthcoming,
            "03" => WorkStatus::PostponedIndefinitely,
            "04" => WorkStatus::Active,
            "05" => WorkStatus::NoLongerOurProduct,
            "06" => WorkStatus::OutOfStockIndefinitely,
            "07" => WorkStatus::OutOfPrint,
            "08" => WorkStatus::Inactive,
            "09" => WorkStatus::Unknown,
            "10" => WorkStatus::Remaindered,
            "11" => WorkStatus::WithdrawnFromSale,
            "12" => WorkStatus::Recalled,
            other => return Err(ValueError::unmapped("publishing status", other)),
        })
    }
}

impl ContributionType {
    /// Accepts the free-text role names and the ONIX contributor role codes
    /// found in publisher files.
    pub fn from_label(label: &str) -> Result<Self, ValueError> {
        Ok(match label.trim() {
            "Author" | "author" | "AUTHOR" | "AUHTOR" | "A01" => ContributionType::Author,
            "Editor" | "editor" | "EDITOR" | "B01" | "B02" | "C99" | "organizer" => {
                ContributionType::Editor
            }
            "Translator" | "translator" | "TRANSLATOR" | "B06" => ContributionType::Translator,
            "Foreword" | "FOREWORD_BY" => ContributionType::ForewordBy,
            "Introduction" | "INTRODUCTION_BY" => ContributionType::IntroductionBy,
            "Preface" | "PREFACE_BY" => ContributionType::PrefaceBy,
            "Afterword" | "AFTERWORD_BY" => ContributionType::AfterwordBy,
            "Music editor" | "MUSIC_EDITOR" => ContributionType::MusicEditor,
            "Photographer" | "PHOTOGRAPHER" => ContributionType::Photographer,
            "Illustrator" | "ILLUSTRATOR" => ContributionType::Illustrator,
            "Contributions by" | "CONTRIBUTIONS_BY" => ContributionType::ContributionsBy,
            other => return Err(ValueError::unmapped("contribution type", other)),
        })
    }
}

/// Maps a three-letter language code to the API's code, which follows the
/// bibliographic ISO 639-2 forms.
#[must_use]
pub fn language_code(code: &str) -> String {
    match code.trim().to_ascii_uppercase().as_str() {
        "FRA" => "FRE".to_string(),
        "DEU" => "GER".to_string(),
        "NLD" => "DUT".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocationPlatform, PublicationType};
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("Monograph", WorkType::Monograph)]
    #[case("Book", WorkType::Monograph)]
    #[case("Edited Book", WorkType::EditedBook)]
    #[case("Journal", WorkType::JournalIssue)]
    fn test_work_type(#[case] label: &str, #[case] expected: WorkType) {
        assert_eq!(WorkType::from_label(label).unwrap(), expected);
    }

    #[rstest]
    #[case("AUHTOR", ContributionType::Author)]
    #[case("A01", ContributionType::Author)]
    #[case("C99", ContributionType::Editor)]
    #[case("organizer", ContributionType::Editor)]
    #[case("B06", ContributionType::Translator)]
    #[case("Foreword", ContributionType::ForewordBy)]
    #[case("Music editor", ContributionType::MusicEditor)]
    fn test_contribution_type(#[case] label: &str, #[case] expected: ContributionType) {
        assert_eq!(ContributionType::from_label(label).unwrap(), expected);
    }

    #[test]
    fn test_unmapped_labels() {
        assert_eq!(
            WorkType::from_label("Pamphlet"),
            Err(ValueError::unmapped("work type", "Pamphlet"))
        );
        assert!(WorkStatus::from_label("Lost").is_err());
        assert!(ContributionType::from_label("Narrator").is_err());
    }

    #[rstest]
    #[case("Withdrawn", WorkStatus::WithdrawnFromSale)]
    #[case("Out of print", WorkStatus::OutOfPrint)]
    fn test_work_status(#[case] label: &str, #[case] expected: WorkStatus) {
        assert_eq!(WorkStatus::from_label(label).unwrap(), expected);
    }

    #[test]
    fn test_onix_status() {
        assert_eq!(WorkStatus::from_onix("04").unwrap(), WorkStatus::Active);
        assert!(WorkStatus::from_onix("99").is_err());
    }

    #[test]
    fn test_parse_code() {
        let kind: PublicationType = parse_code("publication type", "paperback").unwrap();
        assert_eq!(kind, PublicationType::Paperback);
        let platform: LocationPlatform = parse_code("location platform", "OTHER").unwrap();
        assert_eq!(platform, LocationPlatform::Other);
        assert!(parse_code::<PublicationType>("publication type", "SCROLL").is_err());
    }

    #[test]
    fn test_language_code() {
        assert_eq!(language_code("fra"), "FRE");
        assert_eq!(language_code("ENG"), "ENG");
    }
}
