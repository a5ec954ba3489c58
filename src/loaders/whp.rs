//! The White Horse Press spreadsheet.
//!
//! Rows carry no DOI, so every run creates its works again.

use std::path::Path;

use super::{isbn_cell, number_contributors};
use crate::csv::{CsvReader, CsvRow};
use crate::draft::{ContributorDraft, LanguageDraft, PersonName, PublicationDraft, WorkDraft};
use crate::error::{LoadError, ValueError};
use crate::identifiers;
use crate::model::{
    ContributionType, LanguageRelation, PublicationType, SubjectType, WorkStatus, WorkType,
};
use crate::normalize::{self, Title};
use crate::pipeline::{MapContext, MapError, Mapper, PublisherProfile};

const TITLE: &str = "Distinctive Title (required)";

const ISBN_COLUMNS: [(&str, PublicationType); 3] = [
    ("ISBN - PAPERBACK", PublicationType::Paperback),
    ("ISBN - HARDCOVER", PublicationType::Hardback),
    ("ISBN - PDF", PublicationType::Pdf),
];

const BISAC_COLUMNS: [&str; 5] = ["BISAC 1 (required)", "BISAC 2", "BISAC 3", "BISAC 4", "BISAC 5"];

const CONTRIBUTOR_COLUMNS: [(&str, &str); 3] = [
    ("Contributor 1 (required)", "Contributor Role 1 (required)"),
    ("Contributor 2", "Contributor Role 2"),
    ("Contributor 3", "Contributor Role 3"),
];

pub struct WhpMapper {
    profile: PublisherProfile,
}

impl WhpMapper {
    #[must_use]
    pub fn new() -> Self {
        WhpMapper {
            profile: PublisherProfile::new(
                "The White Horse Press",
                Some("WHP"),
                Some("https://www.whpress.co.uk/"),
            ),
        }
    }
}

impl Default for WhpMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for WhpMapper {
    type Record = CsvRow;

    fn profile(&self) -> &PublisherProfile {
        &self.profile
    }

    fn read(&self, path: &Path) -> Result<Vec<CsvRow>, LoadError> {
        CsvReader::new().read_path(path)
    }

    fn map(&self, row: &CsvRow, _ctx: &mut MapContext<'_>) -> Result<Option<WorkDraft>, MapError> {
        Ok(Some(book(row)?))
    }

    fn label(&self, row: &CsvRow, index: usize) -> String {
        row.get(TITLE)
            .map_or_else(|| format!("row {}", index + 1), String::from)
    }
}

fn book(row: &CsvRow) -> Result<WorkDraft, ValueError> {
    let title = Title::from_parts(row.require(TITLE)?, row.get("Subtitle"));
    let contributors = contributors(row)?;
    // the first listed role decides between a monograph and an edited book
    let work_type = match contributors.first() {
        Some(first) if first.contribution_type == ContributionType::Editor => WorkType::EditedBook,
        _ => WorkType::Monograph,
    };
    let mut draft = WorkDraft::new(work_type, WorkStatus::Active, title);

    let work = &mut draft.work;
    work.edition = Some(1);
    work.place = Some("Winwick, UK".to_string());
    work.publication_date = row
        .get("Publication Date (required)")
        .and_then(normalize::date);
    work.page_count = row.int("Number of Pages")?;
    work.license = row
        .get("Creative Commons License URL for Open Access Book")
        .and_then(identifiers::url);
    work.long_abstract = row
        .get("Publisher Description of item (required)")
        .map(String::from);

    for (column, publication_type) in ISBN_COLUMNS {
        // most titles lack one format or another
        let Some(isbn) = isbn_cell(row.get(column))? else {
            continue;
        };
        draft
            .publications
            .push(PublicationDraft::new(publication_type, Some(isbn)));
    }

    draft.languages = languages(row.get("Language (required)"), row.get("Original Language"));
    draft.add_subjects(
        SubjectType::Bisac,
        BISAC_COLUMNS.iter().filter_map(|column| row.get(column)),
    );
    draft.contributors = contributors;
    Ok(draft)
}

/// A translation lists both languages, anything else only its own.
fn languages(language: Option<&str>, original: Option<&str>) -> Vec<LanguageDraft> {
    let Some(language) = language else {
        return Vec::new();
    };
    match original {
        Some(original) => vec![
            LanguageDraft {
                relation: LanguageRelation::TranslatedInto,
                ..LanguageDraft::original(language)
            },
            LanguageDraft {
                relation: LanguageRelation::TranslatedFrom,
                ..LanguageDraft::original(original)
            },
        ],
        None => vec![LanguageDraft::original(language)],
    }
}

fn contributors(row: &CsvRow) -> Result<Vec<ContributorDraft>, ValueError> {
    let mut contributors = Vec::new();
    for (name_column, role_column) in CONTRIBUTOR_COLUMNS {
        let Some(name) = row.get(name_column) else {
            continue;
        };
        let role = ContributionType::from_label(row.require(role_column)?)?;
        let mut contributor = ContributorDraft::new(PersonName::from_inverted(name), role);
        contributor.main = Some(true);
        contributors.push(contributor);
    }
    number_contributors(&mut contributors);
    Ok(contributors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn row(role: &str, original_language: Option<&str>) -> CsvRow {
        let mut pairs = vec![
            (TITLE, "Forests and Chases"),
            ("Subtitle", "A History"),
            ("Publication Date (required)", "2019/05/01"),
            ("Number of Pages", "312"),
            (
                "Creative Commons License URL for Open Access Book",
                "https://creativecommons.org/licenses/by-nc/4.0/",
            ),
            ("Publisher Description of item (required)", "About woods."),
            ("ISBN - PAPERBACK", "9781234567897"),
            ("ISBN - PDF", "9783161484100"),
            ("Language (required)", "eng"),
            ("BISAC 1 (required)", "NAT011000"),
            ("BISAC 3", "HIS015000"),
            ("Contributor 1 (required)", "Langton, John"),
            ("Contributor Role 1 (required)", role),
            ("Contributor 2", "Jones, Graham"),
            ("Contributor Role 2", "Author"),
        ];
        if let Some(original) = original_language {
            pairs.push(("Original Language", original));
        }
        CsvRow::from_pairs(pairs)
    }

    #[rstest]
    #[case("Author", WorkType::Monograph)]
    #[case("Editor", WorkType::EditedBook)]
    fn test_work_type_follows_first_role(#[case] role: &str, #[case] expected: WorkType) {
        let draft = book(&row(role, None)).unwrap();
        assert_eq!(draft.work.work_type, expected);
    }

    #[test]
    fn test_book_fields() {
        let draft = book(&row("Author", None)).unwrap();
        let work = &draft.work;
        assert_eq!(work.full_title, "Forests and Chases: A History");
        assert_eq!(work.publication_date.as_deref(), Some("2019-05-01"));
        assert_eq!(work.page_count, Some(312));
        assert_eq!(work.place.as_deref(), Some("Winwick, UK"));
        assert_eq!(work.edition, Some(1));
        assert_eq!(
            work.license.as_deref(),
            Some("https://creativecommons.org/licenses/by-nc/4.0/")
        );
        assert_eq!(work.long_abstract.as_deref(), Some("About woods."));
        assert_eq!(work.doi, None);
    }

    #[test]
    fn test_missing_formats_are_skipped() {
        let draft = book(&row("Author", None)).unwrap();
        let publications: Vec<(PublicationType, Option<&str>)> = draft
            .publications
            .iter()
            .map(|p| (p.publication_type, p.isbn.as_deref()))
            .collect();
        assert_eq!(
            publications,
            vec![
                (PublicationType::Paperback, Some("978-1-234-56789-7")),
                (PublicationType::Pdf, Some("978-3-16-148410-0")),
            ]
        );
    }

    #[rstest]
    #[case(None, vec![("ENG", LanguageRelation::Original)])]
    #[case(Some("fra"), vec![
        ("ENG", LanguageRelation::TranslatedInto),
        ("FRE", LanguageRelation::TranslatedFrom),
    ])]
    fn test_languages(
        #[case] original: Option<&str>,
        #[case] expected: Vec<(&str, LanguageRelation)>,
    ) {
        let draft = book(&row("Author", original)).unwrap();
        let languages: Vec<(&str, LanguageRelation)> = draft
            .languages
            .iter()
            .map(|l| (l.code.as_str(), l.relation))
            .collect();
        assert_eq!(languages, expected);
        assert!(draft.languages.iter().all(|l| l.main));
    }

    #[test]
    fn test_subjects_and_contributors() {
        let draft = book(&row("Author", None)).unwrap();
        let codes: Vec<&str> = draft.subjects.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["NAT011000", "HIS015000"]);
        assert!(draft.subjects.iter().all(|s| s.subject_type == SubjectType::Bisac));

        let names: Vec<(&str, Option<i32>)> = draft
            .contributors
            .iter()
            .map(|c| (c.contributor.full_name.as_str(), c.ordinal))
            .collect();
        assert_eq!(names, vec![("John Langton", Some(1)), ("Graham Jones", Some(2))]);
        assert!(draft.contributors.iter().all(|c| c.is_main()));
    }

    #[test]
    fn test_unknown_role_fails() {
        assert!(matches!(
            book(&row("Narrator", None)),
            Err(ValueError::UnmappedCode { .. })
        ));
    }
}
