//! Open Book Publishers chapter spreadsheet.
//!
//! Each row is one chapter, linked to its book through the `Book Title`
//! column. Imprints must already exist.

use std::path::Path;

use super::{inverted_contributors, number_contributors};
use crate::csv::{CsvReader, CsvRow};
use crate::draft::{LanguageDraft, ParentDraft, PublicationDraft, WorkDraft};
use crate::error::{LoadError, ValueError};
use crate::identifiers;
use crate::model::{
    ContributionType, LocationPlatform, PublicationType, SubjectType, WorkStatus, WorkType,
};
use crate::normalize::{self, Title};
use crate::pipeline::{MapContext, MapError, Mapper, PublisherProfile};

/// Columns holding secondary contributors, in the order they are numbered.
const ROLE_COLUMNS: [(&str, ContributionType); 7] = [
    ("Translator", ContributionType::Translator),
    ("Photographer", ContributionType::Photographer),
    ("Illustrator", ContributionType::Illustrator),
    ("Foreword by", ContributionType::ForewordBy),
    ("Afterword by", ContributionType::AfterwordBy),
    ("Introduction by", ContributionType::IntroductionBy),
    ("Preface by", ContributionType::PrefaceBy),
];

pub struct ObpChapterMapper {
    profile: PublisherProfile,
}

impl ObpChapterMapper {
    #[must_use]
    pub fn new() -> Self {
        ObpChapterMapper {
            profile: PublisherProfile::new(
                "Open Book Publishers",
                Some("OBP"),
                Some("https://www.openbookpublishers.com/"),
            )
            .require_imprints(),
        }
    }
}

impl Default for ObpChapterMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for ObpChapterMapper {
    type Record = CsvRow;

    fn profile(&self) -> &PublisherProfile {
        &self.profile
    }

    fn read(&self, path: &Path) -> Result<Vec<CsvRow>, LoadError> {
        CsvReader::new().read_path(path)
    }

    fn map(&self, row: &CsvRow, _ctx: &mut MapContext<'_>) -> Result<Option<WorkDraft>, MapError> {
        Ok(Some(chapter(row)?))
    }

    fn label(&self, row: &CsvRow, index: usize) -> String {
        row.get("Chapter Title")
            .map_or_else(|| format!("row {}", index + 1), String::from)
    }
}

fn chapter(row: &CsvRow) -> Result<WorkDraft, ValueError> {
    let title = Title::split(row.require("Chapter Title")?);
    let status = row
        .get("Work Status")
        .map(WorkStatus::from_label)
        .transpose()?
        .unwrap_or(WorkStatus::Active);
    let mut draft = WorkDraft::new(WorkType::BookChapter, status, title);
    draft.imprint = Some(row.require("Imprint")?.to_string());

    let authors = row.get("Authors");
    let editors = row.get("Editors");
    let work = &mut draft.work;
    work.doi = row.get("DOI").and_then(identifiers::doi);
    work.publication_date = row.get("Date").and_then(normalize::date);
    work.copyright_holder = authors.or(editors).map(String::from);
    work.reference = row.get("Record Reference").map(String::from);
    work.place = row.get("Place of publication").map(String::from);
    work.license = row.get("License").and_then(identifiers::url);
    work.landing_page = row.get("Website").and_then(identifiers::url);
    work.long_abstract = row.get("Abstract").map(String::from);
    work.page_count = row.int("Number of Pages")?;
    work.first_page = row.get("Start Page").map(String::from);
    work.last_page = row.get("End Page").map(String::from);
    if let (Some(first), Some(last)) = (row.get("Start Page"), row.get("End Page")) {
        work.page_interval = Some(normalize::page_interval(first, last));
    }

    // book editors are repeated on chapters that have their own authors
    let mut contributors = match authors {
        Some(_) => inverted_contributors(authors, ContributionType::Author),
        None => inverted_contributors(editors, ContributionType::Editor),
    };
    for (column, role) in ROLE_COLUMNS {
        contributors.extend(inverted_contributors(row.get(column), role));
    }
    number_contributors(&mut contributors);
    draft.contributors = contributors;

    draft.languages = row
        .list("Language", &[';'])
        .iter()
        .map(|code| LanguageDraft::original(code))
        .collect();
    draft.add_subjects(SubjectType::Bic, row.list("BIC", &[',', ';']));
    draft.add_subjects(SubjectType::Keyword, row.list("Keywords", &[',', ';']));

    for (publication_type, column) in [
        (PublicationType::Pdf, "Full-text URL - PDF"),
        (PublicationType::Html, "Full-text URL - HTML"),
    ] {
        let Some(url) = row.get(column).and_then(identifiers::url) else {
            continue;
        };
        let mut publication = PublicationDraft::new(publication_type, None);
        publication.add_location(LocationPlatform::Other, Some(url.clone()), Some(url), true);
        draft.publications.push(publication);
    }

    draft.parent = row.get("Book Title").map(|book| ParentDraft {
        title: book.to_string(),
        ordinal: None,
    });
    Ok(draft)
}
