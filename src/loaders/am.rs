//! African Minds spreadsheet.
//!
//! Columns are snake_case and mirror the work fields one to one. The people
//! behind a book are packed into a single `contributions` column, written as
//! bracketed entries such as `(Author, Jane, Doe, UCT, 0000-0002-1825-0097)`.

use std::path::Path;
use std::sync::LazyLock;

use crate::csv::{CsvReader, CsvRow};
use crate::draft::{AffiliationDraft, ContributorDraft, PersonName, PublicationDraft, WorkDraft};
use crate::error::{LoadError, ValueError};
use crate::identifiers;
use crate::model::{ContributionType, Institution, PublicationType, WorkStatus, WorkType};
use crate::normalize::{self, Title};
use crate::pipeline::{MapContext, MapError, Mapper, PublisherProfile};
use crate::regex::Regex;

static ENTRY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((.*?)\)").unwrap());

pub struct AfricanMindsMapper {
    profile: PublisherProfile,
}

impl AfricanMindsMapper {
    #[must_use]
    pub fn new() -> Self {
        AfricanMindsMapper {
            profile: PublisherProfile::new(
                "African Minds",
                None,
                Some("https://www.africanminds.co.za/"),
            ),
        }
    }
}

impl Default for AfricanMindsMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for AfricanMindsMapper {
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
        row.get("title")
            .map_or_else(|| format!("row {}", index + 1), String::from)
    }
}

fn book(row: &CsvRow) -> Result<WorkDraft, ValueError> {
    let title = Title::split(row.require("title")?);
    let work_type = WorkType::from_label(row.require("work_type")?)?;
    let status = row
        .get("work_status")
        .map(WorkStatus::from_label)
        .transpose()?
        .unwrap_or(WorkStatus::Active);
    let mut draft = WorkDraft::new(work_type, status, title);

    let work = &mut draft.work;
    work.doi = row.get("doi").and_then(identifiers::doi);
    work.copyright_holder = row.get("copyright_holder").map(String::from);
    work.publication_date = row.get("publication_date").and_then(normalize::date);
    work.place = row.get("publication_place").map(String::from);
    work.oclc = row.get("oclc").map(String::from);
    work.lccn = row.get("lccn").map(String::from);
    work.image_count = row.int("image_count")?;
    work.table_count = row.int("table_count")?;
    work.audio_count = row.int("audio_count")?;
    work.video_count = row.int("video_count")?;
    work.page_count = row.int("page_count")?;
    work.page_breakdown = row.get("page_breakdown").map(String::from);
    work.edition = Some(row.int("edition")?.unwrap_or(1));
    work.license = row.get("license").and_then(identifiers::url);
    work.short_abstract = row.get("short_abstract").map(String::from);
    work.long_abstract = row.get("long_abstract").map(String::from);
    work.toc = row.get("toc").map(String::from);
    work.cover_url = row.get("cover_url").and_then(identifiers::url);
    work.cover_caption = row.get("cover_caption").map(String::from);
    work.landing_page = row.get("landing_page").and_then(identifiers::url);

    // the sheet has no ISBNs; dimensions describe the printed book
    let width = row.float("width (mm)")?;
    let height = row.float("height (mm)")?;
    if width.is_some() || height.is_some() {
        let mut paperback = PublicationDraft::new(PublicationType::Paperback, None);
        paperback.dimensions.width_mm = width;
        paperback.dimensions.height_mm = height;
        draft.publications.push(paperback);
    }

    if let Some(cell) = row.get("contributions") {
        draft.contributors = contributions(cell)?;
    }
    Ok(draft)
}

fn contributions(cell: &str) -> Result<Vec<ContributorDraft>, ValueError> {
    let mut contributors = Vec::new();
    for (index, capture) in ENTRY.captures_iter(cell).enumerate() {
        let Some(entry) = capture.get(1) else {
            continue;
        };
        let parts: Vec<&str> = entry.as_str().split(',').map(str::trim).collect();
        let contribution_type = ContributionType::from_label(parts[0])?;
        let name = match parts.as_slice() {
            [] | [_] => continue,
            [_, name] => PersonName::opaque(name),
            [_, first, last, ..] => PersonName::from_parts(Some(*first), last, None),
        };
        let (institution, orcid) = match parts.as_slice() {
            [_, _, _, institution, orcid] => (Some(*institution), identifiers::find_orcid(orcid)),
            [_, _, _, unknown] => match identifiers::find_orcid(unknown) {
                Some(orcid) => (None, Some(orcid)),
                None => (Some(*unknown), None),
            },
            _ => (None, None),
        };

        let mut contributor = ContributorDraft::new(name, contribution_type)
            .with_orcid(orcid.as_deref().and_then(identifiers::orcid))
            .with_ordinal(index as i32 + 1);
        contributor.main = Some(true);
        if let Some(name) = institution.filter(|n| !n.is_empty()) {
            contributor.affiliations.push(AffiliationDraft {
                institution: Institution {
                    institution_name: name.to_string(),
                    ..Institution::default()
                },
                position: None,
            });
        }
        contributors.push(contributor);
    }
    Ok(contributors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("(Author, Jane, Doe)", "Jane Doe", None, None)]
    #[case(
        "(Author, Jane, Doe, 0000-0002-1825-0097)",
        "Jane Doe",
        None,
        Some("https://orcid.org/0000-0002-1825-0097")
    )]
    #[case("(Author, Jane, Doe, University of Cape Town)", "Jane Doe", Some("University of Cape Town"), None)]
    #[case(
        "(Editor, Jane, Doe, UCT, https://orcid.org/0000-0002-1825-0097)",
        "Jane Doe",
        Some("UCT"),
        Some("https://orcid.org/0000-0002-1825-0097")
    )]
    #[case("(Author, HSRC Press)", "HSRC Press", None, None)]
    fn test_contribution_entry(
        #[case] cell: &str,
        #[case] full_name: &str,
        #[case] institution: Option<&str>,
        #[case] orcid: Option<&str>,
    ) {
        let list = contributions(cell).unwrap();
        assert_eq!(list.len(), 1);
        let c = &list[0];
        assert_eq!(c.contributor.full_name, full_name);
        assert_eq!(c.contributor.orcid.as_deref(), orcid);
        assert_eq!(
            c.affiliations
                .first()
                .map(|a| a.institution.institution_name.as_str()),
            institution
        );
        assert!(c.is_main());
    }

    #[test]
    fn test_contributions_are_numbered() {
        let list = contributions("(Author, Jane, Doe) (Editor, Richard, Roe)").unwrap();
        let summary: Vec<(ContributionType, Option<i32>)> = list
            .iter()
            .map(|c| (c.contribution_type, c.ordinal))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ContributionType::Author, Some(1)),
                (ContributionType::Editor, Some(2))
            ]
        );
    }

    #[test]
    fn test_unknown_contribution_type() {
        assert!(matches!(
            contributions("(Ghostwriter, Jane, Doe)"),
            Err(ValueError::UnmappedCode { .. })
        ));
    }

    #[test]
    fn test_book_fields() {
        let row = CsvRow::from_pairs([
            ("title", "Knowledge Futures: Open Access in Africa"),
            ("doi", "10.47622/9781928502210"),
            ("work_type", "Monograph"),
            ("publication_date", "2021"),
            ("width (mm)", "170"),
            ("height (mm)", "240"),
            ("contributions", "(Author, Jane, Doe)"),
        ]);
        let draft = book(&row).unwrap();
        assert_eq!(draft.work.work_status, WorkStatus::Active);
        assert_eq!(draft.work.edition, Some(1));
        assert_eq!(draft.work.subtitle.as_deref(), Some("Open Access in Africa"));
        assert_eq!(draft.work.publication_date.as_deref(), Some("2021-01-01"));
        assert_eq!(draft.publications[0].dimensions.width_mm, Some(170.0));
        assert_eq!(draft.publications[0].isbn, None);
        assert_eq!(draft.contributors.len(), 1);
    }
}
