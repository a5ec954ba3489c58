//! Open Book Publishers book spreadsheet.
//!
//! One row per book. Contributors, formats and subject codes are spread over
//! numbered column groups, and the repeated `ORCID ID` and `OBP Role Name`
//! headers are told apart by the CSV reader's header renaming.

use std::path::Path;

use super::{isbn_cell, number_contributors};
use crate::csv::{CsvReader, CsvRow};
use crate::draft::{
    ContributorDraft, LanguageDraft, PersonName, PublicationDraft, SeriesDraft, SubjectDraft,
    WorkDraft,
};
use crate::error::{LoadError, ValueError};
use crate::identifiers;
use crate::model::codes::language_code;
use crate::model::{
    ContributionType, LanguageRelation, LocationPlatform, PublicationType, SeriesType,
    SubjectType, WorkStatus, WorkType, parse_code,
};
use crate::normalize::{self, Title};
use crate::pipeline::{MapContext, MapError, Mapper, PublisherProfile};

const CURRENCIES: [&str; 5] = ["GBP", "USD", "EUR", "AUD", "CAD"];

pub struct ObpMapper {
    profile: PublisherProfile,
}

impl ObpMapper {
    #[must_use]
    pub fn new() -> Self {
        ObpMapper {
            profile: PublisherProfile::new(
                "Open Book Publishers",
                Some("OBP"),
                Some("https://www.openbookpublishers.com/"),
            ),
        }
    }
}

impl Default for ObpMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for ObpMapper {
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
        row.get("Title")
            .map_or_else(|| format!("row {}", index + 1), String::from)
    }
}

/// Header of the `n`th occurrence of a repeated column, counting from 1.
fn repeated(header: &str, n: usize) -> String {
    if n == 1 {
        header.to_string()
    } else {
        format!("{header} {}", n - 1)
    }
}

fn book(row: &CsvRow) -> Result<WorkDraft, ValueError> {
    let title = Title::from_parts(row.require("Title")?, row.get("Subtitle"));
    let work_type = WorkType::from_label(row.require("Publication type")?)?;
    let status = WorkStatus::from_label(row.require("Status")?)?;
    let mut draft = WorkDraft::new(work_type, status, title);

    let work = &mut draft.work;
    work.doi = match (row.get("DOI prefix"), row.get("DOI suffix")) {
        (Some(prefix), Some(suffix)) => identifiers::doi(&format!("{prefix}/{suffix}")),
        _ => None,
    };
    work.publication_date = publication_date(row)?;
    let holders: Vec<&str> = (1..=3)
        .filter_map(|n| row.get(&format!("Copyright holder {n}")))
        .collect();
    work.copyright_holder = (!holders.is_empty()).then(|| holders.join("; "));
    work.oclc = row
        .get("OCN (OCLC number)")
        .map(|v| v.strip_suffix(".0").unwrap_or(v).to_string());
    work.edition = row.int("edition number (integers only)")?;
    work.place = Some("Cambridge, UK".to_string());
    work.page_count = row.int("no of pages")?;
    work.page_breakdown = row.get("pages").map(String::from);
    work.image_count = row.int("no of illustrations")?;
    work.table_count = row.int("no of tables")?;
    // audio and video are counted together
    work.audio_count = row.int("no of audio/video")?;
    work.license = row
        .get("License URL (human-readable summary)")
        .and_then(identifiers::url);
    work.landing_page = row.get("Book-page URL").and_then(identifiers::url);
    work.short_abstract = row
        .get("Short Blurb (less than 100 words)")
        .map(String::from);
    work.long_abstract = row.get("Plain Text Blurb").map(String::from);
    work.toc = row.get("Table of Content").map(String::from);
    work.cover_url = row.get("Cover URL").and_then(identifiers::url);

    let landing_page = draft.work.landing_page.clone();
    draft.publications = publications(row, landing_page)?;
    draft.languages = languages(row);
    subjects(row, &mut draft);
    draft.contributors = contributors(row)?;
    draft.series = series(row, work_type)?;
    Ok(draft)
}

fn publication_date(row: &CsvRow) -> Result<Option<String>, ValueError> {
    let year = row.int("publication year")?;
    let month = row.int("publication month")?;
    let day = row.int("publication day")?;
    Ok(match (year, month, day) {
        (Some(y), Some(m), Some(d)) => Some(format!("{y:04}-{m:02}-{d:02}")),
        _ => None,
    })
}

fn publications(
    row: &CsvRow,
    landing_page: Option<String>,
) -> Result<Vec<PublicationDraft>, ValueError> {
    let width = row.float("Width (mm)")?;
    let height = row.float("Height (mm)")?;
    let mut publications = Vec::new();
    for n in 1..=5 {
        let Some(format) = row.get(&format!("Format {n}")) else {
            continue;
        };
        let Some(isbn) = isbn_cell(row.get(&format!("ISBN {n} with dashes")))? else {
            continue;
        };
        if !identifiers::isbn13_len_ok(&isbn) {
            log::debug!("skipping {format} with ISBN {isbn}");
            continue;
        }
        let publication_type: PublicationType = parse_code("publication type", format)?;
        let mut publication = PublicationDraft::new(publication_type, Some(isbn));
        if publication_type == PublicationType::Pdf {
            publication.add_location(
                LocationPlatform::PublisherWebsite,
                landing_page.clone(),
                row.get("Full-text URL - PDF").and_then(identifiers::url),
                true,
            );
            publications.push(publication);
            continue;
        }
        if matches!(
            publication_type,
            PublicationType::Paperback | PublicationType::Hardback
        ) {
            publication.dimensions.width_mm = width;
            publication.dimensions.height_mm = height;
        }
        publication.add_location(
            LocationPlatform::PublisherWebsite,
            landing_page.clone(),
            None,
            true,
        );
        let format_name = format.to_lowercase();
        for currency in CURRENCIES {
            let amount = row
                .get(&format!("{currency} price {format_name}"))
                .and_then(normalize::price);
            publication.add_price(currency, amount);
        }
        publications.push(publication);
    }
    if let Some(url) = row.get("Full-text URL - HTML").and_then(identifiers::url) {
        let mut html = PublicationDraft::new(PublicationType::Html, None);
        html.add_location(
            LocationPlatform::PublisherWebsite,
            landing_page,
            Some(url),
            true,
        );
        publications.push(html);
    }
    Ok(publications)
}

fn languages(row: &CsvRow) -> Vec<LanguageDraft> {
    let Some(code) = row.get("ONIX Language Code") else {
        return Vec::new();
    };
    match row.get("Original ONIX Language Code") {
        Some(original) if !original.eq_ignore_ascii_case(code) => vec![
            LanguageDraft {
                code: language_code(code),
                relation: LanguageRelation::TranslatedInto,
                main: true,
            },
            LanguageDraft {
                code: language_code(original),
                relation: LanguageRelation::Original,
                main: false,
            },
        ],
        _ => vec![LanguageDraft::original(code)],
    }
}

fn subjects(row: &CsvRow, draft: &mut WorkDraft) {
    for n in 1..=5 {
        for (subject_type, scheme) in [(SubjectType::Bic, "BIC"), (SubjectType::Bisac, "BISAC")] {
            if let Some(code) = row.get(&format!("{scheme} subject code {n}")) {
                draft.subjects.push(SubjectDraft {
                    subject_type,
                    code: code.to_string(),
                    ordinal: n,
                });
            }
        }
    }
    draft.add_subjects(SubjectType::Custom, row.get("Academic discipline (OBP)"));
    draft.add_subjects(SubjectType::Keyword, row.list("keywords", &[',', ';']));
}

fn contributors(row: &CsvRow) -> Result<Vec<ContributorDraft>, ValueError> {
    let mut contributors = Vec::new();
    for n in 1..=6 {
        let first = row.get(&format!("Contributor {n} first name"));
        let last = row.get(&format!("Contributor {n} surname"));
        let (Some(first), Some(last)) = (first, last) else {
            continue;
        };
        let role = ContributionType::from_label(row.require(&repeated("OBP Role Name", n))?)?;
        let orcid = row
            .get(&repeated("ORCID ID", n))
            .and_then(identifiers::orcid);
        contributors.push(
            ContributorDraft::new(PersonName::from_parts(Some(first), last, None), role)
                .with_orcid(orcid),
        );
    }
    number_contributors(&mut contributors);
    Ok(contributors)
}

/// A series is only recorded when it has both a name and a print ISSN.
fn series(row: &CsvRow, work_type: WorkType) -> Result<Vec<SeriesDraft>, ValueError> {
    let (Some(name), Some(issn_print)) = (row.get("Series Name"), row.get("ISSN Print with dashes"))
    else {
        return Ok(Vec::new());
    };
    let series_type = if work_type == WorkType::JournalIssue {
        SeriesType::Journal
    } else {
        SeriesType::BookSeries
    };
    let mut series = SeriesDraft::new(series_type, name);
    series.issn_print = Some(identifiers::issn(issn_print)?);
    series.issn_digital = row
        .get("ISSN Digital with dashes")
        .map(identifiers::issn)
        .transpose()?;
    series.ordinal = row.int("No. in the Series")?;
    Ok(vec![series])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NoResolver;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "Title,Subtitle,DOI prefix,DOI suffix,publication year,publication month,\
publication day,Publication type,Status,Copyright holder 1,Copyright holder 2,Format 1,\
ISBN 1 with dashes,GBP price paperback,USD price paperback,Format 2,ISBN 2 with dashes,Format 3,\
ISBN 3 with dashes,Full-text URL - PDF,Book-page URL,Width (mm),Height (mm),ONIX Language Code,\
Original ONIX Language Code,BIC subject code 1,BISAC subject code 2,keywords,\
Contributor 1 first name,Contributor 1 surname,ORCID ID,OBP Role Name,\
Contributor 2 first name,Contributor 2 surname,ORCID ID,OBP Role Name,\
Series Name,ISSN Print with dashes,No. in the Series";

    const ROW: &str = "Why Read?,A Defence,10.11647,OBP.0001,2020,3,9,Monograph,Active,Jane Doe,,\
Paperback,978-1-234-56789-7,19.95,0,PDF,978-1-234-56788-0,Hardback,1-234-56789-X,\
https://example.org/book.pdf,https://www.openbookpublishers.com/books/10.11647/obp.0001,156,234,\
ENG,FRE,DSB,LIT000000,reading; criticism,Jane,Doe,0000-0002-1825-0097,Author,\
Richard,Roe,,Translator,Open Reports Series,2399-6668,3";

    fn draft() -> WorkDraft {
        let rows = CsvReader::new().parse(&format!("{HEADER}\n{ROW}")).unwrap();
        let mut ctx = MapContext::new(&NoResolver);
        ObpMapper::new().map(&rows[0], &mut ctx).unwrap().unwrap()
    }

    #[test]
    fn test_work_fields() {
        let draft = draft();
        let work = &draft.work;
        assert_eq!(work.full_title, "Why Read? A Defence");
        assert_eq!(work.doi.as_deref(), Some("https://doi.org/10.11647/OBP.0001"));
        assert_eq!(work.publication_date.as_deref(), Some("2020-03-09"));
        assert_eq!(work.copyright_holder.as_deref(), Some("Jane Doe"));
        assert_eq!(work.place.as_deref(), Some("Cambridge, UK"));
    }

    #[test]
    fn test_publications() {
        let draft = draft();
        let kinds: Vec<PublicationType> = draft
            .publications
            .iter()
            .map(|p| p.publication_type)
            .collect();
        // the ISBN-10 hardback is skipped
        assert_eq!(kinds, vec![PublicationType::Paperback, PublicationType::Pdf]);
        let paperback = &draft.publications[0];
        assert_eq!(paperback.prices.len(), 1);
        assert_eq!(paperback.prices[0].currency, "GBP");
        assert_eq!(paperback.dimensions.width_mm, Some(156.0));
        let pdf = &draft.publications[1];
        assert!(pdf.prices.is_empty());
        assert_eq!(
            pdf.locations[0].full_text_url.as_deref(),
            Some("https://example.org/book.pdf")
        );
    }

    #[test]
    fn test_contributors_use_renamed_headers() {
        let draft = draft();
        let people: Vec<(&str, Option<&str>, ContributionType, Option<i32>)> = draft
            .contributors
            .iter()
            .map(|c| {
                (
                    c.contributor.full_name.as_str(),
                    c.contributor.orcid.as_deref(),
                    c.contribution_type,
                    c.ordinal,
                )
            })
            .collect();
        assert_eq!(
            people,
            vec![
                (
                    "Jane Doe",
                    Some("https://orcid.org/0000-0002-1825-0097"),
                    ContributionType::Author,
                    Some(1)
                ),
                ("Richard Roe", None, ContributionType::Translator, Some(2)),
            ]
        );
    }

    #[test]
    fn test_translated_languages_and_subjects() {
        let draft = draft();
        assert_eq!(draft.languages[0].relation, LanguageRelation::TranslatedInto);
        assert_eq!(draft.languages[1].code, "FRE");
        assert!(!draft.languages[1].main);
        let subjects: Vec<(SubjectType, &str, i32)> = draft
            .subjects
            .iter()
            .map(|s| (s.subject_type, s.code.as_str(), s.ordinal))
            .collect();
        assert_eq!(
            subjects,
            vec![
                (SubjectType::Bic, "DSB", 1),
                (SubjectType::Bisac, "LIT000000", 2),
                (SubjectType::Keyword, "reading", 1),
                (SubjectType::Keyword, "criticism", 2),
            ]
        );
    }

    #[test]
    fn test_series() {
        let series = &draft().series[0];
        assert_eq!(series.name, "Open Reports Series");
        assert_eq!(series.issn_print.as_deref(), Some("2399-6668"));
        assert_eq!(series.ordinal, Some(3));
    }

    #[test]
    fn test_series_needs_print_issn() {
        let row = CsvRow::from_pairs([("Series Name", "Open Reports Series")]);
        assert!(series(&row, WorkType::Monograph).unwrap().is_empty());
    }
}
