//! L'Harmattan Open Access catalogue export (`;` separated).
//!
//! Multi-valued cells use `|`. Names are written surname first without a
//! comma, so they go through [`PersonName::from_tokens`].

use std::path::Path;

use crate::csv::{CsvConfig, CsvReader, CsvRow};
use crate::draft::{ContributorDraft, LanguageDraft, PersonName, PublicationDraft, SeriesDraft, WorkDraft};
use crate::error::{LoadError, ValueError};
use crate::identifiers;
use crate::model::{
    ContributionType, LocationPlatform, PublicationType, SeriesType, SubjectType, WorkStatus,
    WorkType,
};
use crate::normalize::{self, Title};
use crate::pipeline::{MapContext, MapError, Mapper, PublisherProfile};

const LICENSE: &str = "https://creativecommons.org/licenses/by-nc-nd/4.0/";

const CREATOR_COLUMNS: [(&str, ContributionType); 4] = [
    ("scs023_author", ContributionType::Author),
    ("scs023_translator", ContributionType::Translator),
    ("contributor", ContributionType::ContributionsBy),
    ("scs023_editor", ContributionType::Editor),
];

pub struct LHarmattanMapper {
    profile: PublisherProfile,
}

impl LHarmattanMapper {
    #[must_use]
    pub fn new() -> Self {
        LHarmattanMapper {
            profile: PublisherProfile::new(
                "L'Harmattan Open Access",
                Some("L'Harmattan"),
                Some("https://openaccess.hu"),
            ),
        }
    }
}

impl Default for LHarmattanMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for LHarmattanMapper {
    type Record = CsvRow;

    fn profile(&self) -> &PublisherProfile {
        &self.profile
    }

    fn read(&self, path: &Path) -> Result<Vec<CsvRow>, LoadError> {
        let mut config = CsvConfig::new();
        config.set_delimiter(b';');
        CsvReader::new().with_config(config).read_path(path)
    }

    fn map(&self, row: &CsvRow, ctx: &mut MapContext<'_>) -> Result<Option<WorkDraft>, MapError> {
        let mut draft = book(row)?;
        if let Some(doi) = draft.work.doi.clone() {
            draft.work.landing_page = ctx.landing_page(&doi)?;
        }
        Ok(Some(draft))
    }

    fn label(&self, row: &CsvRow, index: usize) -> String {
        row.get("title")
            .map_or_else(|| format!("row {}", index + 1), String::from)
    }
}

fn edition(label: Option<&str>) -> i32 {
    match label {
        Some("Second edition") => 2,
        _ => 1,
    }
}

fn book(row: &CsvRow) -> Result<WorkDraft, ValueError> {
    // text editions, academic notes and literary translations load as monographs
    let work_type = row
        .get("taxonomy_EN")
        .and_then(|t| WorkType::from_label(t).ok())
        .unwrap_or(WorkType::Monograph);
    let title = Title::split(row.require("title")?);
    let mut draft = WorkDraft::new(work_type, WorkStatus::Active, title);

    let work = &mut draft.work;
    work.reference = row.get("uid").map(String::from);
    work.doi = row.get("scs023_doi").and_then(identifiers::doi);
    work.publication_date = row.get("date").and_then(normalize::date);
    work.place = row.get("scs023_place").map(|p| p.replace('|', "; "));
    work.long_abstract = row.get("scs023_summary").map(String::from);
    work.edition = Some(edition(row.get("edition-info_EN")));
    work.license = Some(LICENSE.to_string());

    draft.contributors = creators(row);

    let mut pdf = PublicationDraft::new(PublicationType::Pdf, None);
    let doi_url = draft.work.doi.clone();
    pdf.add_location(LocationPlatform::Other, doi_url.clone(), doi_url, true);
    let mut paperback = PublicationDraft::new(
        PublicationType::Paperback,
        super::isbn_cell(row.get("scs023_isbn"))?,
    );
    let printed = row.get("scs023_printed_version").and_then(identifiers::url);
    paperback.add_location(LocationPlatform::Other, printed.clone(), printed, true);
    draft.publications = vec![pdf, paperback];

    draft.languages = row
        .list("language_ISO", &['|'])
        .iter()
        .map(|code| LanguageDraft::original(code))
        .collect();

    if let (Some(name), Some(raw_issn)) = (row.get("scs023_series"), row.get("scs023_issn")) {
        match identifiers::issn(raw_issn) {
            Ok(issn) => {
                let mut series = SeriesDraft::new(SeriesType::BookSeries, name);
                series.issn_print = Some(issn.clone());
                series.issn_digital = Some(issn);
                draft.series.push(series);
            }
            Err(err) => log::warn!("{}: {err}, series skipped", draft.label),
        }
    }

    let mut keywords = row.list("scs023_keywords", &['|']);
    keywords.extend(
        row.list("scs023_field_science", &['|'])
            .iter()
            .flat_map(|field| field_of_science(field)),
    );
    draft.add_subjects(SubjectType::Keyword, keywords);
    Ok(draft)
}

/// All creators in column order. The record's single ORCID and website
/// belong to its creator only when there is exactly one.
fn creators(row: &CsvRow) -> Vec<ContributorDraft> {
    let mut contributors: Vec<ContributorDraft> = CREATOR_COLUMNS
        .iter()
        .flat_map(|(column, role)| {
            row.list(column, &['|']).into_iter().map(|name| {
                let mut contributor = ContributorDraft::new(PersonName::from_tokens(&name), *role);
                contributor.main = Some(true);
                contributor.refresh = true;
                contributor
            })
        })
        .collect();
    if let [only] = contributors.as_mut_slice() {
        only.contributor.orcid = row.get("scs023_orcid").and_then(identifiers::orcid);
        only.contributor.website = row.get("scs023_web").and_then(identifiers::url);
    }
    contributors
}

/// `"Hungarian name / English name (id)"` as its two keyword halves.
fn field_of_science(field: &str) -> Vec<String> {
    let Some((hungarian, english)) = field.split_once(" / ") else {
        return vec![field.trim().to_string()];
    };
    let english = english.rsplit_once(' ').map_or(english, |(name, _)| name);
    vec![hungarian.trim().to_string(), english.trim().to_string()]
}
