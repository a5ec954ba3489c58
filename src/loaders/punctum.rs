//! punctum books spreadsheet.

use std::path::Path;

use super::{inverted_contributors, isbn_cell, number_contributors};
use crate::csv::{CsvReader, CsvRow};
use crate::draft::{LanguageDraft, PublicationDraft, WorkDraft};
use crate::error::{LoadError, ValueError};
use crate::identifiers;
use crate::model::{
    ContributionType, LocationPlatform, PublicationType, SubjectType, WorkStatus, WorkType,
};
use crate::normalize::{self, Title};
use crate::pipeline::{MapContext, MapError, Mapper, PublisherProfile};

pub struct PunctumMapper {
    profile: PublisherProfile,
}

impl PunctumMapper {
    #[must_use]
    pub fn new() -> Self {
        PunctumMapper {
            profile: PublisherProfile::new("punctum books", None, Some("https://punctumbooks.com/")),
        }
    }
}

impl Default for PunctumMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for PunctumMapper {
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
        row.get("Book Title")
            .map_or_else(|| format!("row {}", index + 1), String::from)
    }
}

fn book(row: &CsvRow) -> Result<WorkDraft, ValueError> {
    let title = Title::split(row.require("Book Title")?);
    let work_type = WorkType::from_label(row.require("Type of Document")?)?;
    let mut draft = WorkDraft::new(work_type, WorkStatus::Active, title);
    draft.imprint = row.get("Imprint").map(String::from);

    let authors = row.get("Authors");
    let editors = row.get("Editors");
    let work = &mut draft.work;
    work.doi = row.get("DOI").and_then(identifiers::doi);
    work.publication_date = row.get("Date").and_then(normalize::date);
    let holders: Vec<&str> = [authors, editors].into_iter().flatten().collect();
    work.copyright_holder = (!holders.is_empty()).then(|| holders.join("; "));
    work.page_count = row.int("Number of Pages")?;
    work.edition = Some(row.int("Edition")?.unwrap_or(1));
    work.lccn = row
        .get("LCCN")
        .map(|v| v.strip_suffix(".0").unwrap_or(v).to_string());
    work.reference = row.get("Record Reference").map(String::from);
    work.place = row.get("Place of publication").map(String::from);
    work.license = row.get("License").and_then(identifiers::url);
    work.landing_page = row.get("Website").and_then(identifiers::url);
    work.long_abstract = row.get("Abstract").map(String::from);
    work.cover_url = row.get("Cover URL").and_then(identifiers::url);

    let mut paperback = PublicationDraft::new(
        PublicationType::Paperback,
        isbn_cell(row.get("Primary ISBN"))?,
    );
    let width = row.float("Width (in)")?;
    let height = row.float("Height (in)")?;
    paperback.dimensions.width_in = width;
    paperback.dimensions.width_mm = width.map(|w| f64::from(normalize::in_to_mm(w)));
    paperback.dimensions.height_in = height;
    paperback.dimensions.height_mm = height.map(|h| f64::from(normalize::in_to_mm(h)));
    paperback.add_location(
        LocationPlatform::PublisherWebsite,
        draft.work.landing_page.clone(),
        None,
        true,
    );
    let mut pdf = PublicationDraft::new(PublicationType::Pdf, isbn_cell(row.get("Other ISBN"))?);
    pdf.add_location(
        LocationPlatform::Oapen,
        row.get("OAPEN URL").and_then(identifiers::url),
        None,
        true,
    );
    draft.publications = vec![paperback, pdf];

    draft.languages = row
        .list("Language", &[';'])
        .iter()
        .map(|code| LanguageDraft::original(code))
        .collect();
    draft.add_subjects(SubjectType::Bic, row.list("BIC", &[',', ';']));
    draft.add_subjects(SubjectType::Thema, row.list("Thema", &[',', ';']));
    draft.add_subjects(SubjectType::Keyword, row.list("Keywords", &[',', ';']));

    let mut contributors = inverted_contributors(authors, ContributionType::Author);
    contributors.extend(inverted_contributors(editors, ContributionType::Editor));
    for contributor in &mut contributors {
        contributor.main = Some(true);
    }
    number_contributors(&mut contributors);
    draft.contributors = contributors;
    Ok(draft)
}
