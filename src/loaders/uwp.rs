//! University of Westminster Press MARCXML catalogue records.

use std::path::Path;

use crate::draft::{ContributorDraft, LanguageDraft, PersonName, PublicationDraft, WorkDraft};
use crate::error::{LoadError, ValueError};
use crate::identifiers;
use crate::marcxml::{self, MarcRecord};
use crate::model::{
    ContributionType, LanguageRelation, PublicationType, SubjectType, WorkStatus, WorkType,
    parse_code,
};
use crate::normalize::{self, Title};
use crate::pipeline::{MapContext, MapError, Mapper, PublisherProfile};

const CC_BY: &str = "http://creativecommons.org/licenses/by/4.0/";
const CC_BY_NC_ND: &str = "https://creativecommons.org/licenses/by-nc-nd/4.0/";

pub struct UwpMapper {
    profile: PublisherProfile,
}

impl UwpMapper {
    #[must_use]
    pub fn new() -> Self {
        UwpMapper {
            profile: PublisherProfile::new(
                "University of Westminster Press",
                Some("UWP"),
                Some("https://www.uwestminsterpress.co.uk/"),
            ),
        }
    }
}

impl Default for UwpMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for UwpMapper {
    type Record = MarcRecord;

    fn profile(&self) -> &PublisherProfile {
        &self.profile
    }

    fn read(&self, path: &Path) -> Result<Vec<MarcRecord>, LoadError> {
        marcxml::read_path(path)
    }

    fn map(
        &self,
        record: &MarcRecord,
        ctx: &mut MapContext<'_>,
    ) -> Result<Option<WorkDraft>, MapError> {
        let mut draft = book(record)?;
        if let Some(doi) = draft.work.doi.clone() {
            draft.work.landing_page = ctx.landing_page(&doi)?;
        }
        Ok(Some(draft))
    }

    fn label(&self, record: &MarcRecord, index: usize) -> String {
        record
            .control("001")
            .map_or_else(|| format!("record {}", index + 1), String::from)
    }
}

/// All subfields of the first field with `tag`, space separated.
fn field_text(record: &MarcRecord, tag: &str) -> Option<String> {
    let field = record.fields(tag).next()?;
    let text = field
        .subfields
        .iter()
        .map(|s| s.data.trim())
        .collect::<Vec<_>>()
        .join(" ");
    Some(text)
}

fn license(statement: &str) -> Result<&'static str, ValueError> {
    if statement.contains("Noncommercial + NoDerivatives") {
        Ok(CC_BY_NC_ND)
    } else if statement.contains("Attribution 4.0") {
        Ok(CC_BY)
    } else {
        Err(ValueError::unmapped("license", statement))
    }
}

fn title_part(raw: &str) -> &str {
    raw.trim_end_matches(['\\', '/', ':']).trim()
}

/// Language of the text: positions 35-37 of the 008 control field.
fn work_language(record: &MarcRecord) -> Option<String> {
    let chars: Vec<char> = record.control("008")?.chars().collect();
    let code: String = chars.get(35..38)?.iter().collect();
    let code = code.trim().to_ascii_uppercase();
    (!code.is_empty()).then_some(code)
}

/// LCC class number of the 050 field without its trailing date.
fn lcc(record: &MarcRecord) -> Option<String> {
    let text: Vec<char> = field_text(record, "050")?.chars().collect();
    let code: String = text[..text.len().saturating_sub(4)]
        .iter()
        .filter(|c| !c.is_whitespace())
        .collect();
    (!code.is_empty()).then_some(code)
}

fn book(record: &MarcRecord) -> Result<WorkDraft, ValueError> {
    let title = Title::from_parts(
        title_part(
            record
                .subfield("245", 'a')
                .ok_or_else(|| ValueError::MissingField("245 $a".into()))?,
        ),
        record.subfield("245", 'b').map(title_part),
    );
    let roles: Vec<&str> = ["100", "700"]
        .into_iter()
        .flat_map(|tag| record.subfields(tag, 'e'))
        .collect();
    let work_type = if roles.iter().any(|role| role.contains("editor")) {
        WorkType::EditedBook
    } else {
        WorkType::Monograph
    };
    let mut draft = WorkDraft::new(work_type, WorkStatus::Active, title);

    let work = &mut draft.work;
    work.reference = record.control("001").map(String::from);
    work.doi = record.subfield("856", 'u').and_then(identifiers::doi);
    work.edition = Some(1);
    work.publication_date = record
        .subfield("264", 'c')
        .map(|year| year.replace(['[', ']', '.'], ""))
        .and_then(|year| normalize::date(&year));
    work.place = record
        .subfield("264", 'a')
        .map(|place| place.trim_end_matches([' ', ':']).to_string());
    if let Some(extent) = record.subfield("300", 'a') {
        (work.page_count, work.page_breakdown) = normalize::page_string(extent);
    }
    work.long_abstract = record.subfield("520", 'a').map(|text| {
        text.trim_start_matches('"')
            .replace("\"--Publisher's website.", "")
    });
    work.bibliography_note = record.subfield("504", 'a').map(String::from);
    work.license = field_text(record, "540")
        .map(|statement| license(&statement))
        .transpose()?
        .map(String::from);

    draft.publications = publications(record)?;
    draft.languages = languages(record);
    if let Some(code) = lcc(record) {
        draft.add_subjects(SubjectType::Lcc, [code]);
    }
    draft.contributors = contributors(record)?;
    Ok(draft)
}

fn publications(record: &MarcRecord) -> Result<Vec<PublicationDraft>, ValueError> {
    let mut publications = Vec::new();
    for field in record.fields("020") {
        let Some(kind) = field.subfield('q') else {
            continue;
        };
        let publication_type: PublicationType = parse_code("publication type", kind)?;
        let isbn = super::isbn_cell(field.subfield('a'))?;
        publications.push(PublicationDraft::new(publication_type, isbn));
    }

    let prices: Vec<&str> = record
        .subfields("037", 'c')
        .into_iter()
        .filter(|p| p.contains('£') && *p != "£0")
        .collect();

    // one physical ISBN is the paperback; with two the hardback comes first
    let physical = record
        .fields("776")
        .next()
        .map(|f| f.subfields('z').collect::<Vec<_>>())
        .unwrap_or_default();
    let (hardback, paperback) = match physical.as_slice() {
        [paperback] => (None, Some(*paperback)),
        [hardback, paperback] => (Some(*hardback), Some(*paperback)),
        _ => (None, None),
    };
    if let Some(isbn) = paperback {
        let mut publication =
            PublicationDraft::new(PublicationType::Paperback, super::isbn_cell(Some(isbn))?);
        if let Some(raw) = prices.first() {
            publication.add_price("GBP", gbp(raw, "paperback"));
        }
        publications.push(publication);
    }
    if let Some(isbn) = hardback {
        let mut publication =
            PublicationDraft::new(PublicationType::Hardback, super::isbn_cell(Some(isbn))?);
        if let [_, raw] = prices.as_slice() {
            publication.add_price("GBP", gbp(raw, "hardback"));
        }
        publications.push(publication);
    }
    Ok(publications)
}

/// A `"£14.99 (paperback)"` price note as an amount.
fn gbp(raw: &str, format: &str) -> Option<f64> {
    normalize::price(&raw.replace(&format!(" ({format})"), ""))
}

fn languages(record: &MarcRecord) -> Vec<LanguageDraft> {
    let Some(work_language) = work_language(record) else {
        return Vec::new();
    };
    let language = |code: String, relation| LanguageDraft {
        code,
        relation,
        main: true,
    };
    match record.subfield("041", 'h') {
        Some(original) => vec![
            language(work_language, LanguageRelation::TranslatedInto),
            language(original.trim().to_ascii_uppercase(), LanguageRelation::TranslatedFrom),
        ],
        None => vec![language(work_language, LanguageRelation::Original)],
    }
}

fn contributors(record: &MarcRecord) -> Result<Vec<ContributorDraft>, ValueError> {
    let entries: Vec<(&str, &str)> = ["100", "700"]
        .into_iter()
        .flat_map(|tag| record.fields(tag))
        .flat_map(|field| {
            let name = field.subfield('a').unwrap_or_default().trim_end_matches(',');
            field.subfields('e').map(move |role| (name, role))
        })
        .collect();

    let mut contributors = Vec::new();
    for (index, (name, role)) in entries.into_iter().enumerate() {
        if name.trim().is_empty() {
            continue;
        }
        let contribution_type = ContributionType::from_label(role.trim_end_matches([',', '.']))?;
        let mut contributor =
            ContributorDraft::new(PersonName::from_inverted(name), contribution_type)
                .with_ordinal(index as i32 + 1);
        contributor.main = Some(matches!(
            contribution_type,
            ContributionType::Author | ContributionType::Editor
        ));
        contributors.push(contributor);
    }
    Ok(contributors)
}
