//! Ubiquity presses export.
//!
//! One sheet covers several presses; only LSE Press and the University of
//! Westminster Press are loaded, each into its own publisher. Nested data
//! (contributions, publications, languages, relations) is serialized into
//! single cells as bracketed, quoted tuples:
//!
//! ```text
//! ("Author","Jane","Doe","Jane Doe","true","Bio","0000-0002-1825-0097","",[("Lecturer","LSE","","","GB")])
//! ("PDF","9781234567897","","",…,"",[("GBP","0")],[("https://…","https://…","OTHER","true")])
//! ```

use std::path::Path;
use std::sync::LazyLock;

use crate::csv::{CsvReader, CsvRow};
use crate::draft::{
    AffiliationDraft, ContributorDraft, LanguageDraft, PersonName, PublicationDraft, RelationDraft,
    WorkDraft,
};
use crate::error::{LoadError, ValueError};
use crate::identifiers;
use crate::model::{
    ContributionType, Dimensions, Institution, LanguageRelation, LocationPlatform,
    PublicationType, RelationType, SubjectType, WorkStatus, WorkType, parse_code,
};
use crate::normalize::{self, Title};
use crate::pipeline::{MapContext, MapError, Mapper, PublisherProfile};
use crate::regex::Regex;

static CONTRIBUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*?\[.*?\])\)").unwrap());

static PUBLICATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*?\[.*?\], ?\[.*?\])\)").unwrap());

static PRICES_AND_LOCATIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\], ?\[(.*?)\]").unwrap());

static TUPLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((.*?)\)").unwrap());

static QUOTED_TUPLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\((".*?")\)"#).unwrap());

static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""(.*?)""#).unwrap());

/// Subject columns and the type their codes are loaded as.
const SUBJECT_COLUMNS: [(&str, SubjectType); 6] = [
    ("bic", SubjectType::Bic),
    ("thema", SubjectType::Thema),
    ("bisac", SubjectType::Bisac),
    ("lcc", SubjectType::Lcc),
    ("custom_categories", SubjectType::Custom),
    ("keywords", SubjectType::Keyword),
];

fn lse_press() -> PublisherProfile {
    PublisherProfile::new("LSE Press", None, Some("https://press.lse.ac.uk/"))
}

fn westminster() -> PublisherProfile {
    PublisherProfile::new(
        "University of Westminster Press",
        Some("UWP"),
        Some("https://www.uwestminsterpress.co.uk/"),
    )
}

pub struct UbiquityMapper {
    profile: PublisherProfile,
}

impl UbiquityMapper {
    #[must_use]
    pub fn new() -> Self {
        UbiquityMapper {
            profile: lse_press(),
        }
    }
}

impl Default for UbiquityMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for UbiquityMapper {
    type Record = CsvRow;

    fn profile(&self) -> &PublisherProfile {
        &self.profile
    }

    fn read(&self, path: &Path) -> Result<Vec<CsvRow>, LoadError> {
        CsvReader::new().read_path(path)
    }

    fn map(&self, row: &CsvRow, _ctx: &mut MapContext<'_>) -> Result<Option<WorkDraft>, MapError> {
        let publisher = match row.get("publisher") {
            Some("LSE Press") => lse_press(),
            Some("University of Westminster Press") => westminster(),
            other => {
                log::debug!("skipping row {} from {}", row.line(), other.unwrap_or("no publisher"));
                return Ok(None);
            }
        };
        let mut draft = book(row)?;
        draft.publisher = Some(publisher);
        Ok(Some(draft))
    }

    fn label(&self, row: &CsvRow, index: usize) -> String {
        row.get("title")
            .map_or_else(|| format!("row {}", index + 1), String::from)
    }
}

fn license(abbreviation: &str) -> Result<String, ValueError> {
    let version = match abbreviation.trim() {
        "cc-4-by" => "by",
        "cc-4-by-nc" => "by-nc",
        "cc-4-by-nc-nd" => "by-nc-nd",
        other => return Err(ValueError::unmapped("license", other)),
    };
    Ok(format!("https://creativecommons.org/licenses/{version}/4.0/"))
}

fn book(row: &CsvRow) -> Result<WorkDraft, ValueError> {
    let title = Title::from_parts(row.require("title")?, row.get("subtitle"));
    let work_type = WorkType::from_label(row.require("work_type")?)?;
    let status = row
        .get("work_status")
        .map(WorkStatus::from_label)
        .transpose()?
        .unwrap_or(WorkStatus::Active);
    let mut draft = WorkDraft::new(work_type, status, title);

    let text = |column: &str| row.get(column).map(String::from);
    let work = &mut draft.work;
    work.edition = row.int("edition")?;
    work.doi = row.get("doi").and_then(identifiers::doi);
    work.reference = text("reference");
    work.publication_date = row.get("publication_date").and_then(normalize::date);
    work.place = text("publication_place");
    work.license = row.get("license").map(license).transpose()?;
    work.copyright_holder = text("copyright_holder");
    work.landing_page = row.get("landing_page").and_then(identifiers::url);
    work.page_count = row.int("page_count")?;
    work.page_breakdown = text("page_breakdown");
    work.first_page = text("first_page");
    work.last_page = text("last_page");
    work.page_interval = match (text("page_interval"), &work.first_page, &work.last_page) {
        (Some(interval), _, _) => Some(interval),
        (None, Some(first), Some(last)) => Some(normalize::page_interval(first, last)),
        _ => None,
    };
    work.image_count = row.int("image_count")?;
    work.table_count = row.int("table_count")?;
    work.audio_count = row.int("audio_count")?;
    work.video_count = row.int("video_count")?;
    work.lccn = text("lccn");
    work.oclc = text("oclc");
    work.short_abstract = text("short_abstract");
    work.long_abstract = text("long_abstract");
    work.general_note = text("general_note");
    work.bibliography_note = text("bibliography_note");
    work.toc = text("toc");
    work.cover_url = row.get("cover_url").and_then(identifiers::url);
    work.cover_caption = text("cover_caption");

    if let Some(cell) = row.get("contributions") {
        draft.contributors = contributions(cell)?;
    }
    if let Some(cell) = row.get("publications") {
        draft.publications = publications(cell)?;
    }
    if let Some(cell) = row.get("languages") {
        draft.languages = languages(cell)?;
    }
    for (column, subject_type) in SUBJECT_COLUMNS {
        if let Some(cell) = row.get(column) {
            draft.add_subjects(subject_type, quoted(cell));
        }
    }
    if let Some(cell) = row.get("relations") {
        draft.children = relations(cell)?;
    }
    Ok(draft)
}

/// Comma-separated fields of a tuple with their quotes removed.
fn fields(tuple: &str) -> Vec<String> {
    tuple
        .split(',')
        .map(|f| f.trim().trim_matches('"').to_string())
        .collect()
}

fn quoted(cell: &str) -> Vec<String> {
    QUOTED
        .captures_iter(cell)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Field `index`, or `None` when it is missing or empty.
fn field(fields: &[String], index: usize) -> Option<&str> {
    fields
        .get(index)
        .map(String::as_str)
        .filter(|f| !f.is_empty())
}

fn flag(fields: &[String], index: usize) -> Option<bool> {
    field(fields, index).map(|f| f.eq_ignore_ascii_case("true"))
}

fn number(fields: &[String], index: usize, name: &str) -> Result<Option<f64>, ValueError> {
    field(fields, index)
        .map(|raw| {
            raw.parse::<f64>()
                .map_err(|_| ValueError::invalid_number(name, raw))
        })
        .transpose()
}

fn contributions(cell: &str) -> Result<Vec<ContributorDraft>, ValueError> {
    let mut contributors = Vec::new();
    for capture in CONTRIBUTION.captures_iter(cell) {
        let Some(tuple) = capture.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let f = fields(tuple);
        let Some(raw_type) = field(&f, 0) else {
            continue;
        };
        let contribution_type = ContributionType::from_label(raw_type)?;
        let last = field(&f, 2).unwrap_or_default();
        let name = PersonName::from_parts(field(&f, 1), last, field(&f, 3));
        if name.full_name.is_empty() {
            continue;
        }
        let mut contributor = ContributorDraft::new(name, contribution_type)
            .with_orcid(field(&f, 6).and_then(identifiers::orcid));
        contributor.main = flag(&f, 4);
        contributor.biography = field(&f, 5).map(String::from);
        contributor.contributor.website = field(&f, 7).and_then(identifiers::url);

        for affiliation in QUOTED_TUPLE.captures_iter(tuple).filter_map(|c| c.get(1)) {
            let a = quoted(affiliation.as_str());
            let institution_name = field(&a, 1).unwrap_or_default();
            if institution_name.is_empty() || institution_name.eq_ignore_ascii_case("n/a") {
                continue;
            }
            contributor.affiliations.push(AffiliationDraft {
                institution: Institution {
                    institution_name: institution_name.to_string(),
                    institution_doi: field(&a, 2).and_then(identifiers::doi),
                    ror: field(&a, 3).and_then(identifiers::ror),
                    country_code: field(&a, 4).map(str::to_ascii_uppercase),
                },
                position: field(&a, 0).map(String::from),
            });
        }
        contributors.push(contributor);
    }
    Ok(contributors)
}

fn publications(cell: &str) -> Result<Vec<PublicationDraft>, ValueError> {
    let mut publications = Vec::new();
    for capture in PUBLICATION.captures_iter(cell) {
        let Some(tuple) = capture.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let f = fields(tuple);
        let publication_type: PublicationType =
            parse_code("publication type", field(&f, 0).unwrap_or_default())?;
        let mut publication = PublicationDraft::new(
            publication_type,
            field(&f, 1).map(identifiers::isbn).transpose()?.flatten(),
        );
        publication.dimensions = Dimensions {
            width_mm: number(&f, 2, "width_mm")?,
            width_cm: number(&f, 3, "width_cm")?,
            width_in: number(&f, 4, "width_in")?,
            height_mm: number(&f, 5, "height_mm")?,
            height_cm: number(&f, 6, "height_cm")?,
            height_in: number(&f, 7, "height_in")?,
            depth_mm: number(&f, 8, "depth_mm")?,
            depth_cm: number(&f, 9, "depth_cm")?,
            depth_in: number(&f, 10, "depth_in")?,
            weight_g: number(&f, 11, "weight_g")?,
            weight_oz: number(&f, 12, "weight_oz")?,
        };

        if let Some(lists) = PRICES_AND_LOCATIONS.captures(tuple) {
            let prices = lists.get(1).map_or("", |m| m.as_str());
            for price in TUPLE.captures_iter(prices).filter_map(|c| c.get(1)) {
                let p = fields(price.as_str());
                if let Some(currency) = field(&p, 0) {
                    publication.add_price(currency, field(&p, 1).and_then(normalize::price));
                }
            }
            let locations = lists.get(2).map_or("", |m| m.as_str());
            for location in TUPLE.captures_iter(locations).filter_map(|c| c.get(1)) {
                let l = fields(location.as_str());
                let platform: LocationPlatform =
                    parse_code("location platform", field(&l, 2).unwrap_or("OTHER"))?;
                publication.add_location(
                    platform,
                    field(&l, 0).and_then(identifiers::url),
                    field(&l, 1).and_then(identifiers::url),
                    flag(&l, 3).unwrap_or(false),
                );
            }
        }
        publications.push(publication);
    }
    Ok(publications)
}

fn languages(cell: &str) -> Result<Vec<LanguageDraft>, ValueError> {
    TUPLE
        .captures_iter(cell)
        .filter_map(|c| c.get(1))
        .map(|tuple| {
            let f = fields(tuple.as_str());
            let relation: LanguageRelation =
                parse_code("language relation", field(&f, 0).unwrap_or_default())?;
            Ok(LanguageDraft {
                code: field(&f, 1).unwrap_or_default().to_ascii_uppercase(),
                relation,
                main: flag(&f, 2).unwrap_or(false),
            })
        })
        .collect()
}

fn relations(cell: &str) -> Result<Vec<RelationDraft>, ValueError> {
    let mut relations = Vec::new();
    for tuple in QUOTED_TUPLE.captures_iter(cell).filter_map(|c| c.get(1)) {
        let f = quoted(tuple.as_str());
        let (Some(title), Some(doi)) = (field(&f, 0), field(&f, 1).and_then(identifiers::doi))
        else {
            continue;
        };
        let relation_type: RelationType =
            parse_code("relation type", field(&f, 2).unwrap_or_default())?;
        let raw_ordinal = field(&f, 3).unwrap_or_default();
        let ordinal = raw_ordinal
            .parse::<i32>()
            .map_err(|_| ValueError::invalid_number("relation ordinal", raw_ordinal))?;
        relations.push(RelationDraft {
            relation_type,
            title: Title::from_parts(title, None),
            doi,
            ordinal,
        });
    }
    Ok(relations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryApi;
    use crate::pipeline::{Pipeline, PipelineOptions};
    use crate::resolver::NoResolver;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("cc-4-by", "https://creativecommons.org/licenses/by/4.0/")]
    #[case("cc-4-by-nc", "https://creativecommons.org/licenses/by-nc/4.0/")]
    #[case("cc-4-by-nc-nd", "https://creativecommons.org/licenses/by-nc-nd/4.0/")]
    fn test_license(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(license(raw).unwrap(), expected);
    }

    #[test]
    fn test_unknown_license() {
        assert!(matches!(
            license("cc-3-by"),
            Err(ValueError::UnmappedCode { .. })
        ));
    }

    #[test]
    fn test_contributions_with_affiliations() {
        let cell = r#"("Author","Jane","Doe","Jane Doe","true","Writes books","0000-0002-1825-0097","janedoe.net",[("Lecturer","London School of Economics","","https://ror.org/0090zs177","gb"),("","n/a","","","")]),("Editor","","","","false","","","",[])"#;
        let list = contributions(cell).unwrap();
        assert_eq!(list.len(), 1);
        let jane = &list[0];
        assert_eq!(jane.contribution_type, ContributionType::Author);
        assert_eq!(jane.main, Some(true));
        assert_eq!(jane.biography.as_deref(), Some("Writes books"));
        assert_eq!(jane.contributor.website.as_deref(), Some("https://janedoe.net"));
        assert_eq!(
            jane.contributor.orcid.as_deref(),
            Some("https://orcid.org/0000-0002-1825-0097")
        );
        assert_eq!(jane.ordinal, None);
        assert_eq!(jane.affiliations.len(), 1);
        let affiliation = &jane.affiliations[0];
        assert_eq!(affiliation.position.as_deref(), Some("Lecturer"));
        assert_eq!(affiliation.institution.country_code.as_deref(), Some("GB"));
        assert_eq!(
            affiliation.institution.ror.as_deref(),
            Some("https://ror.org/0090zs177")
        );
    }

    #[test]
    fn test_publications_with_prices_and_locations() {
        let cell = r#"("Paperback","9781234567897","156","","","234","","","","","","","",[("GBP","24.99"),("USD","0")],[("press.lse.ac.uk/site/books/1","","PUBLISHER_WEBSITE","true")]),("PDF","","","","","","","","","","","","",[],[("https://library.oapen.org/1","https://library.oapen.org/1.pdf","OAPEN","false")])"#;
        let list = publications(cell).unwrap();
        assert_eq!(list.len(), 2);
        let paperback = &list[0];
        assert_eq!(paperback.publication_type, PublicationType::Paperback);
        assert_eq!(paperback.dimensions.width_mm, Some(156.0));
        assert_eq!(paperback.dimensions.height_mm, Some(234.0));
        assert_eq!(paperback.prices.len(), 1);
        assert_eq!(paperback.prices[0].currency, "GBP");
        let location = &paperback.locations[0];
        assert_eq!(location.location_platform, LocationPlatform::PublisherWebsite);
        assert_eq!(
            location.landing_page.as_deref(),
            Some("https://press.lse.ac.uk/site/books/1")
        );
        assert!(location.canonical);
        assert_eq!(list[1].locations[0].location_platform, LocationPlatform::Oapen);
        assert!(!list[1].locations[0].canonical);
    }

    #[test]
    fn test_languages_and_subjects() {
        let row = CsvRow::from_pairs([
            ("title", "Urban Futures"),
            ("work_type", "Monograph"),
            ("languages", r#"("ORIGINAL","eng","true")"#),
            ("bic", r#"["JFFG","RPC"]"#),
            ("keywords", r#"["cities", "planning"]"#),
        ]);
        let draft = book(&row).unwrap();
        assert_eq!(
            draft.languages,
            vec![LanguageDraft {
                code: "ENG".into(),
                relation: LanguageRelation::Original,
                main: true
            }]
        );
        let subjects: Vec<(SubjectType, &str, i32)> = draft
            .subjects
            .iter()
            .map(|s| (s.subject_type, s.code.as_str(), s.ordinal))
            .collect();
        assert_eq!(
            subjects,
            vec![
                (SubjectType::Bic, "JFFG", 1),
                (SubjectType::Bic, "RPC", 2),
                (SubjectType::Keyword, "cities", 1),
                (SubjectType::Keyword, "planning", 2),
            ]
        );
    }

    #[test]
    fn test_page_interval_from_pages() {
        let row = CsvRow::from_pairs([
            ("title", "Chapter One"),
            ("work_type", "Book chapter"),
            ("first_page", "7"),
            ("last_page", "30"),
            ("relations", r#"("Part One","10.31389/lsepress.abc.a","HAS_CHILD","1")"#),
        ]);
        let draft = book(&row).unwrap();
        assert_eq!(draft.work.page_interval.as_deref(), Some("7–30"));
        assert_eq!(draft.children.len(), 1);
        assert_eq!(draft.children[0].doi, "https://doi.org/10.31389/lsepress.abc.a");
        assert_eq!(draft.children[0].ordinal, 1);
    }

    #[test]
    fn test_rows_from_other_presses_are_skipped() {
        let mut pipeline =
            Pipeline::new(MemoryApi::new(), NoResolver, PipelineOptions::default()).unwrap();
        let rows = vec![
            CsvRow::from_pairs([
                ("publisher", "Some Other Press"),
                ("title", "Elsewhere"),
                ("work_type", "Monograph"),
            ]),
            CsvRow::from_pairs([
                ("publisher", "University of Westminster Press"),
                ("title", "Here"),
                ("work_type", "Monograph"),
            ]),
        ];
        let report = pipeline.run_records(&UbiquityMapper::new(), &rows);
        assert_eq!(report.failures().count(), 0);
        let works = pipeline.api().works();
        assert_eq!(works.len(), 1);
        assert_eq!(works[0].work.full_title, "Here");
        let publishers = pipeline.api().calls_to("create_publisher");
        assert_eq!(publishers.len(), 1);
        assert_eq!(
            publishers[0]["publisherName"],
            "University of Westminster Press"
        );
    }
}
