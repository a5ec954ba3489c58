//! SciELO Books JSON export.
//!
//! The same record layout is used for every press hosted on SciELO Books, so
//! [`ScieloMapper`] is parameterized by publisher.

use std::path::Path;

use either::{Either, Left, Right};
use serde::Deserialize;
use serde_json::Value;

use crate::draft::{ContributorDraft, LanguageDraft, PersonName, PublicationDraft, WorkDraft};
use crate::error::{LoadError, ValueError};
use crate::identifiers;
use crate::json::{self, string_or_number};
use crate::model::{
    ContributionType, LocationPlatform, PublicationType, SubjectType, WorkStatus, WorkType,
};
use crate::normalize::{self, Title};
use crate::pipeline::{MapContext, MapError, Mapper, PublisherProfile};

/// `[key, value]`, the shape of every creator attribute.
type Pair = (Value, Option<String>);

/// One book as exported by SciELO Books.
#[derive(Debug, Clone, Deserialize)]
pub struct ScieloBook {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// `[[_, role], [_, "Surname, Given"], [_, profile link]]` per creator.
    #[serde(default)]
    pub creators: Vec<Vec<Pair>>,
    #[serde(default)]
    pub edition: Vec<Value>,
    #[serde(default)]
    pub doi_number: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub pages: Option<String>,
    #[serde(default)]
    pub use_licence: Option<String>,
    #[serde(default)]
    pub books_url: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub epub_url: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub eisbn: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub isbn: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub bisac_code: Value,
    #[serde(default)]
    pub primary_descriptor: Option<String>,
}

pub struct ScieloMapper {
    profile: PublisherProfile,
}

impl ScieloMapper {
    #[must_use]
    pub fn scielo() -> Self {
        ScieloMapper {
            profile: PublisherProfile::new("SciELO Books", None, Some("https://books.scielo.org/")),
        }
    }

    #[must_use]
    pub fn editus() -> Self {
        Self::press("EDITUS", "http://www.uesc.br/editora/")
    }

    #[must_use]
    pub fn eduepb() -> Self {
        Self::press("EDUEPB", "https://books.scielo.org/eduepb/")
    }

    #[must_use]
    pub fn edufba() -> Self {
        Self::press("EDUFBA", "https://books.scielo.org/edufba/")
    }

    #[must_use]
    pub fn rosario() -> Self {
        Self::press(
            "Editorial Universidad del Rosario",
            "https://editorial.urosario.edu.co/",
        )
    }

    /// A single press publishing through SciELO Books.
    fn press(name: &str, url: &str) -> Self {
        ScieloMapper {
            profile: PublisherProfile::new(name, None, Some(url)),
        }
    }
}

impl Mapper for ScieloMapper {
    type Record = ScieloBook;

    fn profile(&self) -> &PublisherProfile {
        &self.profile
    }

    fn read(&self, path: &Path) -> Result<Vec<ScieloBook>, LoadError> {
        json::read_path(path)
    }

    fn map(
        &self,
        record: &ScieloBook,
        _ctx: &mut MapContext<'_>,
    ) -> Result<Option<WorkDraft>, MapError> {
        Ok(Some(book(record)?))
    }

    fn label(&self, record: &ScieloBook, _index: usize) -> String {
        record.title.clone()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn language(code: &str) -> Result<&'static str, ValueError> {
    Ok(match code.trim() {
        "pt" => "POR",
        "es" => "SPA",
        "en" => "ENG",
        other => return Err(ValueError::unmapped("language", other)),
    })
}

/// A creator's profile link is either an ORCID or a personal website.
fn profile_link(link: &str) -> Either<String, String> {
    match identifiers::find_orcid(link).and_then(|id| identifiers::orcid(&id)) {
        Some(orcid) => Left(orcid),
        None => Right(link.trim().to_string()),
    }
}

fn attribute(creator: &[Pair], index: usize) -> Option<&str> {
    creator
        .get(index)
        .and_then(|(_, value)| value.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn creators(record: &ScieloBook) -> Result<Vec<ContributorDraft>, ValueError> {
    let mut contributors = Vec::new();
    for creator in &record.creators {
        let (Some(role), Some(name)) = (attribute(creator, 0), attribute(creator, 1)) else {
            continue;
        };
        let contribution_type = ContributionType::from_label(role)?;
        let mut contributor = ContributorDraft::new(PersonName::from_inverted(name), contribution_type)
            .with_ordinal(contributors.len() as i32 + 1);
        match attribute(creator, 2).map(profile_link) {
            Some(Left(orcid)) => contributor.contributor.orcid = Some(orcid),
            Some(Right(website)) => contributor.contributor.website = identifiers::url(&website),
            None => {}
        }
        contributor.main = Some(true);
        contributor.refresh = true;
        contributors.push(contributor);
    }
    Ok(contributors)
}

fn book(record: &ScieloBook) -> Result<WorkDraft, ValueError> {
    let organized = record.creators.iter().any(|creator| {
        creator
            .first()
            .and_then(|(_, role)| role.as_deref())
            .is_some_and(|role| role == "organizer")
    });
    let work_type = if organized {
        WorkType::EditedBook
    } else {
        WorkType::Monograph
    };
    let mut draft = WorkDraft::new(work_type, WorkStatus::Active, Title::split(&record.title));

    let place: Vec<&str> = [present(&record.city), present(&record.country)]
        .into_iter()
        .flatten()
        .collect();
    let edition = match record.edition.first() {
        Some(Value::Number(n)) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Some(Value::String(s)) => normalize::leading_int(s),
        _ => None,
    };

    let work = &mut draft.work;
    work.reference = Some(record.id.clone());
    work.publication_date = present(&record.year).and_then(normalize::date);
    work.place = (!place.is_empty()).then(|| place.join(", "));
    work.edition = Some(edition.unwrap_or(1));
    work.doi = present(&record.doi_number).and_then(identifiers::doi);
    work.page_count = normalize::int_cell("pages", present(&record.pages))?;
    work.license = present(&record.use_licence).and_then(identifiers::url);
    work.landing_page = present(&record.books_url).and_then(identifiers::url);
    work.long_abstract = present(&record.synopsis).map(String::from);
    work.cover_url = present(&record.cover_url).and_then(identifiers::url);

    let landing = draft.work.landing_page.clone();
    let formats = [
        (PublicationType::Pdf, None, present(&record.pdf_url)),
        (PublicationType::Epub, present(&record.eisbn), present(&record.epub_url)),
        (PublicationType::Paperback, present(&record.isbn), None),
    ];
    for (publication_type, isbn, full_text) in formats {
        let mut publication = PublicationDraft::new(publication_type, super::isbn_cell(isbn)?);
        publication.add_location(
            LocationPlatform::Other,
            landing.clone(),
            full_text.and_then(identifiers::url),
            true,
        );
        draft.publications.push(publication);
    }

    draft.contributors = creators(record)?;

    if let Some(code) = present(&record.language) {
        draft.languages.push(LanguageDraft::original(language(code)?));
    }
    if let Some(bisac) = record.bisac_code.pointer("/0/0/1").and_then(Value::as_str) {
        draft.add_subjects(SubjectType::Bisac, [bisac]);
    }
    if let Some(descriptors) = present(&record.primary_descriptor) {
        draft.add_subjects(SubjectType::Keyword, descriptors.split("; "));
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NoResolver;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const RECORD: &str = r#"[{
        "_id": "9q9zk",
        "title": "Saúde e ambiente: uma abordagem",
        "year": "2015",
        "city": "Ilhéus",
        "country": "Brasil",
        "creators": [
            [["role", "organizer"], ["full_name", "Silva, Maria"], ["link_resume", "https://orcid.org/0000-0002-1825-0097"]],
            [["role", "author"], ["full_name", "Santos, João"], ["link_resume", "lattes.cnpq.br/123"]],
            [["role", "author"], ["full_name", "Souza, Ana"], ["link_resume", null]]
        ],
        "edition": ["2"],
        "doi_number": "10.7476/9788574554000",
        "pages": 212,
        "use_licence": "https://creativecommons.org/licenses/by/4.0/",
        "books_url": "http://books.scielo.org/id/9q9zk",
        "synopsis": "Um livro.",
        "pdf_url": "http://books.scielo.org/id/9q9zk/pdf/silva.pdf",
        "epub_url": "http://books.scielo.org/id/9q9zk/epub/silva.epub",
        "eisbn": "9781234567897",
        "isbn": "",
        "language": "pt",
        "bisac_code": [[["code", "MED078000"]]],
        "primary_descriptor": "saúde; ambiente"
    }]"#;

    fn record() -> ScieloBook {
        json::parse::<ScieloBook>(RECORD).unwrap().remove(0)
    }

    #[rstest]
    #[case("https://orcid.org/0000-0002-1825-0097", Left("https://orcid.org/0000-0002-1825-0097".to_string()))]
    #[case("orcid: 0000-0002-1825-0097", Left("https://orcid.org/0000-0002-1825-0097".to_string()))]
    #[case("http://lattes.cnpq.br/123", Right("http://lattes.cnpq.br/123".to_string()))]
    fn test_profile_link(#[case] raw: &str, #[case] expected: Either<String, String>) {
        assert_eq!(profile_link(raw), expected);
    }

    #[test]
    fn test_book_fields() {
        let draft = book(&record()).unwrap();
        let work = &draft.work;
        assert_eq!(work.work_type, WorkType::EditedBook);
        assert_eq!(work.title, "Saúde e ambiente");
        assert_eq!(work.place.as_deref(), Some("Ilhéus, Brasil"));
        assert_eq!(work.edition, Some(2));
        assert_eq!(work.page_count, Some(212));
        assert_eq!(work.publication_date.as_deref(), Some("2015-01-01"));
        assert_eq!(
            work.doi.as_deref(),
            Some("https://doi.org/10.7476/9788574554000")
        );
        assert_eq!(draft.languages[0].code, "POR");
        let subjects: Vec<(SubjectType, &str, i32)> = draft
            .subjects
            .iter()
            .map(|s| (s.subject_type, s.code.as_str(), s.ordinal))
            .collect();
        assert_eq!(
            subjects,
            vec![
                (SubjectType::Bisac, "MED078000", 1),
                (SubjectType::Keyword, "saúde", 1),
                (SubjectType::Keyword, "ambiente", 2),
            ]
        );
    }

    #[test]
    fn test_publications_share_the_landing_page() {
        let draft = book(&record()).unwrap();
        let summary: Vec<(PublicationType, Option<&str>, Option<&str>)> = draft
            .publications
            .iter()
            .map(|p| {
                (
                    p.publication_type,
                    p.isbn.as_deref(),
                    p.locations[0].full_text_url.as_deref(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    PublicationType::Pdf,
                    None,
                    Some("http://books.scielo.org/id/9q9zk/pdf/silva.pdf")
                ),
                (
                    PublicationType::Epub,
                    Some("978-1-234-56789-7"),
                    Some("http://books.scielo.org/id/9q9zk/epub/silva.epub")
                ),
                (PublicationType::Paperback, None, None),
            ]
        );
        assert!(draft.publications.iter().all(|p| p.locations[0].canonical));
    }

    #[test]
    fn test_creators() {
        let draft = book(&record()).unwrap();
        let people: Vec<(&str, ContributionType, Option<&str>, Option<&str>)> = draft
            .contributors
            .iter()
            .map(|c| {
                (
                    c.contributor.full_name.as_str(),
                    c.contribution_type,
                    c.contributor.orcid.as_deref(),
                    c.contributor.website.as_deref(),
                )
            })
            .collect();
        assert_eq!(
            people,
            vec![
                (
                    "Maria Silva",
                    ContributionType::Editor,
                    Some("https://orcid.org/0000-0002-1825-0097"),
                    None
                ),
                (
                    "João Santos",
                    ContributionType::Author,
                    None,
                    Some("https://lattes.cnpq.br/123")
                ),
                ("Ana Souza", ContributionType::Author, None, None),
            ]
        );
        assert!(draft.contributors.iter().all(|c| c.refresh && c.is_main()));
        assert_eq!(draft.contributors[2].ordinal, Some(3));
    }

    #[test]
    fn test_unknown_language() {
        let mut record = record();
        record.language = Some("fr".into());
        assert!(matches!(
            book(&record),
            Err(ValueError::UnmappedCode { .. })
        ));
    }

    #[rstest]
    #[case(ScieloMapper::scielo(), "SciELO Books", "https://books.scielo.org/")]
    #[case(ScieloMapper::editus(), "EDITUS", "http://www.uesc.br/editora/")]
    #[case(ScieloMapper::eduepb(), "EDUEPB", "https://books.scielo.org/eduepb/")]
    #[case(ScieloMapper::edufba(), "EDUFBA", "https://books.scielo.org/edufba/")]
    #[case(
        ScieloMapper::rosario(),
        "Editorial Universidad del Rosario",
        "https://editorial.urosario.edu.co/"
    )]
    fn test_press_profiles(#[case] mapper: ScieloMapper, #[case] name: &str, #[case] url: &str) {
        let profile = mapper.profile();
        assert_eq!(profile.name, name);
        assert_eq!(profile.url.as_deref(), Some(url));
        assert_eq!(profile.shortname, None);
    }

    #[test]
    fn test_press_profile_maps_like_scielo() {
        let record = record();
        let mut ctx = MapContext::new(&NoResolver);
        let scielo = ScieloMapper::scielo().map(&record, &mut ctx).unwrap().unwrap();
        let rosario = ScieloMapper::rosario().map(&record, &mut ctx).unwrap().unwrap();
        assert_eq!(scielo, rosario);
    }
}
