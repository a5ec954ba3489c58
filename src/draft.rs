//! Per-record drafts produced by the mappers and consumed by the pipeline.
//!
//! A [`WorkDraft`] is everything one source record says about one work, already
//! normalized, but without any remote ids. The pipeline resolves ids and decides
//! what to create or update.

use crate::model::{
    ContributionType, Contributor, Dimensions, Institution, LanguageRelation, Location,
    PublicationType, RelationType, SeriesType, SubjectType, Work, WorkStatus, WorkType,
};
use crate::normalize::Title;
use crate::pipeline::PublisherProfile;

/// A work and everything attached to it, as read from one source record.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkDraft {
    /// Human-readable label used in logs and the run report.
    pub label: String,
    /// The work payload. Its `imprint_id` is filled in by the pipeline.
    pub work: Work,
    /// Overrides the mapper's publisher for this record.
    pub publisher: Option<PublisherProfile>,
    /// Named imprint; `None` uses the publisher's default imprint.
    pub imprint: Option<String>,
    pub contributors: Vec<ContributorDraft>,
    pub publications: Vec<PublicationDraft>,
    pub languages: Vec<LanguageDraft>,
    pub subjects: Vec<SubjectDraft>,
    pub series: Vec<SeriesDraft>,
    pub fundings: Vec<FundingDraft>,
    pub children: Vec<RelationDraft>,
    pub parent: Option<ParentDraft>,
}

impl WorkDraft {
    #[must_use]
    pub fn new(work_type: WorkType, work_status: WorkStatus, title: Title) -> Self {
        let label = title.full_title.clone();
        WorkDraft {
            label,
            work: Work::new(work_type, work_status, title, String::new()),
            publisher: None,
            imprint: None,
            contributors: Vec::new(),
            publications: Vec::new(),
            languages: Vec::new(),
            subjects: Vec::new(),
            series: Vec::new(),
            fundings: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Appends subjects of one type, numbering them from 1 in input order.
    pub fn add_subjects<I, S>(&mut self, subject_type: SubjectType, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes = codes
            .into_iter()
            .map(Into::into)
            .filter(|c: &String| !c.trim().is_empty());
        for (i, code) in codes.enumerate() {
            self.subjects.push(SubjectDraft {
                subject_type,
                code: code.trim().to_string(),
                ordinal: i as i32 + 1,
            });
        }
    }
}

/// A person or organization split into the name parts the API stores.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonName {
    pub first_name: Option<String>,
    pub last_name: String,
    pub full_name: String,
}

impl PersonName {
    /// An organization or otherwise unsplittable name.
    #[must_use]
    pub fn opaque(name: &str) -> Self {
        let name = name.trim();
        PersonName {
            first_name: None,
            last_name: name.to_string(),
            full_name: name.to_string(),
        }
    }

    /// Parses `"Surname, Given"`. Without a comma the name is opaque.
    #[must_use]
    pub fn from_inverted(raw: &str) -> Self {
        match raw.split_once(',') {
            Some((last, first)) if !first.trim().is_empty() => {
                let (first, last) = (first.trim(), last.trim());
                PersonName {
                    first_name: Some(first.to_string()),
                    last_name: last.to_string(),
                    full_name: format!("{first} {last}"),
                }
            }
            _ => Self::opaque(raw.trim().trim_end_matches(',')),
        }
    }

    /// Parses space-separated tokens written surname first.
    ///
    /// Two tokens are `"Surname Given"`. Three tokens are `"Initial Surname Given"`,
    /// e.g. `"K. Németh András"` gives first name `"András K."`.
    #[must_use]
    pub fn from_tokens(raw: &str) -> Self {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        match tokens.as_slice() {
            [initial, surname, given] => PersonName {
                first_name: Some(format!("{given} {initial}")),
                last_name: surname.to_string(),
                full_name: format!("{given} {initial} {surname}"),
            },
            [surname, given] => PersonName {
                first_name: Some(given.to_string()),
                last_name: surname.to_string(),
                full_name: format!("{given} {surname}"),
            },
            _ => PersonName {
                first_name: Some(raw.trim().to_string()),
                ..Self::opaque(raw)
            },
        }
    }

    /// Builds a name from already separate parts; the full name is derived
    /// when it is missing.
    #[must_use]
    pub fn from_parts(first: Option<&str>, last: &str, full: Option<&str>) -> Self {
        let first = first.map(str::trim).filter(|f| !f.is_empty());
        let last = last.trim();
        let full = full
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| match first {
                Some(first) => format!("{first} {last}"),
                None => last.to_string(),
            });
        PersonName {
            first_name: first.map(str::to_string),
            last_name: last.to_string(),
            full_name: full,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContributorDraft {
    pub contributor: Contributor,
    pub contribution_type: ContributionType,
    /// Overrides the main-contribution flag derived from the type.
    pub main: Option<bool>,
    pub ordinal: Option<i32>,
    pub biography: Option<String>,
    pub affiliations: Vec<AffiliationDraft>,
    /// Merge incoming fields into an already known contributor.
    pub refresh: bool,
}

impl ContributorDraft {
    #[must_use]
    pub fn new(name: PersonName, contribution_type: ContributionType) -> Self {
        ContributorDraft {
            contributor: Contributor {
                first_name: name.first_name,
                last_name: name.last_name,
                full_name: name.full_name,
                orcid: None,
                website: None,
            },
            contribution_type,
            main: None,
            ordinal: None,
            biography: None,
            affiliations: Vec::new(),
            refresh: false,
        }
    }

    #[must_use]
    pub fn with_orcid(mut self, orcid: Option<String>) -> Self {
        self.contributor.orcid = orcid;
        self
    }

    #[must_use]
    pub fn with_ordinal(mut self, ordinal: i32) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    #[must_use]
    pub fn is_main(&self) -> bool {
        self.main.unwrap_or_else(|| self.contribution_type.is_main())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AffiliationDraft {
    pub institution: Institution,
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublicationDraft {
    pub publication_type: PublicationType,
    pub isbn: Option<String>,
    pub dimensions: Dimensions,
    pub prices: Vec<PriceDraft>,
    pub locations: Vec<Location>,
}

impl PublicationDraft {
    #[must_use]
    pub fn new(publication_type: PublicationType, isbn: Option<String>) -> Self {
        PublicationDraft {
            publication_type,
            isbn,
            dimensions: Dimensions::default(),
            prices: Vec::new(),
            locations: Vec::new(),
        }
    }

    /// Adds a location; nothing is added when both URLs are missing.
    pub fn add_location(
        &mut self,
        platform: crate::model::LocationPlatform,
        landing_page: Option<String>,
        full_text_url: Option<String>,
        canonical: bool,
    ) {
        if landing_page.is_none() && full_text_url.is_none() {
            return;
        }
        self.locations.push(Location {
            landing_page,
            full_text_url,
            location_platform: platform,
            canonical,
        });
    }

    /// Adds a price; zero or missing amounts are ignored.
    pub fn add_price(&mut self, currency: &str, amount: Option<f64>) {
        if let Some(amount) = amount.filter(|a| *a > 0.0) {
            self.prices.push(PriceDraft {
                currency: currency.to_ascii_uppercase(),
                amount,
            });
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceDraft {
    pub currency: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageDraft {
    pub code: String,
    pub relation: LanguageRelation,
    pub main: bool,
}

impl LanguageDraft {
    #[must_use]
    pub fn original(code: &str) -> Self {
        LanguageDraft {
            code: crate::model::codes::language_code(code),
            relation: LanguageRelation::Original,
            main: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectDraft {
    pub subject_type: SubjectType,
    pub code: String,
    pub ordinal: i32,
}

/// A series the work belongs to. ISSNs are already canonical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesDraft {
    pub series_type: SeriesType,
    pub name: String,
    pub issn_print: Option<String>,
    pub issn_digital: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub cfp_url: Option<String>,
    pub ordinal: Option<i32>,
    /// Number this issue together with the rest of the run's issues in the
    /// same series once every record has been processed.
    pub deferred: bool,
}

impl SeriesDraft {
    #[must_use]
    pub fn new(series_type: SeriesType, name: &str) -> Self {
        SeriesDraft {
            series_type,
            name: name.trim().to_string(),
            issn_print: None,
            issn_digital: None,
            url: None,
            description: None,
            cfp_url: None,
            ordinal: None,
            deferred: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingDraft {
    pub institution: Institution,
    pub program: Option<String>,
    pub project_name: Option<String>,
    pub project_shortname: Option<String>,
    pub grant_number: Option<String>,
    pub jurisdiction: Option<String>,
}

/// A related work listed on the parent record, e.g. a chapter of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDraft {
    pub relation_type: RelationType,
    pub title: Title,
    pub doi: String,
    pub ordinal: i32,
}

/// The book a chapter belongs to, found by exact title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentDraft {
    pub title: String,
    pub ordinal: Option<i32>,
}

/// A long abstract for a work that must already exist.
///
/// It only fills an empty abstract; one already on the work is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractDraft {
    pub label: String,
    /// Canonical DOI of the target work.
    pub doi: String,
    /// The target must have this type, when given.
    pub work_type: Option<WorkType>,
    pub long_abstract: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("Doe, Jane", Some("Jane"), "Doe", "Jane Doe")]
    #[case(" Doe ,  Jane ", Some("Jane"), "Doe", "Jane Doe")]
    #[case("Open Book Collective", None, "Open Book Collective", "Open Book Collective")]
    fn test_inverted_names(
        #[case] raw: &str,
        #[case] first: Option<&str>,
        #[case] last: &str,
        #[case] full: &str,
    ) {
        let name = PersonName::from_inverted(raw);
        assert_eq!(name.first_name.as_deref(), first);
        assert_eq!(name.last_name, last);
        assert_eq!(name.full_name, full);
    }

    #[rstest]
    #[case("Kovács Anna", "Anna", "Kovács", "Anna Kovács")]
    #[case("K. Németh András", "András K.", "Németh", "András K. Németh")]
    #[case("Plato", "Plato", "Plato", "Plato")]
    fn test_token_names(
        #[case] raw: &str,
        #[case] first: &str,
        #[case] last: &str,
        #[case] full: &str,
    ) {
        let name = PersonName::from_tokens(raw);
        assert_eq!(name.first_name.as_deref(), Some(first));
        assert_eq!(name.last_name, last);
        assert_eq!(name.full_name, full);
    }

    #[test]
    fn test_name_from_parts() {
        let name = PersonName::from_parts(Some("Jane"), "Doe", None);
        assert_eq!(name.full_name, "Jane Doe");
        let name = PersonName::from_parts(Some(" "), "Doe", Some("J. Doe"));
        assert_eq!(name.first_name, None);
        assert_eq!(name.full_name, "J. Doe");
    }

    #[test]
    fn test_subjects_are_numbered() {
        let mut draft = WorkDraft::new(
            WorkType::Monograph,
            WorkStatus::Active,
            Title::split("A Book"),
        );
        draft.add_subjects(SubjectType::Keyword, ["history", " ", "economics "]);
        let codes: Vec<(String, i32)> = draft
            .subjects
            .iter()
            .map(|s| (s.code.clone(), s.ordinal))
            .collect();
        assert_eq!(
            codes,
            vec![("history".to_string(), 1), ("economics".to_string(), 2)]
        );
    }

    #[test]
    fn test_zero_prices_are_dropped() {
        let mut publication = PublicationDraft::new(PublicationType::Paperback, None);
        publication.add_price("gbp", Some(0.0));
        publication.add_price("gbp", None);
        publication.add_price("usd", Some(19.95));
        assert_eq!(
            publication.prices,
            vec![PriceDraft {
                currency: "USD".into(),
                amount: 19.95
            }]
        );
    }
}
