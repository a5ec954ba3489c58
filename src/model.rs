//! Typed payloads sent to the metadata API and the record views it returns.
//!
//! Required fields are plain values; everything the API treats as optional is
//! an `Option`. All types serialize with camelCase keys and SCREAMING_SNAKE_CASE
//! enum values, matching the API's GraphQL input objects.

use serde::{Deserialize, Serialize};

pub mod codes;

pub use codes::{parse_code, wire_name};

/// Remote identifier (a UUID string in the GraphQL API, a nanoid in memory).
pub type Id = String;

macro_rules! api_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }
    };
}

api_enum!(
    /// Kind of work.
    WorkType {
        BookChapter,
        Monograph,
        EditedBook,
        Textbook,
        JournalIssue,
        BookSet,
    }
);

api_enum!(
    /// Publishing status of a work.
    WorkStatus {
        Unspecified,
        Cancelled,
        Forthcoming,
        PostponedIndefinitely,
        Active,
        NoLongerOurProduct,
        OutOfStockIndefinitely,
        OutOfPrint,
        Inactive,
        Unknown,
        Remaindered,
        WithdrawnFromSale,
        Recalled,
    }
);

api_enum!(
    /// Role of a contributor on a work.
    ContributionType {
        Author,
        Editor,
        Translator,
        Photographer,
        Illustrator,
        MusicEditor,
        ForewordBy,
        IntroductionBy,
        AfterwordBy,
        PrefaceBy,
        SoftwareBy,
        ResearchBy,
        ContributionsBy,
        Indexer,
    }
);

api_enum!(PublicationType {
    Paperback,
    Hardback,
    Pdf,
    Html,
    Xml,
    Epub,
    Mobi,
    Azw3,
    Docx,
    FictionBook,
    Mp3,
    Wav,
});

api_enum!(
    /// Hosting platform of a location.
    LocationPlatform {
        ProjectMuse,
        Oapen,
        Doab,
        Jstor,
        EbscoHost,
        OclcKb,
        ProquestKb,
        ProquestExlibris,
        EbscoKb,
        JiscKb,
        GoogleBooks,
        InternetArchive,
        ScienceOpen,
        ScieloBooks,
        Zenodo,
        PublisherWebsite,
        Thoth,
        Other,
    }
);

api_enum!(SubjectType {
    Bic,
    Bisac,
    Thema,
    Lcc,
    Custom,
    Keyword,
});

api_enum!(LanguageRelation {
    Original,
    TranslatedFrom,
    TranslatedInto,
});

api_enum!(RelationType {
    Replaces,
    HasTranslation,
    HasPart,
    HasChild,
    IsReplacedBy,
    IsTranslationOf,
    IsPartOf,
    IsChildOf,
});

api_enum!(SeriesType { Journal, BookSeries });

impl RelationType {
    /// The relation recorded on the other work.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            RelationType::Replaces => RelationType::IsReplacedBy,
            RelationType::HasTranslation => RelationType::IsTranslationOf,
            RelationType::HasPart => RelationType::IsPartOf,
            RelationType::HasChild => RelationType::IsChildOf,
            RelationType::IsReplacedBy => RelationType::Replaces,
            RelationType::IsTranslationOf => RelationType::HasTranslation,
            RelationType::IsPartOf => RelationType::HasPart,
            RelationType::IsChildOf => RelationType::HasChild,
        }
    }
}

impl ContributionType {
    /// Authors, editors and translators are main contributions.
    #[must_use]
    pub fn is_main(self) -> bool {
        matches!(
            self,
            ContributionType::Author | ContributionType::Editor | ContributionType::Translator
        )
    }
}

/// The canonical work record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub work_type: WorkType,
    pub work_status: WorkStatus,
    pub full_title: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub reference: Option<String>,
    pub edition: Option<i32>,
    pub imprint_id: Id,
    pub doi: Option<String>,
    pub publication_date: Option<String>,
    pub place: Option<String>,
    pub page_count: Option<i32>,
    pub page_breakdown: Option<String>,
    pub first_page: Option<String>,
    pub last_page: Option<String>,
    pub page_interval: Option<String>,
    pub image_count: Option<i32>,
    pub table_count: Option<i32>,
    pub audio_count: Option<i32>,
    pub video_count: Option<i32>,
    pub license: Option<String>,
    pub copyright_holder: Option<String>,
    pub landing_page: Option<String>,
    pub lccn: Option<String>,
    pub oclc: Option<String>,
    pub short_abstract: Option<String>,
    pub long_abstract: Option<String>,
    pub general_note: Option<String>,
    pub bibliography_note: Option<String>,
    pub toc: Option<String>,
    pub cover_url: Option<String>,
    pub cover_caption: Option<String>,
}

impl Work {
    /// A work with only the required fields set.
    #[must_use]
    pub fn new(
        work_type: WorkType,
        work_status: WorkStatus,
        title: crate::normalize::Title,
        imprint_id: impl Into<Id>,
    ) -> Self {
        Work {
            work_type,
            work_status,
            full_title: title.full_title,
            title: title.title,
            subtitle: title.subtitle,
            reference: None,
            edition: None,
            imprint_id: imprint_id.into(),
            doi: None,
            publication_date: None,
            place: None,
            page_count: None,
            page_breakdown: None,
            first_page: None,
            last_page: None,
            page_interval: None,
            image_count: None,
            table_count: None,
            audio_count: None,
            video_count: None,
            license: None,
            copyright_holder: None,
            landing_page: None,
            lccn: None,
            oclc: None,
            short_abstract: None,
            long_abstract: None,
            general_note: None,
            bibliography_note: None,
            toc: None,
            cover_url: None,
            cover_caption: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub first_name: Option<String>,
    pub last_name: String,
    pub full_name: String,
    pub orcid: Option<String>,
    pub website: Option<String>,
}

/// Incoming contributor data where every field may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContributorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub orcid: Option<String>,
    pub website: Option<String>,
}

impl From<&Contributor> for ContributorPatch {
    fn from(c: &Contributor) -> Self {
        ContributorPatch {
            first_name: c.first_name.clone(),
            last_name: Some(c.last_name.clone()),
            full_name: Some(c.full_name.clone()),
            orcid: c.orcid.clone(),
            website: c.website.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContribution {
    pub work_id: Id,
    pub contributor_id: Id,
    pub contribution_type: ContributionType,
    pub main_contribution: bool,
    pub contribution_ordinal: i32,
    pub biography: Option<String>,
    pub first_name: Option<String>,
    pub last_name: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub institution_name: String,
    pub institution_doi: Option<String>,
    pub ror: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAffiliation {
    pub contribution_id: Id,
    pub institution_id: Id,
    pub affiliation_ordinal: i32,
    pub position: Option<String>,
}

/// Physical dimensions of a publication.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub width_mm: Option<f64>,
    pub width_cm: Option<f64>,
    pub width_in: Option<f64>,
    pub height_mm: Option<f64>,
    pub height_cm: Option<f64>,
    pub height_in: Option<f64>,
    pub depth_mm: Option<f64>,
    pub depth_cm: Option<f64>,
    pub depth_in: Option<f64>,
    pub weight_g: Option<f64>,
    pub weight_oz: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPublication {
    pub work_id: Id,
    pub publication_type: PublicationType,
    pub isbn: Option<String>,
    #[serde(flatten)]
    pub dimensions: Dimensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrice {
    pub publication_id: Id,
    pub currency_code: String,
    pub unit_price: f64,
}

/// A location without its publication, as planned before creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub landing_page: Option<String>,
    pub full_text_url: Option<String>,
    pub location_platform: LocationPlatform,
    pub canonical: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub publication_id: Id,
    #[serde(flatten)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLanguage {
    pub work_id: Id,
    pub language_code: String,
    pub language_relation: LanguageRelation,
    pub main_language: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    pub work_id: Id,
    pub subject_type: SubjectType,
    pub subject_code: String,
    pub subject_ordinal: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSeries {
    pub series_type: SeriesType,
    pub series_name: String,
    pub issn_print: Option<String>,
    pub issn_digital: Option<String>,
    pub series_url: Option<String>,
    pub series_description: Option<String>,
    pub series_cfp_url: Option<String>,
    pub imprint_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    pub series_id: Id,
    pub work_id: Id,
    pub issue_ordinal: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkRelation {
    pub relator_work_id: Id,
    pub related_work_id: Id,
    pub relation_type: RelationType,
    pub relation_ordinal: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFunding {
    pub work_id: Id,
    pub institution_id: Id,
    pub program: Option<String>,
    pub project_name: Option<String>,
    pub project_shortname: Option<String>,
    pub grant_number: Option<String>,
    pub jurisdiction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPublisher {
    pub publisher_name: String,
    pub publisher_shortname: Option<String>,
    pub publisher_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImprint {
    pub publisher_id: Id,
    pub imprint_name: String,
    pub imprint_url: Option<String>,
}

// Record views returned by queries.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprintRecord {
    pub imprint_id: Id,
    pub imprint_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherRecord {
    pub publisher_id: Id,
    pub publisher_name: String,
    #[serde(default)]
    pub imprints: Vec<ImprintRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorRecord {
    pub contributor_id: Id,
    #[serde(flatten)]
    pub contributor: Contributor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionRecord {
    pub institution_id: Id,
    #[serde(flatten)]
    pub institution: Institution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRecord {
    pub series_id: Id,
    pub series_name: String,
    pub imprint_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliationRecord {
    pub affiliation_id: Id,
    pub institution_id: Id,
    pub affiliation_ordinal: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRecord {
    pub contribution_id: Id,
    pub contributor_id: Id,
    pub contribution_type: ContributionType,
    pub contribution_ordinal: i32,
    #[serde(default)]
    pub affiliations: Vec<AffiliationRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub price_id: Id,
    pub currency_code: String,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub location_id: Id,
    #[serde(flatten)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationRecord {
    pub publication_id: Id,
    pub publication_type: PublicationType,
    pub isbn: Option<String>,
    #[serde(default)]
    pub prices: Vec<PriceRecord>,
    #[serde(default)]
    pub locations: Vec<LocationRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageRecord {
    pub language_id: Id,
    pub language_code: String,
    pub language_relation: LanguageRelation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    pub subject_id: Id,
    pub subject_type: SubjectType,
    pub subject_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    pub issue_id: Id,
    pub series_id: Id,
    pub work_id: Id,
    pub issue_ordinal: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedWorkRef {
    pub doi: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationRecord {
    pub work_relation_id: Id,
    pub related_work_id: Id,
    pub relation_type: RelationType,
    pub relation_ordinal: i32,
    #[serde(default)]
    pub related_work: RelatedWorkRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRecord {
    pub funding_id: Id,
    pub institution_id: Id,
}

/// A work as fetched from the API, with everything attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRecord {
    pub work_id: Id,
    #[serde(flatten)]
    pub work: Work,
    #[serde(default)]
    pub contributions: Vec<ContributionRecord>,
    #[serde(default)]
    pub publications: Vec<PublicationRecord>,
    #[serde(default)]
    pub languages: Vec<LanguageRecord>,
    #[serde(default)]
    pub subjects: Vec<SubjectRecord>,
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
    #[serde(default)]
    pub fundings: Vec<FundingRecord>,
}

impl WorkRecord {
    /// A freshly created work has nothing attached yet.
    #[must_use]
    pub fn bare(work_id: impl Into<Id>, work: Work) -> Self {
        WorkRecord {
            work_id: work_id.into(),
            work,
            contributions: Vec::new(),
            publications: Vec::new(),
            languages: Vec::new(),
            subjects: Vec::new(),
            issues: Vec::new(),
            relations: Vec::new(),
            fundings: Vec::new(),
        }
    }
}
