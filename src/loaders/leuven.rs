//! Leuven University Press ONIX 3.0 feed.
//!
//! Each `Product` is one work in one form; other forms of the same book are
//! listed as related products and become extra publications.

use std::path::Path;

use crate::draft::{
    ContributorDraft, FundingDraft, LanguageDraft, PersonName, PublicationDraft, SeriesDraft,
    WorkDraft,
};
use crate::error::{LoadError, ValueError};
use crate::identifiers;
use crate::model::{
    ContributionType, Institution, LanguageRelation, LocationPlatform, PublicationType,
    SeriesType, SubjectType, WorkStatus, WorkType,
};
use crate::normalize;
use crate::onix::{self, Element, OnixContributor, Product};
use crate::pipeline::{MapContext, MapError, Mapper, PublisherProfile};

const OAPEN_BITSTREAM: &str = "https://library.oapen.org/bitstream/handle/20.500.12657";

/// Thema subject schemes, from the subject category to its qualifiers.
const THEMA_SCHEMES: [&str; 7] = ["93", "94", "95", "96", "97", "98", "99"];

/// One product together with the message defaults it inherits.
#[derive(Debug, Clone, PartialEq)]
pub struct LeuvenRecord {
    pub product: Element,
    pub default_language: Option<String>,
}

pub struct LeuvenMapper {
    profile: PublisherProfile,
}

impl LeuvenMapper {
    #[must_use]
    pub fn new() -> Self {
        LeuvenMapper {
            profile: PublisherProfile::new("Leuven University Press", None, Some("https://lup.be/")),
        }
    }
}

impl Default for LeuvenMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for LeuvenMapper {
    type Record = LeuvenRecord;

    fn profile(&self) -> &PublisherProfile {
        &self.profile
    }

    fn read(&self, path: &Path) -> Result<Vec<LeuvenRecord>, LoadError> {
        let message = onix::read_path(path)?;
        let default_language = message.default_language();
        Ok(message
            .products
            .into_iter()
            .map(|product| LeuvenRecord {
                product,
                default_language: default_language.clone(),
            })
            .collect())
    }

    fn map(
        &self,
        record: &LeuvenRecord,
        ctx: &mut MapContext<'_>,
    ) -> Result<Option<WorkDraft>, MapError> {
        let product = Product::new(&record.product);
        let mut draft = book(&product, record.default_language.as_deref())?;
        if draft.work.landing_page.is_none() {
            if let Some(doi) = draft.work.doi.clone() {
                draft.work.landing_page = ctx.landing_page(&doi)?;
            }
        }
        Ok(Some(draft))
    }

    fn label(&self, record: &LeuvenRecord, index: usize) -> String {
        Product::new(&record.product)
            .reference()
            .map_or_else(|| format!("product {}", index + 1), String::from)
    }
}

fn book(product: &Product<'_>, default_language: Option<&str>) -> Result<WorkDraft, ValueError> {
    let title = product
        .title()
        .ok_or_else(|| ValueError::MissingField("TitleDetail".to_string()))?;
    let contributors = product.contributors();
    let work_type = match contributors.first().and_then(|c| c.roles.first()) {
        Some(role) if role == "B01" => WorkType::EditedBook,
        _ => WorkType::Monograph,
    };
    let status = product
        .publishing_status()
        .map(WorkStatus::from_onix)
        .transpose()?
        .unwrap_or(WorkStatus::Active);
    let mut draft = WorkDraft::new(work_type, status, title);
    if let Some(reference) = product.reference() {
        draft.label = reference.to_string();
    }

    let oapen = product.oapen_urls();
    let work = &mut draft.work;
    work.reference = product.reference().map(String::from);
    work.doi = product.identifier("06").and_then(identifiers::doi);
    work.landing_page = oapen.first().map(|url| url.to_string());
    work.edition = Some(product.edition_number().unwrap_or(1));
    work.short_abstract = product.text_content("02").map(abstract_text);
    work.long_abstract = product.text_content("03").map(abstract_text);
    work.toc = product.text_content("04").map(abstract_text);
    work.publication_date = product.publication_date().and_then(normalize::date);
    work.place = product.city().map(String::from);
    work.page_count = product.extent("00");
    work.image_count = product.illustration_count();
    work.license = product.license().and_then(identifiers::url);
    work.copyright_holder = product.copyright_holder();
    work.cover_url = product.cover_url().map(String::from);

    draft.publications = publications(product, &oapen, draft.work.landing_page.as_deref())?;
    draft.contributors = contributors
        .iter()
        .filter_map(contributor)
        .collect::<Result<_, _>>()?;
    draft.languages = languages(product, default_language);
    for (subject_type, schemes) in [
        (SubjectType::Thema, &THEMA_SCHEMES[..]),
        (SubjectType::Bisac, &["10"][..]),
        (SubjectType::Bic, &["12"][..]),
        (SubjectType::Custom, &["24"][..]),
    ] {
        let codes: Vec<&str> = schemes.iter().flat_map(|s| product.subjects(s)).collect();
        draft.add_subjects(subject_type, codes);
    }
    let keywords: Vec<String> = product
        .subjects("20")
        .into_iter()
        .flat_map(|k| normalize::split_list(k, &[';']))
        .collect();
    draft.add_subjects(SubjectType::Keyword, keywords);
    draft.fundings = product.publishers_with_role("16").into_iter().map(funding).collect();
    draft.series = product
        .collections()
        .into_iter()
        .filter_map(|(name, ordinal)| {
            let mut series = SeriesDraft::new(SeriesType::BookSeries, &name?);
            series.ordinal = ordinal;
            series.deferred = true;
            Some(series)
        })
        .collect();
    Ok(draft)
}

fn abstract_text(text: &str) -> String {
    text.replace('\r', "")
}

fn publication_type(form: &str, detail: Option<&str>) -> Result<PublicationType, ValueError> {
    Ok(match (form, detail) {
        ("BC", _) => PublicationType::Paperback,
        ("BB", _) => PublicationType::Hardback,
        ("EB" | "ED", Some("E107")) => PublicationType::Pdf,
        ("EB" | "ED", Some("E101")) => PublicationType::Epub,
        _ => {
            let code = detail.map_or_else(|| form.to_string(), |d| format!("{form}/{d}"));
            return Err(ValueError::unmapped("product form", &code));
        }
    })
}

/// OAPEN keeps the PDF under the handle suffix of the landing page, named
/// after the bare ISBN.
fn oapen_full_text(landing_page: &str, isbn: &str) -> Option<String> {
    let start = landing_page.char_indices().rev().nth(4)?.0;
    let handle = &landing_page[start..];
    let digits: String = isbn.chars().filter(char::is_ascii_alphanumeric).collect();
    Some(format!("{OAPEN_BITSTREAM}/{handle}/{digits}.pdf"))
}

fn publications(
    product: &Product<'_>,
    oapen: &[&str],
    landing_page: Option<&str>,
) -> Result<Vec<PublicationDraft>, ValueError> {
    let (form, detail) = product
        .product_form()
        .ok_or_else(|| ValueError::MissingField("ProductForm".to_string()))?;
    let main_type = publication_type(form, detail)?;
    let raw_isbn = product.identifier("15");
    let mut main = PublicationDraft::new(main_type, raw_isbn.map(identifiers::isbn).transpose()?.flatten());
    for (i, url) in oapen.iter().enumerate() {
        let full_text = match (landing_page, raw_isbn) {
            (Some(landing), Some(isbn)) if i == 0 => oapen_full_text(landing, isbn),
            _ => None,
        };
        main.add_location(LocationPlatform::Oapen, Some(url.to_string()), full_text, i == 0);
    }

    let mut publications = vec![main];
    for (form, detail, isbn) in product.alternative_formats() {
        let Ok(alternative) = publication_type(form, detail) else {
            log::debug!("related product form {form} ignored");
            continue;
        };
        if publications.iter().any(|p| p.publication_type == alternative) {
            continue;
        }
        let isbn = isbn.map(identifiers::isbn).transpose()?.flatten();
        publications.push(PublicationDraft::new(alternative, isbn));
    }
    Ok(publications)
}

fn contributor(onix: &OnixContributor) -> Option<Result<ContributorDraft, ValueError>> {
    let name = match (&onix.key_names, &onix.person_name, &onix.corporate_name) {
        (Some(key), person, _) => PersonName::from_parts(
            onix.names_before_key.as_deref(),
            key,
            person.as_deref(),
        ),
        (None, Some(person), _) => PersonName::opaque(person),
        (None, None, Some(corporate)) => PersonName::opaque(corporate),
        (None, None, None) => return None,
    };
    let role = onix.roles.first()?;
    Some(ContributionType::from_label(role).map(|contribution_type| {
        let mut draft = ContributorDraft::new(name, contribution_type)
            .with_orcid(onix.orcid.as_deref().and_then(identifiers::orcid));
        draft.ordinal = onix.sequence;
        draft.biography = onix.biography.clone();
        draft
    }))
}

fn languages(product: &Product<'_>, default_language: Option<&str>) -> Vec<LanguageDraft> {
    let mut languages: Vec<LanguageDraft> = product
        .languages()
        .into_iter()
        .filter_map(|(role, code)| {
            let relation = match role {
                "01" => LanguageRelation::Original,
                "02" => LanguageRelation::TranslatedFrom,
                _ => return None,
            };
            Some(LanguageDraft {
                code: crate::model::codes::language_code(&code),
                relation,
                main: true,
            })
        })
        .collect();
    if languages.is_empty() {
        languages.extend(default_language.map(LanguageDraft::original));
    }
    languages
}

fn funding(name: &str) -> FundingDraft {
    let (institution, program) = match name {
        "ERC" => ("European Research Council", None),
        "KU Leuven Fund for Fair Open Access" => ("KU Leuven", Some("Fund for Fair Open Access")),
        other => (other, None),
    };
    FundingDraft {
        institution: Institution {
            institution_name: institution.to_string(),
            ..Institution::default()
        },
        program: program.map(String::from),
        project_name: None,
        project_shortname: None,
        grant_number: None,
        jurisdiction: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NoResolver;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const MESSAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ONIXMessage release="3.0">
  <Header><DefaultLanguageOfText>eng</DefaultLanguageOfText></Header>
  <Product>
    <RecordReference>9789462702851</RecordReference>
    <ProductIdentifier><ProductIDType>15</ProductIDType><IDValue>9781234567897</IDValue></ProductIdentifier>
    <ProductIdentifier><ProductIDType>06</ProductIDType><IDValue>10.11116/9789461664051</IDValue></ProductIdentifier>
    <DescriptiveDetail>
      <ProductForm>EB</ProductForm>
      <ProductFormDetail>E107</ProductFormDetail>
      <Collection>
        <TitleDetail><TitleType>01</TitleType>
          <TitleElement><TitleElementLevel>02</TitleElementLevel><PartNumber>12</PartNumber><TitleText>Studies in Belgian History</TitleText></TitleElement>
        </TitleDetail>
      </Collection>
      <TitleDetail><TitleType>01</TitleType>
        <TitleElement><TitleElementLevel>01</TitleElementLevel><TitleText>Beyond the Nation</TitleText><Subtitle>Belgium Revisited</Subtitle></TitleElement>
      </TitleDetail>
      <Contributor>
        <SequenceNumber>1</SequenceNumber>
        <ContributorRole>B01</ContributorRole>
        <NameIdentifier><NameIDType>21</NameIDType><IDValue>0000-0002-1825-0097</IDValue></NameIdentifier>
        <PersonName>Jane Doe</PersonName>
        <NamesBeforeKey>Jane</NamesBeforeKey>
        <KeyNames>Doe</KeyNames>
        <BiographicalNote>Jane Doe teaches history.</BiographicalNote>
      </Contributor>
      <Contributor>
        <SequenceNumber>2</SequenceNumber>
        <ContributorRole>A01</ContributorRole>
        <CorporateName>KADOC</CorporateName>
      </Contributor>
      <EditionNumber>2</EditionNumber>
      <Language><LanguageRole>01</LanguageRole><LanguageCode>dut</LanguageCode></Language>
      <Extent><ExtentType>00</ExtentType><ExtentValue>312</ExtentValue><ExtentUnit>03</ExtentUnit></Extent>
      <Subject><SubjectSchemeIdentifier>93</SubjectSchemeIdentifier><SubjectCode>NHD</SubjectCode></Subject>
      <Subject><SubjectSchemeIdentifier>10</SubjectSchemeIdentifier><SubjectCode>HIS010000</SubjectCode></Subject>
      <Subject><SubjectSchemeIdentifier>20</SubjectSchemeIdentifier><SubjectHeadingText>Belgium; nationalism</SubjectHeadingText></Subject>
    </DescriptiveDetail>
    <CollateralDetail>
      <TextContent><TextType>03</TextType><Text>A long&#13;
abstract.</Text></TextContent>
    </CollateralDetail>
    <PublishingDetail>
      <Publisher><PublishingRole>01</PublishingRole><PublisherName>Leuven University Press</PublisherName></Publisher>
      <Publisher><PublishingRole>16</PublishingRole><PublisherName>KU Leuven Fund for Fair Open Access</PublisherName></Publisher>
      <CityOfPublication>Leuven</CityOfPublication>
      <PublishingStatus>04</PublishingStatus>
      <PublishingDate><PublishingDateRole>01</PublishingDateRole><Date>20210315</Date></PublishingDate>
    </PublishingDetail>
    <RelatedMaterial>
      <RelatedProduct>
        <ProductRelationCode>06</ProductRelationCode>
        <ProductIdentifier><ProductIDType>15</ProductIDType><IDValue>9783161484100</IDValue></ProductIdentifier>
        <ProductForm>BC</ProductForm>
      </RelatedProduct>
    </RelatedMaterial>
    <ProductSupply>
      <SupplyDetail>
        <Supplier>
          <SupplierRole>09</SupplierRole>
          <Website><WebsiteLink>https://library.oapen.org/handle/20.500.12657/47395</WebsiteLink></Website>
        </Supplier>
      </SupplyDetail>
    </ProductSupply>
  </Product>
</ONIXMessage>"#;

    fn draft() -> WorkDraft {
        let message = onix::parse_str(MESSAGE).unwrap();
        let record = LeuvenRecord {
            product: message.products[0].clone(),
            default_language: message.default_language(),
        };
        LeuvenMapper::new()
            .map(&record, &mut MapContext::new(&NoResolver))
            .unwrap()
            .unwrap()
    }

    #[rstest]
    #[case("BC", None, PublicationType::Paperback)]
    #[case("BB", None, PublicationType::Hardback)]
    #[case("EB", Some("E107"), PublicationType::Pdf)]
    #[case("ED", Some("E101"), PublicationType::Epub)]
    fn test_publication_type(
        #[case] form: &str,
        #[case] detail: Option<&str>,
        #[case] expected: PublicationType,
    ) {
        assert_eq!(publication_type(form, detail).unwrap(), expected);
    }

    #[test]
    fn test_unknown_product_form() {
        assert!(matches!(
            publication_type("EB", Some("E116")),
            Err(ValueError::UnmappedCode { .. })
        ));
    }

    #[rstest]
    #[case("ERC", "European Research Council", None)]
    #[case("KU Leuven Fund for Fair Open Access", "KU Leuven", Some("Fund for Fair Open Access"))]
    #[case("FWO", "FWO", None)]
    fn test_funding(#[case] name: &str, #[case] institution: &str, #[case] program: Option<&str>) {
        let funding = funding(name);
        assert_eq!(funding.institution.institution_name, institution);
        assert_eq!(funding.program.as_deref(), program);
    }

    #[test]
    fn test_work_fields() {
        let draft = draft();
        let work = &draft.work;
        assert_eq!(draft.label, "9789462702851");
        assert_eq!(work.work_type, WorkType::EditedBook);
        assert_eq!(work.work_status, WorkStatus::Active);
        assert_eq!(work.full_title, "Beyond the Nation: Belgium Revisited");
        assert_eq!(work.doi.as_deref(), Some("https://doi.org/10.11116/9789461664051"));
        assert_eq!(
            work.landing_page.as_deref(),
            Some("https://library.oapen.org/handle/20.500.12657/47395")
        );
        assert_eq!(work.edition, Some(2));
        assert_eq!(work.page_count, Some(312));
        assert_eq!(work.place.as_deref(), Some("Leuven"));
        assert_eq!(work.publication_date.as_deref(), Some("2021-03-15"));
        assert_eq!(work.long_abstract.as_deref(), Some("A long\nabstract."));
    }

    #[test]
    fn test_publications() {
        let draft = draft();
        let summary: Vec<(PublicationType, Option<&str>)> = draft
            .publications
            .iter()
            .map(|p| (p.publication_type, p.isbn.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (PublicationType::Pdf, Some("978-1-234-56789-7")),
                (PublicationType::Paperback, Some("978-3-16-148410-0")),
            ]
        );
        let location = &draft.publications[0].locations[0];
        assert_eq!(location.location_platform, LocationPlatform::Oapen);
        assert!(location.canonical);
        assert_eq!(
            location.full_text_url.as_deref(),
            Some("https://library.oapen.org/bitstream/handle/20.500.12657/47395/9781234567897.pdf")
        );
    }

    #[test]
    fn test_contributors() {
        let draft = draft();
        let editor = &draft.contributors[0];
        assert_eq!(editor.contribution_type, ContributionType::Editor);
        assert_eq!(editor.contributor.first_name.as_deref(), Some("Jane"));
        assert_eq!(
            editor.contributor.orcid.as_deref(),
            Some("https://orcid.org/0000-0002-1825-0097")
        );
        assert_eq!(editor.ordinal, Some(1));
        assert_eq!(editor.biography.as_deref(), Some("Jane Doe teaches history."));
        let corporate = &draft.contributors[1];
        assert_eq!(corporate.contributor.full_name, "KADOC");
        assert_eq!(corporate.contribution_type, ContributionType::Author);
    }

    #[test]
    fn test_languages_subjects_series_and_funding() {
        let draft = draft();
        assert_eq!(draft.languages, vec![LanguageDraft::original("dut")]);
        let subjects: Vec<(SubjectType, &str)> = draft
            .subjects
            .iter()
            .map(|s| (s.subject_type, s.code.as_str()))
            .collect();
        assert_eq!(
            subjects,
            vec![
                (SubjectType::Thema, "NHD"),
                (SubjectType::Bisac, "HIS010000"),
                (SubjectType::Keyword, "Belgium"),
                (SubjectType::Keyword, "nationalism"),
            ]
        );
        assert_eq!(draft.series[0].name, "Studies in Belgian History");
        assert_eq!(draft.series[0].ordinal, Some(12));
        assert!(draft.series[0].deferred);
        assert_eq!(draft.fundings[0].institution.institution_name, "KU Leuven");
    }

    #[test]
    fn test_default_language_fills_in() {
        let languages = languages(
            &Product::new(&Element::default()),
            Some("ENG"),
        );
        assert_eq!(languages, vec![LanguageDraft::original("ENG")]);
    }
}
