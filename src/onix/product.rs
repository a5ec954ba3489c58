//! Accessors over an ONIX 3.0 `Product` element.
//!
//! Code values are returned raw; mapping them to API enumerations is the
//! loader's job.

use super::Element;
use crate::normalize::{self, Title};

/// A borrowed view of one `Product`.
#[derive(Debug, Clone, Copy)]
pub struct Product<'a> {
    element: &'a Element,
}

/// One `Contributor` composite.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnixContributor {
    pub sequence: Option<i32>,
    pub roles: Vec<String>,
    pub names_before_key: Option<String>,
    pub key_names: Option<String>,
    pub person_name: Option<String>,
    pub corporate_name: Option<String>,
    /// Bare ORCID iD (name identifier type 21).
    pub orcid: Option<String>,
    pub biography: Option<String>,
}

impl<'a> Product<'a> {
    pub fn new(element: &'a Element) -> Self {
        Product { element }
    }

    fn descriptive(&self) -> Option<&'a Element> {
        self.element.child("DescriptiveDetail")
    }

    fn descriptive_all(&self, path: &[&str]) -> Vec<&'a Element> {
        self.descriptive()
            .map(|d| d.find_all(path))
            .unwrap_or_default()
    }

    pub fn reference(&self) -> Option<&'a str> {
        self.element.text_of("RecordReference")
    }

    /// `ProductIdentifier/IDValue` for an identifier type, e.g. `06` (DOI) or
    /// `15` (ISBN-13).
    pub fn identifier(&self, id_type: &str) -> Option<&'a str> {
        identifier_in(self.element, id_type)
    }

    pub fn title(&self) -> Option<Title> {
        let details = self.descriptive_all(&["TitleDetail"]);
        let detail = details
            .iter()
            .find(|d| d.text_of("TitleType") == Some("01"))
            .or_else(|| details.first())?;
        let element = detail.child("TitleElement")?;
        let title = title_text(element)?;
        Some(Title::from_parts(&title, element.text_of("Subtitle")))
    }

    /// `ProductForm` with its first `ProductFormDetail`.
    pub fn product_form(&self) -> Option<(&'a str, Option<&'a str>)> {
        let detail = self.descriptive()?;
        Some((detail.text_of("ProductForm")?, detail.text_of("ProductFormDetail")))
    }

    pub fn edition_number(&self) -> Option<i32> {
        self.descriptive()?
            .text_of("EditionNumber")
            .and_then(normalize::leading_int)
    }

    pub fn contributors(&self) -> Vec<OnixContributor> {
        self.descriptive_all(&["Contributor"])
            .into_iter()
            .map(|c| OnixContributor {
                sequence: c.text_of("SequenceNumber").and_then(normalize::leading_int),
                roles: c.children("ContributorRole").map(|r| r.text.clone()).collect(),
                names_before_key: c.text_of("NamesBeforeKey").map(String::from),
                key_names: c.text_of("KeyNames").map(String::from),
                person_name: c.text_of("PersonName").map(String::from),
                corporate_name: c.text_of("CorporateName").map(String::from),
                orcid: c
                    .children("NameIdentifier")
                    .find(|n| n.text_of("NameIDType") == Some("21"))
                    .and_then(|n| n.text_of("IDValue"))
                    .map(String::from),
                biography: c.text_of("BiographicalNote").map(String::from),
            })
            .collect()
    }

    /// `(LanguageRole, LanguageCode)` pairs, codes upper-cased.
    pub fn languages(&self) -> Vec<(&'a str, String)> {
        self.descriptive_all(&["Language"])
            .into_iter()
            .filter_map(|l| {
                Some((
                    l.text_of("LanguageRole")?,
                    l.text_of("LanguageCode")?.to_ascii_uppercase(),
                ))
            })
            .collect()
    }

    pub fn extent(&self, extent_type: &str) -> Option<i32> {
        self.descriptive_all(&["Extent"])
            .into_iter()
            .find(|e| e.text_of("ExtentType") == Some(extent_type))
            .and_then(|e| e.text_of("ExtentValue"))
            .and_then(normalize::leading_int)
    }

    pub fn illustration_count(&self) -> Option<i32> {
        self.descriptive()?
            .text_of("NumberOfIllustrations")
            .and_then(normalize::leading_int)
    }

    /// Subject codes, or heading texts when there is no code, for one scheme.
    pub fn subjects(&self, scheme: &str) -> Vec<&'a str> {
        self.descriptive_all(&["Subject"])
            .into_iter()
            .filter(|s| s.text_of("SubjectSchemeIdentifier") == Some(scheme))
            .filter_map(|s| s.text_of("SubjectCode").or_else(|| s.text_of("SubjectHeadingText")))
            .collect()
    }

    /// Link of the first licence expression of type `02`.
    pub fn license(&self) -> Option<&'a str> {
        self.descriptive_all(&["EpubLicense", "EpubLicenseExpression"])
            .into_iter()
            .find(|e| e.text_of("EpubLicenseExpressionType") == Some("02"))
            .and_then(|e| e.text_of("EpubLicenseExpressionLink"))
    }

    pub fn text_content(&self, text_type: &str) -> Option<&'a str> {
        self.element
            .find_all(&["CollateralDetail", "TextContent"])
            .into_iter()
            .find(|t| t.text_of("TextType") == Some(text_type))
            .and_then(|t| t.text_of("Text"))
    }

    pub fn cover_url(&self) -> Option<&'a str> {
        self.element
            .find_all(&["CollateralDetail", "SupportingResource"])
            .into_iter()
            .find(|r| r.text_of("ResourceContentType") == Some("01"))
            .and_then(|r| r.find(&["ResourceVersion", "ResourceLink"]))
            .map(|l| l.text.as_str())
            .filter(|l| !l.is_empty())
    }

    fn publishing(&self) -> Option<&'a Element> {
        self.element.child("PublishingDetail")
    }

    pub fn publishing_status(&self) -> Option<&'a str> {
        self.publishing()?.text_of("PublishingStatus")
    }

    pub fn city(&self) -> Option<&'a str> {
        self.publishing()?.text_of("CityOfPublication")
    }

    /// Publication date (role `01`), falling back to the first date given.
    pub fn publication_date(&self) -> Option<&'a str> {
        let dates: Vec<&Element> = self.publishing()?.children("PublishingDate").collect();
        dates
            .iter()
            .find(|d| d.text_of("PublishingDateRole") == Some("01"))
            .or_else(|| dates.first())
            .and_then(|d| d.text_of("Date"))
    }

    /// Copyright owners joined with `"; "`.
    pub fn copyright_holder(&self) -> Option<String> {
        let owners: Vec<&str> = self
            .publishing()
            .map(|p| p.find_all(&["CopyrightStatement", "CopyrightOwner"]))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|o| o.text_of("PersonName").or_else(|| o.text_of("CorporateName")))
            .collect();
        (!owners.is_empty()).then(|| owners.join("; "))
    }

    /// Names of publishers with the given publishing role, e.g. `16` (funder).
    pub fn publishers_with_role(&self, role: &str) -> Vec<&'a str> {
        self.publishing()
            .map(|p| p.children("Publisher").collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.text_of("PublishingRole") == Some(role))
            .filter_map(|p| p.text_of("PublisherName"))
            .collect()
    }

    /// Supplier website links pointing at the OAPEN library, in order.
    pub fn oapen_urls(&self) -> Vec<&'a str> {
        self.element
            .find_all(&["ProductSupply", "SupplyDetail", "Supplier", "Website", "WebsiteLink"])
            .into_iter()
            .map(|l| l.text.as_str())
            .filter(|l| l.contains("oapen.org"))
            .collect()
    }

    /// Related products flagged as alternative formats (relation code `06`):
    /// `(ProductForm, ProductFormDetail, ISBN)`.
    pub fn alternative_formats(&self) -> Vec<(&'a str, Option<&'a str>, Option<&'a str>)> {
        self.element
            .find_all(&["RelatedMaterial", "RelatedProduct"])
            .into_iter()
            .filter(|r| r.children("ProductRelationCode").any(|c| c.text == "06"))
            .filter_map(|r| {
                Some((
                    r.text_of("ProductForm")?,
                    r.text_of("ProductFormDetail"),
                    identifier_in(r, "15"),
                ))
            })
            .collect()
    }

    /// `(series name, number within the series)` for each `Collection`.
    pub fn collections(&self) -> Vec<(Option<String>, Option<i32>)> {
        self.descriptive_all(&["Collection"])
            .into_iter()
            .map(|c| {
                let element = c.find(&["TitleDetail", "TitleElement"]);
                let name = element.and_then(title_text);
                let ordinal = element
                    .and_then(|e| e.text_of("PartNumber"))
                    .or_else(|| {
                        c.find(&["CollectionSequence", "CollectionSequenceNumber"])
                            .map(|s| s.text.as_str())
                    })
                    .and_then(normalize::leading_int);
                (name, ordinal)
            })
            .collect()
    }
}

fn identifier_in<'a>(element: &'a Element, id_type: &str) -> Option<&'a str> {
    element
        .children("ProductIdentifier")
        .find(|i| i.text_of("ProductIDType") == Some(id_type))
        .and_then(|i| i.text_of("IDValue"))
}

/// `TitleText`, or `TitlePrefix` plus `TitleWithoutPrefix`.
fn title_text(element: &Element) -> Option<String> {
    if let Some(text) = element.text_of("TitleText") {
        return Some(text.to_string());
    }
    let without = element.text_of("TitleWithoutPrefix")?;
    Some(match element.text_of("TitlePrefix") {
        Some(prefix) => format!("{prefix} {without}"),
        None => without.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::parse_str;
    use super::*;
    use pretty_assertions::assert_eq;

    const PRODUCT: &str = r#"<ONIXMessage release="3.0">
<Header><DefaultLanguageOfText>eng</DefaultLanguageOfText></Header>
<Product>
  <RecordReference>9789462703001</RecordReference>
  <ProductIdentifier><ProductIDType>15</ProductIDType><IDValue>9789462703001</IDValue></ProductIdentifier>
  <ProductIdentifier><ProductIDType>06</ProductIDType><IDValue>10.11116/9789461664000</IDValue></ProductIdentifier>
  <DescriptiveDetail>
    <ProductForm>EB</ProductForm>
    <ProductFormDetail>E107</ProductFormDetail>
    <EpubLicense>
      <EpubLicenseName>CC BY-NC-ND 4.0</EpubLicenseName>
      <EpubLicenseExpression>
        <EpubLicenseExpressionType>02</EpubLicenseExpressionType>
        <EpubLicenseExpressionLink>https://creativecommons.org/licenses/by-nc-nd/4.0/</EpubLicenseExpressionLink>
      </EpubLicenseExpression>
    </EpubLicense>
    <Collection>
      <CollectionType>10</CollectionType>
      <TitleDetail><TitleType>01</TitleType>
        <TitleElement><TitleElementLevel>02</TitleElementLevel><PartNumber>12</PartNumber><TitleText>Mediaevalia Lovaniensia</TitleText></TitleElement>
      </TitleDetail>
    </Collection>
    <TitleDetail><TitleType>01</TitleType>
      <TitleElement><TitleElementLevel>01</TitleElementLevel><TitlePrefix>The</TitlePrefix><TitleWithoutPrefix>Medieval Book</TitleWithoutPrefix><Subtitle>Essays</Subtitle></TitleElement>
    </TitleDetail>
    <Contributor>
      <SequenceNumber>1</SequenceNumber>
      <ContributorRole>B01</ContributorRole>
      <NameIdentifier><NameIDType>21</NameIDType><IDValue>0000-0002-1825-0097</IDValue></NameIdentifier>
      <PersonName>Jan Peeters</PersonName>
      <NamesBeforeKey>Jan</NamesBeforeKey>
      <KeyNames>Peeters</KeyNames>
      <BiographicalNote>Jan teaches history.</BiographicalNote>
    </Contributor>
    <EditionNumber>2</EditionNumber>
    <Language><LanguageRole>01</LanguageRole><LanguageCode>eng</LanguageCode></Language>
    <Extent><ExtentType>00</ExtentType><ExtentValue>320</ExtentValue><ExtentUnit>03</ExtentUnit></Extent>
    <NumberOfIllustrations>14</NumberOfIllustrations>
    <Subject><SubjectSchemeIdentifier>93</SubjectSchemeIdentifier><SubjectCode>NHD</SubjectCode></Subject>
    <Subject><SubjectSchemeIdentifier>20</SubjectSchemeIdentifier><SubjectHeadingText>books; manuscripts</SubjectHeadingText></Subject>
  </DescriptiveDetail>
  <CollateralDetail>
    <TextContent><TextType>03</TextType><ContentAudience>00</ContentAudience><Text>A long&#13; abstract.</Text></TextContent>
    <SupportingResource>
      <ResourceContentType>01</ResourceContentType>
      <ResourceVersion><ResourceForm>02</ResourceForm><ResourceLink>https://example.org/cover.jpg</ResourceLink></ResourceVersion>
    </SupportingResource>
  </CollateralDetail>
  <PublishingDetail>
    <Publisher><PublishingRole>01</PublishingRole><PublisherName>Leuven University Press</PublisherName></Publisher>
    <Publisher><PublishingRole>16</PublishingRole><PublisherName>ERC</PublisherName></Publisher>
    <CityOfPublication>Leuven</CityOfPublication>
    <PublishingStatus>04</PublishingStatus>
    <PublishingDate><PublishingDateRole>01</PublishingDateRole><Date>20200315</Date></PublishingDate>
    <CopyrightStatement><CopyrightYear>2020</CopyrightYear><CopyrightOwner><CorporateName>Leuven University Press</CorporateName></CopyrightOwner></CopyrightStatement>
  </PublishingDetail>
  <RelatedMaterial>
    <RelatedProduct>
      <ProductRelationCode>06</ProductRelationCode>
      <ProductIdentifier><ProductIDType>15</ProductIDType><IDValue>9789462702998</IDValue></ProductIdentifier>
      <ProductForm>BC</ProductForm>
    </RelatedProduct>
  </RelatedMaterial>
  <ProductSupply><SupplyDetail>
    <Supplier><SupplierRole>09</SupplierRole><SupplierName>OAPEN</SupplierName>
      <Website><WebsiteRole>29</WebsiteRole><WebsiteLink>https://library.oapen.org/handle/20.500.12657/41234</WebsiteLink></Website>
    </Supplier>
  </SupplyDetail></ProductSupply>
</Product>
</ONIXMessage>"#;

    #[test]
    fn test_product_fields() {
        let message = parse_str(PRODUCT).unwrap();
        let product = message.products().next().unwrap();

        assert_eq!(product.reference(), Some("9789462703001"));
        assert_eq!(product.identifier("06"), Some("10.11116/9789461664000"));
        let title = product.title().unwrap();
        assert_eq!(title.full_title, "The Medieval Book: Essays");
        assert_eq!(product.product_form(), Some(("EB", Some("E107"))));
        assert_eq!(product.edition_number(), Some(2));
        assert_eq!(product.extent("00"), Some(320));
        assert_eq!(product.illustration_count(), Some(14));
        assert_eq!(product.subjects("93"), vec!["NHD"]);
        assert_eq!(product.subjects("20"), vec!["books; manuscripts"]);
        assert_eq!(product.languages(), vec![("01", "ENG".to_string())]);
        assert_eq!(
            product.license(),
            Some("https://creativecommons.org/licenses/by-nc-nd/4.0/")
        );
        assert_eq!(product.text_content("03"), Some("A long\r abstract."));
        assert_eq!(product.cover_url(), Some("https://example.org/cover.jpg"));
        assert_eq!(product.publishing_status(), Some("04"));
        assert_eq!(product.city(), Some("Leuven"));
        assert_eq!(product.publication_date(), Some("20200315"));
        assert_eq!(product.copyright_holder().as_deref(), Some("Leuven University Press"));
        assert_eq!(product.publishers_with_role("16"), vec!["ERC"]);
        assert_eq!(
            product.oapen_urls(),
            vec!["https://library.oapen.org/handle/20.500.12657/41234"]
        );
        assert_eq!(
            product.alternative_formats(),
            vec![("BC", None, Some("9789462702998"))]
        );
        assert_eq!(
            product.collections(),
            vec![(Some("Mediaevalia Lovaniensia".to_string()), Some(12))]
        );
    }

    #[test]
    fn test_contributor_composite() {
        let message = parse_str(PRODUCT).unwrap();
        let product = message.products().next().unwrap();
        let contributors = product.contributors();
        assert_eq!(
            contributors,
            vec![OnixContributor {
                sequence: Some(1),
                roles: vec!["B01".into()],
                names_before_key: Some("Jan".into()),
                key_names: Some("Peeters".into()),
                person_name: Some("Jan Peeters".into()),
                corporate_name: None,
                orcid: Some("0000-0002-1825-0097".into()),
                biography: Some("Jan teaches history.".into()),
            }]
        );
    }
}
