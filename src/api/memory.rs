//! In-process [`MetadataApi`] used for dry runs and tests.
//!
//! Every call is appended to a log so callers can assert on exactly what
//! would have been sent to the live service.

use nanoid::nanoid;
use serde::Serialize;
use serde_json::{Value, json};

use super::{ApiError, MetadataApi, Result};
use crate::identifiers::same_doi;
use crate::model::{
    AffiliationRecord, ContributionRecord, Contributor, ContributorRecord, FundingRecord, Id,
    ImprintRecord, Institution, InstitutionRecord, IssueRecord, LanguageRecord, LocationRecord,
    NewAffiliation, NewContribution, NewFunding, NewImprint, NewIssue, NewLanguage, NewLocation,
    NewPrice, NewPublication, NewPublisher, NewSeries, NewSubject, NewWorkRelation, PriceRecord,
    PublicationRecord, PublisherRecord, RelatedWorkRef, RelationRecord, SeriesRecord,
    SubjectRecord, Work, WorkRecord, WorkType,
};

/// One recorded API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub method: &'static str,
    pub payload: Value,
}

#[derive(Debug, Default)]
pub struct MemoryApi {
    publishers: Vec<PublisherRecord>,
    works: Vec<WorkRecord>,
    contributors: Vec<ContributorRecord>,
    institutions: Vec<InstitutionRecord>,
    series: Vec<SeriesRecord>,
    calls: Vec<ApiCall>,
}

const QUERIES: &[&str] = &[
    "publishers",
    "work_by_doi",
    "work_by_id",
    "books_by_title",
    "contributors",
    "contributor",
    "institutions",
    "series",
    "series_issues",
];

impl MemoryApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[ApiCall] {
        &self.calls
    }

    /// Payloads of every call to `method`, in order.
    pub fn calls_to(&self, method: &str) -> Vec<&Value> {
        self.calls
            .iter()
            .filter(|c| c.method == method)
            .map(|c| &c.payload)
            .collect()
    }

    /// Calls that would change remote state.
    pub fn mutations(&self) -> Vec<&ApiCall> {
        self.calls
            .iter()
            .filter(|c| !QUERIES.contains(&c.method))
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn works(&self) -> &[WorkRecord] {
        &self.works
    }

    pub fn contributor_records(&self) -> &[ContributorRecord] {
        &self.contributors
    }

    fn record<T: Serialize>(&mut self, method: &'static str, payload: &T) {
        let payload = serde_json::to_value(payload).unwrap_or(Value::Null);
        self.calls.push(ApiCall { method, payload });
    }

    fn work_mut(&mut self, work_id: &str) -> Result<&mut WorkRecord> {
        self.works
            .iter_mut()
            .find(|w| w.work_id == work_id)
            .ok_or_else(|| ApiError::NotFound(format!("work {work_id}")))
    }

    fn publication_mut(&mut self, publication_id: &str) -> Result<&mut PublicationRecord> {
        self.works
            .iter_mut()
            .flat_map(|w| w.publications.iter_mut())
            .find(|p| p.publication_id == publication_id)
            .ok_or_else(|| ApiError::NotFound(format!("publication {publication_id}")))
    }

    fn ensure_institution(&self, institution_id: &str) -> Result<()> {
        if self.institutions.iter().any(|i| i.institution_id == institution_id) {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("institution {institution_id}")))
        }
    }

    fn imprint_ids(&self, publisher_id: &str) -> Vec<&str> {
        self.publishers
            .iter()
            .filter(|p| p.publisher_id == publisher_id)
            .flat_map(|p| p.imprints.iter().map(|i| i.imprint_id.as_str()))
            .collect()
    }
}

impl MetadataApi for MemoryApi {
    fn publishers(&mut self, search: &str) -> Result<Vec<PublisherRecord>> {
        self.record("publishers", &json!({ "search": search }));
        let needle = search.to_lowercase();
        Ok(self
            .publishers
            .iter()
            .filter(|p| p.publisher_name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn work_by_doi(&mut self, doi: &str) -> Result<Option<WorkRecord>> {
        self.record("work_by_doi", &json!({ "doi": doi }));
        Ok(self
            .works
            .iter()
            .find(|w| w.work.doi.as_deref().is_some_and(|d| same_doi(d, doi)))
            .cloned())
    }

    fn work_by_id(&mut self, work_id: &str) -> Result<WorkRecord> {
        self.record("work_by_id", &json!({ "workId": work_id }));
        self.work_mut(work_id).map(|w| w.clone())
    }

    fn books_by_title(&mut self, title: &str, publisher_id: &str) -> Result<Vec<WorkRecord>> {
        self.record(
            "books_by_title",
            &json!({ "title": title, "publisherId": publisher_id }),
        );
        let imprints: Vec<String> = self
            .imprint_ids(publisher_id)
            .into_iter()
            .map(String::from)
            .collect();
        Ok(self
            .works
            .iter()
            .filter(|w| imprints.contains(&w.work.imprint_id))
            .filter(|w| w.work.work_type != WorkType::BookChapter)
            .filter(|w| w.work.full_title == title)
            .cloned()
            .collect())
    }

    fn contributors(&mut self, offset: usize, limit: usize) -> Result<Vec<ContributorRecord>> {
        self.record("contributors", &json!({ "offset": offset, "limit": limit }));
        Ok(self.contributors.iter().skip(offset).take(limit).cloned().collect())
    }

    fn contributor(&mut self, contributor_id: &str) -> Result<ContributorRecord> {
        self.record("contributor", &json!({ "contributorId": contributor_id }));
        self.contributors
            .iter()
            .find(|c| c.contributor_id == contributor_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("contributor {contributor_id}")))
    }

    fn institutions(&mut self, offset: usize, limit: usize) -> Result<Vec<InstitutionRecord>> {
        self.record("institutions", &json!({ "offset": offset, "limit": limit }));
        Ok(self.institutions.iter().skip(offset).take(limit).cloned().collect())
    }

    fn series(&mut self, offset: usize, limit: usize) -> Result<Vec<SeriesRecord>> {
        self.record("series", &json!({ "offset": offset, "limit": limit }));
        Ok(self.series.iter().skip(offset).take(limit).cloned().collect())
    }

    fn series_issues(&mut self, series_id: &str) -> Result<Vec<IssueRecord>> {
        self.record("series_issues", &json!({ "seriesId": series_id }));
        if !self.series.iter().any(|s| s.series_id == series_id) {
            return Err(ApiError::NotFound(format!("series {series_id}")));
        }
        Ok(self
            .works
            .iter()
            .flat_map(|w| w.issues.iter())
            .filter(|i| i.series_id == series_id)
            .cloned()
            .collect())
    }

    fn create_publisher(&mut self, publisher: &NewPublisher) -> Result<Id> {
        self.record("create_publisher", publisher);
        let publisher_id = nanoid!();
        self.publishers.push(PublisherRecord {
            publisher_id: publisher_id.clone(),
            publisher_name: publisher.publisher_name.clone(),
            imprints: Vec::new(),
        });
        Ok(publisher_id)
    }

    fn create_imprint(&mut self, imprint: &NewImprint) -> Result<Id> {
        self.record("create_imprint", imprint);
        let imprint_id = nanoid!();
        let publisher = self
            .publishers
            .iter_mut()
            .find(|p| p.publisher_id == imprint.publisher_id)
            .ok_or_else(|| ApiError::NotFound(format!("publisher {}", imprint.publisher_id)))?;
        publisher.imprints.push(ImprintRecord {
            imprint_id: imprint_id.clone(),
            imprint_name: imprint.imprint_name.clone(),
        });
        Ok(imprint_id)
    }

    fn create_work(&mut self, work: &Work) -> Result<Id> {
        self.record("create_work", work);
        let work_id = nanoid!();
        self.works.push(WorkRecord::bare(work_id.clone(), work.clone()));
        Ok(work_id)
    }

    fn create_contributor(&mut self, contributor: &Contributor) -> Result<Id> {
        self.record("create_contributor", contributor);
        let contributor_id = nanoid!();
        self.contributors.push(ContributorRecord {
            contributor_id: contributor_id.clone(),
            contributor: contributor.clone(),
        });
        Ok(contributor_id)
    }

    fn create_contribution(&mut self, contribution: &NewContribution) -> Result<Id> {
        self.record("create_contribution", contribution);
        if !self
            .contributors
            .iter()
            .any(|c| c.contributor_id == contribution.contributor_id)
        {
            return Err(ApiError::NotFound(format!(
                "contributor {}",
                contribution.contributor_id
            )));
        }
        let contribution_id = nanoid!();
        let work = self.work_mut(&contribution.work_id)?;
        work.contributions.push(ContributionRecord {
            contribution_id: contribution_id.clone(),
            contributor_id: contribution.contributor_id.clone(),
            contribution_type: contribution.contribution_type,
            contribution_ordinal: contribution.contribution_ordinal,
            affiliations: Vec::new(),
        });
        Ok(contribution_id)
    }

    fn create_institution(&mut self, institution: &Institution) -> Result<Id> {
        self.record("create_institution", institution);
        let institution_id = nanoid!();
        self.institutions.push(InstitutionRecord {
            institution_id: institution_id.clone(),
            institution: institution.clone(),
        });
        Ok(institution_id)
    }

    fn create_affiliation(&mut self, affiliation: &NewAffiliation) -> Result<Id> {
        self.record("create_affiliation", affiliation);
        self.ensure_institution(&affiliation.institution_id)?;
        let affiliation_id = nanoid!();
        let contribution = self
            .works
            .iter_mut()
            .flat_map(|w| w.contributions.iter_mut())
            .find(|c| c.contribution_id == affiliation.contribution_id)
            .ok_or_else(|| {
                ApiError::NotFound(format!("contribution {}", affiliation.contribution_id))
            })?;
        contribution.affiliations.push(AffiliationRecord {
            affiliation_id: affiliation_id.clone(),
            institution_id: affiliation.institution_id.clone(),
            affiliation_ordinal: affiliation.affiliation_ordinal,
        });
        Ok(affiliation_id)
    }

    fn create_publication(&mut self, publication: &NewPublication) -> Result<Id> {
        self.record("create_publication", publication);
        let publication_id = nanoid!();
        let work = self.work_mut(&publication.work_id)?;
        work.publications.push(PublicationRecord {
            publication_id: publication_id.clone(),
            publication_type: publication.publication_type,
            isbn: publication.isbn.clone(),
            prices: Vec::new(),
            locations: Vec::new(),
        });
        Ok(publication_id)
    }

    fn create_price(&mut self, price: &NewPrice) -> Result<Id> {
        self.record("create_price", price);
        let price_id = nanoid!();
        self.publication_mut(&price.publication_id)?
            .prices
            .push(PriceRecord {
                price_id: price_id.clone(),
                currency_code: price.currency_code.clone(),
                unit_price: price.unit_price,
            });
        Ok(price_id)
    }

    fn create_location(&mut self, location: &NewLocation) -> Result<Id> {
        self.record("create_location", location);
        let location_id = nanoid!();
        self.publication_mut(&location.publication_id)?
            .locations
            .push(LocationRecord {
                location_id: location_id.clone(),
                location: location.location.clone(),
            });
        Ok(location_id)
    }

    fn create_language(&mut self, language: &NewLanguage) -> Result<Id> {
        self.record("create_language", language);
        let language_id = nanoid!();
        self.work_mut(&language.work_id)?.languages.push(LanguageRecord {
            language_id: language_id.clone(),
            language_code: language.language_code.clone(),
            language_relation: language.language_relation,
        });
        Ok(language_id)
    }

    fn create_subject(&mut self, subject: &NewSubject) -> Result<Id> {
        self.record("create_subject", subject);
        let subject_id = nanoid!();
        self.work_mut(&subject.work_id)?.subjects.push(SubjectRecord {
            subject_id: subject_id.clone(),
            subject_type: subject.subject_type,
            subject_code: subject.subject_code.clone(),
        });
        Ok(subject_id)
    }

    fn create_series(&mut self, series: &NewSeries) -> Result<Id> {
        self.record("create_series", series);
        let series_id = nanoid!();
        self.series.push(SeriesRecord {
            series_id: series_id.clone(),
            series_name: series.series_name.clone(),
            imprint_id: series.imprint_id.clone(),
        });
        Ok(series_id)
    }

    fn create_issue(&mut self, issue: &NewIssue) -> Result<Id> {
        self.record("create_issue", issue);
        if !self.series.iter().any(|s| s.series_id == issue.series_id) {
            return Err(ApiError::NotFound(format!("series {}", issue.series_id)));
        }
        let issue_id = nanoid!();
        self.work_mut(&issue.work_id)?.issues.push(IssueRecord {
            issue_id: issue_id.clone(),
            series_id: issue.series_id.clone(),
            work_id: issue.work_id.clone(),
            issue_ordinal: issue.issue_ordinal,
        });
        Ok(issue_id)
    }

    fn create_work_relation(&mut self, relation: &NewWorkRelation) -> Result<Id> {
        self.record("create_work_relation", relation);
        let relator_doi = self.work_mut(&relation.relator_work_id)?.work.doi.clone();
        let related_doi = self.work_mut(&relation.related_work_id)?.work.doi.clone();
        let relation_id = nanoid!();
        self.work_mut(&relation.relator_work_id)?
            .relations
            .push(RelationRecord {
                work_relation_id: relation_id.clone(),
                related_work_id: relation.related_work_id.clone(),
                relation_type: relation.relation_type,
                relation_ordinal: relation.relation_ordinal,
                related_work: RelatedWorkRef { doi: related_doi },
            });
        // the service records the inverse relation on the related work
        self.work_mut(&relation.related_work_id)?
            .relations
            .push(RelationRecord {
                work_relation_id: nanoid!(),
                related_work_id: relation.relator_work_id.clone(),
                relation_type: relation.relation_type.inverse(),
                relation_ordinal: relation.relation_ordinal,
                related_work: RelatedWorkRef { doi: relator_doi },
            });
        Ok(relation_id)
    }

    fn create_funding(&mut self, funding: &NewFunding) -> Result<Id> {
        self.record("create_funding", funding);
        self.ensure_institution(&funding.institution_id)?;
        let funding_id = nanoid!();
        self.work_mut(&funding.work_id)?.fundings.push(FundingRecord {
            funding_id: funding_id.clone(),
            institution_id: funding.institution_id.clone(),
        });
        Ok(funding_id)
    }

    fn update_work(&mut self, work_id: &str, work: &Work) -> Result<()> {
        self.record("update_work", work);
        self.work_mut(work_id)?.work = work.clone();
        Ok(())
    }

    fn update_contributor(
        &mut self,
        contributor_id: &str,
        contributor: &Contributor,
    ) -> Result<()> {
        self.record("update_contributor", contributor);
        let record = self
            .contributors
            .iter_mut()
            .find(|c| c.contributor_id == contributor_id)
            .ok_or_else(|| ApiError::NotFound(format!("contributor {contributor_id}")))?;
        record.contributor = contributor.clone();
        Ok(())
    }

    fn delete_location(&mut self, location_id: &str) -> Result<()> {
        self.record("delete_location", &json!({ "locationId": location_id }));
        for publication in self.works.iter_mut().flat_map(|w| w.publications.iter_mut()) {
            if let Some(index) = publication
                .locations
                .iter()
                .position(|l| l.location_id == location_id)
            {
                publication.locations.remove(index);
                return Ok(());
            }
        }
        Err(ApiError::NotFound(format!("location {location_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContributionType, RelationType, WorkStatus};
    use crate::normalize::Title;
    use pretty_assertions::assert_eq;

    fn work(title: &str, doi: &str, imprint_id: &str) -> Work {
        let mut work = Work::new(
            WorkType::Monograph,
            WorkStatus::Active,
            Title::split(title),
            imprint_id,
        );
        work.doi = Some(doi.to_string());
        work
    }

    #[test]
    fn test_work_lookup_by_doi() {
        let mut api = MemoryApi::new();
        let id = api
            .create_work(&work("A Book", "https://doi.org/10.1/ABC", "i1"))
            .unwrap();
        let found = api.work_by_doi("https://doi.org/10.1/abc/").unwrap().unwrap();
        assert_eq!(found.work_id, id);
        assert_eq!(api.work_by_doi("https://doi.org/10.1/other").unwrap(), None);
        assert!(matches!(api.work_by_id("missing"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_contribution_requires_contributor() {
        let mut api = MemoryApi::new();
        let work_id = api.create_work(&work("A", "10.1/a", "i1")).unwrap();
        let contribution = NewContribution {
            work_id,
            contributor_id: "nobody".into(),
            contribution_type: ContributionType::Author,
            main_contribution: true,
            contribution_ordinal: 1,
            biography: None,
            first_name: None,
            last_name: "Doe".into(),
            full_name: "Doe".into(),
        };
        assert!(matches!(
            api.create_contribution(&contribution),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_relation_records_inverse() {
        let mut api = MemoryApi::new();
        let book = api.create_work(&work("Book", "10.1/book", "i1")).unwrap();
        let chapter = api.create_work(&work("Chapter", "10.1/ch1", "i1")).unwrap();
        api.create_work_relation(&NewWorkRelation {
            relator_work_id: book.clone(),
            related_work_id: chapter.clone(),
            relation_type: RelationType::HasChild,
            relation_ordinal: 1,
        })
        .unwrap();
        let book = api.work_by_id(&book).unwrap();
        assert_eq!(book.relations[0].related_work.doi.as_deref(), Some("10.1/ch1"));
        let chapter = api.work_by_id(&chapter).unwrap();
        assert_eq!(chapter.relations[0].relation_type, RelationType::IsChildOf);
    }

    #[test]
    fn test_books_by_title_scoped_to_publisher() {
        let mut api = MemoryApi::new();
        let publisher_id = api
            .create_publisher(&NewPublisher {
                publisher_name: "Press".into(),
                publisher_shortname: None,
                publisher_url: None,
            })
            .unwrap();
        let imprint_id = api
            .create_imprint(&NewImprint {
                publisher_id: publisher_id.clone(),
                imprint_name: "Press".into(),
                imprint_url: None,
            })
            .unwrap();
        api.create_work(&work("Book", "10.1/a", &imprint_id)).unwrap();
        api.create_work(&work("Book", "10.1/b", "elsewhere")).unwrap();
        let books = api.books_by_title("Book", &publisher_id).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].work.doi.as_deref(), Some("10.1/a"));
    }

    #[test]
    fn test_call_log() {
        let mut api = MemoryApi::new();
        api.publishers("Press").unwrap();
        api.create_contributor(&Contributor {
            last_name: "Doe".into(),
            full_name: "Jane Doe".into(),
            ..Contributor::default()
        })
        .unwrap();
        assert_eq!(api.calls().len(), 2);
        assert_eq!(api.mutations().len(), 1);
        assert_eq!(api.calls_to("create_contributor")[0]["fullName"], "Jane Doe");
    }
}
