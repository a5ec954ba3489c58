//! Remote metadata API.
//!
//! [`MetadataApi`] is the seam between the pipeline and the service it loads
//! into. [`memory::MemoryApi`] keeps everything in process and records every
//! call; [`graphql::GraphQlClient`] talks to the live GraphQL endpoint.

use thiserror::Error;

use crate::model::{
    Contributor, ContributorRecord, Id, Institution, InstitutionRecord, IssueRecord,
    NewAffiliation, NewContribution, NewFunding, NewImprint, NewIssue, NewLanguage, NewLocation,
    NewPrice, NewPublication, NewPublisher, NewSeries, NewSubject, NewWorkRelation,
    PublisherRecord, SeriesRecord, Work, WorkRecord,
};

#[cfg(feature = "http")]
pub mod graphql;
pub mod memory;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(String),
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Queries and mutations the loaders need.
///
/// Lookups that may legitimately miss return `Ok(None)`; fetching by id
/// returns [`ApiError::NotFound`] instead.
pub trait MetadataApi {
    /// Publishers whose name matches `search`.
    fn publishers(&mut self, search: &str) -> Result<Vec<PublisherRecord>>;
    fn work_by_doi(&mut self, doi: &str) -> Result<Option<WorkRecord>>;
    fn work_by_id(&mut self, work_id: &str) -> Result<WorkRecord>;
    /// Non-chapter works of a publisher with exactly this full title.
    fn books_by_title(&mut self, title: &str, publisher_id: &str) -> Result<Vec<WorkRecord>>;
    fn contributors(&mut self, offset: usize, limit: usize) -> Result<Vec<ContributorRecord>>;
    fn contributor(&mut self, contributor_id: &str) -> Result<ContributorRecord>;
    fn institutions(&mut self, offset: usize, limit: usize) -> Result<Vec<InstitutionRecord>>;
    fn series(&mut self, offset: usize, limit: usize) -> Result<Vec<SeriesRecord>>;
    fn series_issues(&mut self, series_id: &str) -> Result<Vec<IssueRecord>>;

    fn create_publisher(&mut self, publisher: &NewPublisher) -> Result<Id>;
    fn create_imprint(&mut self, imprint: &NewImprint) -> Result<Id>;
    fn create_work(&mut self, work: &Work) -> Result<Id>;
    fn create_contributor(&mut self, contributor: &Contributor) -> Result<Id>;
    fn create_contribution(&mut self, contribution: &NewContribution) -> Result<Id>;
    fn create_institution(&mut self, institution: &Institution) -> Result<Id>;
    fn create_affiliation(&mut self, affiliation: &NewAffiliation) -> Result<Id>;
    fn create_publication(&mut self, publication: &NewPublication) -> Result<Id>;
    fn create_price(&mut self, price: &NewPrice) -> Result<Id>;
    fn create_location(&mut self, location: &NewLocation) -> Result<Id>;
    fn create_language(&mut self, language: &NewLanguage) -> Result<Id>;
    fn create_subject(&mut self, subject: &NewSubject) -> Result<Id>;
    fn create_series(&mut self, series: &NewSeries) -> Result<Id>;
    fn create_issue(&mut self, issue: &NewIssue) -> Result<Id>;
    fn create_work_relation(&mut self, relation: &NewWorkRelation) -> Result<Id>;
    fn create_funding(&mut self, funding: &NewFunding) -> Result<Id>;

    fn update_work(&mut self, work_id: &str, work: &Work) -> Result<()>;
    fn update_contributor(&mut self, contributor_id: &str, contributor: &Contributor)
    -> Result<()>;

    fn delete_location(&mut self, location_id: &str) -> Result<()>;
}

/// Fetches every page of a paginated listing.
pub fn paginate<T>(
    page_size: usize,
    mut fetch: impl FnMut(usize, usize) -> Result<Vec<T>>,
) -> Result<Vec<T>> {
    let page_size = page_size.max(1);
    let mut all = Vec::new();
    loop {
        let page = fetch(all.len(), page_size)?;
        let last = page.len() < page_size;
        all.extend(page);
        if last {
            return Ok(all);
        }
    }
}
