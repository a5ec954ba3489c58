//! Blocking GraphQL client for the live metadata service.
//!
//! Authenticates once at `{url}/account/login` and sends every query and
//! mutation to `{url}/graphql` with the bearer token. Mutation inputs are the
//! camelCase [`crate::model`] payloads passed as the `$data` variable.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{ApiError, MetadataApi, Result};
use crate::model::{
    Contributor, ContributorRecord, Id, Institution, InstitutionRecord, IssueRecord,
    NewAffiliation, NewContribution, NewFunding, NewImprint, NewIssue, NewLanguage, NewLocation,
    NewPrice, NewPublication, NewPublisher, NewSeries, NewSubject, NewWorkRelation,
    PublisherRecord, SeriesRecord, Work, WorkRecord, WorkType,
};

const WORK_FIELDS: &str = "workId workType workStatus fullTitle title subtitle reference edition \
imprintId doi publicationDate place pageCount pageBreakdown firstPage lastPage pageInterval \
imageCount tableCount audioCount videoCount license copyrightHolder landingPage lccn oclc \
shortAbstract longAbstract generalNote bibliographyNote toc coverUrl coverCaption \
contributions { contributionId contributorId contributionType contributionOrdinal \
affiliations { affiliationId institutionId affiliationOrdinal } } \
publications { publicationId publicationType isbn prices { priceId currencyCode unitPrice } \
locations { locationId landingPage fullTextUrl locationPlatform canonical } } \
languages { languageId languageCode languageRelation } \
subjects { subjectId subjectType subjectCode } \
issues { issueId seriesId workId issueOrdinal } \
relations { workRelationId relatedWorkId relationType relationOrdinal relatedWork { doi } } \
fundings { fundingId institutionId }";

const CONTRIBUTOR_FIELDS: &str = "contributorId firstName lastName fullName orcid website";

const INSTITUTION_FIELDS: &str = "institutionId institutionName institutionDoi ror countryCode";

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlMessage {
    message: String,
}

/// Connection settings for [`GraphQlClient`].
#[derive(Debug, Clone)]
pub struct GraphQlConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for GraphQlConfig {
    fn default() -> Self {
        Self {
            url: "https://api.thoth.pub".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
pub struct GraphQlClient {
    client: Client,
    url: String,
    token: Option<String>,
}

impl GraphQlClient {
    pub fn new(config: GraphQlConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("bibingest/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ApiError::Http(err.to_string()))?;
        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Exchanges credentials for a bearer token used on every later request.
    pub fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/account/login", self.url))
            .json(&Credentials { email, password })
            .send()
            .map_err(|err| ApiError::Http(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ApiError::Auth(format!("login returned {}", response.status())));
        }
        let login: LoginResponse = response
            .json()
            .map_err(|err| ApiError::Auth(err.to_string()))?;
        log::debug!("logged in to {} as {email}", self.url);
        self.token = Some(login.token);
        Ok(())
    }

    fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value, field: &str) -> Result<T> {
        let mut request = self
            .client
            .post(format!("{}/graphql", self.url))
            .json(&request_body(query, variables));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().map_err(|err| ApiError::Http(err.to_string()))?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Auth("request was not authorised".to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Http(format!("GraphQL endpoint returned {status}")));
        }
        let body: GraphQlResponse = response
            .json()
            .map_err(|err| ApiError::Http(err.to_string()))?;
        extract(body, field)
    }

    fn mutate(&self, mutation: &str, input_type: &str, id_field: &str, data: Value) -> Result<Id> {
        let query = mutation_query(mutation, input_type, id_field);
        let created: Value = self.execute(&query, json!({ "data": data }), mutation)?;
        created
            .get(id_field)
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| ApiError::GraphQl(vec![format!("{mutation} returned no {id_field}")]))
    }

    fn create<T: Serialize>(&self, mutation: &str, input_type: &str, id_field: &str, payload: &T) -> Result<Id> {
        let data = serde_json::to_value(payload).map_err(|err| ApiError::Http(err.to_string()))?;
        self.mutate(mutation, input_type, id_field, data)
    }
}

fn request_body(query: &str, variables: Value) -> Value {
    json!({ "query": query, "variables": variables })
}

fn mutation_query(mutation: &str, input_type: &str, id_field: &str) -> String {
    format!("mutation($data: {input_type}!) {{ {mutation}(data: $data) {{ {id_field} }} }}")
}

/// Pulls `data.{field}` out of a response, surfacing GraphQL errors.
fn extract<T: DeserializeOwned>(body: GraphQlResponse, field: &str) -> Result<T> {
    if !body.errors.is_empty() {
        return Err(ApiError::GraphQl(
            body.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    let value = body
        .data
        .and_then(|mut data| data.get_mut(field).map(Value::take))
        .unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|err| ApiError::GraphQl(vec![err.to_string()]))
}

/// Adds the id key a patch input needs next to the payload fields.
fn patch(id_field: &str, id: &str, payload: Value) -> Value {
    let mut data = payload;
    if let Value::Object(map) = &mut data {
        map.insert(id_field.to_string(), Value::String(id.to_string()));
    }
    data
}

impl MetadataApi for GraphQlClient {
    fn publishers(&mut self, search: &str) -> Result<Vec<PublisherRecord>> {
        let query = "query($filter: String!) { publishers(limit: 9999, filter: $filter) \
            { publisherId publisherName imprints { imprintId imprintName } } }";
        self.execute(query, json!({ "filter": search }), "publishers")
    }

    fn work_by_doi(&mut self, doi: &str) -> Result<Option<WorkRecord>> {
        let query = format!("query($doi: Doi!) {{ workByDoi(doi: $doi) {{ {WORK_FIELDS} }} }}");
        match self.execute(&query, json!({ "doi": doi }), "workByDoi") {
            Ok(work) => Ok(work),
            // the service reports an unknown DOI as an error rather than null
            Err(ApiError::GraphQl(messages))
                if messages.iter().any(|m| m.to_lowercase().contains("not found")) =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn work_by_id(&mut self, work_id: &str) -> Result<WorkRecord> {
        let query = format!("query($workId: Uuid!) {{ work(workId: $workId) {{ {WORK_FIELDS} }} }}");
        let work: Option<WorkRecord> = self.execute(&query, json!({ "workId": work_id }), "work")?;
        work.ok_or_else(|| ApiError::NotFound(format!("work {work_id}")))
    }

    fn books_by_title(&mut self, title: &str, publisher_id: &str) -> Result<Vec<WorkRecord>> {
        let query = format!(
            "query($filter: String!, $publishers: [Uuid!]) {{ works(limit: 9999, filter: $filter, \
             publishers: $publishers) {{ {WORK_FIELDS} }} }}"
        );
        let works: Vec<WorkRecord> = self.execute(
            &query,
            json!({ "filter": title, "publishers": [publisher_id] }),
            "works",
        )?;
        Ok(works
            .into_iter()
            .filter(|w| w.work.work_type != WorkType::BookChapter && w.work.full_title == title)
            .collect())
    }

    fn contributors(&mut self, offset: usize, limit: usize) -> Result<Vec<ContributorRecord>> {
        let query = format!(
            "query($offset: Int!, $limit: Int!) {{ contributors(offset: $offset, limit: $limit) \
             {{ {CONTRIBUTOR_FIELDS} }} }}"
        );
        self.execute(&query, json!({ "offset": offset, "limit": limit }), "contributors")
    }

    fn contributor(&mut self, contributor_id: &str) -> Result<ContributorRecord> {
        let query = format!(
            "query($contributorId: Uuid!) {{ contributor(contributorId: $contributorId) \
             {{ {CONTRIBUTOR_FIELDS} }} }}"
        );
        let record: Option<ContributorRecord> = self.execute(
            &query,
            json!({ "contributorId": contributor_id }),
            "contributor",
        )?;
        record.ok_or_else(|| ApiError::NotFound(format!("contributor {contributor_id}")))
    }

    fn institutions(&mut self, offset: usize, limit: usize) -> Result<Vec<InstitutionRecord>> {
        let query = format!(
            "query($offset: Int!, $limit: Int!) {{ institutions(offset: $offset, limit: $limit) \
             {{ {INSTITUTION_FIELDS} }} }}"
        );
        self.execute(&query, json!({ "offset": offset, "limit": limit }), "institutions")
    }

    fn series(&mut self, offset: usize, limit: usize) -> Result<Vec<SeriesRecord>> {
        let query = "query($offset: Int!, $limit: Int!) { serieses(offset: $offset, limit: $limit) \
            { seriesId seriesName imprintId } }";
        self.execute(query, json!({ "offset": offset, "limit": limit }), "serieses")
    }

    fn series_issues(&mut self, series_id: &str) -> Result<Vec<IssueRecord>> {
        #[derive(Deserialize)]
        struct SeriesIssues {
            issues: Vec<IssueRecord>,
        }
        let query = "query($seriesId: Uuid!) { series(seriesId: $seriesId) \
            { issues { issueId seriesId workId issueOrdinal } } }";
        let series: Option<SeriesIssues> =
            self.execute(query, json!({ "seriesId": series_id }), "series")?;
        series
            .map(|s| s.issues)
            .ok_or_else(|| ApiError::NotFound(format!("series {series_id}")))
    }

    fn create_publisher(&mut self, publisher: &NewPublisher) -> Result<Id> {
        self.create("createPublisher", "NewPublisher", "publisherId", publisher)
    }

    fn create_imprint(&mut self, imprint: &NewImprint) -> Result<Id> {
        self.create("createImprint", "NewImprint", "imprintId", imprint)
    }

    fn create_work(&mut self, work: &Work) -> Result<Id> {
        self.create("createWork", "NewWork", "workId", work)
    }

    fn create_contributor(&mut self, contributor: &Contributor) -> Result<Id> {
        self.create("createContributor", "NewContributor", "contributorId", contributor)
    }

    fn create_contribution(&mut self, contribution: &NewContribution) -> Result<Id> {
        self.create("createContribution", "NewContribution", "contributionId", contribution)
    }

    fn create_institution(&mut self, institution: &Institution) -> Result<Id> {
        self.create("createInstitution", "NewInstitution", "institutionId", institution)
    }

    fn create_affiliation(&mut self, affiliation: &NewAffiliation) -> Result<Id> {
        self.create("createAffiliation", "NewAffiliation", "affiliationId", affiliation)
    }

    fn create_publication(&mut self, publication: &NewPublication) -> Result<Id> {
        self.create("createPublication", "NewPublication", "publicationId", publication)
    }

    fn create_price(&mut self, price: &NewPrice) -> Result<Id> {
        self.create("createPrice", "NewPrice", "priceId", price)
    }

    fn create_location(&mut self, location: &NewLocation) -> Result<Id> {
        self.create("createLocation", "NewLocation", "locationId", location)
    }

    fn create_language(&mut self, language: &NewLanguage) -> Result<Id> {
        self.create("createLanguage", "NewLanguage", "languageId", language)
    }

    fn create_subject(&mut self, subject: &NewSubject) -> Result<Id> {
        self.create("createSubject", "NewSubject", "subjectId", subject)
    }

    fn create_series(&mut self, series: &NewSeries) -> Result<Id> {
        self.create("createSeries", "NewSeries", "seriesId", series)
    }

    fn create_issue(&mut self, issue: &NewIssue) -> Result<Id> {
        self.create("createIssue", "NewIssue", "issueId", issue)
    }

    fn create_work_relation(&mut self, relation: &NewWorkRelation) -> Result<Id> {
        self.create("createWorkRelation", "NewWorkRelation", "workRelationId", relation)
    }

    fn create_funding(&mut self, funding: &NewFunding) -> Result<Id> {
        self.create("createFunding", "NewFunding", "fundingId", funding)
    }

    fn update_work(&mut self, work_id: &str, work: &Work) -> Result<()> {
        let payload = serde_json::to_value(work).map_err(|err| ApiError::Http(err.to_string()))?;
        self.mutate("updateWork", "PatchWork", "workId", patch("workId", work_id, payload))
            .map(|_| ())
    }

    fn update_contributor(
        &mut self,
        contributor_id: &str,
        contributor: &Contributor,
    ) -> Result<()> {
        let payload =
            serde_json::to_value(contributor).map_err(|err| ApiError::Http(err.to_string()))?;
        self.mutate(
            "updateContributor",
            "PatchContributor",
            "contributorId",
            patch("contributorId", contributor_id, payload),
        )
        .map(|_| ())
    }

    fn delete_location(&mut self, location_id: &str) -> Result<()> {
        let query = "mutation($locationId: Uuid!) { deleteLocation(locationId: $locationId) \
            { locationId } }";
        let _: Value = self.execute(query, json!({ "locationId": location_id }), "deleteLocation")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mutation_query() {
        assert_eq!(
            mutation_query("createWork", "NewWork", "workId"),
            "mutation($data: NewWork!) { createWork(data: $data) { workId } }"
        );
    }

    #[test]
    fn test_request_body() {
        let body = request_body("query { x }", json!({ "a": 1 }));
        assert_eq!(body, json!({ "query": "query { x }", "variables": { "a": 1 } }));
    }

    #[test]
    fn test_patch_adds_id() {
        let data = patch("workId", "w1", json!({ "title": "T" }));
        assert_eq!(data, json!({ "title": "T", "workId": "w1" }));
    }

    #[test]
    fn test_extract_data_field() {
        let body: GraphQlResponse = serde_json::from_value(json!({
            "data": { "contributors": [
                { "contributorId": "c1", "firstName": null, "lastName": "Doe",
                  "fullName": "Doe", "orcid": null, "website": null }
            ] }
        }))
        .unwrap();
        let records: Vec<ContributorRecord> = extract(body, "contributors").unwrap();
        assert_eq!(records[0].contributor_id, "c1");
        assert_eq!(records[0].contributor.full_name, "Doe");
    }

    #[test]
    fn test_extract_errors() {
        let body: GraphQlResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "message": "Invalid ISBN" }]
        }))
        .unwrap();
        let result: Result<Value> = extract(body, "createPublication");
        assert_eq!(result, Err(ApiError::GraphQl(vec!["Invalid ISBN".into()])));
    }

    #[test]
    fn test_extract_null_as_none() {
        let body: GraphQlResponse =
            serde_json::from_value(json!({ "data": { "work": null } })).unwrap();
        let work: Option<WorkRecord> = extract(body, "work").unwrap();
        assert_eq!(work, None);
    }

    #[test]
    fn test_client_url_is_trimmed() {
        let client = GraphQlClient::new(GraphQlConfig {
            url: "https://api.example.org/".into(),
            ..GraphQlConfig::default()
        })
        .unwrap();
        assert_eq!(client.url, "https://api.example.org");
    }
}
