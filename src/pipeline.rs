//! Generic create-or-update orchestration.
//!
//! A [`Mapper`] turns source records into [`WorkDraft`]s; the [`Pipeline`]
//! resolves every id the draft needs, creates what is missing and updates only
//! what changed. Records are processed serially, in input order.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::api::{self, ApiError, MetadataApi};
use crate::cache::IdentityCache;
use crate::draft::{
    AbstractDraft, AffiliationDraft, ContributorDraft, FundingDraft, LanguageDraft, ParentDraft,
    PublicationDraft, RelationDraft, SeriesDraft, SubjectDraft, WorkDraft,
};
use crate::error::{LoadError, ValueError};
use crate::identifiers::same_doi;
use crate::model::{
    AffiliationRecord, ContributionRecord, ContributorPatch, FundingRecord, Id, Institution,
    IssueRecord, LanguageRecord, LocationRecord, NewAffiliation, NewContribution, NewFunding,
    NewImprint, NewIssue, NewLanguage, NewLocation, NewPrice, NewPublication, NewPublisher,
    NewSeries, NewSubject, NewWorkRelation, PriceRecord, PublicationRecord, RelatedWorkRef,
    RelationRecord, RelationType, SubjectRecord, Work, WorkRecord, WorkType, wire_name,
};
use crate::reconcile::{
    PendingIssue, issue_ordinal, merge_contributor, merge_work, next_ordinal,
    number_grouped_issues, plan_locations,
};
use crate::report::{RecordError, RecordSuccess, RunReport};
use crate::resolver::{DoiResolver, ResolveError};

/// How a draft's named imprint is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImprintPolicy {
    /// Create the imprint under the publisher when it does not exist.
    #[default]
    CreateMissing,
    /// A named imprint must already exist.
    RequireExisting,
}

/// The publisher a mapper loads into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherProfile {
    pub name: String,
    pub shortname: Option<String>,
    pub url: Option<String>,
    pub imprint_policy: ImprintPolicy,
}

impl PublisherProfile {
    #[must_use]
    pub fn new(name: &str, shortname: Option<&str>, url: Option<&str>) -> Self {
        PublisherProfile {
            name: name.to_string(),
            shortname: shortname.map(String::from),
            url: url.map(String::from),
            imprint_policy: ImprintPolicy::CreateMissing,
        }
    }

    #[must_use]
    pub fn require_imprints(mut self) -> Self {
        self.imprint_policy = ImprintPolicy::RequireExisting;
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl From<MapError> for RecordError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::Value(err) => err.into(),
            MapError::Resolve(err) => err.into(),
        }
    }
}

/// Services a mapper may use while mapping one record.
pub struct MapContext<'a> {
    resolver: &'a dyn DoiResolver,
}

impl<'a> MapContext<'a> {
    pub fn new(resolver: &'a dyn DoiResolver) -> Self {
        MapContext { resolver }
    }

    /// The URL a DOI redirects to, if it resolves.
    pub fn landing_page(&mut self, doi: &str) -> Result<Option<String>, ResolveError> {
        self.resolver.landing_page(doi)
    }
}

/// Publisher-specific reading and mapping.
pub trait Mapper {
    type Record;

    fn profile(&self) -> &PublisherProfile;

    fn read(&self, path: &Path) -> Result<Vec<Self::Record>, LoadError>;

    /// Maps one record; `Ok(None)` skips a record that belongs elsewhere.
    fn map(
        &self,
        record: &Self::Record,
        ctx: &mut MapContext<'_>,
    ) -> Result<Option<WorkDraft>, MapError>;

    /// Label for records that never became a draft.
    fn label(&self, _record: &Self::Record, index: usize) -> String {
        format!("record {}", index + 1)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Stop at the first failed record.
    pub fail_fast: bool,
    /// Page size for the listings that fill the identity cache.
    pub page_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            fail_fast: false,
            page_size: 500,
        }
    }
}

pub struct Pipeline<A, R> {
    session: Session<A>,
    resolver: R,
    options: PipelineOptions,
}

impl<A: MetadataApi, R: DoiResolver> Pipeline<A, R> {
    /// Fills the identity cache from the API and prepares a run.
    pub fn new(mut api: A, resolver: R, options: PipelineOptions) -> api::Result<Self> {
        let cache = IdentityCache::load(&mut api, options.page_size)?;
        Ok(Pipeline {
            session: Session::new(api, cache),
            resolver,
            options,
        })
    }

    pub fn api(&self) -> &A {
        &self.session.api
    }

    pub fn into_api(self) -> A {
        self.session.api
    }

    /// Reads `path` with the mapper and loads every record.
    pub fn run<M: Mapper>(&mut self, mapper: &M, path: &Path) -> Result<RunReport, LoadError> {
        let records = mapper.read(path)?;
        log::info!("read {} records from {}", records.len(), path.display());
        Ok(self.run_records(mapper, &records))
    }

    /// Loads already decoded records.
    pub fn run_records<M: Mapper>(&mut self, mapper: &M, records: &[M::Record]) -> RunReport {
        let mut report = RunReport::default();
        for (index, record) in records.iter().enumerate() {
            let mut ctx = MapContext::new(&self.resolver);
            let (label, result) = match mapper.map(record, &mut ctx) {
                Ok(Some(draft)) => {
                    let label = draft.label.clone();
                    (label, self.session.load(mapper.profile(), draft))
                }
                Ok(None) => {
                    let label = mapper.label(record, index);
                    log::debug!("{label}: not a {} record, skipped", mapper.profile().name);
                    (label, Ok(RecordSuccess::Skipped))
                }
                Err(err) => (mapper.label(record, index), Err(err.into())),
            };
            let failed = result.is_err();
            if let Err(err) = &result {
                log::error!("{label}: {err}");
            }
            report.push(label, result);
            if failed && self.options.fail_fast {
                report.aborted = true;
                break;
            }
        }
        self.session.create_pending_issues(&mut report);
        report
    }

    /// Fills in the abstracts of works that already exist.
    ///
    /// Nothing is created: a draft whose work is missing or has another type
    /// is skipped.
    pub fn run_abstracts(&mut self, drafts: &[AbstractDraft]) -> RunReport {
        let mut report = RunReport::default();
        for draft in drafts {
            let result = self.session.fill_abstract(draft).map_err(RecordError::from);
            let failed = result.is_err();
            if let Err(err) = &result {
                log::error!("{}: {err}", draft.label);
            }
            report.push(draft.label.clone(), result);
            if failed && self.options.fail_fast {
                report.aborted = true;
                break;
            }
        }
        report
    }
}

#[derive(Debug, Clone)]
struct PublisherIds {
    publisher_id: Id,
    imprint_id: Id,
}

/// Per-run state: the API, the identity cache and the issues waiting for
/// grouped numbering.
struct Session<A> {
    api: A,
    cache: IdentityCache,
    publishers: HashMap<String, PublisherIds>,
    pending_issues: Vec<PendingIssue>,
    /// Mutations issued for the current record.
    changes: usize,
}

impl<A: MetadataApi> Session<A> {
    fn new(api: A, cache: IdentityCache) -> Self {
        Session {
            api,
            cache,
            publishers: HashMap::new(),
            pending_issues: Vec::new(),
            changes: 0,
        }
    }

    fn load(
        &mut self,
        default_profile: &PublisherProfile,
        draft: WorkDraft,
    ) -> Result<RecordSuccess, RecordError> {
        let WorkDraft {
            label,
            mut work,
            publisher: publisher_override,
            imprint,
            contributors,
            publications,
            languages,
            subjects,
            series,
            fundings,
            children,
            parent,
        } = draft;
        self.changes = 0;

        let profile = publisher_override.as_ref().unwrap_or(default_profile);
        let publisher = self.publisher(profile)?;
        work.imprint_id = self.imprint(profile, &publisher, imprint.as_deref())?;

        let (mut current, created) = self.upsert_work(&label, work)?;
        self.contributions(&label, &mut current, &contributors)?;
        self.publications(&label, &mut current, &publications)?;
        self.languages(&mut current, &languages)?;
        self.subjects(&mut current, &subjects)?;
        self.series(&label, &mut current, &series)?;
        self.fundings(&label, &mut current, &fundings)?;
        self.children(&label, &mut current, &children)?;
        if let Some(parent) = &parent {
            self.parent(&label, &current, &publisher, parent)?;
        }

        let work_id = current.work_id;
        Ok(if created {
            RecordSuccess::Created(work_id)
        } else if self.changes > 0 {
            RecordSuccess::Updated(work_id)
        } else {
            log::debug!("{label}: nothing to change");
            RecordSuccess::Unchanged(work_id)
        })
    }

    fn publisher(&mut self, profile: &PublisherProfile) -> api::Result<PublisherIds> {
        if let Some(ids) = self.publishers.get(&profile.name) {
            return Ok(ids.clone());
        }
        let found = self.api.publishers(&profile.name)?;
        let record = found
            .iter()
            .find(|p| p.publisher_name.eq_ignore_ascii_case(&profile.name))
            .or(found.first());
        let ids = match record {
            Some(record) => {
                self.cache.add_publisher(record);
                let imprint_id = match record.imprints.first() {
                    Some(imprint) => imprint.imprint_id.clone(),
                    None => self.create_imprint(&record.publisher_id, profile, &profile.name)?,
                };
                PublisherIds {
                    publisher_id: record.publisher_id.clone(),
                    imprint_id,
                }
            }
            None => {
                let publisher_id = self.api.create_publisher(&NewPublisher {
                    publisher_name: profile.name.clone(),
                    publisher_shortname: profile.shortname.clone(),
                    publisher_url: profile.url.clone(),
                })?;
                log::info!("created publisher {} ({publisher_id})", profile.name);
                let imprint_id = self.create_imprint(&publisher_id, profile, &profile.name)?;
                PublisherIds {
                    publisher_id,
                    imprint_id,
                }
            }
        };
        self.publishers.insert(profile.name.clone(), ids.clone());
        Ok(ids)
    }

    fn create_imprint(
        &mut self,
        publisher_id: &str,
        profile: &PublisherProfile,
        name: &str,
    ) -> api::Result<Id> {
        let imprint_id = self.api.create_imprint(&NewImprint {
            publisher_id: publisher_id.to_string(),
            imprint_name: name.to_string(),
            imprint_url: profile.url.clone(),
        })?;
        self.cache.insert_imprint(&imprint_id, name);
        log::info!("created imprint {name} ({imprint_id})");
        Ok(imprint_id)
    }

    fn imprint(
        &mut self,
        profile: &PublisherProfile,
        publisher: &PublisherIds,
        name: Option<&str>,
    ) -> api::Result<Id> {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Ok(publisher.imprint_id.clone());
        };
        if let Some(imprint_id) = self.cache.imprint(name) {
            return Ok(imprint_id.clone());
        }
        match profile.imprint_policy {
            ImprintPolicy::RequireExisting => Err(ApiError::NotFound(format!("imprint {name}"))),
            ImprintPolicy::CreateMissing => {
                self.create_imprint(&publisher.publisher_id, profile, name)
            }
        }
    }

    /// Updates the work with the same DOI, or creates a new one.
    fn upsert_work(&mut self, label: &str, work: Work) -> api::Result<(WorkRecord, bool)> {
        if let Some(doi) = work.doi.as_deref() {
            if let Some(mut existing) = self.api.work_by_doi(doi)? {
                match merge_work(&existing.work, &work) {
                    Some(merged) => {
                        self.api.update_work(&existing.work_id, &merged)?;
                        self.changes += 1;
                        log::info!("{label}: updated work {}", existing.work_id);
                        existing.work = merged;
                    }
                    None => log::debug!("{label}: work {} is up to date", existing.work_id),
                }
                return Ok((existing, false));
            }
        }
        let work_id = self.api.create_work(&work)?;
        log::info!("{label}: created work {work_id}");
        Ok((WorkRecord::bare(work_id, work), true))
    }

    fn fill_abstract(&mut self, draft: &AbstractDraft) -> api::Result<RecordSuccess> {
        let label = &draft.label;
        let Some(mut existing) = self.api.work_by_doi(&draft.doi)? else {
            log::warn!("{label}: no work with DOI {}", draft.doi);
            return Ok(RecordSuccess::Skipped);
        };
        if let Some(work_type) = draft.work_type {
            if existing.work.work_type != work_type {
                log::warn!(
                    "{label}: work {} is not a {}",
                    existing.work_id,
                    wire_name(&work_type)
                );
                return Ok(RecordSuccess::Skipped);
            }
        }
        if existing.work.long_abstract.is_some() {
            log::info!("{label}: work {} already has an abstract", existing.work_id);
            return Ok(RecordSuccess::Unchanged(existing.work_id));
        }
        existing.work.long_abstract = Some(draft.long_abstract.clone());
        self.api.update_work(&existing.work_id, &existing.work)?;
        log::info!("{label}: added abstract to work {}", existing.work_id);
        Ok(RecordSuccess::Updated(existing.work_id))
    }

    fn contributor(&mut self, label: &str, draft: &ContributorDraft) -> api::Result<Id> {
        let incoming = &draft.contributor;
        let cached = self
            .cache
            .contributor(incoming.orcid.as_deref(), &incoming.full_name)
            .cloned();
        let Some(contributor_id) = cached else {
            let contributor_id = self.api.create_contributor(incoming)?;
            self.changes += 1;
            self.cache.insert_contributor(
                &contributor_id,
                incoming.orcid.as_deref(),
                &incoming.full_name,
            );
            log::info!("{label}: created contributor {} ({contributor_id})", incoming.full_name);
            return Ok(contributor_id);
        };
        if draft.refresh {
            let remote = self.api.contributor(&contributor_id)?;
            if let Some(merged) =
                merge_contributor(&remote.contributor, &ContributorPatch::from(incoming))
            {
                self.api.update_contributor(&contributor_id, &merged)?;
                self.changes += 1;
                self.cache.insert_contributor(
                    &contributor_id,
                    merged.orcid.as_deref(),
                    &merged.full_name,
                );
                log::info!("{label}: updated contributor {} ({contributor_id})", merged.full_name);
            }
        }
        Ok(contributor_id)
    }

    fn contributions(
        &mut self,
        label: &str,
        current: &mut WorkRecord,
        drafts: &[ContributorDraft],
    ) -> api::Result<()> {
        for draft in drafts {
            let contributor_id = self.contributor(label, draft)?;
            let existing = current.contributions.iter().position(|c| {
                c.contributor_id == contributor_id && c.contribution_type == draft.contribution_type
            });
            let index = match existing {
                Some(index) => {
                    log::debug!(
                        "{label}: {} is already listed as {}",
                        draft.contributor.full_name,
                        wire_name(&draft.contribution_type)
                    );
                    index
                }
                None => {
                    let ordinal = draft.ordinal.unwrap_or_else(|| {
                        next_ordinal(current.contributions.iter().map(|c| c.contribution_ordinal))
                    });
                    let contribution_id = self.api.create_contribution(&NewContribution {
                        work_id: current.work_id.clone(),
                        contributor_id: contributor_id.clone(),
                        contribution_type: draft.contribution_type,
                        main_contribution: draft.is_main(),
                        contribution_ordinal: ordinal,
                        biography: draft.biography.clone(),
                        first_name: draft.contributor.first_name.clone(),
                        last_name: draft.contributor.last_name.clone(),
                        full_name: draft.contributor.full_name.clone(),
                    })?;
                    self.changes += 1;
                    log::info!(
                        "{label}: added {} as {}",
                        draft.contributor.full_name,
                        wire_name(&draft.contribution_type)
                    );
                    current.contributions.push(ContributionRecord {
                        contribution_id,
                        contributor_id,
                        contribution_type: draft.contribution_type,
                        contribution_ordinal: ordinal,
                        affiliations: Vec::new(),
                    });
                    current.contributions.len() - 1
                }
            };
            for affiliation in &draft.affiliations {
                self.affiliation(label, &mut current.contributions[index], affiliation)?;
            }
        }
        Ok(())
    }

    /// Resolves an institution by ROR or name, creating it when it has a
    /// usable name.
    fn institution(&mut self, label: &str, institution: &Institution) -> api::Result<Option<Id>> {
        let name = institution.institution_name.trim();
        if let Some(institution_id) = self.cache.institution(institution.ror.as_deref(), name) {
            return Ok(Some(institution_id.clone()));
        }
        if name.is_empty() || name.eq_ignore_ascii_case("n/a") {
            return Ok(None);
        }
        let institution_id = self.api.create_institution(&Institution {
            institution_name: name.to_string(),
            ..institution.clone()
        })?;
        self.changes += 1;
        self.cache
            .insert_institution(&institution_id, institution.ror.as_deref(), name);
        log::info!("{label}: created institution {name} ({institution_id})");
        Ok(Some(institution_id))
    }

    fn affiliation(
        &mut self,
        label: &str,
        contribution: &mut ContributionRecord,
        draft: &AffiliationDraft,
    ) -> api::Result<()> {
        let Some(institution_id) = self.institution(label, &draft.institution)? else {
            log::debug!("{label}: affiliation without an institution skipped");
            return Ok(());
        };
        if contribution
            .affiliations
            .iter()
            .any(|a| a.institution_id == institution_id)
        {
            return Ok(());
        }
        let ordinal = next_ordinal(contribution.affiliations.iter().map(|a| a.affiliation_ordinal));
        let affiliation_id = self.api.create_affiliation(&NewAffiliation {
            contribution_id: contribution.contribution_id.clone(),
            institution_id: institution_id.clone(),
            affiliation_ordinal: ordinal,
            position: draft.position.clone(),
        })?;
        self.changes += 1;
        contribution.affiliations.push(AffiliationRecord {
            affiliation_id,
            institution_id,
            affiliation_ordinal: ordinal,
        });
        Ok(())
    }

    fn publications(
        &mut self,
        label: &str,
        current: &mut WorkRecord,
        drafts: &[PublicationDraft],
    ) -> api::Result<()> {
        for draft in drafts {
            let existing = current
                .publications
                .iter()
                .position(|p| p.publication_type == draft.publication_type);
            let index = match existing {
                Some(index) => index,
                None => {
                    let publication_id = self.api.create_publication(&NewPublication {
                        work_id: current.work_id.clone(),
                        publication_type: draft.publication_type,
                        isbn: draft.isbn.clone(),
                        dimensions: draft.dimensions.clone(),
                    })?;
                    self.changes += 1;
                    log::info!(
                        "{label}: created {} publication {publication_id}",
                        wire_name(&draft.publication_type)
                    );
                    current.publications.push(PublicationRecord {
                        publication_id,
                        publication_type: draft.publication_type,
                        isbn: draft.isbn.clone(),
                        prices: Vec::new(),
                        locations: Vec::new(),
                    });
                    current.publications.len() - 1
                }
            };
            let publication = &mut current.publications[index];

            for price in &draft.prices {
                if publication
                    .prices
                    .iter()
                    .any(|p| p.currency_code == price.currency)
                {
                    continue;
                }
                let price_id = self.api.create_price(&NewPrice {
                    publication_id: publication.publication_id.clone(),
                    currency_code: price.currency.clone(),
                    unit_price: price.amount,
                })?;
                self.changes += 1;
                publication.prices.push(PriceRecord {
                    price_id,
                    currency_code: price.currency.clone(),
                    unit_price: price.amount,
                });
            }

            let plan = plan_locations(&publication.locations, &draft.locations);
            for location_id in &plan.delete {
                self.api.delete_location(location_id)?;
                self.changes += 1;
            }
            publication
                .locations
                .retain(|l| !plan.delete.contains(&l.location_id));
            for location in plan.create {
                let location_id = self.api.create_location(&NewLocation {
                    publication_id: publication.publication_id.clone(),
                    location: location.clone(),
                })?;
                self.changes += 1;
                log::debug!(
                    "{label}: added {} location {location_id}",
                    wire_name(&location.location_platform)
                );
                publication.locations.push(LocationRecord {
                    location_id,
                    location,
                });
            }
        }
        Ok(())
    }

    fn languages(&mut self, current: &mut WorkRecord, drafts: &[LanguageDraft]) -> api::Result<()> {
        for draft in drafts {
            if current.languages.iter().any(|l| l.language_code == draft.code) {
                continue;
            }
            let language_id = self.api.create_language(&NewLanguage {
                work_id: current.work_id.clone(),
                language_code: draft.code.clone(),
                language_relation: draft.relation,
                main_language: draft.main,
            })?;
            self.changes += 1;
            current.languages.push(LanguageRecord {
                language_id,
                language_code: draft.code.clone(),
                language_relation: draft.relation,
            });
        }
        Ok(())
    }

    fn subjects(&mut self, current: &mut WorkRecord, drafts: &[SubjectDraft]) -> api::Result<()> {
        for draft in drafts {
            if current
                .subjects
                .iter()
                .any(|s| s.subject_type == draft.subject_type && s.subject_code == draft.code)
            {
                continue;
            }
            let subject_id = self.api.create_subject(&NewSubject {
                work_id: current.work_id.clone(),
                subject_type: draft.subject_type,
                subject_code: draft.code.clone(),
                subject_ordinal: draft.ordinal,
            })?;
            self.changes += 1;
            current.subjects.push(SubjectRecord {
                subject_id,
                subject_type: draft.subject_type,
                subject_code: draft.code.clone(),
            });
        }
        Ok(())
    }

    fn series(
        &mut self,
        label: &str,
        current: &mut WorkRecord,
        drafts: &[SeriesDraft],
    ) -> api::Result<()> {
        for draft in drafts.iter().filter(|s| !s.name.is_empty()) {
            let series_id = match self.cache.series(&draft.name).cloned() {
                Some(series_id) => series_id,
                None => {
                    let series_id = self.api.create_series(&NewSeries {
                        series_type: draft.series_type,
                        series_name: draft.name.clone(),
                        issn_print: draft.issn_print.clone(),
                        issn_digital: draft.issn_digital.clone(),
                        series_url: draft.url.clone(),
                        series_description: draft.description.clone(),
                        series_cfp_url: draft.cfp_url.clone(),
                        imprint_id: current.work.imprint_id.clone(),
                    })?;
                    self.changes += 1;
                    self.cache.insert_series(&series_id, &draft.name);
                    log::info!("{label}: created series {} ({series_id})", draft.name);
                    series_id
                }
            };
            if current.issues.iter().any(|i| i.series_id == series_id) {
                continue;
            }
            if draft.deferred {
                let queued = self
                    .pending_issues
                    .iter()
                    .any(|p| p.series_id == series_id && p.work_id == current.work_id);
                if !queued {
                    self.pending_issues.push(PendingIssue {
                        series_id,
                        work_id: current.work_id.clone(),
                        ordinal: draft.ordinal,
                    });
                }
                continue;
            }
            let taken: Vec<i32> = self
                .api
                .series_issues(&series_id)?
                .iter()
                .map(|i| i.issue_ordinal)
                .collect();
            let ordinal = issue_ordinal(draft.ordinal, &taken);
            let issue_id = self.api.create_issue(&NewIssue {
                series_id: series_id.clone(),
                work_id: current.work_id.clone(),
                issue_ordinal: ordinal,
            })?;
            self.changes += 1;
            log::info!("{label}: issue {ordinal} of {}", draft.name);
            current.issues.push(IssueRecord {
                issue_id,
                series_id,
                work_id: current.work_id.clone(),
                issue_ordinal: ordinal,
            });
        }
        Ok(())
    }

    fn fundings(
        &mut self,
        label: &str,
        current: &mut WorkRecord,
        drafts: &[FundingDraft],
    ) -> api::Result<()> {
        for draft in drafts {
            let Some(institution_id) = self.institution(label, &draft.institution)? else {
                continue;
            };
            if current
                .fundings
                .iter()
                .any(|f| f.institution_id == institution_id)
            {
                continue;
            }
            let funding_id = self.api.create_funding(&NewFunding {
                work_id: current.work_id.clone(),
                institution_id: institution_id.clone(),
                program: draft.program.clone(),
                project_name: draft.project_name.clone(),
                project_shortname: draft.project_shortname.clone(),
                grant_number: draft.grant_number.clone(),
                jurisdiction: draft.jurisdiction.clone(),
            })?;
            self.changes += 1;
            current.fundings.push(FundingRecord {
                funding_id,
                institution_id,
            });
        }
        Ok(())
    }

    /// Links the chapters listed on a book record, creating missing ones.
    fn children(
        &mut self,
        label: &str,
        current: &mut WorkRecord,
        drafts: &[RelationDraft],
    ) -> Result<(), RecordError> {
        for draft in drafts {
            if draft.relation_type != RelationType::HasChild {
                return Err(
                    ValueError::unmapped("relation type", wire_name(&draft.relation_type)).into(),
                );
            }
            let linked = current.relations.iter().any(|r| {
                r.related_work
                    .doi
                    .as_deref()
                    .is_some_and(|doi| same_doi(doi, &draft.doi))
            });
            if linked {
                log::debug!("{label}: already related to {}", draft.doi);
                continue;
            }
            let child_id = match self.api.work_by_doi(&draft.doi)? {
                Some(child) => child.work_id,
                None => {
                    let book = &current.work;
                    let mut chapter = Work::new(
                        WorkType::BookChapter,
                        book.work_status,
                        draft.title.clone(),
                        book.imprint_id.clone(),
                    );
                    chapter.doi = Some(draft.doi.clone());
                    chapter.publication_date = book.publication_date.clone();
                    chapter.place = book.place.clone();
                    chapter.license = book.license.clone();
                    let child_id = self.api.create_work(&chapter)?;
                    self.changes += 1;
                    log::info!("{label}: created chapter {} ({child_id})", chapter.full_title);
                    child_id
                }
            };
            let taken: Vec<i32> = current
                .relations
                .iter()
                .filter(|r| r.relation_type == RelationType::HasChild)
                .map(|r| r.relation_ordinal)
                .collect();
            let ordinal = if taken.contains(&draft.ordinal) {
                next_ordinal(taken)
            } else {
                draft.ordinal
            };
            let work_relation_id = self.api.create_work_relation(&NewWorkRelation {
                relator_work_id: current.work_id.clone(),
                related_work_id: child_id.clone(),
                relation_type: RelationType::HasChild,
                relation_ordinal: ordinal,
            })?;
            self.changes += 1;
            current.relations.push(RelationRecord {
                work_relation_id,
                related_work_id: child_id,
                relation_type: RelationType::HasChild,
                relation_ordinal: ordinal,
                related_work: RelatedWorkRef {
                    doi: Some(draft.doi.clone()),
                },
            });
        }
        Ok(())
    }

    /// Attaches a chapter to the book with the given title.
    fn parent(
        &mut self,
        label: &str,
        current: &WorkRecord,
        publisher: &PublisherIds,
        draft: &ParentDraft,
    ) -> api::Result<()> {
        let book = self
            .api
            .books_by_title(&draft.title, &publisher.publisher_id)?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("parent book \"{}\"", draft.title)))?;
        let children: Vec<&RelationRecord> = book
            .relations
            .iter()
            .filter(|r| r.relation_type == RelationType::HasChild)
            .collect();
        if children.iter().any(|r| r.related_work_id == current.work_id) {
            return Ok(());
        }
        let ordinal = draft
            .ordinal
            .unwrap_or_else(|| next_ordinal(children.iter().map(|r| r.relation_ordinal)));
        self.api.create_work_relation(&NewWorkRelation {
            relator_work_id: book.work_id.clone(),
            related_work_id: current.work_id.clone(),
            relation_type: RelationType::HasChild,
            relation_ordinal: ordinal,
        })?;
        self.changes += 1;
        log::info!("{label}: chapter {ordinal} of {}", book.work.full_title);
        Ok(())
    }

    /// Numbers and creates the issues collected during the run.
    fn create_pending_issues(&mut self, report: &mut RunReport) {
        let pending = std::mem::take(&mut self.pending_issues);
        for issue in number_grouped_issues(pending) {
            match self.api.create_issue(&issue) {
                Ok(issue_id) => {
                    log::info!(
                        "issue {} of series {} for work {} ({issue_id})",
                        issue.issue_ordinal,
                        issue.series_id,
                        issue.work_id
                    );
                    report.deferred_issues_created += 1;
                }
                Err(err) => {
                    log::error!("{err} ({})", issue.work_id);
                    report.deferred_issues_failed += 1;
                }
            }
        }
    }
}
