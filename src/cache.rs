//! Run-scoped identity maps from natural keys to remote ids.

use std::collections::HashMap;

use crate::api::{self, MetadataApi, paginate};
use crate::model::{Id, PublisherRecord};

/// Contributor, institution, series and imprint ids known to the service.
///
/// Populated once from paginated listings and grown as the run creates
/// records. Contributors are keyed by ORCID and by full name, institutions by
/// ROR and by name.
#[derive(Debug, Clone, Default)]
pub struct IdentityCache {
    contributors: HashMap<String, Id>,
    institutions: HashMap<String, Id>,
    series: HashMap<String, Id>,
    imprints: HashMap<String, Id>,
}

impl IdentityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<A: MetadataApi + ?Sized>(api: &mut A, page_size: usize) -> api::Result<Self> {
        let mut cache = Self::new();

        let contributors = paginate(page_size, |offset, limit| api.contributors(offset, limit))?;
        for record in &contributors {
            cache.insert_contributor(
                &record.contributor_id,
                record.contributor.orcid.as_deref(),
                &record.contributor.full_name,
            );
        }

        let institutions = paginate(page_size, |offset, limit| api.institutions(offset, limit))?;
        for record in &institutions {
            cache.insert_institution(
                &record.institution_id,
                record.institution.ror.as_deref(),
                &record.institution.institution_name,
            );
        }

        let series = paginate(page_size, |offset, limit| api.series(offset, limit))?;
        for record in &series {
            cache.insert_series(&record.series_id, &record.series_name);
        }

        log::debug!(
            "cached {} contributors, {} institutions, {} series",
            contributors.len(),
            institutions.len(),
            series.len()
        );
        Ok(cache)
    }

    /// Looks a contributor up by ORCID first, then by full name.
    pub fn contributor(&self, orcid: Option<&str>, full_name: &str) -> Option<&Id> {
        orcid
            .and_then(|orcid| self.contributors.get(orcid))
            .or_else(|| self.contributors.get(full_name))
    }

    pub fn insert_contributor(&mut self, id: &str, orcid: Option<&str>, full_name: &str) {
        self.contributors.insert(full_name.to_string(), id.to_string());
        if let Some(orcid) = orcid {
            self.contributors.insert(orcid.to_string(), id.to_string());
        }
    }

    /// Looks an institution up by ROR first, then by name.
    pub fn institution(&self, ror: Option<&str>, name: &str) -> Option<&Id> {
        ror.and_then(|ror| self.institutions.get(ror))
            .or_else(|| self.institutions.get(name))
    }

    pub fn insert_institution(&mut self, id: &str, ror: Option<&str>, name: &str) {
        if !name.is_empty() {
            self.institutions.insert(name.to_string(), id.to_string());
        }
        if let Some(ror) = ror {
            self.institutions.insert(ror.to_string(), id.to_string());
        }
    }

    pub fn series(&self, name: &str) -> Option<&Id> {
        self.series.get(name)
    }

    pub fn insert_series(&mut self, id: &str, name: &str) {
        self.series.insert(name.to_string(), id.to_string());
    }

    pub fn imprint(&self, name: &str) -> Option<&Id> {
        self.imprints.get(name)
    }

    pub fn insert_imprint(&mut self, id: &str, name: &str) {
        self.imprints.insert(name.to_string(), id.to_string());
    }

    /// Caches every imprint of a publisher.
    pub fn add_publisher(&mut self, publisher: &PublisherRecord) {
        for imprint in &publisher.imprints {
            self.insert_imprint(&imprint.imprint_id, &imprint.imprint_name);
        }
    }
}
