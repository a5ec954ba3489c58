//! Diff-and-merge helpers that decide what the pipeline sends.
//!
//! Everything here is pure: the functions compare incoming data with what the
//! service already holds and return the payloads or plans to apply, so that a
//! rerun over unchanged input sends nothing.

use itertools::Itertools;

use crate::model::{
    Contributor, ContributorPatch, Id, Location, LocationPlatform, LocationRecord, NewIssue, Work,
};

/// Combines a remote contributor with incoming data, preferring non-null
/// incoming values.
///
/// Returns `None` when the result equals the remote record, i.e. no update is
/// needed.
#[must_use]
pub fn merge_contributor(remote: &Contributor, incoming: &ContributorPatch) -> Option<Contributor> {
    let merged = Contributor {
        first_name: incoming.first_name.clone().or_else(|| remote.first_name.clone()),
        last_name: incoming
            .last_name
            .clone()
            .unwrap_or_else(|| remote.last_name.clone()),
        full_name: incoming
            .full_name
            .clone()
            .unwrap_or_else(|| remote.full_name.clone()),
        orcid: incoming.orcid.clone().or_else(|| remote.orcid.clone()),
        website: incoming.website.clone().or_else(|| remote.website.clone()),
    };
    (merged != *remote).then_some(merged)
}

fn prefer<T: Clone>(incoming: &Option<T>, existing: &Option<T>) -> Option<T> {
    incoming.as_ref().or(existing.as_ref()).cloned()
}

/// Combines an existing work with an incoming one.
///
/// Required fields and the title come from the incoming work; optional fields
/// keep the existing value unless the incoming one is set. Returns `None`
/// when nothing changes.
#[must_use]
pub fn merge_work(existing: &Work, incoming: &Work) -> Option<Work> {
    let merged = Work {
        work_type: incoming.work_type,
        work_status: incoming.work_status,
        full_title: incoming.full_title.clone(),
        title: incoming.title.clone(),
        subtitle: incoming.subtitle.clone(),
        imprint_id: incoming.imprint_id.clone(),
        reference: prefer(&incoming.reference, &existing.reference),
        edition: prefer(&incoming.edition, &existing.edition),
        doi: prefer(&incoming.doi, &existing.doi),
        publication_date: prefer(&incoming.publication_date, &existing.publication_date),
        place: prefer(&incoming.place, &existing.place),
        page_count: prefer(&incoming.page_count, &existing.page_count),
        page_breakdown: prefer(&incoming.page_breakdown, &existing.page_breakdown),
        first_page: prefer(&incoming.first_page, &existing.first_page),
        last_page: prefer(&incoming.last_page, &existing.last_page),
        page_interval: prefer(&incoming.page_interval, &existing.page_interval),
        image_count: prefer(&incoming.image_count, &existing.image_count),
        table_count: prefer(&incoming.table_count, &existing.table_count),
        audio_count: prefer(&incoming.audio_count, &existing.audio_count),
        video_count: prefer(&incoming.video_count, &existing.video_count),
        license: prefer(&incoming.license, &existing.license),
        copyright_holder: prefer(&incoming.copyright_holder, &existing.copyright_holder),
        landing_page: prefer(&incoming.landing_page, &existing.landing_page),
        lccn: prefer(&incoming.lccn, &existing.lccn),
        oclc: prefer(&incoming.oclc, &existing.oclc),
        short_abstract: prefer(&incoming.short_abstract, &existing.short_abstract),
        long_abstract: prefer(&incoming.long_abstract, &existing.long_abstract),
        general_note: prefer(&incoming.general_note, &existing.general_note),
        bibliography_note: prefer(&incoming.bibliography_note, &existing.bibliography_note),
        toc: prefer(&incoming.toc, &existing.toc),
        cover_url: prefer(&incoming.cover_url, &existing.cover_url),
        cover_caption: prefer(&incoming.cover_caption, &existing.cover_caption),
    };
    (merged != *existing).then_some(merged)
}

/// Location changes for one publication, applied deletes first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationPlan {
    pub delete: Vec<Id>,
    /// Canonical location first, then the rest in order.
    pub create: Vec<Location>,
}

impl LocationPlan {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.create.is_empty()
    }
}

fn already_present(existing: &[LocationRecord], location: &Location) -> bool {
    existing.iter().any(|e| {
        let e = &e.location;
        if location.location_platform == LocationPlatform::Other {
            e.location_platform == LocationPlatform::Other
                && e.landing_page == location.landing_page
                && e.full_text_url == location.full_text_url
        } else {
            e.location_platform == location.location_platform
        }
    })
}

/// Plans the location changes that keep exactly one canonical location on a
/// publication.
///
/// A new canonical location replaces the current set: existing locations are
/// deleted and queued again as non-canonical after it.
#[must_use]
pub fn plan_locations(existing: &[LocationRecord], incoming: &[Location]) -> LocationPlan {
    let mut canonical: Option<Location> = None;
    let mut others = Vec::new();
    for location in incoming.iter().filter(|l| !already_present(existing, l)) {
        if location.canonical && canonical.is_none() {
            canonical = Some(location.clone());
        } else {
            others.push(Location {
                canonical: false,
                ..location.clone()
            });
        }
    }

    let mut plan = LocationPlan::default();
    match canonical {
        Some(canonical) => {
            plan.create.push(canonical);
            for record in existing {
                plan.delete.push(record.location_id.clone());
                plan.create.push(Location {
                    canonical: false,
                    ..record.location.clone()
                });
            }
        }
        None if existing.is_empty() && !others.is_empty() => {
            others[0].canonical = true;
        }
        None => {}
    }
    plan.create.extend(others);
    plan
}

/// One past the highest ordinal, or 1.
#[must_use]
pub fn next_ordinal<I: IntoIterator<Item = i32>>(existing: I) -> i32 {
    existing.into_iter().max().map_or(1, |max| max + 1)
}

/// Ordinal for a new issue in a series.
///
/// The requested ordinal wins unless another issue already has it.
#[must_use]
pub fn issue_ordinal(requested: Option<i32>, existing: &[i32]) -> i32 {
    match requested {
        Some(ordinal) if !existing.contains(&ordinal) => ordinal,
        _ => existing
            .iter()
            .max()
            .map_or(existing.len() as i32 + 1, |max| max + 1),
    }
}

/// An issue whose ordinal is decided once the whole run is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingIssue {
    pub series_id: Id,
    pub work_id: Id,
    pub ordinal: Option<i32>,
}

/// Numbers pending issues densely per series.
///
/// Within a series, issues without an ordinal come first, then the rest by
/// ordinal; input order breaks ties.
#[must_use]
pub fn number_grouped_issues(pending: Vec<PendingIssue>) -> Vec<NewIssue> {
    pending
        .into_iter()
        .sorted_by(|a, b| {
            a.series_id
                .cmp(&b.series_id)
                .then_with(|| a.ordinal.cmp(&b.ordinal))
        })
        .chunk_by(|issue| issue.series_id.clone())
        .into_iter()
        .flat_map(|(_, group)| {
            group
                .enumerate()
                .map(|(index, issue)| NewIssue {
                    series_id: issue.series_id,
                    work_id: issue.work_id,
                    issue_ordinal: index as i32 + 1,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
