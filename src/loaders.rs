//! Per-publisher mappers.
//!
//! Each submodule knows one publisher's export layout and turns its records
//! into [`WorkDraft`](crate::draft::WorkDraft)s. [`LoaderKind`] names them for
//! the command line and [`run`] dispatches to the right one.

use std::path::Path;
use std::sync::LazyLock;

use clap::ValueEnum;

use crate::api::MetadataApi;
use crate::draft::{ContributorDraft, PersonName};
use crate::error::{LoadError, ValueError};
use crate::identifiers;
use crate::model::ContributionType;
use crate::pipeline::Pipeline;
use crate::regex::Regex;
use crate::report::RunReport;
use crate::resolver::DoiResolver;

pub mod am;
pub mod leuven;
pub mod lharmattan;
pub mod obp;
pub mod obp_chapter_abstracts;
pub mod obp_chapters;
pub mod punctum;
pub mod scielo;
pub mod ubiquity;
pub mod uwp;
pub mod whp;

/// An ORCID written in brackets after a name, with or without its URL prefix.
static BRACKETED_ORCID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\((?:https?://orcid\.org/)?(\d{4}-\d{4}-\d{4}-\d{3}[\dX])\)").unwrap()
});

/// The publisher export a run reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoaderKind {
    /// Open Book Publishers book CSV
    Obp,
    /// Open Book Publishers chapter CSV
    ObpChapters,
    /// Abstracts for Open Book Publishers chapters already loaded
    ObpChapterAbstracts,
    /// punctum books CSV
    Punctum,
    /// African Minds CSV
    Am,
    /// Ubiquity presses CSV (LSE Press, University of Westminster Press)
    Ubiquity,
    /// L'Harmattan Open Access CSV
    Lharmattan,
    /// SciELO Books JSON
    Scielo,
    /// EDITUS books in SciELO JSON
    Editus,
    /// EDUEPB books in SciELO JSON
    Eduepb,
    /// EDUFBA books in SciELO JSON
    Edufba,
    /// Editorial Universidad del Rosario books in SciELO JSON
    Rosario,
    /// The White Horse Press CSV
    Whp,
    /// University of Westminster Press MARCXML
    Uwp,
    /// Leuven University Press ONIX 3.0
    Leuven,
}

/// Reads `path` with the mapper for `kind` and loads it through `pipeline`.
pub fn run<A: MetadataApi, R: DoiResolver>(
    kind: LoaderKind,
    pipeline: &mut Pipeline<A, R>,
    path: &Path,
) -> Result<RunReport, LoadError> {
    match kind {
        LoaderKind::Obp => pipeline.run(&obp::ObpMapper::new(), path),
        LoaderKind::ObpChapters => pipeline.run(&obp_chapters::ObpChapterMapper::new(), path),
        LoaderKind::ObpChapterAbstracts => {
            let drafts = obp_chapter_abstracts::read(path)?;
            log::info!("read {} abstracts from {}", drafts.len(), path.display());
            Ok(pipeline.run_abstracts(&drafts))
        }
        LoaderKind::Punctum => pipeline.run(&punctum::PunctumMapper::new(), path),
        LoaderKind::Am => pipeline.run(&am::AfricanMindsMapper::new(), path),
        LoaderKind::Ubiquity => pipeline.run(&ubiquity::UbiquityMapper::new(), path),
        LoaderKind::Lharmattan => pipeline.run(&lharmattan::LHarmattanMapper::new(), path),
        LoaderKind::Scielo => pipeline.run(&scielo::ScieloMapper::scielo(), path),
        LoaderKind::Editus => pipeline.run(&scielo::ScieloMapper::editus(), path),
        LoaderKind::Eduepb => pipeline.run(&scielo::ScieloMapper::eduepb(), path),
        LoaderKind::Edufba => pipeline.run(&scielo::ScieloMapper::edufba(), path),
        LoaderKind::Rosario => pipeline.run(&scielo::ScieloMapper::rosario(), path),
        LoaderKind::Whp => pipeline.run(&whp::WhpMapper::new(), path),
        LoaderKind::Uwp => pipeline.run(&uwp::UwpMapper::new(), path),
        LoaderKind::Leuven => pipeline.run(&leuven::LeuvenMapper::new(), path),
    }
}

/// Hyphenates an optional ISBN cell.
pub(crate) fn isbn_cell(raw: Option<&str>) -> Result<Option<String>, ValueError> {
    Ok(raw.map(identifiers::isbn).transpose()?.flatten())
}

/// Parses one `"Surname, Given (ORCID)"` entry.
///
/// An iD in brackets is taken as written; elsewhere in the entry only the
/// assigned ORCID ranges are recognised.
///
/// A single part is kept whole, and three parts are taken to be an
/// organization written in reverse, e.g. `"Dept, Faculty, University"`.
pub(crate) fn inverted_entry(entry: &str) -> (PersonName, Option<String>) {
    let orcid = BRACKETED_ORCID
        .captures(entry)
        .and_then(|c| c.get(1))
        .map(|id| id.as_str().to_string())
        .or_else(|| identifiers::find_orcid(entry))
        .and_then(|id| identifiers::orcid(&id));
    let entry = BRACKETED_ORCID.replace_all(entry, "");
    let parts: Vec<&str> = entry.split(',').map(str::trim).collect();
    let name = match parts.as_slice() {
        [surname, given] => PersonName::from_parts(Some(*given), surname, None),
        [a, b, c] => PersonName::opaque(&format!("{c}, {b}, {a}")),
        _ => PersonName::opaque(&entry),
    };
    (name, orcid)
}

/// Contributors from a `;` separated list of inverted names.
pub(crate) fn inverted_contributors(
    cell: Option<&str>,
    contribution_type: ContributionType,
) -> Vec<ContributorDraft> {
    let Some(cell) = cell else {
        return Vec::new();
    };
    cell.split(';')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|entry| {
            let (name, orcid) = inverted_entry(entry);
            ContributorDraft::new(name, contribution_type).with_orcid(orcid)
        })
        .collect()
}

/// Numbers contributions 1..n in list order.
pub(crate) fn number_contributors(contributors: &mut [ContributorDraft]) {
    for (i, contributor) in contributors.iter_mut().enumerate() {
        contributor.ordinal = Some(i as i32 + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("Doe, Jane (0000-0002-1825-0097)", Some("Jane"), "Jane Doe", true)]
    #[case("Doe, Jane (https://orcid.org/0000-0002-1825-0097)", Some("Jane"), "Jane Doe", true)]
    #[case("Doe, Jane", Some("Jane"), "Jane Doe", false)]
    #[case("Plato", None, "Plato", false)]
    #[case("Centre, Faculty, University", None, "University, Faculty, Centre", false)]
    fn test_inverted_entry(
        #[case] raw: &str,
        #[case] first: Option<&str>,
        #[case] full: &str,
        #[case] has_orcid: bool,
    ) {
        let (name, orcid) = inverted_entry(raw);
        assert_eq!(name.first_name.as_deref(), first);
        assert_eq!(name.full_name, full);
        assert_eq!(
            orcid,
            has_orcid.then(|| "https://orcid.org/0000-0002-1825-0097".to_string())
        );
    }

    #[test]
    fn test_bracketed_orcid_outside_assigned_ranges() {
        let (name, orcid) = inverted_entry("Doe, Jane (0000-0001-2345-6789)");
        assert_eq!(name.full_name, "Jane Doe");
        assert_eq!(orcid.as_deref(), Some("https://orcid.org/0000-0001-2345-6789"));
        assert_eq!(inverted_entry("Doe, Jane 0000-0001-2345-6789").1, None);
    }

    #[test]
    fn test_inverted_contributors() {
        let mut list = inverted_contributors(
            Some("Doe, Jane; ; Roe, Richard"),
            ContributionType::Editor,
        );
        number_contributors(&mut list);
        let names: Vec<(&str, Option<i32>)> = list
            .iter()
            .map(|c| (c.contributor.full_name.as_str(), c.ordinal))
            .collect();
        assert_eq!(names, vec![("Jane Doe", Some(1)), ("Richard Roe", Some(2))]);
        assert!(inverted_contributors(None, ContributionType::Author).is_empty());
    }

    #[rstest]
    #[case("obp-chapter-abstracts", LoaderKind::ObpChapterAbstracts)]
    #[case("whp", LoaderKind::Whp)]
    #[case("eduepb", LoaderKind::Eduepb)]
    #[case("edufba", LoaderKind::Edufba)]
    #[case("rosario", LoaderKind::Rosario)]
    fn test_mode_names(#[case] name: &str, #[case] expected: LoaderKind) {
        assert_eq!(LoaderKind::from_str(name, false), Ok(expected));
    }

    #[test]
    fn test_isbn_cell() {
        assert_eq!(
            isbn_cell(Some("9781234567897")).unwrap().as_deref(),
            Some("978-1-234-56789-7")
        );
        assert_eq!(isbn_cell(None).unwrap(), None);
        assert!(isbn_cell(Some("9781234567890")).is_err());
    }
}
