//! Open Book Publishers chapter abstracts.
//!
//! A two column sheet, `DOI` and `Content`, that adds abstracts to chapters
//! already loaded. Nothing else about the chapter is touched.

use std::path::Path;

use crate::Result;
use crate::csv::{CsvReader, CsvRow};
use crate::draft::AbstractDraft;
use crate::identifiers;
use crate::model::WorkType;

/// Abstracts longer than this many lines were pasted with stray breaks.
const MAX_LINES: usize = 6;

/// Reads the sheet; rows without a DOI or an abstract are dropped.
pub fn read(path: &Path) -> Result<Vec<AbstractDraft>> {
    let rows = CsvReader::new().read_path(path)?;
    Ok(rows.iter().filter_map(abstract_draft).collect())
}

fn abstract_draft(row: &CsvRow) -> Option<AbstractDraft> {
    let (Some(raw_doi), Some(content)) = (row.get("DOI"), row.get("Content")) else {
        log::debug!("line {}: no DOI or abstract, skipped", row.line());
        return None;
    };
    let doi = identifiers::doi(raw_doi).filter(|d| d.starts_with("https://doi.org/10."));
    let Some(doi) = doi else {
        log::warn!("line {}: not a DOI: {raw_doi}", row.line());
        return None;
    };
    Some(AbstractDraft {
        label: raw_doi.to_string(),
        doi,
        work_type: Some(WorkType::BookChapter),
        long_abstract: tidy(content),
    })
}

fn tidy(content: &str) -> String {
    let content = content.trim();
    if content.lines().count() > MAX_LINES {
        content.lines().collect::<Vec<_>>().join(" ").replace("  ", " ")
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MetadataApi;
    use crate::api::memory::MemoryApi;
    use crate::model::{Work, WorkStatus};
    use crate::normalize::Title;
    use crate::pipeline::{Pipeline, PipelineOptions};
    use crate::report::RecordSuccess;
    use crate::resolver::NoResolver;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn drafts(csv: &str) -> Vec<AbstractDraft> {
        CsvReader::new()
            .parse(csv)
            .unwrap()
            .iter()
            .filter_map(abstract_draft)
            .collect()
    }

    fn existing(work_type: WorkType, doi: &str, long_abstract: Option<&str>) -> Work {
        let mut work = Work::new(work_type, WorkStatus::Active, Title::split("Chapter"), "imprint");
        work.doi = Some(doi.to_string());
        work.long_abstract = long_abstract.map(String::from);
        work
    }

    #[test]
    fn test_rows_need_doi_and_content() {
        let drafts = drafts(
            "\
DOI,Content
10.11647/obp.0001.01,An abstract.
10.11647/obp.0001.02,
,Orphan abstract.
not a doi,Another.
",
        );
        assert_eq!(
            drafts,
            vec![AbstractDraft {
                label: "10.11647/obp.0001.01".into(),
                doi: "https://doi.org/10.11647/obp.0001.01".into(),
                work_type: Some(WorkType::BookChapter),
                long_abstract: "An abstract.".into(),
            }]
        );
    }

    #[rstest]
    #[case("  One line.  ", "One line.")]
    #[case("First.\nSecond.", "First.\nSecond.")]
    #[case("a\nb\nc\nd\ne\nf\ng ", "a b c d e f g")]
    #[case("a \nb\nc\nd\ne\nf\ng", "a b c d e f g")]
    fn test_tidy(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(tidy(raw), expected);
    }

    #[test]
    fn test_only_empty_chapter_abstracts_are_filled() {
        let mut api = MemoryApi::new();
        let chapter = "https://doi.org/10.11647/obp.0001.01";
        let done = "https://doi.org/10.11647/obp.0001.02";
        let book = "https://doi.org/10.11647/obp.0001";
        api.create_work(&existing(WorkType::BookChapter, chapter, None)).unwrap();
        api.create_work(&existing(WorkType::BookChapter, done, Some("Kept."))).unwrap();
        api.create_work(&existing(WorkType::Monograph, book, None)).unwrap();
        api.clear_calls();

        let input = drafts(
            "\
DOI,Content
10.11647/obp.0001.01,New abstract.
10.11647/OBP.0001.02,Replacement.
10.11647/obp.0001,Book abstract.
10.11647/obp.9999.01,Missing chapter.
",
        );
        let mut pipeline =
            Pipeline::new(api, NoResolver, PipelineOptions::default()).unwrap();
        let report = pipeline.run_abstracts(&input);
        assert!(report.is_success(), "{report}");
        assert_eq!(report.updated(), 1);
        assert_eq!(report.unchanged(), 1);
        assert_eq!(report.skipped(), 2);
        assert!(matches!(
            report.outcomes[0].result,
            Ok(RecordSuccess::Updated(_))
        ));

        let api = pipeline.into_api();
        assert_eq!(api.calls_to("update_work").len(), 1);
        assert!(api.calls_to("create_work").is_empty());
        let abstracts: Vec<Option<&str>> = api
            .works()
            .iter()
            .map(|w| w.work.long_abstract.as_deref())
            .collect();
        assert_eq!(abstracts, vec![Some("New abstract."), Some("Kept."), None]);
    }
}
