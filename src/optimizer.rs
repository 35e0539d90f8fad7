use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::registry::Registry;
use crate::resolver::{owner_index, ResolvedPage};
use crate::runner::{CheckRecord, RunResult, SourceId};

/// What an issue is reported against: the owning component when the source
/// belongs to one, otherwise the file itself (entry templates have no owner).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueTarget {
    Selector(String),
    File(PathBuf),
}

impl fmt::Display for IssueTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueTarget::Selector(selector) => write!(f, "{selector}"),
            IssueTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Serialize for IssueTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One reported issue after root-cause collapsing. `affected_pages` carries
/// every entry template whose closure surfaced this issue; `occurrences` is
/// the pre-collapse count, so nothing is lost by the reduction.
#[derive(Debug, Clone, Serialize)]
pub struct ReportedIssue {
    pub check: String,
    pub target: IssueTarget,
    pub line: Option<usize>,
    pub message: String,
    pub affected_pages: Vec<PathBuf>,
    pub occurrences: usize,
}

/// A check that panicked on one source, collapsed across the pages that ran it.
#[derive(Debug, Clone, Serialize)]
pub struct FailedCheck {
    pub check: String,
    pub source: SourceId,
    pub error: String,
    pub affected_pages: Vec<PathBuf>,
}

/// Everything the runner produced for one resolved page.
pub struct PageRun {
    pub entry: PathBuf,
    pub page: ResolvedPage,
    pub result: RunResult,
}

#[derive(Debug, Default)]
pub struct OptimizedResults {
    pub issues: Vec<ReportedIssue>,
    pub failures: Vec<FailedCheck>,
}

/// Collapse duplicate findings that stem from one shared root cause.
///
/// The resolver fans a shared component out to every page that reaches it, so
/// the runner reports the same underlying defect once per including page.
/// Grouping by (check, target, line, message) folds those repeats into a
/// single entry annotated with the affected pages. Page-local issues fall out
/// of the same reduction with a single affected page. This is pure
/// post-processing: it changes reporting cardinality, never any outcome.
pub fn optimize(pages: &[PageRun], registry: &Registry) -> OptimizedResults {
    type IssueKey = (IssueTarget, String, Option<usize>, String);
    type FailKey = (SourceId, String);

    let mut grouped: BTreeMap<IssueKey, (BTreeSet<PathBuf>, usize)> = BTreeMap::new();
    let mut failed: BTreeMap<FailKey, (String, BTreeSet<PathBuf>)> = BTreeMap::new();

    for run in pages {
        let owners = owner_index(&run.page, registry);

        for ((source, check), record) in &run.result.records {
            let target = match source {
                SourceId::Inline(selector) => IssueTarget::Selector(selector.clone()),
                SourceId::Disk(path) => match owners.get(path) {
                    Some(selector) => IssueTarget::Selector(selector.clone()),
                    None => IssueTarget::File(path.clone()),
                },
            };

            match record {
                CheckRecord::Completed(outcome) => {
                    for issue in &outcome.issues {
                        let key = (
                            target.clone(),
                            check.clone(),
                            issue.line,
                            issue.message.clone(),
                        );
                        let entry = grouped.entry(key).or_default();
                        entry.0.insert(run.entry.clone());
                        entry.1 += 1;
                    }
                }
                CheckRecord::Failed { error } => {
                    let entry = failed
                        .entry((source.clone(), check.clone()))
                        .or_insert_with(|| (error.clone(), BTreeSet::new()));
                    entry.1.insert(run.entry.clone());
                }
            }
        }
    }

    let issues = grouped
        .into_iter()
        .map(|((target, check, line, message), (pages, occurrences))| ReportedIssue {
            check,
            target,
            line,
            message,
            affected_pages: pages.into_iter().collect(),
            occurrences,
        })
        .collect();

    let failures = failed
        .into_iter()
        .map(|((source, check), (error, pages))| FailedCheck {
            check,
            source,
            error,
            affected_pages: pages.into_iter().collect(),
        })
        .collect();

    OptimizedResults { issues, failures }
}
