use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;

use crate::optimizer::{FailedCheck, IssueTarget, OptimizedResults, PageRun, ReportedIssue};

/// The resolved closure of one entry template, flattened for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub entry: PathBuf,
    pub components: Vec<String>,
    pub html_files: Vec<PathBuf>,
    pub scss_files: Vec<PathBuf>,
    pub inline_templates: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentReport {
    pub target: IssueTarget,
    pub issues: Vec<ReportedIssue>,
}

/// The final result object. This is the sole contract external formatters
/// and the CLI rely on; it is identical whether the run was sequential or
/// parallel, and it carries no timestamps.
#[derive(Debug, Serialize)]
pub struct AnalysisResult {
    pub files_scanned: usize,
    pub components_with_issues: usize,
    pub total_issues: usize,
    pub pages: Vec<PageSummary>,
    pub components: Vec<ComponentReport>,
    pub failed_checks: Vec<FailedCheck>,
}

impl AnalysisResult {
    pub fn is_clean(&self) -> bool {
        self.total_issues == 0 && self.failed_checks.is_empty()
    }
}

/// Freeze optimizer output and page closures into the final result object.
/// Component reports are keyed and emitted in component-name order, which is
/// the canonical order every formatter sees.
pub fn assemble(pages: &[PageRun], optimized: OptimizedResults) -> AnalysisResult {
    let mut scanned: BTreeSet<&PathBuf> = BTreeSet::new();
    let mut page_summaries = Vec::with_capacity(pages.len());

    for run in pages {
        scanned.extend(run.page.html_files.iter());
        scanned.extend(run.page.scss_files.iter());

        page_summaries.push(PageSummary {
            entry: run.entry.clone(),
            components: run.page.components.iter().cloned().collect(),
            html_files: run.page.html_files.iter().cloned().collect(),
            scss_files: run.page.scss_files.iter().cloned().collect(),
            inline_templates: run
                .page
                .inline_templates
                .iter()
                .map(|t| t.selector.clone())
                .collect(),
        });
    }
    page_summaries.sort_by(|a, b| a.entry.cmp(&b.entry));

    let total_issues = optimized.issues.len();
    let components_with_issues = optimized
        .issues
        .iter()
        .filter(|i| matches!(i.target, IssueTarget::Selector(_)))
        .map(|i| &i.target)
        .collect::<BTreeSet<_>>()
        .len();

    let mut by_target: BTreeMap<IssueTarget, Vec<ReportedIssue>> = BTreeMap::new();
    for issue in optimized.issues {
        by_target.entry(issue.target.clone()).or_default().push(issue);
    }
    let components = by_target
        .into_iter()
        .map(|(target, issues)| ComponentReport { target, issues })
        .collect();

    AnalysisResult {
        files_scanned: scanned.len(),
        components_with_issues,
        total_issues,
        pages: page_summaries,
        components,
        failed_checks: optimized.failures,
    }
}
