pub mod checks;
pub mod config;
pub mod optimizer;
pub mod registry;
pub mod report;
pub mod reporter;
pub mod resolver;
pub mod runner;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use checks::{CheckDescriptor, FileKind};
use config::AnalyzerConfig;
use optimizer::PageRun;
use registry::Registry;
use report::AnalysisResult;
use runner::{LoadedSource, RunnerError, SourceId};

/// Run the whole pipeline with the built-in check battery: build the
/// registry, resolve each entry template's closure, run checks over every
/// closure, collapse shared-root-cause findings, and freeze the result.
///
/// With no explicit entries, graph-root templates are analyzed.
pub fn analyze(config: &AnalyzerConfig, entries: &[PathBuf]) -> Result<AnalysisResult, RunnerError> {
    let checks = runner::enabled_checks(&checks::default_checks(), config.tier);
    analyze_with_checks(config, entries, &checks)
}

/// Same pipeline with a caller-supplied check set.
pub fn analyze_with_checks(
    config: &AnalyzerConfig,
    entries: &[PathBuf],
    checks: &[CheckDescriptor],
) -> Result<AnalysisResult, RunnerError> {
    let registry = Registry::build(&config.root_dir, config);

    let entries: Vec<PathBuf> = if entries.is_empty() {
        resolver::find_entry_templates(&registry)
    } else {
        entries.to_vec()
    };

    // Every file is read at most once per run, here on the coordinating
    // thread. Workers only ever see pre-loaded text.
    let mut texts: BTreeMap<PathBuf, Option<String>> = BTreeMap::new();
    let mut load = |path: &PathBuf| -> Option<String> {
        texts
            .entry(path.clone())
            .or_insert_with(|| match fs::read_to_string(path) {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    None
                }
            })
            .clone()
    };

    let mut page_runs = Vec::with_capacity(entries.len());
    for entry in &entries {
        let page = resolver::resolve_page(entry, &registry);

        let mut sources = Vec::new();
        for path in &page.html_files {
            if let Some(text) = load(path) {
                sources.push(LoadedSource {
                    id: SourceId::Disk(path.clone()),
                    kind: FileKind::Html,
                    text,
                });
            }
        }
        for path in &page.scss_files {
            if let Some(text) = load(path) {
                sources.push(LoadedSource {
                    id: SourceId::Disk(path.clone()),
                    kind: FileKind::Scss,
                    text,
                });
            }
        }
        for inline in &page.inline_templates {
            sources.push(LoadedSource {
                id: SourceId::Inline(inline.selector.clone()),
                kind: FileKind::Html,
                text: inline.template.clone(),
            });
        }

        let result = runner::run(&sources, checks, config.concurrency)?;
        page_runs.push(PageRun {
            entry: entry.clone(),
            page,
            result,
        });
    }

    let optimized = optimizer::optimize(&page_runs, &registry);
    Ok(report::assemble(&page_runs, optimized))
}
