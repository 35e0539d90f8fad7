use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread::ScopedJoinHandle;

use crossbeam_channel as channel;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::checks::{CheckDescriptor, CheckInput, CheckOutcome, FileKind, Tier};

/// Identity of a checkable text: a file on disk, or an inline template known
/// only by the selector of the component that declares it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceId {
    Disk(PathBuf),
    Inline(String),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Disk(path) => write!(f, "{}", path.display()),
            SourceId::Inline(selector) => write!(f, "inline:{selector}"),
        }
    }
}

impl Serialize for SourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A text pre-loaded by the coordinator. Workers only ever see these; they
/// never read from disk themselves.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub id: SourceId,
    pub kind: FileKind,
    pub text: String,
}

/// Result of one (source, check) work item. A check that panics is captured
/// here rather than taking the run down.
#[derive(Debug, Clone)]
pub enum CheckRecord {
    Completed(CheckOutcome),
    Failed { error: String },
}

/// Fatal pool-level faults. Unlike per-check failures these abort the run:
/// a crashed worker cannot be told apart from corrupted shared state, so no
/// partial result is returned.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("worker thread crashed during check execution")]
    WorkerCrashed,
    #[error("result channel closed before all work items completed")]
    Disconnected,
}

/// Per-(source, check) records in canonical key order. Insertion is keyed,
/// never appended, so completion order cannot leak into the result.
#[derive(Debug, Default)]
pub struct RunResult {
    pub records: BTreeMap<(SourceId, String), CheckRecord>,
}

/// Drop checks above the enabled tier before dispatch.
pub fn enabled_checks(checks: &[CheckDescriptor], tier: Tier) -> Vec<CheckDescriptor> {
    checks.iter().filter(|c| c.tier <= tier).cloned().collect()
}

/// Run every applicable (source, check) pair over a pool of `concurrency`
/// workers. `concurrency == 1` executes inline on the calling thread; both
/// modes aggregate identically and must produce identical results.
pub fn run(
    sources: &[LoadedSource],
    checks: &[CheckDescriptor],
    concurrency: usize,
) -> Result<RunResult, RunnerError> {
    let items: Vec<(usize, usize)> = sources
        .iter()
        .enumerate()
        .flat_map(|(si, source)| {
            checks
                .iter()
                .enumerate()
                .filter(move |(_, check)| check.file_kind == source.kind)
                .map(move |(ci, _)| (si, ci))
        })
        .collect();

    if concurrency <= 1 {
        let mut records = BTreeMap::new();
        for (si, ci) in items {
            let (key, record) = execute(&sources[si], &checks[ci]);
            records.insert(key, record);
        }
        return Ok(RunResult { records });
    }

    run_parallel(sources, checks, &items, concurrency)
}

fn run_parallel(
    sources: &[LoadedSource],
    checks: &[CheckDescriptor],
    items: &[(usize, usize)],
    concurrency: usize,
) -> Result<RunResult, RunnerError> {
    type Keyed = ((SourceId, String), CheckRecord);

    std::thread::scope(|scope| {
        let (work_tx, work_rx) = channel::unbounded::<(usize, usize)>();
        let (result_tx, result_rx) = channel::unbounded::<Keyed>();

        let mut handles = Vec::with_capacity(concurrency);
        for _ in 0..concurrency {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            handles.push(scope.spawn(move || {
                for (si, ci) in work_rx.iter() {
                    let keyed = execute(&sources[si], &checks[ci]);
                    if result_tx.send(keyed).is_err() {
                        return;
                    }
                }
            }));
        }
        drop(work_rx);
        drop(result_tx);

        for item in items {
            if work_tx.send(*item).is_err() {
                break;
            }
        }
        drop(work_tx);

        let mut records = BTreeMap::new();
        for _ in 0..items.len() {
            match result_rx.recv() {
                Ok((key, record)) => {
                    records.insert(key, record);
                }
                Err(_) => {
                    // Every sender is gone but work is unaccounted for: at
                    // least one worker died without completing its items.
                    return Err(shutdown(handles).err().unwrap_or(RunnerError::Disconnected));
                }
            }
        }

        shutdown(handles)?;
        Ok(RunResult { records })
    })
}

/// Drain the pool: block until every worker has exited and release them.
/// A worker that panicked is a fatal fault.
fn shutdown(handles: Vec<ScopedJoinHandle<'_, ()>>) -> Result<(), RunnerError> {
    let mut crashed = false;
    for handle in handles {
        if handle.join().is_err() {
            crashed = true;
        }
    }
    if crashed {
        Err(RunnerError::WorkerCrashed)
    } else {
        Ok(())
    }
}

/// One pure work item: run a single check over a single pre-loaded text.
/// A panicking check is recorded as a failure for this pair only.
fn execute(source: &LoadedSource, check: &CheckDescriptor) -> ((SourceId, String), CheckRecord) {
    let path = match &source.id {
        SourceId::Disk(p) => Some(p.as_path()),
        SourceId::Inline(_) => None,
    };
    let input = CheckInput {
        text: &source.text,
        path,
    };

    let record = match catch_unwind(AssertUnwindSafe(|| (check.run)(&input))) {
        Ok(outcome) => CheckRecord::Completed(outcome),
        Err(_) => {
            tracing::error!(check = check.name, source = %source.id, "check panicked");
            CheckRecord::Failed {
                error: format!("check '{}' panicked", check.name),
            }
        }
    };

    ((source.id.clone(), check.name.to_string()), record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckFn, FileKind};

    fn descriptor(name: &'static str, kind: FileKind, tier: Tier, run: CheckFn) -> CheckDescriptor {
        CheckDescriptor {
            name,
            tier,
            file_kind: kind,
            weight: 1,
            rule_id: name,
            run,
        }
    }

    fn count_lines(input: &CheckInput) -> CheckOutcome {
        CheckOutcome::clean(input.text.lines().count())
    }

    fn always_panic(_input: &CheckInput) -> CheckOutcome {
        panic!("boom");
    }

    fn source(name: &str, kind: FileKind, text: &str) -> LoadedSource {
        LoadedSource {
            id: SourceId::Disk(PathBuf::from(name)),
            kind,
            text: text.to_string(),
        }
    }

    #[test]
    fn filters_checks_by_file_kind() {
        let sources = vec![source("a.html", FileKind::Html, "x"), source("b.scss", FileKind::Scss, "y")];
        let checks = vec![descriptor("html-only", FileKind::Html, Tier::Core, count_lines)];
        let result = run(&sources, &checks, 1).unwrap();
        assert_eq!(result.records.len(), 1);
        let key = result.records.keys().next().unwrap();
        assert_eq!(key.0, SourceId::Disk(PathBuf::from("a.html")));
    }

    #[test]
    fn tier_filter_drops_extended_checks() {
        let checks = vec![
            descriptor("core", FileKind::Html, Tier::Core, count_lines),
            descriptor("extended", FileKind::Html, Tier::Extended, count_lines),
        ];
        let enabled = enabled_checks(&checks, Tier::Core);
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "core");
    }

    #[test]
    fn panicking_check_is_recorded_not_fatal() {
        let sources = vec![source("a.html", FileKind::Html, "x")];
        let checks = vec![
            descriptor("bad", FileKind::Html, Tier::Core, always_panic),
            descriptor("good", FileKind::Html, Tier::Core, count_lines),
        ];
        let result = run(&sources, &checks, 2).unwrap();
        assert_eq!(result.records.len(), 2);

        let bad = &result.records[&(SourceId::Disk(PathBuf::from("a.html")), "bad".to_string())];
        assert!(matches!(bad, CheckRecord::Failed { .. }));
        let good = &result.records[&(SourceId::Disk(PathBuf::from("a.html")), "good".to_string())];
        assert!(matches!(good, CheckRecord::Completed(_)));
    }

    #[test]
    fn sequential_and_parallel_runs_agree() {
        let sources: Vec<LoadedSource> = (0..20)
            .map(|i| source(&format!("f{i}.html"), FileKind::Html, &"line\n".repeat(i)))
            .collect();
        let checks = vec![descriptor("lines", FileKind::Html, Tier::Core, count_lines)];

        let sequential = run(&sources, &checks, 1).unwrap();
        let parallel = run(&sources, &checks, 8).unwrap();

        let keys: Vec<_> = sequential.records.keys().collect();
        assert_eq!(keys, parallel.records.keys().collect::<Vec<_>>());
        for (key, record) in &sequential.records {
            let (CheckRecord::Completed(a), CheckRecord::Completed(b)) =
                (record, &parallel.records[key])
            else {
                panic!("unexpected failure record");
            };
            assert_eq!(a.elements_found, b.elements_found);
        }
    }

    #[test]
    fn empty_work_set_yields_empty_result() {
        let result = run(&[], &[], 4).unwrap();
        assert!(result.records.is_empty());
    }
}
