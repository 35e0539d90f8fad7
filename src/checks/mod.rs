pub mod deep_nesting;
pub mod img_alt_text;
pub mod no_important;
pub mod no_inline_styles;

use std::path::Path;

use serde::Serialize;

/// Kind of source text a check applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Html,
    Scss,
}

/// Check tiers, ordered from the always-on core set to the stricter
/// opt-in set. A configured tier enables itself and everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Core,
    Extended,
}

/// Input handed to a check: pre-loaded text plus the originating path when the
/// text came from disk. Inline templates have no path.
pub struct CheckInput<'a> {
    pub text: &'a str,
    pub path: Option<&'a Path>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckIssue {
    pub line: Option<usize>,
    pub message: String,
}

/// What every check returns. Checks must be pure functions of their input;
/// the runner's determinism contract depends on it.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub pass: bool,
    pub issues: Vec<CheckIssue>,
    pub elements_found: usize,
}

impl CheckOutcome {
    pub fn clean(elements_found: usize) -> Self {
        Self {
            pass: true,
            issues: Vec::new(),
            elements_found,
        }
    }

    pub fn from_issues(issues: Vec<CheckIssue>, elements_found: usize) -> Self {
        Self {
            pass: issues.is_empty(),
            issues,
            elements_found,
        }
    }
}

pub type CheckFn = fn(&CheckInput) -> CheckOutcome;

/// A registered check. Opaque to the engine beyond dispatch: the runner only
/// looks at `file_kind` and `tier` when building work items.
#[derive(Clone)]
pub struct CheckDescriptor {
    pub name: &'static str,
    pub tier: Tier,
    pub file_kind: FileKind,
    pub weight: u32,
    pub rule_id: &'static str,
    pub run: CheckFn,
}

/// The built-in battery. Callers may extend or replace this list; the engine
/// treats descriptors as opaque plugins.
pub fn default_checks() -> Vec<CheckDescriptor> {
    vec![
        CheckDescriptor {
            name: "Images have alt text",
            tier: Tier::Core,
            file_kind: FileKind::Html,
            weight: 3,
            rule_id: "img-alt-text",
            run: img_alt_text::check,
        },
        CheckDescriptor {
            name: "No inline style attributes",
            tier: Tier::Extended,
            file_kind: FileKind::Html,
            weight: 1,
            rule_id: "no-inline-styles",
            run: no_inline_styles::check,
        },
        CheckDescriptor {
            name: "No !important in styles",
            tier: Tier::Core,
            file_kind: FileKind::Scss,
            weight: 2,
            rule_id: "no-important",
            run: no_important::check,
        },
        CheckDescriptor {
            name: "Selector nesting depth",
            tier: Tier::Extended,
            file_kind: FileKind::Scss,
            weight: 1,
            rule_id: "deep-nesting",
            run: deep_nesting::check,
        },
    ]
}

/// 1-based line number of a byte offset into `text`.
pub(crate) fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered() {
        assert!(Tier::Core < Tier::Extended);
    }

    #[test]
    fn line_of_is_one_based() {
        let text = "a\nb\nc";
        assert_eq!(line_of(text, 0), 1);
        assert_eq!(line_of(text, 2), 2);
        assert_eq!(line_of(text, 4), 3);
    }

    #[test]
    fn default_battery_covers_both_file_kinds() {
        let checks = default_checks();
        assert!(checks.iter().any(|c| c.file_kind == FileKind::Html));
        assert!(checks.iter().any(|c| c.file_kind == FileKind::Scss));
    }
}
