use std::sync::LazyLock;

use regex::Regex;

use crate::checks::{CheckInput, CheckIssue, CheckOutcome};

static IMPORTANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\s*important\b").unwrap()
});

static COMMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*//").unwrap()
});

static RULE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[^/@\s][^:{}]*:").unwrap()
});

pub fn check(input: &CheckInput) -> CheckOutcome {
    let mut issues = Vec::new();
    let mut elements = 0usize;

    for (i, line) in input.text.lines().enumerate() {
        if COMMENT_LINE.is_match(line) {
            continue;
        }
        if RULE_LINE.is_match(line) {
            elements += 1;
        }
        if IMPORTANT.is_match(line) {
            issues.push(CheckIssue {
                line: Some(i + 1),
                message: "declaration uses !important".to_string(),
            });
        }
    }

    CheckOutcome::from_issues(issues, elements)
}
