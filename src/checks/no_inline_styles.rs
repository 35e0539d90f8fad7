use std::sync::LazyLock;

use regex::Regex;

use crate::checks::{line_of, CheckInput, CheckIssue, CheckOutcome};

static ELEMENT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[a-zA-Z][^>]*>").unwrap()
});

static STYLE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\sstyle\s*=\s*("[^"]*"|'[^']*')"#).unwrap()
});

pub fn check(input: &CheckInput) -> CheckOutcome {
    let mut issues = Vec::new();
    let mut elements = 0usize;

    for m in ELEMENT_TAG.find_iter(input.text) {
        elements += 1;
        if STYLE_ATTR.is_match(m.as_str()) {
            issues.push(CheckIssue {
                line: Some(line_of(input.text, m.start())),
                message: "element uses an inline style attribute instead of a stylesheet rule"
                    .to_string(),
            });
        }
    }

    CheckOutcome::from_issues(issues, elements)
}
