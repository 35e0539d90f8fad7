use std::sync::LazyLock;

use regex::Regex;

use crate::checks::{line_of, CheckInput, CheckIssue, CheckOutcome};

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<img\b[^>]*>").unwrap()
});

static ALT_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\s\[]alt\]?\s*=\s*("[^"]*"|'[^']*')"#).unwrap()
});

pub fn check(input: &CheckInput) -> CheckOutcome {
    let mut issues = Vec::new();
    let mut elements = 0usize;

    for m in IMG_TAG.find_iter(input.text) {
        elements += 1;
        if !ALT_ATTR.is_match(m.as_str()) {
            issues.push(CheckIssue {
                line: Some(line_of(input.text, m.start())),
                message: "<img> element has no alt attribute".to_string(),
            });
        }
    }

    CheckOutcome::from_issues(issues, elements)
}
