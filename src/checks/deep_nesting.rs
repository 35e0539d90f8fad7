use crate::checks::{CheckInput, CheckIssue, CheckOutcome};

const MAX_DEPTH: usize = 4;

/// Flags selector blocks nested deeper than MAX_DEPTH levels. Depth is
/// tracked by brace balance, which is close enough for SCSS written by hand;
/// interpolated braces inside strings are rare in stylesheets and accepted as
/// a known imprecision of the heuristic.
pub fn check(input: &CheckInput) -> CheckOutcome {
    let mut issues = Vec::new();
    let mut elements = 0usize;
    let mut depth = 0usize;
    let mut reported_at = 0usize;

    for (i, line) in input.text.lines().enumerate() {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    elements += 1;
                    if depth > MAX_DEPTH && depth > reported_at {
                        reported_at = depth;
                        issues.push(CheckIssue {
                            line: Some(i + 1),
                            message: format!(
                                "selector nested {} levels deep (max {})",
                                depth, MAX_DEPTH
                            ),
                        });
                    }
                }
                '}' => {
                    depth = depth.saturating_sub(1);
                    if depth < MAX_DEPTH {
                        reported_at = 0;
                    }
                }
                _ => {}
            }
        }
    }

    CheckOutcome::from_issues(issues, elements)
}
