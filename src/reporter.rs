use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::report::{AnalysisResult, PageSummary};

pub fn print_header() {
    println!(
        "{}",
        "\n=== Page Component Analysis ===\n".if_supports_color(Stdout, |s| s.bold())
    );
}

pub fn print_page(page: &PageSummary) {
    println!(
        "{} {}: {} component(s), {} template(s), {} stylesheet(s)",
        "\u{25b8}".if_supports_color(Stdout, |s| s.cyan()),
        page.entry.display(),
        page.components.len(),
        page.html_files.len() + page.inline_templates.len(),
        page.scss_files.len(),
    );
}

pub fn print_issues(result: &AnalysisResult) {
    for component in &result.components {
        println!(
            "\n{} {}: {}",
            "\u{2717}".if_supports_color(Stdout, |s| s.red()),
            component.target,
            format!("{} issue(s)", component.issues.len())
                .if_supports_color(Stdout, |s| s.red()),
        );
        for issue in &component.issues {
            let line = issue
                .line
                .map(|l| format!(":{l}"))
                .unwrap_or_default();
            let pages = if issue.affected_pages.len() > 1 {
                format!(" [{} pages affected]", issue.affected_pages.len())
            } else {
                String::new()
            };
            println!(
                "  {}",
                format!("[{}]{} {}{}", issue.check, line, issue.message, pages)
                    .if_supports_color(Stdout, |s| s.dimmed())
            );
        }
    }

    for failure in &result.failed_checks {
        println!(
            "\n{} {} on {}: {}",
            "\u{26a0}".if_supports_color(Stdout, |s| s.yellow()),
            failure.check,
            failure.source,
            failure.error.if_supports_color(Stdout, |s| s.yellow()),
        );
    }
}

pub fn print_summary(result: &AnalysisResult) -> bool {
    println!(
        "{}",
        "\n--- Summary ---".if_supports_color(Stdout, |s| s.bold())
    );

    if result.is_clean() {
        println!(
            "{}",
            format!(
                "\n{} file(s) scanned across {} page(s). No issues found.\n",
                result.files_scanned,
                result.pages.len(),
            )
            .if_supports_color(Stdout, |s| s.green()),
        );
        true
    } else {
        println!(
            "{}",
            format!(
                "\n{} issue(s) in {} component(s), {} file(s) scanned, {} failed check(s).\n",
                result.total_issues,
                result.components_with_issues,
                result.files_scanned,
                result.failed_checks.len(),
            )
            .if_supports_color(Stdout, |s| s.red()),
        );
        false
    }
}
