use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use page_lint::analyze;
use page_lint::config::AnalyzerConfig;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A project large enough to keep several workers busy: three pages sharing
/// a banner component, a dozen leaf widgets, and enough defects that every
/// check produces findings.
fn write_project(root: &Path) {
    let app = root.join("src/app");

    for page in ["home", "about", "contact"] {
        write(
            &app.join(format!("{page}/{page}.component.ts")),
            &format!(
                "@Component({{\n  selector: 'app-{page}',\n  templateUrl: './{page}.component.html',\n  styleUrls: ['./{page}.component.scss'],\n}})\nclass C {{}}\n"
            ),
        );
        let widgets: String = (0..4)
            .map(|i| format!("<app-{page}-w{i}></app-{page}-w{i}>\n"))
            .collect();
        write(
            &app.join(format!("{page}/{page}.component.html")),
            &format!("<app-banner></app-banner>\n{widgets}<img src=\"{page}.png\">\n"),
        );
        write(
            &app.join(format!("{page}/{page}.component.scss")),
            ".page { color: red !important; }\n",
        );

        for i in 0..4 {
            write(
                &app.join(format!("{page}/w{i}.component.ts")),
                &format!(
                    "@Component({{\n  selector: 'app-{page}-w{i}',\n  template: `<div style=\"width: {i}px\">w{i}</div>`,\n}})\nclass W {{}}\n"
                ),
            );
        }
    }

    write(
        &app.join("banner/banner.component.ts"),
        "@Component({\n  selector: 'app-banner',\n  templateUrl: './banner.component.html',\n  styleUrls: ['./banner.component.scss'],\n})\nclass B {}\n",
    );
    write(
        &app.join("banner/banner.component.html"),
        "<div>\n  <img src=\"banner.png\">\n</div>\n",
    );
    write(
        &app.join("banner/banner.component.scss"),
        ".a { .b { .c { .d { .e { color: red; } } } } }\n",
    );
}

fn result_hash(root: &Path, concurrency: usize) -> String {
    let mut config = AnalyzerConfig::from_root(root);
    config.concurrency = concurrency;

    let result = analyze(&config, &[]).unwrap();
    let json = serde_json::to_string(&result).unwrap();

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[test]
fn sequential_and_parallel_results_hash_identically() {
    let temp = tempfile::tempdir().unwrap();
    write_project(temp.path());

    let sequential = result_hash(temp.path(), 1);
    for workers in [2, 4, 8] {
        assert_eq!(
            sequential,
            result_hash(temp.path(), workers),
            "result diverged at {workers} workers"
        );
    }
}

#[test]
fn repeated_runs_are_stable() {
    let temp = tempfile::tempdir().unwrap();
    write_project(temp.path());

    assert_eq!(result_hash(temp.path(), 4), result_hash(temp.path(), 4));
}

#[test]
fn parallel_run_finds_real_issues() {
    let temp = tempfile::tempdir().unwrap();
    write_project(temp.path());

    let mut config = AnalyzerConfig::from_root(temp.path());
    config.concurrency = 4;
    let result = analyze(&config, &[]).unwrap();

    assert!(!result.is_clean());
    assert!(result.total_issues > 0);
    assert!(result.failed_checks.is_empty());
    assert_eq!(result.pages.len(), 3);
}
