use std::path::PathBuf;
use std::process;

use page_lint::checks::Tier;
use page_lint::config::AnalyzerConfig;

fn usage() -> ! {
    eprintln!(
        "Usage: page-lint [--root-dir DIR] [--entry FILE]... [--jobs N] [--tier core|extended] [--json]"
    );
    process::exit(2);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut root_dir: Option<PathBuf> = None;
    let mut entries: Vec<PathBuf> = Vec::new();
    let mut jobs: Option<usize> = None;
    let mut tier: Option<Tier> = None;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--root-dir" if i + 1 < args.len() => {
                root_dir = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--entry" if i + 1 < args.len() => {
                entries.push(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--jobs" if i + 1 < args.len() => {
                match args[i + 1].parse::<usize>() {
                    Ok(n) if n >= 1 => jobs = Some(n),
                    _ => usage(),
                }
                i += 2;
            }
            "--tier" if i + 1 < args.len() => {
                tier = match args[i + 1].as_str() {
                    "core" => Some(Tier::Core),
                    "extended" => Some(Tier::Extended),
                    _ => usage(),
                };
                i += 2;
            }
            "--json" => {
                json = true;
                i += 1;
            }
            _ => usage(),
        }
    }

    let mut config = match root_dir {
        Some(dir) => AnalyzerConfig::from_root(&dir),
        None => match AnalyzerConfig::discover() {
            Some(c) => c,
            None => {
                eprintln!("Error: Could not find project root. Run from within a git repository or use --root-dir.");
                process::exit(2);
            }
        },
    };
    if let Some(n) = jobs {
        config.concurrency = n;
    }
    if let Some(t) = tier {
        config.tier = t;
    }

    let result = match page_lint::analyze(&config, &entries) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: analysis aborted: {e}");
            process::exit(2);
        }
    };

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("Error: could not serialize result: {e}");
                process::exit(2);
            }
        }
        process::exit(if result.is_clean() { 0 } else { 1 });
    }

    page_lint::reporter::print_header();
    for page in &result.pages {
        page_lint::reporter::print_page(page);
    }
    page_lint::reporter::print_issues(&result);
    let clean = page_lint::reporter::print_summary(&result);

    process::exit(if clean { 0 } else { 1 });
}
