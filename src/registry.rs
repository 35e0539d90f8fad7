use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{self, AnalyzerConfig};

/// Metadata extracted from one component declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    pub selector: String,
    pub file_path: PathBuf,
    pub component_dir: PathBuf,
    /// External template file, resolved relative to the component's directory.
    pub template_url: Option<PathBuf>,
    /// Inline template text, for components declared without a template file.
    pub template: Option<String>,
    pub style_urls: Vec<PathBuf>,
}

/// Selector -> ComponentInfo, built once per analysis run and read-only
/// afterwards. Selectors are assumed unique by project convention; the last
/// successfully parsed declaration for a selector wins.
#[derive(Debug, Default)]
pub struct Registry {
    components: BTreeMap<String, ComponentInfo>,
}

impl Registry {
    /// Scan the source tree under `root` and extract every component
    /// declaration found. Never fails: unreadable files and malformed
    /// declarations are skipped with a warning, and a totally inaccessible
    /// root yields an empty registry.
    pub fn build(root: &Path, _config: &AnalyzerConfig) -> Registry {
        let skip = config::skip_dirs(&[]);
        let mut files = collect_component_sources(root, &skip);
        files.sort();

        let mut components = BTreeMap::new();
        for file in &files {
            let text = match fs::read_to_string(file) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "skipping unreadable source file");
                    continue;
                }
            };
            for info in extract_components(&text, file) {
                components.insert(info.selector.clone(), info);
            }
        }

        Registry { components }
    }

    pub fn get(&self, selector: &str) -> Option<&ComponentInfo> {
        self.components.get(selector)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ComponentInfo)> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[cfg(test)]
    pub fn insert(&mut self, info: ComponentInfo) {
        self.components.insert(info.selector.clone(), info);
    }
}

/// Collect .ts files that can hold component declarations, skipping test
/// specs and declaration files.
fn collect_component_sources(dir: &Path, skip_dirs: &HashSet<&str>) -> Vec<PathBuf> {
    let mut results = Vec::new();
    collect_inner(dir, skip_dirs, &mut results);
    results
}

fn collect_inner(dir: &Path, skip_dirs: &HashSet<&str>, results: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if path.is_dir() {
                if !skip_dirs.contains(name) && !name.starts_with('.') {
                    collect_inner(&path, skip_dirs, results);
                }
            } else if path.is_file()
                && name.ends_with(".ts")
                && !name.ends_with(".spec.ts")
                && !name.ends_with(".test.ts")
                && !name.ends_with(".d.ts")
            {
                results.push(path);
            }
        }
    }
}

static SELECTOR_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bselector\s*:\s*['"]([^'"]+)['"]"#).unwrap()
});

static TEMPLATE_URL_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\btemplateUrl\s*:\s*['"]([^'"]+)['"]"#).unwrap()
});

static STYLE_URLS_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bstyleUrls\s*:\s*\[([^\]]*)\]").unwrap()
});

static STYLE_URL_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bstyleUrl\s*:\s*['"]([^'"]+)['"]"#).unwrap()
});

static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]([^'"]+)['"]"#).unwrap()
});

static DECORATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@Component\s*\(").unwrap()
});

static INLINE_TEMPLATE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\btemplate\s*:\s*(`|'|")"#).unwrap()
});

/// Extract every component declaration from one source file. This is a
/// best-effort textual pass, not an AST parse: declarations the scanner
/// cannot make sense of are skipped.
fn extract_components(text: &str, file: &Path) -> Vec<ComponentInfo> {
    let component_dir = file.parent().unwrap_or(Path::new(".")).to_path_buf();
    let mut results = Vec::new();

    for m in DECORATOR.find_iter(text) {
        // The match ends on the opening paren of @Component(...)
        let open = m.end() - 1;
        let block = match balanced_block(text, open, b'(', b')') {
            Some(b) => b,
            None => {
                tracing::warn!(path = %file.display(), "unterminated @Component declaration, skipping");
                continue;
            }
        };

        let selector = match SELECTOR_FIELD.captures(block).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().trim().to_string(),
            None => {
                tracing::warn!(path = %file.display(), "component declaration without a selector, skipping");
                continue;
            }
        };

        let template_url = TEMPLATE_URL_FIELD
            .captures(block)
            .and_then(|c| c.get(1))
            .map(|m| resolve_relative(&component_dir, m.as_str()));

        // An external template wins over an inline one when both appear.
        let template = if template_url.is_none() {
            inline_template(block)
        } else {
            None
        };

        let mut style_urls = Vec::new();
        if let Some(list) = STYLE_URLS_FIELD.captures(block).and_then(|c| c.get(1)) {
            for q in QUOTED.captures_iter(list.as_str()) {
                if let Some(url) = q.get(1) {
                    style_urls.push(resolve_relative(&component_dir, url.as_str()));
                }
            }
        } else if let Some(url) = STYLE_URL_FIELD.captures(block).and_then(|c| c.get(1)) {
            style_urls.push(resolve_relative(&component_dir, url.as_str()));
        }

        results.push(ComponentInfo {
            selector,
            file_path: file.to_path_buf(),
            component_dir: component_dir.clone(),
            template_url,
            template,
            style_urls,
        });
    }

    results
}

/// Extract the inline `template:` field, honoring its delimiter kind.
/// Backtick literals may span lines; quoted ones may not contain their quote.
fn inline_template(block: &str) -> Option<String> {
    let caps = INLINE_TEMPLATE_FIELD.captures(block)?;
    let delim = caps.get(1)?;
    let delim_ch = delim.as_str().as_bytes()[0];
    let start = delim.end();

    let bytes = block.as_bytes();
    let mut escaped = false;
    for i in start..bytes.len() {
        let b = bytes[i];
        if escaped {
            escaped = false;
            continue;
        }
        if b == b'\\' {
            escaped = true;
            continue;
        }
        if b == delim_ch {
            return Some(block[start..i].to_string());
        }
    }
    None
}

/// Return the text between the delimiter at `open` and its balanced partner,
/// skipping delimiters inside string literals and comments.
fn balanced_block(text: &str, open: usize, open_ch: u8, close_ch: u8) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&open_ch) {
        return None;
    }

    let mut depth = 0i32;
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut in_template = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;
    let mut escaped = false;

    let mut i = open;
    while i < bytes.len() {
        let ch = bytes[i] as char;

        if escaped {
            escaped = false;
            i += 1;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            i += 1;
            continue;
        }

        if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
            }
            i += 1;
            continue;
        }
        if in_block_comment {
            if ch == '*' && bytes.get(i + 1) == Some(&b'/') {
                in_block_comment = false;
                i += 1;
            }
            i += 1;
            continue;
        }

        if ch == '\'' && !in_double_quote && !in_template {
            in_single_quote = !in_single_quote;
            i += 1;
            continue;
        }
        if ch == '"' && !in_single_quote && !in_template {
            in_double_quote = !in_double_quote;
            i += 1;
            continue;
        }
        if ch == '`' && !in_single_quote && !in_double_quote {
            in_template = !in_template;
            i += 1;
            continue;
        }
        if in_single_quote || in_double_quote || in_template {
            i += 1;
            continue;
        }

        if ch == '/' && bytes.get(i + 1) == Some(&b'/') {
            in_line_comment = true;
            i += 2;
            continue;
        }
        if ch == '/' && bytes.get(i + 1) == Some(&b'*') {
            in_block_comment = true;
            i += 2;
            continue;
        }

        if bytes[i] == open_ch {
            depth += 1;
        } else if bytes[i] == close_ch {
            depth -= 1;
            if depth == 0 {
                return Some(&text[open + 1..i]);
            }
        }

        i += 1;
    }

    None
}

/// Join a directory-relative reference and clean out `.`/`..` components.
fn resolve_relative(dir: &Path, reference: &str) -> PathBuf {
    normalize_path(&dir.join(reference))
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                components.pop();
            }
            std::path::Component::CurDir => {}
            _ => {
                components.push(component);
            }
        }
    }
    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_one(text: &str) -> ComponentInfo {
        let mut infos = extract_components(text, Path::new("/app/src/widget/widget.component.ts"));
        assert_eq!(infos.len(), 1);
        infos.remove(0)
    }

    #[test]
    fn extracts_selector_template_and_styles() {
        let info = extract_one(
            r#"
@Component({
  selector: 'app-widget',
  templateUrl: './widget.component.html',
  styleUrls: ['./widget.component.scss', '../shared/base.scss'],
})
export class WidgetComponent {}
"#,
        );
        assert_eq!(info.selector, "app-widget");
        assert_eq!(
            info.template_url.as_deref(),
            Some(Path::new("/app/src/widget/widget.component.html"))
        );
        assert_eq!(
            info.style_urls,
            vec![
                PathBuf::from("/app/src/widget/widget.component.scss"),
                PathBuf::from("/app/src/shared/base.scss"),
            ]
        );
        assert!(info.template.is_none());
    }

    #[test]
    fn extracts_inline_backtick_template() {
        let info = extract_one(
            "@Component({\n  selector: 'app-footer',\n  template: `<footer>\n<app-nav></app-nav>\n</footer>`,\n})\nclass F {}",
        );
        assert_eq!(info.selector, "app-footer");
        assert!(info.template_url.is_none());
        assert!(info.template.as_deref().unwrap().contains("<app-nav>"));
    }

    #[test]
    fn supports_singular_style_url() {
        let info = extract_one(
            "@Component({ selector: 'app-x', styleUrl: './x.scss' })\nclass X {}",
        );
        assert_eq!(info.style_urls, vec![PathBuf::from("/app/src/widget/x.scss")]);
    }

    #[test]
    fn skips_declaration_without_selector() {
        let infos = extract_components(
            "@Component({ templateUrl: './a.html' })\nclass A {}",
            Path::new("/app/a.ts"),
        );
        assert!(infos.is_empty());
    }

    #[test]
    fn handles_parens_inside_strings_and_comments() {
        let info = extract_one(
            "@Component({\n  // decorator ) with a stray paren\n  selector: 'app-y',\n  template: '<b>(ok)</b>',\n})\nclass Y {}",
        );
        assert_eq!(info.selector, "app-y");
        assert_eq!(info.template.as_deref(), Some("<b>(ok)</b>"));
    }

    #[test]
    fn last_declaration_for_a_selector_wins() {
        let text = r#"
@Component({ selector: 'app-dup', templateUrl: './first.html' })
class A {}
@Component({ selector: 'app-dup', templateUrl: './second.html' })
class B {}
"#;
        let infos = extract_components(text, Path::new("/app/dup.ts"));
        assert_eq!(infos.len(), 2);
        let mut registry = Registry::default();
        for info in infos {
            registry.components.insert(info.selector.clone(), info);
        }
        assert_eq!(
            registry.get("app-dup").unwrap().template_url.as_deref(),
            Some(Path::new("/app/second.html"))
        );
    }
}
