use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::registry::Registry;

/// Inline template text carried by selector, since there is no file path to
/// hand to the check runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineTemplate {
    pub selector: String,
    pub template: String,
}

/// The closure of one entry template: every template and stylesheet that
/// contributes to the page's rendered output, deduplicated.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedPage {
    pub html_files: BTreeSet<PathBuf>,
    pub scss_files: BTreeSet<PathBuf>,
    pub components: BTreeSet<String>,
    pub inline_templates: Vec<InlineTemplate>,
}

/// Hyphenated tag names reserved by the custom-elements spec for built-in
/// SVG/MathML elements, plus framework structural tags. None of these can be
/// project components.
const NON_COMPONENT_TAGS: &[&str] = &[
    "ng-container",
    "ng-content",
    "ng-template",
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

static CUSTOM_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([a-zA-Z][a-zA-Z0-9]*(?:-[a-zA-Z0-9]+)+)[\s>/]").unwrap()
});

/// Resolve the full component closure of `entry_template`.
///
/// A single visited set is threaded through the whole call, so each selector
/// is expanded at most once no matter how many ancestors reference it. That
/// bounds the work to the registry size and makes cyclic component graphs
/// terminate. An unreadable entry template yields an empty page.
pub fn resolve_page(entry_template: &Path, registry: &Registry) -> ResolvedPage {
    let mut page = ResolvedPage::default();
    let mut visited: BTreeSet<String> = BTreeSet::new();

    // Texts still to be scanned for component tags. Template files are read
    // here, once, and recorded in the closure as they are taken up.
    enum Work {
        TemplateFile(PathBuf),
        InlineText(String),
    }

    let mut stack: Vec<Work> = vec![Work::TemplateFile(entry_template.to_path_buf())];

    while let Some(work) = stack.pop() {
        let text = match work {
            Work::TemplateFile(path) => match fs::read_to_string(&path) {
                Ok(text) => {
                    page.html_files.insert(path);
                    text
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable template");
                    continue;
                }
            },
            Work::InlineText(text) => text,
        };

        for tag in component_tags(&text) {
            if !visited.insert(tag.clone()) {
                continue;
            }
            // Unregistered tags are assumed to be third-party elements
            // living outside the scanned tree.
            let info = match registry.get(&tag) {
                Some(info) => info,
                None => continue,
            };

            page.components.insert(tag.clone());
            page.scss_files.extend(info.style_urls.iter().cloned());

            if let Some(template_url) = &info.template_url {
                stack.push(Work::TemplateFile(template_url.clone()));
            } else if let Some(template) = &info.template {
                page.inline_templates.push(InlineTemplate {
                    selector: tag,
                    template: template.clone(),
                });
                stack.push(Work::InlineText(template.clone()));
            }
        }
    }

    page.inline_templates.sort_by(|a, b| a.selector.cmp(&b.selector));
    page
}

/// Hyphenated custom-element tags referenced by a template, in order of first
/// appearance, minus known non-component built-ins.
fn component_tags(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut tags = Vec::new();
    for caps in CUSTOM_TAG.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            let tag = m.as_str().to_ascii_lowercase();
            if NON_COMPONENT_TAGS.contains(&tag.as_str()) {
                continue;
            }
            if seen.insert(tag.clone()) {
                tags.push(tag);
            }
        }
    }
    tags
}

/// Derive entry templates from the registry when the caller names none:
/// components referenced by no other component's template are graph roots,
/// and their external templates are the entry set.
pub fn find_entry_templates(registry: &Registry) -> Vec<PathBuf> {
    let mut referenced: BTreeSet<String> = BTreeSet::new();

    for (_, info) in registry.iter() {
        let text = if let Some(template) = &info.template {
            template.clone()
        } else if let Some(url) = &info.template_url {
            match fs::read_to_string(url) {
                Ok(text) => text,
                Err(_) => continue,
            }
        } else {
            continue;
        };

        for tag in component_tags(&text) {
            if registry.get(&tag).is_some() {
                referenced.insert(tag);
            }
        }
    }

    let mut entries: Vec<PathBuf> = registry
        .iter()
        .filter(|(selector, info)| {
            !referenced.contains(*selector) && info.template_url.is_some()
        })
        .filter_map(|(_, info)| info.template_url.clone())
        .collect();
    entries.sort();
    entries.dedup();
    entries
}

/// Map every disk path in a page's closure to the selector that owns it, for
/// issue attribution. The entry template itself usually has no owner.
pub fn owner_index(page: &ResolvedPage, registry: &Registry) -> BTreeMap<PathBuf, String> {
    let mut owners = BTreeMap::new();
    for selector in &page.components {
        if let Some(info) = registry.get(selector) {
            if let Some(url) = &info.template_url {
                owners.insert(url.clone(), selector.clone());
            }
            for style in &info.style_urls {
                owners.insert(style.clone(), selector.clone());
            }
        }
    }
    owners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ComponentInfo;
    use std::path::PathBuf;

    fn component(selector: &str, template: &str) -> ComponentInfo {
        ComponentInfo {
            selector: selector.to_string(),
            file_path: PathBuf::from(format!("/app/{selector}.ts")),
            component_dir: PathBuf::from("/app"),
            template_url: None,
            template: Some(template.to_string()),
            style_urls: Vec::new(),
        }
    }

    #[test]
    fn component_tags_skips_builtins_and_dedups() {
        let tags = component_tags(
            "<ng-container>\n<app-header></app-header>\n<app-header/>\n<font-face>\n<div>",
        );
        assert_eq!(tags, vec!["app-header".to_string()]);
    }

    #[test]
    fn cyclic_inline_graphs_terminate() {
        let temp = tempfile::tempdir().unwrap();
        let entry = temp.path().join("entry.html");
        std::fs::write(&entry, "<app-a></app-a>").unwrap();

        let mut registry = Registry::default();
        registry.insert(component("app-a", "<app-b></app-b>"));
        registry.insert(component("app-b", "<app-a></app-a>"));

        let page = resolve_page(&entry, &registry);
        assert_eq!(
            page.components.iter().collect::<Vec<_>>(),
            vec!["app-a", "app-b"]
        );
        assert_eq!(page.inline_templates.len(), 2);
    }

    #[test]
    fn unreadable_entry_yields_empty_page() {
        let registry = Registry::default();
        let page = resolve_page(Path::new("/nonexistent/entry.html"), &registry);
        assert_eq!(page, ResolvedPage::default());
    }
}
