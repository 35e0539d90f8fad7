use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::checks::Tier;

/// Directories that are never traversed by the registry scan.
/// These hold build output, dependency caches, or version-control metadata,
/// none of which contain component declarations.
pub const GLOBAL_SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "target",
    ".cache",
    ".angular",
    "out-tsc",
    "coverage",
    ".nyc_output",
    "tmp",
];

/// Build a HashSet from the global skip dirs plus any extra entries.
pub fn skip_dirs(extra: &[&'static str]) -> HashSet<&'static str> {
    let mut set: HashSet<&'static str> = GLOBAL_SKIP_DIRS.iter().copied().collect();
    for e in extra {
        set.insert(e);
    }
    set
}

pub struct AnalyzerConfig {
    pub root_dir: PathBuf,
    /// Worker count for check execution. 1 means fully sequential.
    pub concurrency: usize,
    /// Highest check tier to dispatch.
    pub tier: Tier,
}

impl AnalyzerConfig {
    pub fn from_root(root: &Path) -> Self {
        Self {
            root_dir: root.to_path_buf(),
            concurrency: default_concurrency(),
            tier: Tier::Extended,
        }
    }

    /// Discover project root by walking up from cwd to find .git directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            if dir.join(".git").exists() {
                return Some(Self::from_root(&dir));
            }
            if !dir.pop() {
                return None;
            }
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
