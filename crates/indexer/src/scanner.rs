use crate::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Finds the markdown notes of a vault
#[derive(Debug, Clone)]
pub struct VaultScanner {
    root: PathBuf,
    exclude: GlobSet,
    /// One matcher per `.gitignore` in the vault, deepest directory first
    gitignores: Vec<Gitignore>,
}

impl VaultScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            gitignores: load_gitignores(&root),
            root,
            exclude: GlobSet::empty(),
        }
    }

    /// Scanner that also skips files matching any of `patterns` (relative to
    /// the vault root).
    pub fn with_excludes(root: impl AsRef<Path>, patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        let root = root.as_ref().to_path_buf();
        Ok(Self {
            gitignores: load_gitignores(&root),
            root,
            exclude: builder.build()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Markdown files under the root, sorted (.gitignore aware)
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .parents(false)
            .require_git(false);
        builder.filter_entry(move |entry| !is_ignored_scope(entry.path(), &root));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if !is_markdown(path) {
                        continue;
                    }
                    if self.is_excluded(path) {
                        log::debug!("Skipping excluded note {}", path.display());
                        continue;
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!("Found {} notes under {}", files.len(), self.root.display());
        files
    }

    /// Whether a watch event for `path` concerns a note [`scan`](Self::scan)
    /// would load.
    ///
    /// `.gitignore` files are read when the scanner is built; ones added or
    /// edited later are not picked up.
    pub fn is_tracked(&self, path: &Path) -> bool {
        if !is_markdown(path)
            || is_ignored_scope(path, &self.root)
            || self.is_excluded(path)
            || self.is_gitignored(path)
        {
            return false;
        }
        path.strip_prefix(&self.root).is_ok_and(|relative| {
            relative.components().all(|component| match component {
                Component::Normal(name) => !name.to_string_lossy().starts_with('.'),
                _ => true,
            })
        })
    }

    /// The deepest `.gitignore` with a matching rule decides; a whitelist
    /// (`!pattern`) re-includes.
    fn is_gitignored(&self, path: &Path) -> bool {
        for gitignore in &self.gitignores {
            if !path.starts_with(gitignore.path()) {
                continue;
            }
            let matched = gitignore.matched_path_or_any_parents(path, false);
            if matched.is_ignore() {
                return true;
            }
            if matched.is_whitelist() {
                return false;
            }
        }
        false
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        path.strip_prefix(&self.root)
            .is_ok_and(|relative| self.exclude.is_match(relative))
    }
}

/// Matchers for the root `.gitignore` (plus `.git/info/exclude`) and every
/// nested `.gitignore` the walk reaches, the same files `scan` honours.
fn load_gitignores(root: &Path) -> Vec<Gitignore> {
    let mut sources: Vec<(PathBuf, Vec<PathBuf>)> = vec![(
        root.to_path_buf(),
        vec![root.join(".git/info/exclude"), root.join(".gitignore")],
    )];

    let scope_root = root.to_path_buf();
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .parents(false)
        .require_git(false);
    builder.filter_entry(move |entry| !is_ignored_scope(entry.path(), &scope_root));
    for entry in builder.build().flatten() {
        let is_file = entry.file_type().is_some_and(|file_type| file_type.is_file());
        if !is_file || entry.file_name() != ".gitignore" {
            continue;
        }
        match entry.path().parent() {
            Some(dir) if dir != root => {
                sources.push((dir.to_path_buf(), vec![entry.path().to_path_buf()]));
            }
            _ => {}
        }
    }

    let mut gitignores: Vec<Gitignore> = sources
        .into_iter()
        .filter_map(|(dir, files)| {
            let mut builder = GitignoreBuilder::new(&dir);
            for file in files.iter().filter(|file| file.is_file()) {
                if let Some(err) = builder.add(file) {
                    log::warn!("Failed to read {}: {err}", file.display());
                }
            }
            match builder.build() {
                Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
                Ok(_) => None,
                Err(err) => {
                    log::warn!("Invalid ignore rules under {}: {err}", dir.display());
                    None
                }
            }
        })
        .collect();
    gitignores.sort_by_key(|gitignore| std::cmp::Reverse(gitignore.path().components().count()));
    gitignores
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.iter().any(|candidate| ext.eq_ignore_ascii_case(candidate)))
}

fn is_ignored_scope(path: &Path, root: &Path) -> bool {
    if let Ok(relative) = path.strip_prefix(root) {
        for component in relative.components() {
            if let Component::Normal(name) = component {
                let lowered = name.to_string_lossy().to_lowercase();
                if IGNORED_SCOPES.iter().any(|ignored| ignored == &lowered) {
                    return true;
                }
            }
        }
    }
    false
}

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

const IGNORED_SCOPES: &[&str] = &[
    // VCS / editors
    ".git",
    ".hg",
    ".obsidian",
    ".trash",
    ".vscode",
    // tool state
    ".voicetree",
    "node_modules",
];
